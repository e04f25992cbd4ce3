//! Integration tests for selector parsing and specificity.

use wombat_css::selector::{
    AttributeOperator, CaseSensitivity, Combinator, PseudoClass, PseudoClassKind, PseudoElement, SimpleSelector,
    Specificity, parse_selector_list,
};
use wombat_css::syntax::parse_component_values;

fn specificity(text: &str) -> Specificity {
    parse_selector_list(&parse_component_values(text)).unwrap()[0].specificity()
}

#[test]
fn test_basic_specificity() {
    assert_eq!(specificity("body"), Specificity(0, 0, 1));
    assert_eq!(specificity(".highlight"), Specificity(0, 1, 0));
    assert_eq!(specificity("#main"), Specificity(1, 0, 0));
    assert_eq!(specificity("*"), Specificity(0, 0, 0));
    assert_eq!(specificity("ul li.active > a:hover"), Specificity(0, 2, 3));
    assert_eq!(specificity("p::before"), Specificity(0, 0, 2));
}

#[test]
fn test_is_not_has_take_the_most_specific_argument() {
    assert_eq!(specificity(":is(#a, .b, c)"), Specificity(1, 0, 0));
    assert_eq!(specificity(":not(.a, .b.c)"), Specificity(0, 2, 0));
    assert_eq!(specificity("a:has(> img)"), Specificity(0, 0, 2));
}

#[test]
fn test_where_is_zero() {
    assert_eq!(specificity(":where(#a .b) p"), Specificity(0, 0, 1));
}

#[test]
fn test_nth_child_of_selector() {
    assert_eq!(specificity(":nth-child(2n+1 of .item)"), Specificity(0, 2, 0));
    assert_eq!(specificity(":nth-child(odd)"), Specificity(0, 1, 0));
}

#[test]
fn test_combinators_are_stored_right_to_left() {
    let list = parse_selector_list(&parse_component_values("div > p + span ~ em")).unwrap();
    let selector = &list[0];
    assert!(matches!(
        &selector.subject.simple_selectors[0],
        SimpleSelector::Type { name, .. } if name == "em"
    ));
    let combinators: Vec<Combinator> = selector.combinators.iter().map(|(c, _)| *c).collect();
    assert_eq!(
        combinators,
        vec![
            Combinator::SubsequentSibling,
            Combinator::NextSibling,
            Combinator::Child
        ]
    );
}

#[test]
fn test_attribute_selectors() {
    let list = parse_selector_list(&parse_component_values("[lang|=en i]")).unwrap();
    let SimpleSelector::Attribute(attribute) = &list[0].subject.simple_selectors[0] else {
        panic!("expected attribute selector");
    };
    assert_eq!(attribute.name, "lang");
    assert_eq!(attribute.operator, AttributeOperator::DashMatch);
    assert_eq!(attribute.value, "en");
    assert_eq!(attribute.case, CaseSensitivity::Insensitive);
}

#[test]
fn test_legacy_pseudo_elements() {
    let list = parse_selector_list(&parse_component_values("p:before, p::marker")).unwrap();
    assert_eq!(list[0].pseudo_element(), Some(PseudoElement::Before));
    assert_eq!(list[1].pseudo_element(), Some(PseudoElement::Marker));
}

#[test]
fn test_unknown_pseudo_element_parses_but_is_flagged() {
    let list = parse_selector_list(&parse_component_values("p::-vendor-thing")).unwrap();
    assert!(list[0].has_unknown_pseudo_element());
}

#[test]
fn test_invalid_selector_lists_are_rejected() {
    assert!(parse_selector_list(&parse_component_values("p, ")).is_none());
    assert!(parse_selector_list(&parse_component_values("p >")).is_none());
    assert!(parse_selector_list(&parse_component_values(":banana")).is_none());
}

#[test]
fn test_is_is_forgiving() {
    let list = parse_selector_list(&parse_component_values(":is(:banana, .ok)")).unwrap();
    let SimpleSelector::PseudoClass(PseudoClass::Is(inner)) = &list[0].subject.simple_selectors[0] else {
        panic!("expected :is()");
    };
    assert_eq!(inner.len(), 1);
}

#[test]
fn test_nesting_selector_absolutizes_to_is() {
    let parent = parse_selector_list(&parse_component_values(".card")).unwrap();
    let nested = parse_selector_list(&parse_component_values("&:hover")).unwrap();
    let absolutized = nested[0].absolutized(Some(&parent));
    assert!(!absolutized.contains_nesting_selector());
    assert_eq!(absolutized.specificity(), Specificity(0, 2, 0));
    assert!(absolutized.subject.simple_selectors.iter().any(|s| matches!(
        s,
        SimpleSelector::PseudoClass(PseudoClass::Simple(PseudoClassKind::Hover))
    )));
}

#[test]
fn test_nested_selector_without_ampersand_is_a_descendant() {
    let parent = parse_selector_list(&parse_component_values("#a")).unwrap();
    let nested = parse_selector_list(&parse_component_values("span")).unwrap();
    let absolutized = nested[0].absolutized(Some(&parent));
    assert_eq!(absolutized.combinators.len(), 1);
    assert_eq!(absolutized.combinators[0].0, Combinator::Descendant);
    assert_eq!(absolutized.specificity(), Specificity(1, 0, 1));
}

#[test]
fn test_top_level_ampersand_has_zero_specificity() {
    let list = parse_selector_list(&parse_component_values("& .x")).unwrap();
    let absolutized = list[0].absolutized(None);
    assert_eq!(absolutized.specificity(), Specificity(0, 1, 0));
}
