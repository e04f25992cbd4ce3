//! Selector matching.
//!
//! [Selectors Level 4 § 3.1 Matching](https://www.w3.org/TR/selectors-4/#match-against-element)
//!
//! Complex selectors are matched right to left: the subject compound is
//! tested against the element, then each combinator moves to the candidate
//! elements for the next compound. Descendant and subsequent-sibling
//! combinators try every candidate, so a failure further left backtracks to
//! the next candidate instead of failing the whole selector.

use std::cell::Cell;

use wombat_css::Stylesheet;
use wombat_css::selector::{
    AnPlusB, AttributeOperator, AttributeSelector, CaseSensitivity, Combinator, CompoundSelector, NamespacePrefix,
    PseudoClass, PseudoClassBitmap, PseudoClassKind, PseudoElement, Selector, SelectorList, SimpleSelector,
};
use wombat_dom::{DomTree, ElementData, ElementState, NodeId};

/// Everything a match depends on besides the selector and the element.
#[derive(Debug)]
pub struct MatchContext<'a> {
    /// The tree the element lives in.
    pub tree: &'a DomTree,
    /// Sheet the selector came from, for namespace prefixes.
    pub sheet: Option<&'a Stylesheet>,
    /// Pseudo-element being styled, if any.
    pub pseudo_element: Option<PseudoElement>,
    /// The shadow host visible to `:host`, when matching rules that belong
    /// to a shadow tree.
    pub shadow_host: Option<NodeId>,
    /// The `:scope` element. Defaults to the document element.
    pub scope: Option<NodeId>,
    /// Whether ids and classes compare ASCII case-insensitively.
    pub quirks_mode: bool,
    has_anchor: Option<NodeId>,
    attempted: Cell<PseudoClassBitmap>,
}

impl<'a> MatchContext<'a> {
    /// A context for matching in the document tree.
    #[must_use]
    pub fn new(tree: &'a DomTree) -> Self {
        Self {
            tree,
            sheet: None,
            pseudo_element: None,
            shadow_host: None,
            scope: None,
            quirks_mode: tree.is_quirks_mode(),
            has_anchor: None,
            attempted: Cell::new(PseudoClassBitmap::default()),
        }
    }

    /// Pseudo-classes the matcher looked at so far. Dynamic state only
    /// matters for the pseudo-classes in this set.
    #[must_use]
    pub fn attempted_pseudo_classes(&self) -> PseudoClassBitmap {
        self.attempted.get()
    }

    fn note_attempt(&self, kind: PseudoClassKind) {
        let mut attempted = self.attempted.get();
        attempted.insert(kind);
        self.attempted.set(attempted);
    }

    fn nested(&self) -> MatchContext<'a> {
        MatchContext {
            tree: self.tree,
            sheet: self.sheet,
            pseudo_element: None,
            shadow_host: self.shadow_host,
            scope: self.scope,
            quirks_mode: self.quirks_mode,
            has_anchor: self.has_anchor,
            attempted: Cell::new(self.attempted.get()),
        }
    }

    fn absorb(&self, nested: &Self) {
        self.attempted.set(self.attempted.get().union(nested.attempted.get()));
    }
}

/// [§ 3.1](https://www.w3.org/TR/selectors-4/#match-against-element)
///
/// "A selector is said to match an element when..." the element is the
/// subject of the selector.
#[must_use]
pub fn matches(selector: &Selector, element: NodeId, context: &MatchContext<'_>) -> bool {
    if selector.has_unknown_pseudo_element() {
        return false;
    }
    if selector.pseudo_element() != context.pseudo_element {
        return false;
    }
    match_from(selector, 0, element, context)
}

/// Whether any selector of a list matches.
#[must_use]
pub fn matches_any(list: &SelectorList, element: NodeId, context: &MatchContext<'_>) -> bool {
    list.iter().any(|selector| matches(selector, element, context))
}

fn compound_at(selector: &Selector, index: usize) -> &CompoundSelector {
    if index == 0 {
        &selector.subject
    } else {
        &selector.combinators[index - 1].1
    }
}

/// Match compound `index` (0 is the subject) against `element`, then
/// continue leftwards. Returns on the first full match.
fn match_from(selector: &Selector, index: usize, element: NodeId, context: &MatchContext<'_>) -> bool {
    if !matches_compound(compound_at(selector, index), element, context) {
        return false;
    }
    let Some((combinator, _)) = selector.combinators.get(index) else {
        return true;
    };
    let tree = context.tree;
    match combinator {
        Combinator::Child => parent_for_matching(element, context)
            .is_some_and(|parent| match_from(selector, index + 1, parent, context)),
        Combinator::Descendant => {
            let mut current = parent_for_matching(element, context);
            while let Some(ancestor) = current {
                if match_from(selector, index + 1, ancestor, context) {
                    return true;
                }
                current = parent_for_matching(ancestor, context);
            }
            false
        }
        Combinator::NextSibling => tree
            .preceding_siblings(element)
            .find(|&sibling| tree.is_element(sibling))
            .is_some_and(|sibling| match_from(selector, index + 1, sibling, context)),
        Combinator::SubsequentSibling => tree
            .preceding_siblings(element)
            .filter(|&sibling| tree.is_element(sibling))
            .any(|sibling| match_from(selector, index + 1, sibling, context)),
    }
}

/// The parent element for combinator purposes. From the top of a shadow
/// tree the walk continues to the host, but only when the rules being
/// matched belong to that shadow tree.
fn parent_for_matching(element: NodeId, context: &MatchContext<'_>) -> Option<NodeId> {
    let tree = context.tree;
    if let Some(parent) = tree.parent_element(element) {
        return Some(parent);
    }
    let host = tree.parent(element).and_then(|parent| tree.shadow_host(parent))?;
    (context.shadow_host == Some(host)).then_some(host)
}

fn matches_compound(compound: &CompoundSelector, element: NodeId, context: &MatchContext<'_>) -> bool {
    let Some(data) = context.tree.as_element(element) else {
        return false;
    };
    // [CSS Scoping § 3.2.1](https://drafts.csswg.org/css-scoping/#host-element-in-tree)
    // "the shadow host is featureless" in its own shadow tree's context,
    // except for :host.
    if context.shadow_host == Some(element) {
        let only_host = compound.simple_selectors.iter().all(|simple| {
            matches!(
                simple,
                SimpleSelector::PseudoClass(PseudoClass::Host(_) | PseudoClass::Is(_) | PseudoClass::Where(_) | PseudoClass::Not(_))
                    | SimpleSelector::PseudoElement(_)
            )
        });
        let mentions_host = compound
            .simple_selectors
            .iter()
            .any(|simple| matches!(simple, SimpleSelector::PseudoClass(PseudoClass::Host(_))));
        if !only_host || !mentions_host {
            return false;
        }
    }
    compound
        .simple_selectors
        .iter()
        .all(|simple| matches_simple(simple, element, data, context))
}

fn matches_simple(simple: &SimpleSelector, element: NodeId, data: &ElementData, context: &MatchContext<'_>) -> bool {
    match simple {
        SimpleSelector::Universal(prefix) => namespace_matches(prefix, data, context),
        SimpleSelector::Type { name, namespace } => {
            data.local_name().eq_ignore_ascii_case(name) && namespace_matches(namespace, data, context)
        }
        SimpleSelector::Id(id) => data.id().is_some_and(|value| compare(value, id, context.quirks_mode)),
        SimpleSelector::Class(class) => data
            .classes()
            .iter()
            .any(|value| compare(value, class, context.quirks_mode)),
        SimpleSelector::Attribute(attribute) => matches_attribute(attribute, data),
        SimpleSelector::PseudoClass(pseudo) => matches_pseudo_class(pseudo, element, data, context),
        SimpleSelector::PseudoElement(pseudo) => context.pseudo_element == Some(*pseudo),
        SimpleSelector::UnknownPseudoElement(_) => false,
        SimpleSelector::Nesting => context.scope.or_else(|| context.tree.document_element()) == Some(element),
        SimpleSelector::RelativeAnchor => context.has_anchor == Some(element),
    }
}

fn compare(value: &str, wanted: &str, case_insensitive: bool) -> bool {
    if case_insensitive {
        value.eq_ignore_ascii_case(wanted)
    } else {
        value == wanted
    }
}

/// [CSS Namespaces § 4](https://www.w3.org/TR/css-namespaces-3/#css-qnames)
fn namespace_matches(prefix: &NamespacePrefix, data: &ElementData, context: &MatchContext<'_>) -> bool {
    match prefix {
        NamespacePrefix::Any => true,
        NamespacePrefix::None => data.namespace().is_none(),
        NamespacePrefix::Default => context
            .sheet
            .and_then(|sheet| sheet.default_namespace.as_deref())
            .is_none_or(|uri| data.namespace() == Some(uri)),
        NamespacePrefix::Named(name) => context
            .sheet
            .and_then(|sheet| sheet.namespace_uri(name))
            .is_some_and(|uri| data.namespace() == Some(uri)),
    }
}

/// [§ 6 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
fn matches_attribute(selector: &AttributeSelector, data: &ElementData) -> bool {
    let Some(attribute) = data
        .attributes()
        .iter()
        .find(|attr| attr.name.eq_ignore_ascii_case(&selector.name))
    else {
        return false;
    };
    let insensitive = selector.case == CaseSensitivity::Insensitive;
    let (value, wanted) = if insensitive {
        (attribute.value.to_ascii_lowercase(), selector.value.to_ascii_lowercase())
    } else {
        (attribute.value.clone(), selector.value.clone())
    };
    match selector.operator {
        AttributeOperator::Exists => true,
        AttributeOperator::Equals => value == wanted,
        AttributeOperator::Includes => !wanted.is_empty() && value.split_ascii_whitespace().any(|word| word == wanted),
        AttributeOperator::DashMatch => {
            value == wanted || value.strip_prefix(wanted.as_str()).is_some_and(|rest| rest.starts_with('-'))
        }
        AttributeOperator::Prefix => !wanted.is_empty() && value.starts_with(&wanted),
        AttributeOperator::Suffix => !wanted.is_empty() && value.ends_with(&wanted),
        AttributeOperator::Substring => !wanted.is_empty() && value.contains(&wanted),
    }
}

fn is_form_control(data: &ElementData) -> bool {
    data.is_html() && matches!(data.local_name(), "button" | "input" | "select" | "textarea" | "option" | "optgroup" | "fieldset")
}

fn is_disabled(data: &ElementData) -> bool {
    data.state.contains(ElementState::DISABLED) || (is_form_control(data) && data.has_attribute("disabled"))
}

fn same_type(a: &ElementData, b: &ElementData) -> bool {
    a.local_name() == b.local_name() && a.namespace() == b.namespace()
}

/// 1-based position among element siblings that satisfy `filter`, counted
/// from the start or the end.
fn sibling_position(
    element: NodeId,
    context: &MatchContext<'_>,
    from_end: bool,
    filter: impl Fn(NodeId, &ElementData) -> bool,
) -> i32 {
    let tree = context.tree;
    let siblings = if from_end {
        tree.following_siblings(element)
    } else {
        tree.preceding_siblings(element)
    };
    let count = siblings
        .filter(|&sibling| tree.as_element(sibling).is_some_and(|data| filter(sibling, data)))
        .count();
    count as i32 + 1
}

fn nth(
    step: AnPlusB,
    element: NodeId,
    context: &MatchContext<'_>,
    from_end: bool,
    of: Option<&SelectorList>,
) -> bool {
    if let Some(list) = of {
        let nested = context.nested();
        if !matches_any(list, element, &nested) {
            context.absorb(&nested);
            return false;
        }
        let position = sibling_position(element, context, from_end, |sibling, _| matches_any(list, sibling, &nested));
        context.absorb(&nested);
        return step.matches(position);
    }
    step.matches(sibling_position(element, context, from_end, |_, _| true))
}

fn nth_of_type(step: AnPlusB, element: NodeId, data: &ElementData, context: &MatchContext<'_>, from_end: bool) -> bool {
    step.matches(sibling_position(element, context, from_end, |_, sibling| same_type(data, sibling)))
}

/// [§ 3.6 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
fn matches_pseudo_class(pseudo: &PseudoClass, element: NodeId, data: &ElementData, context: &MatchContext<'_>) -> bool {
    context.note_attempt(pseudo.kind());
    let tree = context.tree;
    match pseudo {
        PseudoClass::Simple(kind) => match kind {
            PseudoClassKind::Root => tree.document_element() == Some(element),
            PseudoClassKind::Empty => tree.children(element).iter().all(|&child| {
                !tree.is_element(child) && tree.as_text(child).is_none_or(str::is_empty)
            }),
            PseudoClassKind::FirstChild => nth(AnPlusB { a: 0, b: 1 }, element, context, false, None),
            PseudoClassKind::LastChild => nth(AnPlusB { a: 0, b: 1 }, element, context, true, None),
            PseudoClassKind::OnlyChild => {
                nth(AnPlusB { a: 0, b: 1 }, element, context, false, None)
                    && nth(AnPlusB { a: 0, b: 1 }, element, context, true, None)
            }
            PseudoClassKind::FirstOfType => nth_of_type(AnPlusB { a: 0, b: 1 }, element, data, context, false),
            PseudoClassKind::LastOfType => nth_of_type(AnPlusB { a: 0, b: 1 }, element, data, context, true),
            PseudoClassKind::OnlyOfType => {
                nth_of_type(AnPlusB { a: 0, b: 1 }, element, data, context, false)
                    && nth_of_type(AnPlusB { a: 0, b: 1 }, element, data, context, true)
            }
            // [§ 9.1 :any-link](https://www.w3.org/TR/selectors-4/#the-any-link-pseudo)
            PseudoClassKind::Link | PseudoClassKind::AnyLink => {
                data.is_html() && matches!(data.local_name(), "a" | "area" | "link") && data.has_attribute("href")
            }
            PseudoClassKind::Hover => data.state.contains(ElementState::HOVER),
            PseudoClassKind::Focus => data.state.contains(ElementState::FOCUS),
            PseudoClassKind::Active => data.state.contains(ElementState::ACTIVE),
            PseudoClassKind::FocusWithin => {
                data.state.contains(ElementState::FOCUS)
                    || tree.descendants(element).into_iter().any(|descendant| {
                        tree.as_element(descendant)
                            .is_some_and(|d| d.state.contains(ElementState::FOCUS))
                    })
            }
            PseudoClassKind::Checked => {
                data.state.contains(ElementState::CHECKED)
                    || (data.is_html() && data.local_name() == "input" && data.has_attribute("checked"))
            }
            PseudoClassKind::Disabled => is_disabled(data),
            PseudoClassKind::Enabled => is_form_control(data) && !is_disabled(data),
            PseudoClassKind::Scope => context.scope.or_else(|| tree.document_element()) == Some(element),
            // The functional forms carry their own variants.
            PseudoClassKind::NthChild
            | PseudoClassKind::NthLastChild
            | PseudoClassKind::NthOfType
            | PseudoClassKind::NthLastOfType
            | PseudoClassKind::Is
            | PseudoClassKind::Where
            | PseudoClassKind::Not
            | PseudoClassKind::Has => false,
            PseudoClassKind::Host => context.shadow_host == Some(element),
        },
        PseudoClass::NthChild(step, of) => nth(*step, element, context, false, of.as_ref()),
        PseudoClass::NthLastChild(step, of) => nth(*step, element, context, true, of.as_ref()),
        PseudoClass::NthOfType(step) => nth_of_type(*step, element, data, context, false),
        PseudoClass::NthLastOfType(step) => nth_of_type(*step, element, data, context, true),
        PseudoClass::Is(list) | PseudoClass::Where(list) => {
            let nested = context.nested();
            let result = matches_any(list, element, &nested);
            context.absorb(&nested);
            result
        }
        PseudoClass::Not(list) => {
            let nested = context.nested();
            let result = !matches_any(list, element, &nested);
            context.absorb(&nested);
            result
        }
        PseudoClass::Has(relative) => matches_has(relative, element, context),
        // [CSS Scoping § 3.2.1](https://drafts.csswg.org/css-scoping/#host-selector)
        PseudoClass::Host(argument) => {
            if context.shadow_host != Some(element) {
                return false;
            }
            argument.as_ref().is_none_or(|list| {
                let mut nested = context.nested();
                nested.shadow_host = None;
                let result = matches_any(list, element, &nested);
                context.absorb(&nested);
                result
            })
        }
    }
}

/// [§ 4.5 :has()](https://www.w3.org/TR/selectors-4/#relational)
///
/// Each relative selector ends (leftmost) in an anchor compound joined by
/// the combinator written at the start of the argument. Candidates are
/// searched forward from the anchor: its descendants for `>` and
/// descendant forms, its following siblings and their descendants for `+`
/// and `~`.
fn matches_has(relative: &[Selector], anchor: NodeId, context: &MatchContext<'_>) -> bool {
    let tree = context.tree;
    let mut nested = context.nested();
    nested.has_anchor = Some(anchor);
    let result = relative.iter().any(|selector| {
        let leading = selector.combinators.last().map(|(combinator, _)| *combinator);
        let candidates: Vec<NodeId> = match leading {
            Some(Combinator::NextSibling | Combinator::SubsequentSibling) => tree
                .following_siblings(anchor)
                .flat_map(|sibling| core::iter::once(sibling).chain(tree.descendants(sibling)))
                .collect(),
            _ => tree.descendants(anchor),
        };
        candidates
            .into_iter()
            .filter(|&candidate| tree.is_element(candidate))
            .any(|candidate| !selector.has_unknown_pseudo_element() && match_from(selector, 0, candidate, &nested))
    });
    context.absorb(&nested);
    result
}

#[cfg(test)]
mod tests {
    use wombat_css::{parse_component_values, parse_selector_list};

    use super::*;

    fn selector(css: &str) -> SelectorList {
        parse_selector_list(&parse_component_values(css)).expect("valid selector")
    }

    fn tree_with_list() -> (DomTree, Vec<NodeId>) {
        let mut tree = DomTree::new();
        let html = tree.create_html_element("html");
        tree.append_child(NodeId::ROOT, html);
        let ul = tree.create_html_element("ul");
        tree.append_child(html, ul);
        let items: Vec<NodeId> = (0..4)
            .map(|_| {
                let li = tree.create_html_element("li");
                tree.append_child(ul, li);
                li
            })
            .collect();
        (tree, items)
    }

    #[test]
    fn test_nth_child() {
        let (tree, items) = tree_with_list();
        let context = MatchContext::new(&tree);
        let odd = selector("li:nth-child(odd)");
        let matched: Vec<bool> = items.iter().map(|&li| matches_any(&odd, li, &context)).collect();
        assert_eq!(matched, vec![true, false, true, false]);
        assert!(matches_any(&selector("li:last-child"), items[3], &context));
        assert!(!matches_any(&selector("li:only-child"), items[0], &context));
    }

    #[test]
    fn test_attempted_pseudo_classes_are_recorded() {
        let (tree, items) = tree_with_list();
        let context = MatchContext::new(&tree);
        let _ = matches_any(&selector("ul:hover li"), items[0], &context);
        assert!(context.attempted_pseudo_classes().contains(PseudoClassKind::Hover));
        assert!(!context.attempted_pseudo_classes().contains(PseudoClassKind::Focus));
    }

    #[test]
    fn test_has_searches_descendants() {
        let (tree, items) = tree_with_list();
        let ul = tree.parent(items[0]).expect("list");
        let context = MatchContext::new(&tree);
        assert!(matches_any(&selector("ul:has(> li)"), ul, &context));
        assert!(matches_any(&selector("html:has(li)"), tree.document_element().expect("root"), &context));
        assert!(!matches_any(&selector("ul:has(> p)"), ul, &context));
        assert!(matches_any(&selector("li:has(+ li)"), items[2], &context));
        assert!(!matches_any(&selector("li:has(+ li)"), items[3], &context));
    }
}
