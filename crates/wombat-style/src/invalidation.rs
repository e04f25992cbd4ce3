//! Which elements to restyle when an id, class, attribute or dynamic state
//! changes.
//!
//! For every feature that appears in some selector, the engine records a
//! descendant invalidation set: whether the element itself needs restyling,
//! which features of its descendants make them need restyling, and whether
//! following siblings are affected. Changes are looked up feature by
//! feature and the sets merged.
//!
//! Structural pseudo-classes (`:nth-child`, `:empty`, ...) never appear in
//! the sets; they change only when the tree changes shape, and insertions
//! and removals restyle the affected subtree anyway.

use rustc_hash::{FxHashMap, FxHashSet};
use wombat_css::selector::{Combinator, CompoundSelector, PseudoClass, PseudoClassKind, Selector, SimpleSelector};
use wombat_dom::ElementData;

/// One invalidatable feature of an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InvalidationProperty {
    /// An id.
    Id(String),
    /// A class name.
    Class(String),
    /// An attribute name, ASCII-lowercased.
    Attribute(String),
    /// A local name, ASCII-lowercased.
    TagName(String),
    /// A dynamic pseudo-class.
    PseudoClass(PseudoClassKind),
}

impl InvalidationProperty {
    /// An attribute change, plus the features it implies: `id` and `class`
    /// changes are reported by value, and a few attributes drive
    /// pseudo-classes.
    #[must_use]
    pub fn for_attribute_change(name: &str, old_value: Option<&str>, new_value: Option<&str>) -> Vec<Self> {
        let name = name.to_ascii_lowercase();
        let mut properties = Vec::new();
        match name.as_str() {
            "id" => properties.extend(old_value.into_iter().chain(new_value).map(|id| Self::Id(id.to_string()))),
            "class" => {
                let old: FxHashSet<&str> = old_value.unwrap_or_default().split_ascii_whitespace().collect();
                let new: FxHashSet<&str> = new_value.unwrap_or_default().split_ascii_whitespace().collect();
                properties.extend(old.symmetric_difference(&new).map(|class| Self::Class((*class).to_string())));
            }
            "checked" => properties.push(Self::PseudoClass(PseudoClassKind::Checked)),
            "disabled" => {
                properties.push(Self::PseudoClass(PseudoClassKind::Disabled));
                properties.push(Self::PseudoClass(PseudoClassKind::Enabled));
            }
            "href" => {
                properties.push(Self::PseudoClass(PseudoClassKind::Link));
                properties.push(Self::PseudoClass(PseudoClassKind::AnyLink));
            }
            _ => {}
        }
        properties.push(Self::Attribute(name));
        properties
    }

    /// The id, classes, attributes and tag name of an element, which
    /// invalidation sets filter descendants by.
    #[must_use]
    pub fn for_element(element: &ElementData) -> Vec<Self> {
        let mut features = vec![Self::TagName(element.local_name().to_ascii_lowercase())];
        features.extend(element.id().map(|id| Self::Id(id.to_string())));
        features.extend(element.classes().iter().map(|class| Self::Class(class.clone())));
        features.extend(
            element
                .attributes()
                .iter()
                .map(|attribute| Self::Attribute(attribute.name.to_ascii_lowercase())),
        );
        features
    }
}

/// The fan-out of a change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationSet {
    /// Restyle the changed element.
    pub invalidate_self: bool,
    /// Restyle every descendant.
    pub invalidate_whole_subtree: bool,
    /// Restyle following siblings (filtered by `properties` when
    /// non-empty) and their subtrees.
    pub invalidate_siblings: bool,
    /// Restyle descendants that have any of these features.
    pub properties: FxHashSet<InvalidationProperty>,
}

impl InvalidationSet {
    /// Whether the change affects anything.
    #[must_use]
    pub fn needs_invalidation(&self) -> bool {
        self.invalidate_self || self.invalidate_whole_subtree || self.invalidate_siblings || !self.properties.is_empty()
    }

    /// Merge another set into this one.
    pub fn include_all(&mut self, other: &Self) {
        self.invalidate_self |= other.invalidate_self;
        self.invalidate_whole_subtree |= other.invalidate_whole_subtree;
        self.invalidate_siblings |= other.invalidate_siblings;
        self.properties.extend(other.properties.iter().cloned());
    }

    /// Whether any of an element's features is in [`Self::properties`].
    #[must_use]
    pub fn matches_any(&self, features: &[InvalidationProperty]) -> bool {
        features.iter().any(|feature| self.properties.contains(feature))
    }
}

/// Per-feature invalidation sets for a set of selectors.
#[derive(Debug, Clone, Default)]
pub struct StyleInvalidationData {
    descendant_invalidation_sets: FxHashMap<InvalidationProperty, InvalidationSet>,
}

fn is_dynamic(kind: PseudoClassKind) -> bool {
    matches!(
        kind,
        PseudoClassKind::Link
            | PseudoClassKind::AnyLink
            | PseudoClassKind::Hover
            | PseudoClassKind::Focus
            | PseudoClassKind::FocusWithin
            | PseudoClassKind::Active
            | PseudoClassKind::Checked
            | PseudoClassKind::Disabled
            | PseudoClassKind::Enabled
    )
}

/// Features of a compound, including those inside `:is()`, `:where()`
/// and `:not()`. Returns whether a nested argument has combinators of its
/// own, which makes its effect impossible to pin to one position.
fn collect_compound_features(compound: &CompoundSelector, out: &mut Vec<InvalidationProperty>) -> bool {
    let mut has_complex_argument = false;
    for simple in &compound.simple_selectors {
        match simple {
            SimpleSelector::Id(id) => out.push(InvalidationProperty::Id(id.clone())),
            SimpleSelector::Class(class) => out.push(InvalidationProperty::Class(class.clone())),
            SimpleSelector::Attribute(attribute) => {
                out.push(InvalidationProperty::Attribute(attribute.name.to_ascii_lowercase()));
            }
            SimpleSelector::Type { name, .. } => out.push(InvalidationProperty::TagName(name.to_ascii_lowercase())),
            SimpleSelector::PseudoClass(pseudo) => {
                if is_dynamic(pseudo.kind()) {
                    out.push(InvalidationProperty::PseudoClass(pseudo.kind()));
                }
                if let PseudoClass::Is(list) | PseudoClass::Where(list) | PseudoClass::Not(list) = pseudo {
                    for argument in list {
                        has_complex_argument |= !argument.combinators.is_empty();
                        for compound in argument.compounds() {
                            has_complex_argument |= collect_compound_features(compound, out);
                        }
                    }
                }
            }
            _ => {}
        }
    }
    has_complex_argument
}

impl StyleInvalidationData {
    /// Build the sets for a collection of selectors.
    pub fn build<'a>(selectors: impl IntoIterator<Item = &'a Selector>) -> Self {
        let mut data = Self::default();
        for selector in selectors {
            data.add_selector(selector);
        }
        data
    }

    fn set_for(&mut self, property: InvalidationProperty) -> &mut InvalidationSet {
        self.descendant_invalidation_sets.entry(property).or_default()
    }

    /// Record one selector.
    pub fn add_selector(&mut self, selector: &Selector) {
        let mut subject_features = Vec::new();
        let subject_is_complex = collect_compound_features(&selector.subject, &mut subject_features);
        for feature in &subject_features {
            let set = self.set_for(feature.clone());
            set.invalidate_self = true;
            set.invalidate_whole_subtree |= subject_is_complex;
        }

        let mut crossed_ancestor = false;
        for (combinator, compound) in &selector.combinators {
            let sibling = matches!(combinator, Combinator::NextSibling | Combinator::SubsequentSibling);
            crossed_ancestor |= !sibling;
            let mut features = Vec::new();
            let is_complex = collect_compound_features(compound, &mut features);
            for feature in features {
                let set = self.set_for(feature);
                if !crossed_ancestor {
                    set.invalidate_siblings = true;
                }
                if subject_features.is_empty() || is_complex || subject_is_complex || (crossed_ancestor && sibling) {
                    set.invalidate_whole_subtree = true;
                } else {
                    set.properties.extend(subject_features.iter().cloned());
                }
            }
        }
    }

    /// [Merged](InvalidationSet::include_all) sets for a batch of changed
    /// features. Features no selector uses contribute nothing.
    #[must_use]
    pub fn invalidation_set_for_properties(&self, properties: &[InvalidationProperty]) -> InvalidationSet {
        let mut result = InvalidationSet::default();
        for property in properties {
            if let Some(set) = self.descendant_invalidation_sets.get(property) {
                result.include_all(set);
            }
        }
        result
    }

    /// Number of features with a recorded set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descendant_invalidation_sets.len()
    }

    /// Whether no selector contributed anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descendant_invalidation_sets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use wombat_css::{parse_component_values, parse_selector_list};

    use super::*;

    fn data(selectors: &str) -> StyleInvalidationData {
        let list = parse_selector_list(&parse_component_values(selectors)).expect("valid selectors");
        StyleInvalidationData::build(&list)
    }

    fn class(name: &str) -> InvalidationProperty {
        InvalidationProperty::Class(name.to_string())
    }

    #[test]
    fn test_subject_class_invalidates_self() {
        let set = data(".a").invalidation_set_for_properties(&[class("a")]);
        assert!(set.invalidate_self);
        assert!(!set.invalidate_whole_subtree);
        assert!(set.properties.is_empty());
    }

    #[test]
    fn test_ancestor_class_invalidates_matching_descendants() {
        let set = data(".a .b").invalidation_set_for_properties(&[class("a")]);
        assert!(!set.invalidate_self);
        assert!(set.properties.contains(&class("b")));
        assert!(!set.invalidate_whole_subtree);
    }

    #[test]
    fn test_featureless_subject_invalidates_subtree() {
        let set = data(".a > *").invalidation_set_for_properties(&[class("a")]);
        assert!(set.invalidate_whole_subtree);
    }

    #[test]
    fn test_sibling_combinator_invalidates_siblings() {
        let set = data(".a + .b").invalidation_set_for_properties(&[class("a")]);
        assert!(set.invalidate_siblings);
        assert!(set.properties.contains(&class("b")));
    }

    #[test]
    fn test_structural_pseudo_classes_are_ignored() {
        let data = data("li:first-child, a:hover");
        let hover = InvalidationProperty::PseudoClass(PseudoClassKind::Hover);
        let first = InvalidationProperty::PseudoClass(PseudoClassKind::FirstChild);
        assert!(data.invalidation_set_for_properties(&[hover]).invalidate_self);
        assert!(!data.invalidation_set_for_properties(&[first]).needs_invalidation());
    }

    #[test]
    fn test_class_attribute_change_reports_only_toggled_classes() {
        let properties = InvalidationProperty::for_attribute_change("class", Some("a b"), Some("b c"));
        assert!(properties.contains(&class("a")));
        assert!(properties.contains(&class("c")));
        assert!(!properties.contains(&class("b")));
        assert!(properties.contains(&InvalidationProperty::Attribute("class".into())));
    }
}
