//! The cascade.
//!
//! [CSS Cascading and Inheritance Level 5 § 6](https://www.w3.org/TR/css-cascade-5/#cascading)
//!
//! "The cascade takes an unordered list of declared values for a given
//! property on a given element, sorts them by their declaration's
//! precedence as determined below, and outputs a single cascaded value."
//!
//! Declarations are applied from lowest to highest precedence, so a later
//! write always wins. Every write is kept on a per-property stack tagged
//! with its origin and layer, which is what `revert` and `revert-layer`
//! unwind.

use std::cmp::Ordering;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use wombat_css::property::PropertyId;
use wombat_css::selector::PseudoElement;
use wombat_css::stylesheet::{Declaration, DeclarationBlock};
use wombat_css::syntax::ComponentValue;
use wombat_css::value::{Easing, StyleValue, Time, UnresolvedValue};
use wombat_css::{Keyword, LogicalAliasMappingContext};
use wombat_dom::NodeId;

use crate::rule_cache::MatchingRule;
use crate::rule_store::CascadeOrigin;

/// [§ 6.4 Cascade Layers](https://www.w3.org/TR/css-cascade-5/#layering)
///
/// The layer a cascaded value came from. Scoped sheets get their own
/// layers even when the names coincide with document layers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CascadeLayer {
    /// [§ 6.2.1 Presentational hints](https://www.w3.org/TR/css-cascade-5/#preshint)
    ///
    /// "For the purpose of cascading this author presentational hint origin
    /// is treated as an independent origin; however for the purpose of the
    /// revert keyword (but not for the revert-layer keyword) it is
    /// considered part of the author origin."
    PresentationalHints,
    /// A named layer of the document or of a shadow root.
    Named(Option<NodeId>, Arc<str>),
    /// The implicit outer layer, including the style attribute.
    Unlayered(Option<NodeId>),
}

/// A shorthand whose value contains `var()`; its longhands hold
/// [`StyleValue::PendingSubstitution`] until it is substituted.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingShorthand {
    /// The shorthand as declared.
    pub shorthand: PropertyId,
    /// Its raw value.
    pub value: UnresolvedValue,
}

/// One write into [`CascadedProperties`].
#[derive(Debug, Clone, PartialEq)]
pub struct CascadedValue {
    /// The declared value, after shorthand expansion.
    pub value: StyleValue,
    /// Origin of the declaration.
    pub origin: CascadeOrigin,
    /// Layer of the declaration.
    pub layer: CascadeLayer,
    /// Whether it was `!important`.
    pub important: bool,
    /// The logical property that was declared, when this physical property
    /// was reached through flow-relative mapping.
    pub logical_alias: Option<PropertyId>,
    /// The shorthand to substitute when `value` is pending.
    pub pending: Option<Arc<PendingShorthand>>,
}

/// Cascaded values of one element, keyed by physical longhand.
#[derive(Debug, Clone, Default)]
pub struct CascadedProperties {
    properties: FxHashMap<PropertyId, Vec<CascadedValue>>,
}

impl CascadedProperties {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value that outranks everything recorded so far.
    pub fn set(&mut self, property: PropertyId, value: CascadedValue) {
        debug_assert!(property.is_physical_longhand(), "{property} is not a physical longhand");
        self.properties.entry(property).or_default().push(value);
    }

    /// [§ 7.3.3 revert](https://www.w3.org/TR/css-cascade-5/#default)
    ///
    /// "Rolls back the cascaded value to the ... previous cascade origin".
    /// Drops every value from `origin` and from origins that outrank it.
    pub fn revert(&mut self, property: PropertyId, origin: CascadeOrigin) {
        self.retain(property, |entry| entry.origin < origin);
    }

    /// [§ 7.3.4 revert-layer](https://www.w3.org/TR/css-cascade-5/#revert-layer)
    ///
    /// Drops the values of one layer. Origins without layers behave as if
    /// `revert` had been specified.
    pub fn revert_layer(&mut self, property: PropertyId, origin: CascadeOrigin, layer: &CascadeLayer) {
        if origin != CascadeOrigin::Author {
            self.revert(property, origin);
            return;
        }
        self.retain(property, |entry| entry.origin != origin || entry.layer != *layer);
    }

    fn retain(&mut self, property: PropertyId, keep: impl Fn(&CascadedValue) -> bool) {
        if let Some(entries) = self.properties.get_mut(&property) {
            entries.retain(keep);
            if entries.is_empty() {
                let _ = self.properties.remove(&property);
            }
        }
    }

    /// The winning entry.
    #[must_use]
    pub fn get(&self, property: PropertyId) -> Option<&CascadedValue> {
        self.properties.get(&property).and_then(|entries| entries.last())
    }

    /// The winning value.
    #[must_use]
    pub fn value(&self, property: PropertyId) -> Option<&StyleValue> {
        self.get(property).map(|entry| &entry.value)
    }

    /// Winning entries, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (PropertyId, &CascadedValue)> {
        self.properties
            .iter()
            .filter_map(|(property, entries)| Some((*property, entries.last()?)))
    }

    /// Number of properties with a cascaded value.
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether nothing was cascaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Custom properties after the cascade, still unsubstituted.
pub type CascadedCustomProperties = FxHashMap<String, Vec<ComponentValue>>;

/// Rules that matched an element, split by origin.
#[derive(Debug, Default)]
pub struct MatchedRules<'a> {
    /// User-agent rules.
    pub user_agent: Vec<&'a MatchingRule>,
    /// User rules.
    pub user: Vec<&'a MatchingRule>,
    /// Author rules from the document and from shadow roots.
    pub author: Vec<&'a MatchingRule>,
}

/// [§ 6.4.4 Specificity](https://www.w3.org/TR/css-cascade-5/#cascade-specificity)
/// and [§ 6.4.5 Order of Appearance](https://www.w3.org/TR/css-cascade-5/#cascade-order)
fn cascade_order(a: &MatchingRule, b: &MatchingRule) -> Ordering {
    a.specificity
        .cmp(&b.specificity)
        .then(a.sheet_index.cmp(&b.sheet_index))
        .then(a.rule_index.cmp(&b.rule_index))
        .then(a.selector_index.cmp(&b.selector_index))
}

/// Sort ascending by precedence. When several selectors of one rule
/// match, only the most specific is kept so the block applies once.
pub fn sort_matching_rules(rules: &mut Vec<&MatchingRule>) {
    rules.sort_by(|a, b| {
        (a.scope, a.sheet_index, a.rule_index)
            .cmp(&(b.scope, b.sheet_index, b.rule_index))
            .then(b.specificity.cmp(&a.specificity))
    });
    rules.dedup_by(|later, earlier| {
        later.scope == earlier.scope
            && later.sheet_index == earlier.sheet_index
            && later.rule_index == earlier.rule_index
            && Arc::ptr_eq(&later.declarations, &earlier.declarations)
    });
    rules.sort_by(|a, b| cascade_order(a, b));
}

impl<'a> MatchedRules<'a> {
    /// Put every origin in cascade order.
    pub fn sort(&mut self) {
        sort_matching_rules(&mut self.user_agent);
        sort_matching_rules(&mut self.user);
        sort_matching_rules(&mut self.author);
    }

    /// Whether no rule matched at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.user_agent.is_empty() && self.user.is_empty() && self.author.is_empty()
    }

    /// [§ 6.1 Cascade Sorting Order](https://www.w3.org/TR/css-cascade-5/#cascade-sort)
    ///
    /// Author rules grouped by context and layer, lowest normal precedence
    /// first: shadow trees before the document ("when comparing two
    /// declarations that have different tree contexts ... for normal rules
    /// the declaration earlier in the shadow-including tree order wins"),
    /// and within a context layers in order with unlayered rules last.
    fn author_groups(&self) -> Vec<(CascadeLayer, Vec<&'a MatchingRule>)> {
        let mut groups: Vec<((bool, usize), CascadeLayer, Vec<&'a MatchingRule>)> = Vec::new();
        for &rule in &self.author {
            let key = (rule.scope.is_none(), rule.layer.as_ref().map_or(usize::MAX, |_| rule.layer_rank));
            let layer = match &rule.layer {
                Some(name) => CascadeLayer::Named(rule.scope, Arc::clone(name)),
                None => CascadeLayer::Unlayered(rule.scope),
            };
            match groups.iter_mut().find(|(existing, group_layer, _)| *existing == key && *group_layer == layer) {
                Some((_, _, rules)) => rules.push(rule),
                None => groups.push((key, layer, vec![rule])),
            }
        }
        groups.sort_by_key(|(key, _, _)| *key);
        groups.into_iter().map(|(_, layer, rules)| (layer, rules)).collect()
    }
}

/// Everything that declares values for one element.
#[derive(Debug, Clone, Copy)]
pub struct CascadeSources<'a> {
    /// Sorted matched rules.
    pub rules: &'a MatchedRules<'a>,
    /// Declarations derived from presentational attributes.
    pub presentational_hints: Option<&'a DeclarationBlock>,
    /// The parsed `style` attribute.
    pub inline_style: Option<&'a DeclarationBlock>,
    /// Pseudo-element being cascaded.
    pub pseudo_element: Option<PseudoElement>,
    /// Shadow root of the tree the element lives in, `None` in the
    /// document. The style attribute belongs to this context.
    pub scope: Option<NodeId>,
}

/// Shorthands whose value is a positional list of one to four box edges.
fn is_edge_shorthand(property: PropertyId) -> bool {
    matches!(
        property,
        PropertyId::Margin
            | PropertyId::Padding
            | PropertyId::Inset
            | PropertyId::BorderWidth
            | PropertyId::BorderStyle
            | PropertyId::BorderColor
    )
}

/// Shorthands whose value is a positional list of one or two items.
fn is_pair_shorthand(property: PropertyId) -> bool {
    matches!(
        property,
        PropertyId::MarginBlock
            | PropertyId::MarginInline
            | PropertyId::PaddingBlock
            | PropertyId::PaddingInline
            | PropertyId::InsetBlock
            | PropertyId::InsetInline
            | PropertyId::BorderBlockWidth
            | PropertyId::BorderInlineWidth
            | PropertyId::BorderBlockStyle
            | PropertyId::BorderInlineStyle
            | PropertyId::BorderBlockColor
            | PropertyId::BorderInlineColor
            | PropertyId::Overflow
            | PropertyId::Gap
    )
}

/// [§ 2 Shorthand Properties](https://www.w3.org/TR/css-cascade-5/#shorthand)
///
/// Call `set` once per longhand (physical or logical) that a declaration
/// of `property` assigns.
pub fn for_each_property_expanding_shorthands(
    property: PropertyId,
    value: &StyleValue,
    set: &mut dyn FnMut(PropertyId, StyleValue),
) {
    if !property.is_shorthand() {
        set(property, value.clone());
        return;
    }

    // [CSS Values 5 § 3.2](https://drafts.csswg.org/css-values-5/#pending-substitution-value)
    // "the longhand properties it's associated with must instead be filled
    // in with a special, unobservable-to-authors pending-substitution value"
    if matches!(value, StyleValue::Unresolved(_) | StyleValue::PendingSubstitution(_)) {
        let shorthand = match value {
            StyleValue::PendingSubstitution(shorthand) => *shorthand,
            _ => property,
        };
        for longhand in property.longhands() {
            for_each_property_expanding_shorthands(*longhand, &StyleValue::PendingSubstitution(shorthand), set);
        }
        return;
    }

    if let StyleValue::Shorthand(shorthand) = value {
        for (sub_property, sub_value) in shorthand.sub_properties.iter().zip(&shorthand.values) {
            for_each_property_expanding_shorthands(*sub_property, sub_value, set);
        }
        return;
    }

    if value.is_css_wide_keyword() || matches!(value, StyleValue::GuaranteedInvalid) {
        for longhand in property.longhands() {
            for_each_property_expanding_shorthands(*longhand, value, set);
        }
        return;
    }

    let longhands = property.longhands();
    if is_edge_shorthand(property) && longhands.len() == 4 {
        let [top, right, bottom, left] = [longhands[0], longhands[1], longhands[2], longhands[3]];
        let items = value.as_slice();
        let (t, r, b, l) = match items {
            [all] => (all, all, all, all),
            [vertical, horizontal] => (vertical, horizontal, vertical, horizontal),
            [t, horizontal, b] => (t, horizontal, b, horizontal),
            [t, r, b, l] => (t, r, b, l),
            _ => return,
        };
        for (longhand, item) in [(top, t), (right, r), (bottom, b), (left, l)] {
            for_each_property_expanding_shorthands(longhand, item, set);
        }
        return;
    }

    if is_pair_shorthand(property) && longhands.len() == 2 {
        let (start, end) = match value.as_slice() {
            [both] => (both, both),
            [start, end] => (start, end),
            _ => return,
        };
        for_each_property_expanding_shorthands(longhands[0], start, set);
        for_each_property_expanding_shorthands(longhands[1], end, set);
        return;
    }

    // [CSS Transitions § 2.5](https://www.w3.org/TR/css-transitions-1/#transition-shorthand-property)
    if property == PropertyId::Transition && value.is_keyword(Keyword::None) {
        set(PropertyId::TransitionProperty, StyleValue::Keyword(Keyword::All));
        set(PropertyId::TransitionDuration, StyleValue::Time(Time::ZERO));
        set(PropertyId::TransitionTimingFunction, StyleValue::Easing(Easing::EASE));
        set(PropertyId::TransitionDelay, StyleValue::Time(Time::ZERO));
        set(PropertyId::TransitionBehavior, StyleValue::Keyword(Keyword::Normal));
        return;
    }

    // Single-longhand shorthands may hold the longhand's value directly.
    if let [only] = longhands {
        for_each_property_expanding_shorthands(*only, value, set);
        return;
    }

    log::debug!(target: "wombat::style", "cannot expand {property} value {value:?}");
}

/// Which properties to cascade; empty means all.
fn wanted(only: &[PropertyId], property: PropertyId) -> bool {
    only.is_empty() || only.contains(&property)
}

/// One declaration block at one cascade level.
struct CascadeStep<'a> {
    block: &'a DeclarationBlock,
    origin: CascadeOrigin,
    layer: CascadeLayer,
    important: bool,
}

fn push_rules<'a>(
    steps: &mut Vec<CascadeStep<'a>>,
    group: &[&'a MatchingRule],
    origin: CascadeOrigin,
    layer: &CascadeLayer,
    important: bool,
) {
    steps.extend(group.iter().map(|rule| CascadeStep {
        block: &rule.declarations,
        origin,
        layer: layer.clone(),
        important,
    }));
}

/// [§ 6.1 Cascade Sorting Order](https://www.w3.org/TR/css-cascade-5/#cascade-sort)
///
/// Every block that applies to an element, lowest precedence first:
///
/// 1. normal user agent, then normal user declarations
/// 2. author presentational hints
/// 3. normal author declarations, layers in order with unlayered rules
///    last, then the style attribute
/// 4. important author declarations: unlayered first, then the style
///    attribute, then layers in reverse order
/// 5. important user, then important user agent declarations
fn cascade_steps<'a>(sources: &CascadeSources<'a>) -> Vec<CascadeStep<'a>> {
    let rules = sources.rules;
    let outer = CascadeLayer::Unlayered(None);
    let element_attached = sources.pseudo_element.is_none();
    let inline = sources.inline_style.filter(|_| element_attached);
    let author_groups = rules.author_groups();
    let mut steps = Vec::new();
    push_rules(&mut steps, &rules.user_agent, CascadeOrigin::UserAgent, &outer, false);
    push_rules(&mut steps, &rules.user, CascadeOrigin::User, &outer, false);
    if let Some(hints) = sources.presentational_hints.filter(|_| element_attached) {
        steps.push(CascadeStep {
            block: hints,
            origin: CascadeOrigin::Author,
            layer: CascadeLayer::PresentationalHints,
            important: false,
        });
    }
    for (layer, group) in &author_groups {
        push_rules(&mut steps, group, CascadeOrigin::Author, layer, false);
    }
    let scope = sources.scope;
    let inline_step = |important| {
        inline.map(|block| CascadeStep {
            block,
            origin: CascadeOrigin::Author,
            layer: CascadeLayer::Unlayered(scope),
            important,
        })
    };
    steps.extend(inline_step(false));

    // Important inline declarations sit above the unlayered important rules
    // of their own context, below its layers and any later context.
    let outranks_inline = |layer: &CascadeLayer| match layer {
        CascadeLayer::Named(context, _) => *context == scope || (scope.is_none() && context.is_some()),
        CascadeLayer::Unlayered(context) => scope.is_none() && context.is_some(),
        CascadeLayer::PresentationalHints => false,
    };
    let mut inline_important = inline_step(true);
    for (layer, group) in author_groups.iter().rev() {
        if outranks_inline(layer) {
            steps.extend(inline_important.take());
        }
        push_rules(&mut steps, group, CascadeOrigin::Author, layer, true);
    }
    steps.extend(inline_important);

    push_rules(&mut steps, &rules.user, CascadeOrigin::User, &outer, true);
    push_rules(&mut steps, &rules.user_agent, CascadeOrigin::UserAgent, &outer, true);
    steps
}

fn apply_declaration(
    cascaded: &mut CascadedProperties,
    declaration: &Declaration,
    step: &CascadeStep<'_>,
    logical: Option<LogicalAliasMappingContext>,
    only: &[PropertyId],
) {
    // [CSS Values 5 § 3.3](https://drafts.csswg.org/css-values-5/#invalid-at-computed-value-time)
    // "as if the property's value had been specified as the unset keyword"
    let value = if matches!(declaration.value, StyleValue::GuaranteedInvalid) {
        StyleValue::Unset
    } else {
        declaration.value.clone()
    };
    let pending = match &value {
        StyleValue::Unresolved(unresolved) if declaration.property.is_shorthand() => Some(Arc::new(PendingShorthand {
            shorthand: declaration.property,
            value: unresolved.clone(),
        })),
        _ => None,
    };

    for_each_property_expanding_shorthands(declaration.property, &value, &mut |longhand, longhand_value| {
        let (physical, logical_alias) = if longhand.is_logical_alias() {
            let Some(context) = logical else {
                return;
            };
            (longhand.map_logical_alias(context), Some(longhand))
        } else {
            (longhand, None)
        };
        if !wanted(only, physical) {
            return;
        }
        match longhand_value {
            StyleValue::Revert => cascaded.revert(physical, step.origin),
            StyleValue::RevertLayer => cascaded.revert_layer(physical, step.origin, &step.layer),
            longhand_value => {
                let pending = if matches!(longhand_value, StyleValue::PendingSubstitution(_)) {
                    pending.clone()
                } else {
                    None
                };
                cascaded.set(
                    physical,
                    CascadedValue {
                        value: longhand_value,
                        origin: step.origin,
                        layer: step.layer.clone(),
                        important: step.important,
                        logical_alias,
                        pending,
                    },
                );
            }
        }
    });
}

/// Cascade every declaration that applies to an element. Logical aliases
/// are skipped when `logical` is `None`, which is how the writing-mode and
/// direction pre-pass runs. With `only` non-empty, other physical
/// properties are ignored.
#[must_use]
pub fn cascade_declarations(
    sources: &CascadeSources<'_>,
    logical: Option<LogicalAliasMappingContext>,
    only: &[PropertyId],
) -> CascadedProperties {
    let mut cascaded = CascadedProperties::new();
    for step in cascade_steps(sources) {
        for declaration in step.block.declarations.iter().filter(|d| d.important == step.important) {
            apply_declaration(&mut cascaded, declaration, &step, logical, only);
        }
    }
    cascaded
}

/// [CSS Variables § 2](https://www.w3.org/TR/css-variables-1/#defining-variables)
///
/// Custom properties cascade like any other property but are never
/// expanded or mapped. A lone `revert` or `revert-layer` rolls the
/// property back exactly as it does for longhands.
#[must_use]
pub fn cascade_custom_properties(sources: &CascadeSources<'_>) -> CascadedCustomProperties {
    let mut stacks: FxHashMap<&str, Vec<(CascadeOrigin, CascadeLayer, &[ComponentValue])>> = FxHashMap::default();
    for step in cascade_steps(sources) {
        let block = step.block;
        for declaration in block.custom_properties.iter().filter(|d| d.important == step.important) {
            let stack = stacks.entry(declaration.name.as_str()).or_default();
            let keyword = match declaration.value.as_slice() {
                [single] => single.as_ident(),
                _ => None,
            };
            match keyword {
                Some(ident) if ident.eq_ignore_ascii_case("revert") => {
                    stack.retain(|(origin, _, _)| *origin < step.origin);
                }
                Some(ident) if ident.eq_ignore_ascii_case("revert-layer") => {
                    if step.origin == CascadeOrigin::Author {
                        stack.retain(|(origin, layer, _)| *origin != step.origin || *layer != step.layer);
                    } else {
                        stack.retain(|(origin, _, _)| *origin < step.origin);
                    }
                }
                _ => stack.push((step.origin, step.layer.clone(), declaration.value.as_slice())),
            }
        }
    }
    stacks
        .into_iter()
        .filter_map(|(name, stack)| {
            let (_, _, value) = stack.last()?;
            Some((name.to_string(), value.to_vec()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use wombat_css::parse_component_values;
    use wombat_css::parse_css_value;

    use super::*;

    fn expand(property: PropertyId, css: &str) -> Vec<(PropertyId, StyleValue)> {
        let value = parse_css_value(property, &parse_component_values(css)).expect("valid value");
        let mut out = Vec::new();
        for_each_property_expanding_shorthands(property, &value, &mut |longhand, value| out.push((longhand, value)));
        out
    }

    fn entry(value: StyleValue, origin: CascadeOrigin, layer: CascadeLayer) -> CascadedValue {
        CascadedValue {
            value,
            origin,
            layer,
            important: false,
            logical_alias: None,
            pending: None,
        }
    }

    #[test]
    fn test_edge_shorthand_three_values() {
        let longhands = expand(PropertyId::Margin, "1px 2px 3px");
        assert_eq!(
            longhands,
            vec![
                (PropertyId::MarginTop, StyleValue::px(1.0)),
                (PropertyId::MarginRight, StyleValue::px(2.0)),
                (PropertyId::MarginBottom, StyleValue::px(3.0)),
                (PropertyId::MarginLeft, StyleValue::px(2.0)),
            ]
        );
    }

    #[test]
    fn test_pair_shorthand_single_value() {
        let longhands = expand(PropertyId::MarginInline, "4px");
        assert_eq!(
            longhands,
            vec![
                (PropertyId::MarginInlineStart, StyleValue::px(4.0)),
                (PropertyId::MarginInlineEnd, StyleValue::px(4.0)),
            ]
        );
    }

    #[test]
    fn test_border_expands_to_twelve_longhands() {
        let longhands = expand(PropertyId::Border, "2px solid red");
        assert_eq!(longhands.len(), 12);
        assert!(longhands.contains(&(PropertyId::BorderLeftStyle, StyleValue::Keyword(Keyword::Solid))));
    }

    #[test]
    fn test_transition_none() {
        let longhands = expand(PropertyId::Transition, "none");
        assert_eq!(longhands[0], (PropertyId::TransitionProperty, StyleValue::Keyword(Keyword::All)));
        assert_eq!(longhands[1], (PropertyId::TransitionDuration, StyleValue::Time(Time::ZERO)));
        assert_eq!(longhands.len(), 5);
    }

    #[test]
    fn test_css_wide_keyword_reaches_nested_longhands() {
        let longhands = expand(PropertyId::Border, "inherit");
        assert_eq!(longhands.len(), 12);
        assert!(longhands.iter().all(|(_, value)| *value == StyleValue::Inherit));
    }

    #[test]
    fn test_unresolved_shorthand_marks_longhands_pending() {
        let longhands = expand(PropertyId::Padding, "var(--gap) 1px");
        assert_eq!(longhands.len(), 4);
        assert!(
            longhands
                .iter()
                .all(|(_, value)| *value == StyleValue::PendingSubstitution(PropertyId::Padding))
        );
    }

    #[test]
    fn test_revert_drops_origin_and_above() {
        let mut cascaded = CascadedProperties::new();
        let color = PropertyId::Color;
        let outer = CascadeLayer::Unlayered(None);
        cascaded.set(color, entry(StyleValue::Integer(1), CascadeOrigin::UserAgent, outer.clone()));
        cascaded.set(color, entry(StyleValue::Integer(2), CascadeOrigin::User, outer.clone()));
        cascaded.set(color, entry(StyleValue::Integer(3), CascadeOrigin::Author, CascadeLayer::PresentationalHints));
        cascaded.revert(color, CascadeOrigin::Author);
        assert_eq!(cascaded.value(color), Some(&StyleValue::Integer(2)));
        cascaded.revert(color, CascadeOrigin::User);
        assert_eq!(cascaded.value(color), Some(&StyleValue::Integer(1)));
        cascaded.revert(color, CascadeOrigin::UserAgent);
        assert!(cascaded.is_empty());
    }

    #[test]
    fn test_revert_layer_keeps_presentational_hints() {
        let mut cascaded = CascadedProperties::new();
        let width = PropertyId::Width;
        let outer = CascadeLayer::Unlayered(None);
        cascaded.set(width, entry(StyleValue::px(1.0), CascadeOrigin::Author, CascadeLayer::PresentationalHints));
        cascaded.set(width, entry(StyleValue::px(2.0), CascadeOrigin::Author, outer.clone()));
        cascaded.revert_layer(width, CascadeOrigin::Author, &outer);
        assert_eq!(cascaded.value(width), Some(&StyleValue::px(1.0)));
    }
}
