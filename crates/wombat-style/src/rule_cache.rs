//! Per-origin rule index.
//!
//! Matching every rule against every element is quadratic, so rules are
//! bucketed by the most selective feature of their subject compound: id,
//! then class, then tag, then attribute. An element only looks at the
//! buckets for features it has, plus the rules with no usable key.
//! Pseudo-element rules live in their own table so they are never tried
//! for ordinary elements.
//!
//! Building the cache also flattens cascade layers, evaluates `@media`
//! and `@supports`, indexes `@keyframes` by name and collects `@font-face`
//! rules, so it is the only place that walks a stylesheet's rule tree.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use wombat_css::media::MediaEnvironment;
use wombat_css::selector::{
    Combinator, CompoundSelector, PseudoClass, PseudoClassBitmap, PseudoClassKind, PseudoElement, Selector,
    SimpleSelector, pseudo_class_arguments,
};
use wombat_css::stylesheet::{CssRule, DeclarationBlock, FontFaceRule, KeyframesRule};
use wombat_css::{Specificity, Stylesheet};
use wombat_dom::{ElementData, NodeId};

use crate::bloom::{FeatureKind, feature_hash};
use crate::rule_store::{CascadeOrigin, SheetEntry};

/// Hashes kept per selector for the ancestor filter.
const MAX_ANCESTOR_HASHES: usize = 4;

/// One selector of one style rule, ready for matching.
#[derive(Debug)]
pub struct MatchingRule {
    /// Declarations of the rule; shared by all selectors of the rule.
    pub declarations: Arc<DeclarationBlock>,
    /// The selector, with nesting already resolved.
    pub selector: Selector,
    /// The sheet the rule comes from.
    pub sheet: Arc<Stylesheet>,
    /// Cascade origin.
    pub origin: CascadeOrigin,
    /// Order of the sheet within the cascade.
    pub sheet_index: usize,
    /// Order of the rule within its sheet.
    pub rule_index: usize,
    /// Position of the selector within its rule's selector list.
    pub selector_index: usize,
    /// Specificity of [`Self::selector`].
    pub specificity: Specificity,
    /// Qualified cascade layer, `None` when unlayered.
    pub layer: Option<Arc<str>>,
    /// Position of [`Self::layer`] in the flattened layer order.
    pub layer_rank: usize,
    /// Shadow root the rule is scoped to.
    pub scope: Option<NodeId>,
    /// Pseudo-element the selector targets.
    pub pseudo_element: Option<PseudoElement>,
    /// Features that must be present among the element's ancestors.
    pub ancestor_hashes: Vec<u32>,
    /// Whether the selector uses `:has()`.
    pub contains_has: bool,
}

impl MatchingRule {
    /// Whether the sheet's default namespace admits an element.
    #[must_use]
    pub fn namespace_admits(&self, element: &ElementData) -> bool {
        self.sheet
            .default_namespace
            .as_deref()
            .is_none_or(|uri| element.namespace() == Some(uri))
    }
}

/// Bucket a rule is stored in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleBucket {
    /// Keyed by an id.
    Id(String),
    /// Keyed by a class name.
    Class(String),
    /// Keyed by an ASCII-lowercased local name.
    Tag(String),
    /// Subject contains `:root`.
    Root,
    /// Keyed by an ASCII-lowercased attribute name.
    Attribute(String),
    /// No usable key.
    Other,
}

impl RuleBucket {
    const fn rank(&self) -> u8 {
        match self {
            Self::Id(_) => 5,
            Self::Class(_) => 4,
            Self::Tag(_) => 3,
            Self::Root => 2,
            Self::Attribute(_) => 1,
            Self::Other => 0,
        }
    }
}

/// Features that occur inside `:has()` arguments. A DOM change that
/// touches one of these may change which elements `:has()` matches.
#[derive(Debug, Default, Clone)]
pub struct HasSelectorMetadata {
    /// Whether any selector uses `:has()` at all.
    pub present: bool,
    /// Ids mentioned inside `:has()`.
    pub ids: FxHashSet<String>,
    /// Class names mentioned inside `:has()`.
    pub classes: FxHashSet<String>,
    /// Attribute names (lowercased) mentioned inside `:has()`.
    pub attributes: FxHashSet<String>,
    /// Local names (lowercased) mentioned inside `:has()`.
    pub tags: FxHashSet<String>,
    /// Pseudo-classes mentioned inside `:has()`.
    pub pseudo_classes: PseudoClassBitmap,
}

/// Index over the rules of one origin within one tree scope.
#[derive(Debug, Default)]
pub struct RuleCache {
    by_id: FxHashMap<String, Vec<MatchingRule>>,
    by_class: FxHashMap<String, Vec<MatchingRule>>,
    by_tag: FxHashMap<String, Vec<MatchingRule>>,
    by_attribute: FxHashMap<String, Vec<MatchingRule>>,
    root_rules: Vec<MatchingRule>,
    other_rules: Vec<MatchingRule>,
    pseudo_element_rules: FxHashMap<PseudoElement, Vec<MatchingRule>>,
    keyframes: FxHashMap<String, Arc<KeyframesRule>>,
    font_faces: Vec<FontFaceRule>,
    layer_order: Vec<String>,
    has_metadata: HasSelectorMetadata,
    pseudo_class_index: PseudoClassBitmap,
    rule_count: usize,
    quirks_mode: bool,
}

/// [CSS Cascade 5 § 6.4.3 Layer Ordering](https://www.w3.org/TR/css-cascade-5/#layer-ordering)
///
/// Layers in first-declaration order, nested by qualified name.
#[derive(Debug, Default)]
struct LayerTree {
    children: Vec<(String, LayerTree)>,
}

impl LayerTree {
    fn declare(&mut self, qualified: &str) {
        let mut node = self;
        for part in qualified.split('.') {
            let index = match node.children.iter().position(|(name, _)| name == part) {
                Some(index) => index,
                None => {
                    node.children.push((part.to_string(), Self::default()));
                    node.children.len() - 1
                }
            };
            node = &mut node.children[index].1;
        }
    }

    /// "the rules of a layer's sub-layers come before the layer's own
    /// rules": post-order.
    fn flatten(&self, prefix: &str, out: &mut Vec<String>) {
        for (name, child) in &self.children {
            let qualified = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}.{name}")
            };
            child.flatten(&qualified, out);
            out.push(qualified);
        }
    }
}

/// Rules gathered before layer ranks are known.
struct Builder<'a> {
    media: &'a MediaEnvironment,
    layers: LayerTree,
    rules: Vec<MatchingRule>,
    keyframes: FxHashMap<String, Arc<KeyframesRule>>,
    font_faces: Vec<FontFaceRule>,
}

impl Builder<'_> {
    fn collect(&mut self, rules: &[CssRule], entry: &SheetEntry) {
        for rule in rules {
            match rule {
                CssRule::Style(style) => {
                    let declarations = Arc::new(style.declarations.clone());
                    self.add_selectors(&style.absolutized_selectors, &declarations, style.layer.as_deref(), style.index, entry);
                    self.collect(&style.child_rules, entry);
                }
                // [CSS Nesting § 3.4](https://drafts.csswg.org/css-nesting-1/#nested-declarations-rule)
                // "matches the same elements as its parent style rule, with the
                // same specificity behavior as the :is() pseudo-class"
                CssRule::NestedDeclarations(nested) => {
                    let selector = Selector::from_compound(CompoundSelector {
                        simple_selectors: vec![SimpleSelector::PseudoClass(PseudoClass::Is(
                            nested.parent_selectors.clone(),
                        ))],
                    });
                    let declarations = Arc::new(nested.declarations.clone());
                    self.add_selectors(&[selector], &declarations, nested.layer.as_deref(), nested.index, entry);
                }
                CssRule::LayerBlock(block) => {
                    self.layers.declare(&block.name);
                    self.collect(&block.rules, entry);
                }
                CssRule::LayerStatement(statement) => {
                    for name in &statement.names {
                        self.layers.declare(name);
                    }
                }
                CssRule::Import(import) => {
                    if let Some(layer) = &import.layer {
                        self.layers.declare(layer);
                    }
                }
                CssRule::Media(media) => {
                    if media.queries.matches(self.media) {
                        self.collect(&media.rules, entry);
                    }
                }
                CssRule::Supports(supports) => {
                    if supports.matches {
                        self.collect(&supports.rules, entry);
                    }
                }
                CssRule::FontFace(face) => self.font_faces.push(face.clone()),
                CssRule::Keyframes(keyframes) => {
                    if let Some(layer) = &keyframes.layer {
                        self.layers.declare(layer);
                    }
                    let _ = self
                        .keyframes
                        .insert(keyframes.name.clone(), Arc::new(keyframes.clone()));
                }
                CssRule::Namespace(_) => {}
            }
        }
    }

    fn add_selectors(
        &mut self,
        selectors: &[Selector],
        declarations: &Arc<DeclarationBlock>,
        layer: Option<&str>,
        rule_index: usize,
        entry: &SheetEntry,
    ) {
        if let Some(layer) = layer {
            self.layers.declare(layer);
        }
        let layer: Option<Arc<str>> = layer.map(Arc::from);
        for (selector_index, selector) in selectors.iter().enumerate() {
            self.rules.push(MatchingRule {
                declarations: Arc::clone(declarations),
                selector: selector.clone(),
                sheet: Arc::clone(&entry.sheet),
                origin: entry.origin,
                sheet_index: entry.index,
                rule_index,
                selector_index,
                specificity: selector.specificity(),
                layer: layer.clone(),
                layer_rank: 0,
                scope: entry.scope,
                pseudo_element: selector.pseudo_element(),
                ancestor_hashes: ancestor_hashes(selector),
                contains_has: selector_contains_has(selector),
            });
        }
    }
}

/// `:is(X)` or `:where(X)` where X is a single simple selector.
fn unwrap_single_argument(simple: &SimpleSelector) -> Option<&SimpleSelector> {
    let SimpleSelector::PseudoClass(PseudoClass::Is(list) | PseudoClass::Where(list)) = simple else {
        return None;
    };
    match list.as_slice() {
        [only] if only.combinators.is_empty() => match only.subject.simple_selectors.as_slice() {
            [single] => Some(single),
            _ => None,
        },
        _ => None,
    }
}

/// The bucket for a subject compound.
#[must_use]
pub fn bucket_for_compound(compound: &CompoundSelector, quirks_mode: bool) -> RuleBucket {
    let fold = |name: &str| {
        if quirks_mode {
            name.to_ascii_lowercase()
        } else {
            name.to_string()
        }
    };
    let mut best = RuleBucket::Other;
    let candidates = compound
        .simple_selectors
        .iter()
        .map(|simple| unwrap_single_argument(simple).unwrap_or(simple));
    for simple in candidates {
        let key = match simple {
            SimpleSelector::Id(id) => RuleBucket::Id(fold(id)),
            SimpleSelector::Class(class) => RuleBucket::Class(fold(class)),
            SimpleSelector::Type { name, .. } => RuleBucket::Tag(name.to_ascii_lowercase()),
            SimpleSelector::Attribute(attribute) => RuleBucket::Attribute(attribute.name.to_ascii_lowercase()),
            SimpleSelector::PseudoClass(PseudoClass::Simple(PseudoClassKind::Root)) => RuleBucket::Root,
            _ => continue,
        };
        if key.rank() > best.rank() {
            best = key;
        }
    }
    best
}

/// Hashes of the id, class, tag and attribute features of every compound
/// that has to match an ancestor of the subject.
fn ancestor_hashes(selector: &Selector) -> Vec<u32> {
    let mut hashes = Vec::new();
    let mut reached_ancestors = false;
    for (combinator, compound) in &selector.combinators {
        if matches!(combinator, Combinator::Descendant | Combinator::Child) {
            reached_ancestors = true;
        }
        if !reached_ancestors {
            continue;
        }
        for simple in &compound.simple_selectors {
            let hash = match simple {
                SimpleSelector::Id(id) => feature_hash(FeatureKind::Id, id),
                SimpleSelector::Class(class) => feature_hash(FeatureKind::Class, class),
                SimpleSelector::Type { name, .. } => feature_hash(FeatureKind::Tag, name),
                SimpleSelector::Attribute(attribute) => feature_hash(FeatureKind::Attribute, &attribute.name),
                _ => continue,
            };
            hashes.push(hash);
            if hashes.len() == MAX_ANCESTOR_HASHES {
                return hashes;
            }
        }
    }
    hashes
}

fn selector_contains_has(selector: &Selector) -> bool {
    selector
        .compounds()
        .flat_map(|compound| &compound.simple_selectors)
        .any(|simple| match simple {
            SimpleSelector::PseudoClass(PseudoClass::Has(_)) => true,
            SimpleSelector::PseudoClass(pseudo) => pseudo_class_arguments(pseudo)
                .into_iter()
                .flatten()
                .any(selector_contains_has),
            _ => false,
        })
}

fn visit_features(
    selector: &Selector,
    inside_has: bool,
    metadata: &mut HasSelectorMetadata,
    pseudo_classes: &mut PseudoClassBitmap,
) {
    for simple in selector.compounds().flat_map(|compound| &compound.simple_selectors) {
        match simple {
            SimpleSelector::Id(id) if inside_has => {
                let _ = metadata.ids.insert(id.clone());
            }
            SimpleSelector::Class(class) if inside_has => {
                let _ = metadata.classes.insert(class.clone());
            }
            SimpleSelector::Attribute(attribute) if inside_has => {
                let _ = metadata.attributes.insert(attribute.name.to_ascii_lowercase());
            }
            SimpleSelector::Type { name, .. } if inside_has => {
                let _ = metadata.tags.insert(name.to_ascii_lowercase());
            }
            SimpleSelector::PseudoClass(pseudo) => {
                pseudo_classes.insert(pseudo.kind());
                if inside_has {
                    metadata.pseudo_classes.insert(pseudo.kind());
                }
                let nested_has = inside_has || matches!(pseudo, PseudoClass::Has(_));
                if matches!(pseudo, PseudoClass::Has(_)) {
                    metadata.present = true;
                }
                for list in pseudo_class_arguments(pseudo) {
                    for argument in list {
                        visit_features(argument, nested_has, metadata, pseudo_classes);
                    }
                }
            }
            _ => {}
        }
    }
}

impl RuleCache {
    /// Index the given sheets. They must all share one origin and scope,
    /// and come in cascade order.
    #[must_use]
    pub fn build(entries: &[SheetEntry], media: &MediaEnvironment, quirks_mode: bool) -> Self {
        let mut builder = Builder {
            media,
            layers: LayerTree::default(),
            rules: Vec::new(),
            keyframes: FxHashMap::default(),
            font_faces: Vec::new(),
        };
        for entry in entries {
            builder.collect(&entry.sheet.rules, entry);
        }

        let mut layer_order = Vec::new();
        builder.layers.flatten("", &mut layer_order);
        let ranks: FxHashMap<&str, usize> = layer_order
            .iter()
            .enumerate()
            .map(|(rank, name)| (name.as_str(), rank))
            .collect();

        let mut cache = Self {
            keyframes: builder.keyframes,
            font_faces: builder.font_faces,
            quirks_mode,
            ..Self::default()
        };
        for mut rule in builder.rules {
            rule.layer_rank = rule
                .layer
                .as_deref()
                .and_then(|layer| ranks.get(layer).copied())
                .unwrap_or(layer_order.len());
            visit_features(&rule.selector, false, &mut cache.has_metadata, &mut cache.pseudo_class_index);
            cache.insert(rule);
        }
        cache.layer_order = layer_order;
        cache
    }

    fn insert(&mut self, rule: MatchingRule) {
        self.rule_count += 1;
        if let Some(pseudo) = rule.pseudo_element {
            self.pseudo_element_rules.entry(pseudo).or_default().push(rule);
            return;
        }
        match bucket_for_compound(&rule.selector.subject, self.quirks_mode) {
            RuleBucket::Id(id) => self.by_id.entry(id).or_default().push(rule),
            RuleBucket::Class(class) => self.by_class.entry(class).or_default().push(rule),
            RuleBucket::Tag(tag) => self.by_tag.entry(tag).or_default().push(rule),
            RuleBucket::Attribute(name) => self.by_attribute.entry(name).or_default().push(rule),
            RuleBucket::Root => self.root_rules.push(rule),
            RuleBucket::Other => self.other_rules.push(rule),
        }
    }

    /// The rules stored in one bucket.
    #[must_use]
    pub fn bucket(&self, bucket: &RuleBucket) -> &[MatchingRule] {
        let rules = match bucket {
            RuleBucket::Id(id) => self.by_id.get(id),
            RuleBucket::Class(class) => self.by_class.get(class),
            RuleBucket::Tag(tag) => self.by_tag.get(tag),
            RuleBucket::Attribute(name) => self.by_attribute.get(name),
            RuleBucket::Root => Some(&self.root_rules),
            RuleBucket::Other => Some(&self.other_rules),
        };
        rules.map_or(&[], Vec::as_slice)
    }

    fn fold(&self, name: &str) -> String {
        if self.quirks_mode {
            name.to_ascii_lowercase()
        } else {
            name.to_string()
        }
    }

    /// Candidate rules for an element or one of its pseudo-elements. Every
    /// rule that could match is returned once; the caller still has to run
    /// the matcher. With `layer` set, only rules of that layer are returned.
    #[must_use]
    pub fn collect_matching_rules(
        &self,
        element: &ElementData,
        is_root: bool,
        pseudo: Option<PseudoElement>,
        layer: Option<&str>,
    ) -> Vec<&MatchingRule> {
        let in_layer = |rule: &&MatchingRule| layer.is_none_or(|name| rule.layer.as_deref() == Some(name));
        if let Some(pseudo) = pseudo {
            return self
                .pseudo_element_rules
                .get(&pseudo)
                .into_iter()
                .flatten()
                .filter(in_layer)
                .collect();
        }

        let mut candidates: Vec<&MatchingRule> = Vec::new();
        if let Some(id) = element.id()
            && let Some(rules) = self.by_id.get(&self.fold(id))
        {
            candidates.extend(rules);
        }
        let mut seen_classes: Vec<String> = Vec::with_capacity(element.classes().len());
        for class in element.classes() {
            let key = self.fold(class);
            if seen_classes.contains(&key) {
                continue;
            }
            if let Some(rules) = self.by_class.get(&key) {
                candidates.extend(rules);
            }
            seen_classes.push(key);
        }
        if let Some(rules) = self.by_tag.get(&element.local_name().to_ascii_lowercase()) {
            candidates.extend(rules);
        }
        let mut seen_attributes: Vec<String> = Vec::with_capacity(element.attributes().len());
        for attribute in element.attributes() {
            let key = attribute.name.to_ascii_lowercase();
            if seen_attributes.contains(&key) {
                continue;
            }
            if let Some(rules) = self.by_attribute.get(&key) {
                candidates.extend(rules);
            }
            seen_attributes.push(key);
        }
        if is_root {
            candidates.extend(&self.root_rules);
        }
        candidates.extend(&self.other_rules);
        candidates.retain(in_layer);
        candidates
    }

    /// Every rule, in no particular order.
    pub fn rules(&self) -> impl Iterator<Item = &MatchingRule> {
        self.by_id
            .values()
            .chain(self.by_class.values())
            .chain(self.by_tag.values())
            .chain(self.by_attribute.values())
            .chain(self.pseudo_element_rules.values())
            .flatten()
            .chain(&self.root_rules)
            .chain(&self.other_rules)
    }

    /// Number of indexed selectors.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rule_count
    }

    /// Whether no rule is indexed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rule_count == 0
    }

    /// `@keyframes` by name. Later rules replace earlier ones.
    #[must_use]
    pub fn keyframes(&self, name: &str) -> Option<&Arc<KeyframesRule>> {
        self.keyframes.get(name)
    }

    /// `@font-face` rules in order.
    #[must_use]
    pub fn font_faces(&self) -> &[FontFaceRule] {
        &self.font_faces
    }

    /// Flattened layer names, lowest precedence first.
    #[must_use]
    pub fn layer_order(&self) -> &[String] {
        &self.layer_order
    }

    /// What `:has()` arguments mention.
    #[must_use]
    pub const fn has_metadata(&self) -> &HasSelectorMetadata {
        &self.has_metadata
    }

    /// Whether any rule mentions a pseudo-class, anywhere in a selector.
    #[must_use]
    pub const fn has_rules_for_pseudo_class(&self, kind: PseudoClassKind) -> bool {
        self.pseudo_class_index.contains(kind)
    }

    /// Whether any pseudo-element rule exists for `pseudo`.
    #[must_use]
    pub fn has_pseudo_element_rules(&self, pseudo: PseudoElement) -> bool {
        self.pseudo_element_rules.get(&pseudo).is_some_and(|rules| !rules.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use wombat_dom::DomTree;

    use super::*;

    fn cache(css: &str) -> RuleCache {
        let entry = SheetEntry {
            sheet: Arc::new(Stylesheet::parse(css, None)),
            origin: CascadeOrigin::Author,
            scope: None,
            index: 0,
        };
        RuleCache::build(&[entry], &MediaEnvironment::default(), false)
    }

    #[test]
    fn test_buckets_prefer_most_specific_feature() {
        let cache = cache("#a.b p { } p.c[title] { } div[lang] { } :root { } * { } :is(.wrapped) { }");
        assert_eq!(cache.bucket(&RuleBucket::Id("a".into())).len(), 0);
        assert_eq!(cache.bucket(&RuleBucket::Tag("p".into())).len(), 1);
        assert_eq!(cache.bucket(&RuleBucket::Class("c".into())).len(), 1);
        assert_eq!(cache.bucket(&RuleBucket::Tag("div".into())).len(), 1);
        assert_eq!(cache.bucket(&RuleBucket::Root).len(), 1);
        assert_eq!(cache.bucket(&RuleBucket::Other).len(), 1);
        assert_eq!(cache.bucket(&RuleBucket::Class("wrapped".into())).len(), 1);
        assert_eq!(cache.len(), 6);
    }

    #[test]
    fn test_root_outranks_attribute_bucket() {
        let cache = cache(":root[lang] { } [lang]:root { } [dir] { } html:root[lang] { }");
        assert_eq!(cache.bucket(&RuleBucket::Root).len(), 2);
        assert_eq!(cache.bucket(&RuleBucket::Attribute("lang".into())).len(), 0);
        assert_eq!(cache.bucket(&RuleBucket::Attribute("dir".into())).len(), 1);
        assert_eq!(cache.bucket(&RuleBucket::Tag("html".into())).len(), 1);
    }

    #[test]
    fn test_pseudo_element_rules_are_separate() {
        let cache = cache("p::before { content: 'x' } p { }");
        let mut tree = DomTree::new();
        let p = tree.create_html_element("p");
        let data = tree.as_element(p).expect("element");
        assert_eq!(cache.collect_matching_rules(data, false, None, None).len(), 1);
        assert_eq!(
            cache
                .collect_matching_rules(data, false, Some(PseudoElement::Before), None)
                .len(),
            1
        );
        assert!(!cache.has_pseudo_element_rules(PseudoElement::After));
    }

    #[test]
    fn test_layer_order_is_post_order() {
        let cache = cache("@layer a { @layer b { p {} } } @layer c; @layer a.d { p {} }");
        assert_eq!(cache.layer_order(), &["a.b", "a.d", "a", "c"]);
    }

    #[test]
    fn test_media_rules_evaluated_at_build() {
        let cache = cache("@media (min-width: 2000px) { p {} } @media (min-width: 10px) { div {} }");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.bucket(&RuleBucket::Tag("div".into())).len(), 1);
    }

    #[test]
    fn test_has_metadata_and_pseudo_class_index() {
        let cache = cache("div:has(> .icon[data-x]:hover) {} a:focus {}");
        let has = cache.has_metadata();
        assert!(has.present);
        assert!(has.classes.contains("icon"));
        assert!(has.attributes.contains("data-x"));
        assert!(has.pseudo_classes.contains(PseudoClassKind::Hover));
        assert!(!has.pseudo_classes.contains(PseudoClassKind::Focus));
        assert!(cache.has_rules_for_pseudo_class(PseudoClassKind::Focus));
        assert!(!cache.has_rules_for_pseudo_class(PseudoClassKind::Active));
    }

    #[test]
    fn test_ancestor_hashes_skip_sibling_compounds() {
        let cache = cache(".x + p {} .y p {}");
        let rules = cache.bucket(&RuleBucket::Tag("p".into()));
        assert!(rules[0].ancestor_hashes.is_empty());
        assert_eq!(rules[1].ancestor_hashes, vec![feature_hash(FeatureKind::Class, "y")]);
    }
}
