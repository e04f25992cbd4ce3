//! The style engine: owns the stylesheets, the rule caches, fonts and
//! animations, and turns a [`DomTree`] into computed styles.
//!
//! [CSS Cascade 5 § 4 Value Processing](https://www.w3.org/TR/css-cascade-5/#value-stages)
//!
//! For every element the engine
//!
//! 1. collects candidate rules from the user-agent, user and author caches
//!    and runs the matcher on them,
//! 2. cascades the matched declarations with presentational hints and the
//!    `style` attribute,
//! 3. resolves custom properties and computes every longhand,
//! 4. runs the transition style change event and updates CSS animations.
//!
//! Results are cached per element and pseudo-element until the tree marks
//! the element dirty.

use std::fmt;
use std::iter::successors;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use wombat_common::fetch::{CompletedFetch, ResourceFetcher};
use wombat_common::warning::warn_once;
use wombat_css::{
    AbsolutizeContext, CssRule, DeclarationBlock, Direction, Keyword, KeyframesRule, LogicalAliasMappingContext,
    MediaEnvironment, PropertyId, PseudoClassBitmap, PseudoClassKind, PseudoElement, StyleValue, Stylesheet,
    WritingMode,
};
use wombat_dom::{DomTree, ElementData, NodeId};

use crate::animation::{AnimationEngine, AnimationEvent, AnimationKey};
use crate::bloom::AncestorFilter;
use crate::cascade::{CascadeSources, MatchedRules, cascade_custom_properties, cascade_declarations};
use crate::computed::ComputedProperties;
use crate::config::StyleConfig;
use crate::font::FontResolver;
use crate::hints::{HtmlPresentationalHints, PresentationalHints};
use crate::invalidation::{InvalidationProperty, StyleInvalidationData};
use crate::matcher::{MatchContext, matches};
use crate::resolver::{ResolveContext, compute_properties, create_document_style, resolve_custom_properties};
use crate::rule_cache::{MatchingRule, RuleCache};
use crate::rule_store::{CascadeOrigin, RuleStore, SheetEntry, SheetId};

/// Pseudo-elements computed for every element during a document pass.
const TREE_ABIDING_PSEUDO_ELEMENTS: [PseudoElement; 3] =
    [PseudoElement::Before, PseudoElement::After, PseudoElement::Marker];

/// Rule caches for every origin and tree scope, built from one snapshot of
/// the [`RuleStore`].
#[derive(Debug)]
struct RuleCaches {
    quirks_mode: bool,
    user_agent: RuleCache,
    user: RuleCache,
    author: RuleCache,
    shadow: FxHashMap<NodeId, RuleCache>,
    invalidation: StyleInvalidationData,
}

impl RuleCaches {
    fn build(store: &RuleStore, media: &MediaEnvironment, quirks_mode: bool) -> Self {
        let origin_cache = |origin: CascadeOrigin, scope: Option<NodeId>| {
            let mut entries: Vec<SheetEntry> = Vec::new();
            store.for_each_sheet(origin, quirks_mode, scope, |entry| entries.push(entry.clone()));
            RuleCache::build(&entries, media, quirks_mode)
        };
        let user_agent = origin_cache(CascadeOrigin::UserAgent, None);
        let user = origin_cache(CascadeOrigin::User, None);
        let author = origin_cache(CascadeOrigin::Author, None);
        let shadow: FxHashMap<NodeId, RuleCache> = store
            .scopes()
            .map(|scope| (scope, origin_cache(CascadeOrigin::Author, Some(scope))))
            .collect();

        let mut caches = Self {
            quirks_mode,
            user_agent,
            user,
            author,
            shadow,
            invalidation: StyleInvalidationData::default(),
        };
        caches.invalidation = StyleInvalidationData::build(caches.all().flat_map(|cache| cache.rules()).map(|rule| &rule.selector));
        caches
    }

    fn all(&self) -> impl Iterator<Item = &RuleCache> {
        [&self.user_agent, &self.user, &self.author]
            .into_iter()
            .chain(self.shadow.values())
    }

    /// Caches that hold `@keyframes` visible from `scope`, most specific
    /// first.
    fn keyframes_lookup(&self, scope: Option<NodeId>) -> Vec<&RuleCache> {
        scope
            .and_then(|scope| self.shadow.get(&scope))
            .into_iter()
            .chain([&self.author, &self.user, &self.user_agent])
            .collect()
    }

    fn may_have_has_selectors(&self) -> bool {
        self.all().any(|cache| cache.has_metadata().present)
    }

    fn affects_has(&self, properties: &[InvalidationProperty]) -> bool {
        self.all().any(|cache| {
            let metadata = cache.has_metadata();
            metadata.present
                && properties.iter().any(|property| match property {
                    InvalidationProperty::Id(id) => metadata.ids.contains(id),
                    InvalidationProperty::Class(class) => metadata.classes.contains(class),
                    InvalidationProperty::Attribute(name) => metadata.attributes.contains(name),
                    InvalidationProperty::TagName(name) => metadata.tags.contains(name),
                    InvalidationProperty::PseudoClass(kind) => metadata.pseudo_classes.contains(*kind),
                })
        })
    }
}

/// Run the matcher over the candidates of one cache and keep the rules
/// that match.
#[allow(clippy::too_many_arguments)]
fn match_cache<'a>(
    cache: &'a RuleCache,
    tree: &'a DomTree,
    element: NodeId,
    data: &ElementData,
    pseudo: Option<PseudoElement>,
    shadow_host: Option<NodeId>,
    filter: Option<&AncestorFilter>,
    attempted: &mut PseudoClassBitmap,
    out: &mut Vec<&'a MatchingRule>,
) {
    let is_root = tree.document_element() == Some(element);
    let mut context = MatchContext::new(tree);
    context.pseudo_element = pseudo;
    context.shadow_host = shadow_host;

    for rule in cache.collect_matching_rules(data, is_root, pseudo, None) {
        if !rule.namespace_admits(data) {
            continue;
        }
        if let Some(filter) = filter
            && !filter.might_contain_all(&rule.ancestor_hashes)
        {
            continue;
        }
        context.sheet = Some(rule.sheet.as_ref());
        if matches(&rule.selector, element, &context) {
            out.push(rule);
        }
    }
    *attempted = attempted.union(context.attempted_pseudo_classes());
}

/// Elements below `element` in the flat tree, shadow trees included.
fn flat_descendants(tree: &DomTree, element: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![element];
    while let Some(node) = stack.pop() {
        let children = tree
            .shadow_root_of(node)
            .into_iter()
            .flat_map(|root| tree.element_children(root))
            .chain(tree.element_children(node));
        for child in children {
            out.push(child);
            stack.push(child);
        }
    }
    out
}

/// [CSS Logical 1 § 2](https://www.w3.org/TR/css-logical-1/#box)
///
/// `writing-mode` and `direction` from the pre-pass cascade. Both are
/// inherited, so anything but an explicit value takes the parent's.
fn logical_context(
    writing_mode: Option<&StyleValue>,
    direction: Option<&StyleValue>,
    parent: LogicalAliasMappingContext,
) -> LogicalAliasMappingContext {
    let writing_mode = match writing_mode {
        Some(StyleValue::Initial) => WritingMode::default(),
        Some(value) if !value.is_css_wide_keyword() => WritingMode::from_value(value),
        _ => parent.writing_mode,
    };
    let direction = match direction {
        Some(StyleValue::Initial) => Direction::default(),
        Some(value) if !value.is_css_wide_keyword() => Direction::from_value(value),
        _ => parent.direction,
    };
    LogicalAliasMappingContext {
        writing_mode,
        direction,
    }
}

/// The parsed `style` attribute of an element, reparsed only when its text
/// changes.
fn inline_style(
    cache: &mut FxHashMap<NodeId, (String, Arc<DeclarationBlock>)>,
    element: NodeId,
    data: &ElementData,
) -> Option<Arc<DeclarationBlock>> {
    let Some(css) = data.inline_style() else {
        let _ = cache.remove(&element);
        return None;
    };
    if let Some((text, block)) = cache.get(&element)
        && text == css
    {
        return Some(Arc::clone(block));
    }
    let block = Arc::new(DeclarationBlock::parse_style_attribute(css));
    let _ = cache.insert(element, (css.to_string(), Arc::clone(&block)));
    Some(block)
}

/// Whether `content` keeps a `::before` or `::after` from generating a box.
fn suppresses_generated_content(style: &ComputedProperties) -> bool {
    style.property(PropertyId::Content).as_keyword().is_some_and(|keyword| matches!(keyword, Keyword::None | Keyword::Normal))
}

/// Computes and caches styles for the elements of a document.
pub struct StyleEngine {
    config: StyleConfig,
    viewport: (f32, f32),
    rules: RuleStore,
    caches: Option<RuleCaches>,
    hints: Box<dyn PresentationalHints>,
    fetcher: Option<Box<dyn ResourceFetcher>>,
    fonts: FontResolver,
    animations: AnimationEngine,
    ancestor_filter: AncestorFilter,
    inline_styles: FxHashMap<NodeId, (String, Arc<DeclarationBlock>)>,
    styles: FxHashMap<AnimationKey, Arc<ComputedProperties>>,
}

impl fmt::Debug for StyleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleEngine")
            .field("viewport", &self.viewport)
            .field("rules", &self.rules)
            .field("caches_built", &self.caches.is_some())
            .field("fonts", &self.fonts)
            .field("styles", &self.styles.len())
            .finish_non_exhaustive()
    }
}

impl StyleEngine {
    /// An engine with only the user-agent sheets.
    #[must_use]
    pub fn new(config: StyleConfig) -> Self {
        let viewport = (config.viewport.width, config.viewport.height);
        Self {
            config,
            viewport,
            rules: RuleStore::new(),
            caches: None,
            hints: Box::new(HtmlPresentationalHints),
            fetcher: None,
            fonts: FontResolver::new(),
            animations: AnimationEngine::new(),
            ancestor_filter: AncestorFilter::new(),
            inline_styles: FxHashMap::default(),
            styles: FxHashMap::default(),
        }
    }

    /// Replace the source of presentational hints.
    #[must_use]
    pub fn with_presentational_hints(mut self, hints: impl PresentationalHints + 'static) -> Self {
        self.hints = Box::new(hints);
        self
    }

    /// Set the fetcher web fonts are loaded through. Loads already in flight
    /// on the previous fetcher are cancelled.
    pub fn set_resource_fetcher(&mut self, fetcher: Option<Box<dyn ResourceFetcher>>) {
        self.fonts.cancel_all(self.fetcher.as_deref());
        self.fetcher = fetcher;
        let _ = self.fonts.start_pending_loads(self.fetcher.as_deref());
    }

    /// The configuration the engine was created with.
    #[must_use]
    pub const fn config(&self) -> &StyleConfig {
        &self.config
    }

    /// The stylesheets.
    #[must_use]
    pub const fn rule_store(&self) -> &RuleStore {
        &self.rules
    }

    /// Font loaders and matching.
    #[must_use]
    pub const fn fonts(&self) -> &FontResolver {
        &self.fonts
    }

    /// Add an author sheet, scoped to a shadow root when `scope` is set.
    pub fn add_sheet(&mut self, sheet: Arc<Stylesheet>, scope: Option<NodeId>) -> SheetId {
        if sheet.rules.iter().any(|rule| matches!(rule, CssRule::Import(_))) {
            warn_once("CSS", "@import rules are not fetched");
        }
        let id = self.rules.add_sheet(sheet, scope);
        self.invalidate_rule_cache();
        id
    }

    /// Remove an author sheet.
    pub fn remove_sheet(&mut self, id: SheetId) -> bool {
        let removed = self.rules.remove_sheet(id);
        if removed {
            self.invalidate_rule_cache();
        }
        removed
    }

    /// Replace an author sheet in place, keeping its cascade position.
    pub fn replace_sheet(&mut self, id: SheetId, sheet: Arc<Stylesheet>) -> bool {
        let replaced = self.rules.replace_sheet(id, sheet);
        if replaced {
            self.invalidate_rule_cache();
        }
        replaced
    }

    /// Set or clear the user style sheet.
    pub fn set_user_style_sheet(&mut self, css: Option<String>) {
        self.rules.set_user_style_sheet(css);
        self.invalidate_rule_cache();
    }

    /// Resize the viewport. Media queries and viewport units change, so the
    /// caller should mark the whole tree dirty.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        if self.viewport == (width, height) {
            return;
        }
        self.viewport = (width, height);
        self.invalidate_rule_cache();
    }

    /// The viewport size in CSS pixels.
    #[must_use]
    pub const fn viewport(&self) -> (f32, f32) {
        self.viewport
    }

    /// Drop the rule caches. They are rebuilt on the next style query.
    pub fn invalidate_rule_cache(&mut self) {
        if self.caches.take().is_some() {
            log::debug!(target: "wombat::style", "rule caches invalidated");
        }
    }

    fn ensure_rule_caches(&mut self, tree: &DomTree) {
        let quirks_mode = tree.is_quirks_mode();
        if self.caches.as_ref().is_some_and(|caches| caches.quirks_mode == quirks_mode) {
            return;
        }
        let media = MediaEnvironment {
            width: self.viewport.0,
            height: self.viewport.1,
        };
        let caches = RuleCaches::build(&self.rules, &media, quirks_mode);
        log::debug!(
            target: "wombat::style",
            "built rule caches: {} user-agent, {} user, {} author, {} shadow scopes",
            caches.user_agent.len(),
            caches.user.len(),
            caches.author.len(),
            caches.shadow.len()
        );
        let fetcher = self.fetcher.as_deref();
        self.fonts.set_font_faces(caches.all().flat_map(RuleCache::font_faces), fetcher);
        let _ = self.fonts.start_pending_loads(fetcher);
        self.caches = Some(caches);
    }

    /// The style of the initial containing block.
    pub fn create_document_style(&mut self) -> ComputedProperties {
        create_document_style(&self.config, self.viewport, &mut self.fonts, self.fetcher.as_deref())
    }

    /// The last style computed for an element or pseudo-element.
    #[must_use]
    pub fn style(&self, element: NodeId, pseudo: Option<PseudoElement>) -> Option<&Arc<ComputedProperties>> {
        self.styles.get(&(element, pseudo))
    }

    /// Push an element onto the ancestor filter before styling its
    /// children.
    pub fn push_ancestor(&mut self, tree: &DomTree, element: NodeId) {
        if let Some(data) = tree.as_element(element) {
            self.ancestor_filter.push(element, data);
        }
    }

    /// Pop an element pushed with [`Self::push_ancestor`].
    pub fn pop_ancestor(&mut self, element: NodeId) {
        self.ancestor_filter.pop(element);
    }

    /// Empty the ancestor filter.
    pub fn reset_ancestor_filter(&mut self) {
        self.ancestor_filter.reset();
    }

    /// Styles of the ancestors of `element` in the flat tree, root first.
    /// Ancestors without a style are computed on the way.
    fn ancestor_styles(&mut self, tree: &DomTree, element: NodeId) -> Vec<Arc<ComputedProperties>> {
        let mut chain: Vec<NodeId> =
            successors(tree.parent_or_shadow_host_element(element), |&id| tree.parent_or_shadow_host_element(id))
                .collect();
        chain.reverse();
        let mut styles = Vec::with_capacity(chain.len());
        for id in chain {
            let style = match self.styles.get(&(id, None)) {
                Some(style) => Arc::clone(style),
                None => match self.compute_style(tree, id, None) {
                    Some(style) => style,
                    None => break,
                },
            };
            styles.push(style);
        }
        styles
    }

    /// [CSS Cascade 5 § 4](https://www.w3.org/TR/css-cascade-5/#value-stages)
    ///
    /// Compute the style of `element`, or of one of its pseudo-elements.
    /// Returns `None` for pseudo-elements that match no rule or whose
    /// `content` generates no box.
    pub fn compute_style(
        &mut self,
        tree: &DomTree,
        element: NodeId,
        pseudo: Option<PseudoElement>,
    ) -> Option<Arc<ComputedProperties>> {
        let data = tree.as_element(element)?;
        self.ensure_rule_caches(tree);

        let mut ancestors = self.ancestor_styles(tree, element);
        if pseudo.is_some() {
            let originating = match self.styles.get(&(element, None)) {
                Some(style) => Arc::clone(style),
                None => self.compute_style(tree, element, None)?,
            };
            ancestors.push(originating);
        }

        let key = (element, pseudo);
        let caches = self.caches.as_ref()?;
        let parent = tree.parent_or_shadow_host_element(element);
        let filter = self.ancestor_filter.is_valid_for_parent(parent).then_some(&self.ancestor_filter);
        let scope = tree.containing_shadow_root(element);

        let mut attempted = PseudoClassBitmap::default();
        let mut matched = MatchedRules::default();
        match_cache(&caches.user_agent, tree, element, data, pseudo, None, filter, &mut attempted, &mut matched.user_agent);
        match_cache(&caches.user, tree, element, data, pseudo, None, filter, &mut attempted, &mut matched.user);
        match scope {
            // [DOM § 4.2.2.3](https://dom.spec.whatwg.org/#shadow-trees)
            // Document rules do not reach into shadow trees.
            Some(root) => {
                if let Some(cache) = caches.shadow.get(&root) {
                    let host = tree.shadow_host(root);
                    match_cache(cache, tree, element, data, pseudo, host, filter, &mut attempted, &mut matched.author);
                }
            }
            None => {
                match_cache(&caches.author, tree, element, data, pseudo, None, filter, &mut attempted, &mut matched.author);
            }
        }
        // `:host` rules of the element's own shadow tree.
        if let Some(root) = tree.shadow_root_of(element)
            && let Some(cache) = caches.shadow.get(&root)
        {
            match_cache(cache, tree, element, data, pseudo, Some(element), filter, &mut attempted, &mut matched.author);
        }
        if pseudo.is_some() && matched.is_empty() {
            let _ = self.styles.remove(&key);
            self.animations.remove(key);
            return None;
        }
        matched.sort();

        let hints = if pseudo.is_none() {
            self.hints.presentational_hints(tree, element)
        } else {
            None
        };
        let inline = if pseudo.is_none() {
            inline_style(&mut self.inline_styles, element, data)
        } else {
            None
        };
        let sources = CascadeSources {
            rules: &matched,
            presentational_hints: hints.as_ref(),
            inline_style: inline.as_deref(),
            pseudo_element: pseudo,
            scope,
        };

        let parent_style = ancestors.last();
        let parent_logical = parent_style.map(|style| style.logical_alias_mapping_context()).unwrap_or_default();
        let logical_pass = cascade_declarations(&sources, None, &[PropertyId::WritingMode, PropertyId::Direction]);
        let logical = logical_context(
            logical_pass.value(PropertyId::WritingMode),
            logical_pass.value(PropertyId::Direction),
            parent_logical,
        );

        let cascaded = cascade_declarations(&sources, Some(logical), &[]);
        let custom = resolve_custom_properties(
            &cascade_custom_properties(&sources),
            parent_style.map(|style| style.custom_properties()),
            Some(data),
        );

        let is_root = pseudo.is_none() && tree.document_element() == Some(element);
        let mut context = ResolveContext {
            config: &self.config,
            element: Some(data),
            pseudo_element: pseudo,
            ancestors: &ancestors,
            is_root,
            viewport: self.viewport,
            logical,
            fonts: &mut self.fonts,
            fetcher: self.fetcher.as_deref(),
        };
        let mut computed = compute_properties(&cascaded, custom, &mut context);
        computed.set_attempted_pseudo_classes(attempted);

        if matches!(pseudo, Some(PseudoElement::Before | PseudoElement::After)) && suppresses_generated_content(&computed) {
            let _ = self.styles.remove(&key);
            self.animations.remove(key);
            return None;
        }

        if let Some(previous) = self.styles.get(&key) {
            self.animations.update_transitions(key, previous, &computed);
        }
        let absolutize = AbsolutizeContext {
            viewport: self.viewport,
            font_metrics: *computed.font_metrics(),
            root_font_metrics: ancestors.first().map_or(*computed.font_metrics(), |root| *root.font_metrics()),
        };
        let lookup_caches = caches.keyframes_lookup(scope);
        let lookup = |name: &str| -> Option<Arc<KeyframesRule>> {
            lookup_caches.iter().find_map(|cache| cache.keyframes(name).cloned())
        };
        self.animations.update_animations(key, &computed, &absolutize, &lookup);
        self.animations.apply(key, &mut computed);

        log::trace!(target: "wombat::style", "computed style for {element:?} {pseudo:?}");
        let computed = Arc::new(computed);
        let _ = self.styles.insert(key, Arc::clone(&computed));
        Some(computed)
    }

    /// Restyle every element that is dirty or whose parent changed, then
    /// clear the dirty bits. Returns the number of elements restyled.
    pub fn compute_document_styles(&mut self, tree: &mut DomTree) -> usize {
        let Some(root) = tree.document_element() else {
            return 0;
        };
        self.ensure_rule_caches(tree);
        self.ancestor_filter.reset();
        let mut visited = Vec::new();
        let restyled = self.restyle_subtree(tree, root, false, &mut visited);
        for id in visited {
            tree.clear_style_dirty(id);
        }
        tree.clear_style_dirty(NodeId::ROOT);
        log::debug!(target: "wombat::style", "restyled {restyled} elements");
        restyled
    }

    fn restyle_subtree(&mut self, tree: &DomTree, element: NodeId, parent_changed: bool, visited: &mut Vec<NodeId>) -> usize {
        let dirty = parent_changed || tree.needs_style_update(element) || !self.styles.contains_key(&(element, None));
        let mut restyled = 0;
        let mut changed = false;
        if dirty {
            let previous = self.styles.get(&(element, None)).cloned();
            let Some(style) = self.compute_style(tree, element, None) else {
                return 0;
            };
            changed = previous.as_deref() != Some(style.as_ref());
            restyled += 1;
            for pseudo in TREE_ABIDING_PSEUDO_ELEMENTS {
                let has_rules = self
                    .caches
                    .as_ref()
                    .is_some_and(|caches| caches.all().any(|cache| cache.has_pseudo_element_rules(pseudo)));
                if has_rules {
                    let _ = self.compute_style(tree, element, Some(pseudo));
                } else {
                    let _ = self.styles.remove(&(element, Some(pseudo)));
                }
            }
        }
        visited.push(element);

        if dirty || tree.child_needs_style_update(element) {
            let Some(data) = tree.as_element(element) else {
                return restyled;
            };
            self.ancestor_filter.push(element, data);
            let shadow_root = tree.shadow_root_of(element);
            visited.extend(shadow_root);
            let children: Vec<NodeId> = shadow_root
                .into_iter()
                .flat_map(|root| tree.element_children(root))
                .chain(tree.element_children(element))
                .collect();
            for child in children {
                restyled += self.restyle_subtree(tree, child, changed, visited);
            }
            self.ancestor_filter.pop(element);
        }
        restyled
    }

    /// Forget everything about an element and its flat-tree descendants.
    /// Call before the element is detached.
    pub fn element_removed(&mut self, tree: &DomTree, element: NodeId) {
        let mut removed: FxHashSet<NodeId> = flat_descendants(tree, element).into_iter().collect();
        let _ = removed.insert(element);
        let keys: Vec<AnimationKey> = self.styles.keys().filter(|(id, _)| removed.contains(id)).copied().collect();
        for key in keys {
            let _ = self.styles.remove(&key);
        }
        for id in &removed {
            self.animations.remove((*id, None));
            for pseudo in TREE_ABIDING_PSEUDO_ELEMENTS {
                self.animations.remove((*id, Some(pseudo)));
            }
            let _ = self.inline_styles.remove(id);
        }
    }

    /// An element was inserted. It, its subtree and its following siblings
    /// (for structural pseudo-classes) need styles.
    pub fn element_inserted(&mut self, tree: &mut DomTree, element: NodeId) {
        if self.may_have_has_selectors(tree) {
            tree.mark_all_style_dirty();
            return;
        }
        let mut dirty = vec![element];
        dirty.extend(flat_descendants(tree, element));
        for sibling in tree.following_siblings(element).collect::<Vec<_>>() {
            dirty.push(sibling);
            dirty.extend(flat_descendants(tree, sibling));
        }
        for id in dirty {
            tree.mark_style_dirty(id);
        }
    }

    /// Mark the elements a change to `properties` of `element` can restyle.
    /// Returns whether anything was marked.
    pub fn invalidate_for_changes(
        &mut self,
        tree: &mut DomTree,
        element: NodeId,
        properties: &[InvalidationProperty],
    ) -> bool {
        self.ensure_rule_caches(tree);
        let Some(caches) = &self.caches else {
            return false;
        };
        if caches.affects_has(properties) {
            log::debug!(target: "wombat::style", "change on {element:?} affects :has(); restyling everything");
            tree.mark_all_style_dirty();
            return true;
        }
        let set = caches.invalidation.invalidation_set_for_properties(properties);
        if !set.needs_invalidation() {
            return false;
        }

        let features = |id: NodeId| tree.as_element(id).map(InvalidationProperty::for_element).unwrap_or_default();
        let mut dirty = Vec::new();
        if set.invalidate_self {
            dirty.push(element);
        }
        if set.invalidate_whole_subtree || !set.properties.is_empty() {
            for descendant in flat_descendants(tree, element) {
                if set.invalidate_whole_subtree || set.matches_any(&features(descendant)) {
                    dirty.push(descendant);
                }
            }
        }
        if set.invalidate_siblings {
            for sibling in tree.following_siblings(element).filter(|&id| tree.as_element(id).is_some()) {
                if set.properties.is_empty() || set.matches_any(&features(sibling)) {
                    dirty.push(sibling);
                    dirty.extend(flat_descendants(tree, sibling));
                }
            }
        }

        let invalidated = !dirty.is_empty();
        for id in dirty {
            tree.mark_style_dirty(id);
        }
        invalidated
    }

    /// An attribute of `element` changed from `old_value` to `new_value`.
    pub fn attribute_changed(
        &mut self,
        tree: &mut DomTree,
        element: NodeId,
        name: &str,
        old_value: Option<&str>,
        new_value: Option<&str>,
    ) -> bool {
        let properties = InvalidationProperty::for_attribute_change(name, old_value, new_value);
        let mut invalidated = self.invalidate_for_changes(tree, element, &properties);
        if name.eq_ignore_ascii_case("style") || self.hints.is_presentational_attribute(name) {
            tree.mark_style_dirty(element);
            invalidated = true;
        }
        invalidated
    }

    /// Dynamic state behind `kind` changed on `element`.
    pub fn state_changed(&mut self, tree: &mut DomTree, element: NodeId, kind: PseudoClassKind) -> bool {
        if !self.has_rules_for_pseudo_class(tree, kind) {
            return false;
        }
        self.invalidate_for_changes(tree, element, &[InvalidationProperty::PseudoClass(kind)])
    }

    /// Whether any rule mentions the pseudo-class `kind`.
    pub fn has_rules_for_pseudo_class(&mut self, tree: &DomTree, kind: PseudoClassKind) -> bool {
        self.ensure_rule_caches(tree);
        self.caches
            .as_ref()
            .is_some_and(|caches| caches.all().any(|cache| cache.has_rules_for_pseudo_class(kind)))
    }

    /// Whether any rule contains `:has()`.
    pub fn may_have_has_selectors(&mut self, tree: &DomTree) -> bool {
        self.ensure_rule_caches(tree);
        self.caches.as_ref().is_some_and(RuleCaches::may_have_has_selectors)
    }

    /// Whether a change to `properties` can change what a `:has()` argument
    /// matches.
    pub fn invalidation_affects_has(&mut self, tree: &DomTree, properties: &[InvalidationProperty]) -> bool {
        self.ensure_rule_caches(tree);
        self.caches.as_ref().is_some_and(|caches| caches.affects_has(properties))
    }

    /// A web font finished loading; every style may use it now.
    pub fn did_load_font(&mut self, tree: &mut DomTree, family: &str) {
        log::debug!(target: "wombat::style", "font {family} loaded");
        tree.mark_all_style_dirty();
    }

    /// Route a completed fetch to the font loaders. Returns whether a font
    /// became available.
    pub fn did_complete_fetch(&mut self, tree: &mut DomTree, completed: CompletedFetch) -> bool {
        match self.fonts.did_complete_fetch(completed, self.fetcher.as_deref()) {
            Some(family) => {
                self.did_load_font(tree, &family);
                true
            }
            None => false,
        }
    }

    /// Advance the document timeline to `time` milliseconds and mark every
    /// element whose animated values change.
    pub fn set_timeline_time(&mut self, tree: &mut DomTree, time: f64) {
        let mut animated = self.animations.animated_elements();
        self.animations.set_timeline_time(time);
        animated.extend(self.animations.animated_elements());
        for (element, _) in animated {
            tree.mark_style_dirty(element);
        }
    }

    /// The current document timeline time.
    #[must_use]
    pub const fn timeline_time(&self) -> f64 {
        self.animations.timeline_time()
    }

    /// Running transitions and animations.
    #[must_use]
    pub const fn animations(&self) -> &AnimationEngine {
        &self.animations
    }

    /// Events queued since the last call.
    pub fn take_events(&mut self) -> Vec<AnimationEvent> {
        self.animations.take_events()
    }
}

#[cfg(test)]
mod tests {
    use wombat_dom::ElementState;

    use super::*;

    fn engine_with(css: &str) -> StyleEngine {
        let mut engine = StyleEngine::new(StyleConfig::default());
        let _ = engine.add_sheet(Arc::new(Stylesheet::parse(css, None)), None);
        engine
    }

    fn document() -> (DomTree, NodeId, NodeId) {
        let mut tree = DomTree::new();
        let html = tree.create_html_element("html");
        tree.append_child(NodeId::ROOT, html);
        let body = tree.create_html_element("body");
        tree.append_child(html, body);
        (tree, html, body)
    }

    #[test]
    fn test_before_without_content_is_none() {
        let mut engine = engine_with("p::before { color: red }");
        let (mut tree, _, body) = document();
        let p = tree.create_html_element("p");
        tree.append_child(body, p);
        assert!(engine.compute_style(&tree, p, Some(PseudoElement::Before)).is_none());
    }

    #[test]
    fn test_before_with_content_is_styled() {
        let mut engine = engine_with("p::before { content: 'x'; color: red }");
        let (mut tree, _, body) = document();
        let p = tree.create_html_element("p");
        tree.append_child(body, p);
        let style = engine.compute_style(&tree, p, Some(PseudoElement::Before)).unwrap();
        assert_eq!(style.color_value(PropertyId::Color), Some(wombat_css::Color::rgb(255, 0, 0)));
    }

    #[test]
    fn test_unmatched_pseudo_element_drops_its_animations() {
        let mut engine = engine_with(
            "@keyframes fade { from { opacity: 0 } to { opacity: 1 } } \
             p.run::before { content: 'x'; animation: fade 1s linear; transition: color 1s } \
             p.run.dim::before { color: rgb(10, 20, 30) }",
        );
        let (mut tree, _, body) = document();
        let p = tree.create_html_element("p");
        let _ = tree.set_attribute(p, "class", "run");
        tree.append_child(body, p);
        let key = (p, Some(PseudoElement::Before));

        assert!(engine.compute_style(&tree, p, key.1).is_some());
        let _ = tree.set_attribute(p, "class", "run dim");
        assert!(engine.compute_style(&tree, p, key.1).is_some());
        assert_eq!(engine.animations().animations(key).len(), 1);
        assert!(engine.animations().transitions(key).is_some());

        let _ = tree.set_attribute(p, "class", "");
        assert!(engine.compute_style(&tree, p, key.1).is_none());
        assert!(engine.animations().animations(key).is_empty());
        assert!(engine.animations().transitions(key).is_none());
        assert!(!engine.animations().animated_elements().contains(&key));
    }

    #[test]
    fn test_inline_style_is_reparsed_on_change() {
        let mut engine = StyleEngine::new(StyleConfig::default());
        let (mut tree, _, body) = document();
        tree.set_inline_style(body, "width: 10px");
        let style = engine.compute_style(&tree, body, None).unwrap();
        assert_eq!(style.property(PropertyId::Width), &StyleValue::px(10.0));
        tree.set_inline_style(body, "width: 20px");
        let style = engine.compute_style(&tree, body, None).unwrap();
        assert_eq!(style.property(PropertyId::Width), &StyleValue::px(20.0));
    }

    #[test]
    fn test_document_pass_clears_dirty_bits() {
        let mut engine = engine_with("body { color: blue }");
        let (mut tree, html, body) = document();
        assert_eq!(engine.compute_document_styles(&mut tree), 2);
        assert!(!tree.needs_style_update(body));
        assert!(engine.style(html, None).is_some());
        assert_eq!(engine.compute_document_styles(&mut tree), 0);
    }

    #[test]
    fn test_state_change_without_rules_is_ignored() {
        let mut engine = engine_with("p { color: red }");
        let (mut tree, _, body) = document();
        let _ = engine.compute_document_styles(&mut tree);
        tree.set_element_state(body, ElementState::HOVER, true);
        assert!(!engine.state_changed(&mut tree, body, PseudoClassKind::Hover));
        assert!(!tree.needs_style_update(body));
    }

    #[test]
    fn test_class_change_marks_matching_descendants() {
        let mut engine = engine_with(".open .item { color: red }");
        let (mut tree, _, body) = document();
        let item = tree.create_html_element("div");
        let other = tree.create_html_element("div");
        let _ = tree.set_attribute(item, "class", "item");
        tree.append_child(body, item);
        tree.append_child(body, other);
        let _ = engine.compute_document_styles(&mut tree);

        assert!(engine.attribute_changed(&mut tree, body, "class", None, Some("open")));
        assert!(tree.needs_style_update(item));
        assert!(!tree.needs_style_update(other));
    }

    #[test]
    fn test_has_selector_invalidates_everything() {
        let mut engine = engine_with("div:has(.x) { color: red }");
        let (mut tree, _, body) = document();
        let _ = engine.compute_document_styles(&mut tree);
        assert!(engine.may_have_has_selectors(&tree));
        assert!(engine.attribute_changed(&mut tree, body, "class", None, Some("x")));
        assert!(tree.needs_style_update(body));
    }

    #[test]
    fn test_media_rules_follow_viewport() {
        let mut engine = engine_with("@media (min-width: 1000px) { body { width: 5px } }");
        let (tree, _, body) = document();
        let style = engine.compute_style(&tree, body, None).unwrap();
        assert_ne!(style.property(PropertyId::Width), &StyleValue::px(5.0));
        engine.set_viewport(1200.0, 800.0);
        let style = engine.compute_style(&tree, body, None).unwrap();
        assert_eq!(style.property(PropertyId::Width), &StyleValue::px(5.0));
    }
}
