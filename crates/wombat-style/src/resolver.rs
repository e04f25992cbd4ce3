//! Cascaded values to computed values.
//!
//! [CSS Cascading and Inheritance Level 5 § 4.4 Computed Values](https://www.w3.org/TR/css-cascade-5/#computed)
//!
//! "The computed value is the result of resolving the specified value as
//! defined in the 'Computed Value' line of the property definition table,
//! generally absolutizing it in preparation for inheritance."
//!
//! Resolution runs in a fixed order because later steps read the results
//! of earlier ones: custom properties, substitution, defaulting,
//! `math-depth`, the font (size, weight, family list, metrics,
//! `line-height`), absolutization, and finally the fix-ups that depend on
//! several properties at once (border widths, box type, overflow,
//! `text-align`).

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use wombat_common::fetch::ResourceFetcher;
use wombat_css::property::PHYSICAL_LONGHAND_COUNT;
use wombat_css::substitute::{SubstitutionSource, referenced_custom_properties, substitute};
use wombat_css::value::MathDepth;
use wombat_css::{
    AbsolutizeContext, ComponentValue, Direction, FontMetrics, Keyword, LogicalAliasMappingContext, PropertyId,
    PseudoElement, StyleValue, parse_css_value,
};
use wombat_dom::{ElementData, namespace};

use crate::cascade::{CascadedCustomProperties, CascadedProperties, PendingShorthand};
use crate::cascade::for_each_property_expanding_shorthands;
use crate::computed::{ComputedProperties, CustomProperties};
use crate::config::StyleConfig;
use crate::font::{FamilyName, FontDescriptor, FontResolver};

/// [MathML Core § 3.3 The math-depth property](https://w3c.github.io/mathml-core/#the-math-script-level-property)
///
/// Scale applied per step of `math-depth` when `font-size: math` and no
/// `scriptPercentScaleDown`/`scriptScriptPercentScaleDown` is available.
const MATH_SCRIPT_SCALE: f32 = 0.71;

/// Growth factor past either end of the absolute-size ladder.
const LADDER_OVERFLOW_FACTOR: f32 = 1.2;

const ABSOLUTE_SIZES: [Keyword; 8] = [
    Keyword::XxSmall,
    Keyword::XSmall,
    Keyword::Small,
    Keyword::Medium,
    Keyword::Large,
    Keyword::XLarge,
    Keyword::XxLarge,
    Keyword::XxxLarge,
];

/// Lookups for `var()` and `attr()`.
pub(crate) struct Substitutions<'a> {
    pub(crate) custom: &'a FxHashMap<String, Vec<ComponentValue>>,
    pub(crate) element: Option<&'a ElementData>,
}

impl SubstitutionSource for Substitutions<'_> {
    fn custom_property(&self, name: &str) -> Option<&[ComponentValue]> {
        self.custom.get(name).map(Vec::as_slice)
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.element?.attribute(name)
    }
}

/// How a custom property declared as a CSS-wide keyword defaults.
#[derive(Clone, Copy, PartialEq, Eq)]
enum CustomDefault {
    Initial,
    Inherit,
}

fn custom_property_default(values: &[ComponentValue]) -> Option<CustomDefault> {
    let values = wombat_css::syntax::trim_whitespace(values.to_vec());
    let [single] = values.as_slice() else {
        return None;
    };
    match single.as_ident()?.to_ascii_lowercase().as_str() {
        "initial" => Some(CustomDefault::Initial),
        "inherit" | "unset" => Some(CustomDefault::Inherit),
        _ => None,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    InProgress,
    Done,
}

/// Depth-first resolution of declared custom properties that reference
/// other custom properties.
struct CustomPropertyResolver<'a> {
    declared: FxHashMap<&'a str, &'a [ComponentValue]>,
    resolved: FxHashMap<String, Vec<ComponentValue>>,
    state: FxHashMap<&'a str, VisitState>,
    stack: Vec<&'a str>,
    cyclic: FxHashSet<&'a str>,
    element: Option<&'a ElementData>,
}

impl<'a> CustomPropertyResolver<'a> {
    fn visit(&mut self, name: &'a str) {
        let Some(&value) = self.declared.get(name) else {
            return;
        };
        let _ = self.state.insert(name, VisitState::InProgress);
        self.stack.push(name);
        for reference in referenced_custom_properties(value) {
            let Some((&dependency, _)) = self.declared.get_key_value(reference.as_str()) else {
                continue;
            };
            match self.state.get(dependency) {
                // [CSS Variables § 2.3](https://www.w3.org/TR/css-variables-1/#cycles)
                // "If there is a cycle in the dependency graph, all the
                // custom properties in the cycle are invalid at
                // computed-value time."
                Some(VisitState::InProgress) => {
                    if let Some(start) = self.stack.iter().position(|entry| *entry == dependency) {
                        self.cyclic.extend(self.stack[start..].iter().copied());
                    }
                }
                Some(VisitState::Done) => {}
                None => self.visit(dependency),
            }
        }
        let _ = self.stack.pop();
        let _ = self.state.insert(name, VisitState::Done);

        let substituted = if self.cyclic.contains(name) {
            None
        } else {
            substitute(
                value,
                &Substitutions {
                    custom: &self.resolved,
                    element: self.element,
                },
            )
        };
        match substituted {
            Some(values) => {
                let _ = self.resolved.insert(name.to_string(), values);
            }
            None => {
                log::debug!(target: "wombat::style", "custom property {name} is invalid at computed-value time");
                let _ = self.resolved.remove(name);
            }
        }
    }
}

/// [CSS Variables § 2](https://www.w3.org/TR/css-variables-1/#defining-variables)
///
/// Compute custom properties from the cascaded declarations and the
/// parent's computed custom properties. Custom properties inherit; a
/// guaranteed-invalid value is represented by absence. When nothing is
/// declared the parent's map is shared.
#[must_use]
pub fn resolve_custom_properties(
    cascaded: &CascadedCustomProperties,
    parent: Option<&CustomProperties>,
    element: Option<&ElementData>,
) -> CustomProperties {
    if cascaded.is_empty() {
        return parent.cloned().unwrap_or_default();
    }
    let mut resolved: FxHashMap<String, Vec<ComponentValue>> =
        parent.map(|parent| parent.as_ref().clone()).unwrap_or_default();
    let mut declared = FxHashMap::default();
    for (name, value) in cascaded {
        match custom_property_default(value) {
            Some(CustomDefault::Initial) => {
                let _ = resolved.remove(name);
            }
            Some(_) => {}
            None => {
                let _ = declared.insert(name.as_str(), value.as_slice());
            }
        }
    }
    for (&name, &value) in &declared {
        let _ = resolved.insert(name.to_string(), value.to_vec());
    }

    let mut names: Vec<&str> = declared.keys().copied().collect();
    names.sort_unstable();
    let mut resolver = CustomPropertyResolver {
        declared,
        resolved,
        state: FxHashMap::default(),
        stack: Vec::new(),
        cyclic: FxHashSet::default(),
        element,
    };
    for name in names {
        if !resolver.state.contains_key(name) {
            resolver.visit(name);
        }
    }
    Arc::new(resolver.resolved)
}

/// Inputs value resolution needs besides the cascaded values.
pub struct ResolveContext<'a> {
    /// Engine configuration.
    pub config: &'a StyleConfig,
    /// The element, or the originating element of a pseudo-element.
    pub element: Option<&'a ElementData>,
    /// The pseudo-element being resolved.
    pub pseudo_element: Option<PseudoElement>,
    /// Computed styles of the ancestors, root first. The last entry is the
    /// parent, or the originating element for a pseudo-element.
    pub ancestors: &'a [Arc<ComputedProperties>],
    /// Whether this is the document element itself.
    pub is_root: bool,
    /// Viewport width and height.
    pub viewport: (f32, f32),
    /// Writing mode and direction from the pre-pass.
    pub logical: LogicalAliasMappingContext,
    /// Font selection and loading.
    pub fonts: &'a mut FontResolver,
    /// Fetches web fonts, when the embedder provides one.
    pub fetcher: Option<&'a dyn ResourceFetcher>,
}

impl ResolveContext<'_> {
    fn parent(&self) -> Option<&ComputedProperties> {
        self.ancestors.last().map(AsRef::as_ref)
    }

    /// Metrics `rem`-like units refer to while the font size of this
    /// element is being computed.
    fn root_metrics(&self) -> FontMetrics {
        match self.ancestors.first() {
            Some(root) if !self.is_root => *root.font_metrics(),
            _ => FontMetrics::from_font_size(self.config.default_user_font_size),
        }
    }

    fn is_html_element(&self, local_name: &str) -> bool {
        self.pseudo_element.is_none()
            && self
                .element
                .is_some_and(|element| element.is_html() && element.local_name().eq_ignore_ascii_case(local_name))
    }
}

struct SpecifiedValue {
    value: StyleValue,
    important: bool,
    logical_alias: Option<PropertyId>,
}

/// Cascaded values with every substitution performed.
struct SpecifiedValues {
    values: Vec<Option<SpecifiedValue>>,
}

impl SpecifiedValues {
    fn collect(cascaded: &CascadedProperties, custom: &CustomProperties, element: Option<&ElementData>) -> Self {
        let source = Substitutions {
            custom: custom.as_ref(),
            element,
        };
        let mut pending_cache: FxHashMap<usize, Option<Vec<(PropertyId, StyleValue)>>> = FxHashMap::default();
        let mut values: Vec<Option<SpecifiedValue>> = (0..PHYSICAL_LONGHAND_COUNT).map(|_| None).collect();

        for (property, entry) in cascaded.iter() {
            let Some(slot) = property.index() else {
                continue;
            };
            let declared_as = entry.logical_alias.unwrap_or(property);
            let value = match &entry.value {
                StyleValue::Unresolved(unresolved) => substitute(&unresolved.values, &source)
                    .and_then(|values| parse_css_value(declared_as, &values))
                    .filter(|value| !matches!(value, StyleValue::Unresolved(_)))
                    .unwrap_or(StyleValue::GuaranteedInvalid),
                StyleValue::PendingSubstitution(_) => match &entry.pending {
                    Some(pending) => {
                        let key = Arc::as_ptr(pending) as usize;
                        pending_cache
                            .entry(key)
                            .or_insert_with(|| expand_pending_shorthand(pending, &source))
                            .as_ref()
                            .and_then(|longhands| {
                                longhands
                                    .iter()
                                    .find(|(longhand, _)| *longhand == declared_as)
                                    .map(|(_, value)| value.clone())
                            })
                            .unwrap_or(StyleValue::GuaranteedInvalid)
                    }
                    None => StyleValue::GuaranteedInvalid,
                },
                value => value.clone(),
            };
            values[slot] = Some(SpecifiedValue {
                value,
                important: entry.important,
                logical_alias: entry.logical_alias,
            });
        }
        Self { values }
    }

    fn get(&self, property: PropertyId) -> Option<&SpecifiedValue> {
        self.values.get(property.index()?)?.as_ref()
    }
}

/// [CSS Values 5 § 3.2](https://drafts.csswg.org/css-values-5/#pending-substitution-value)
///
/// "the shorthand is substituted ... then parsed, and the resulting
/// values are assigned to the longhands". Parsed once per declaration.
fn expand_pending_shorthand(
    pending: &PendingShorthand,
    source: &dyn SubstitutionSource,
) -> Option<Vec<(PropertyId, StyleValue)>> {
    let substituted = substitute(&pending.value.values, source)?;
    let value = parse_css_value(pending.shorthand, &substituted)?;
    if matches!(value, StyleValue::Unresolved(_)) {
        return None;
    }
    let mut longhands = Vec::new();
    for_each_property_expanding_shorthands(pending.shorthand, &value, &mut |longhand, value| {
        longhands.push((longhand, value));
    });
    Some(longhands)
}

/// [§ 7 Defaulting](https://www.w3.org/TR/css-cascade-5/#defaulting)
///
/// Returns the value and whether it came from the parent.
fn default_value(
    property: PropertyId,
    specified: Option<&SpecifiedValue>,
    parent: Option<&ComputedProperties>,
) -> (StyleValue, bool) {
    let inherit = |alias: Option<PropertyId>| match parent {
        Some(parent) => {
            // Logical declarations inherit the parent's value of the same
            // logical property, mapped through the parent's writing mode.
            let source = alias.map_or(property, |alias| {
                alias.map_logical_alias(parent.logical_alias_mapping_context())
            });
            (parent.property(source).clone(), true)
        }
        None => (property.initial_value(), property.is_inherited()),
    };
    let Some(specified) = specified else {
        return if property.is_inherited() {
            inherit(None)
        } else {
            (property.initial_value(), false)
        };
    };
    match &specified.value {
        StyleValue::Initial => (property.initial_value(), false),
        StyleValue::Inherit => inherit(specified.logical_alias),
        StyleValue::Unset | StyleValue::GuaranteedInvalid | StyleValue::Revert | StyleValue::RevertLayer => {
            if property.is_inherited() {
                inherit(specified.logical_alias)
            } else {
                (property.initial_value(), false)
            }
        }
        value => (value.clone(), false),
    }
}

fn absolute_size_index(keyword: Keyword) -> Option<usize> {
    ABSOLUTE_SIZES.iter().position(|size| *size == keyword)
}

/// [CSS Fonts 4 § 2.5](https://www.w3.org/TR/css-fonts-4/#relative-size-value)
///
/// "a smaller or larger value is computed ... relative to the
/// computed font size of the parent element ... by moving to the next
/// entry of the absolute size table". Past either end the size is scaled.
fn step_font_size(parent_size: f32, base: f32, ratios: &[f32; 8], larger: bool) -> f32 {
    let mut ladder = ratios.iter().map(|ratio| base * ratio);
    if larger {
        ladder
            .find(|size| *size > parent_size + f32::EPSILON)
            .unwrap_or(parent_size * LADDER_OVERFLOW_FACTOR)
    } else {
        ladder
            .rev()
            .find(|size| *size < parent_size - f32::EPSILON)
            .unwrap_or(parent_size / LADDER_OVERFLOW_FACTOR)
    }
}

/// [MathML Core § 3.3](https://w3c.github.io/mathml-core/#dfn-scale-factor)
///
/// Scale between the inherited and the computed `math-depth`: 0.71 per
/// step, inverted when the depth decreases.
#[must_use]
pub fn math_font_size_scale(inherited_depth: i32, computed_depth: i32) -> f32 {
    let delta = computed_depth - inherited_depth;
    let scale = MATH_SCRIPT_SCALE.powi(delta.abs());
    if delta < 0 { 1.0 / scale } else { scale }
}

/// One `font-size` value in pixels. Relative values resolve against
/// `parent_size`; absolute keywords against `base`, the medium size.
fn font_size_from_value(
    value: &StyleValue,
    parent_size: f32,
    base: f32,
    context: &AbsolutizeContext,
    config: &StyleConfig,
    math_scale: f32,
) -> Option<f32> {
    Some(match value {
        StyleValue::Keyword(Keyword::Smaller) => step_font_size(parent_size, base, &config.absolute_size_ratios, false),
        StyleValue::Keyword(Keyword::Larger) => step_font_size(parent_size, base, &config.absolute_size_ratios, true),
        StyleValue::Keyword(Keyword::Math) => parent_size * math_scale,
        StyleValue::Keyword(keyword) => base * config.absolute_size_ratios[absolute_size_index(*keyword)?],
        StyleValue::Length(length) => length.to_px(context),
        StyleValue::Percentage(percentage) => parent_size * percentage / 100.0,
        StyleValue::Calculated(node) => node.resolve(context, Some(parent_size))?,
        _ => return None,
    })
}

/// Re-run the `font-size` cascade down the ancestor chain with the
/// monospace medium size, for an element whose family is exactly
/// `monospace` and whose size is inherited. An ancestor's `unset` restarts
/// from the monospace medium size like `initial`. `calc()` and `math` sizes
/// are passed through unchanged.
fn monospace_font_size(ancestors: &[Arc<ComputedProperties>], config: &StyleConfig, viewport: (f32, f32)) -> f32 {
    let base = config.default_monospace_font_size;
    let root_metrics = ancestors
        .first()
        .map_or_else(|| FontMetrics::from_font_size(config.default_user_font_size), |root| *root.font_metrics());
    let mut size = base;
    for ancestor in ancestors {
        let Some(value) = ancestor.specified_font_size() else {
            continue;
        };
        size = match value {
            StyleValue::Initial | StyleValue::Unset => base,
            StyleValue::Inherit
            | StyleValue::GuaranteedInvalid
            | StyleValue::Calculated(_)
            | StyleValue::Keyword(Keyword::Math) => continue,
            value => {
                let context = AbsolutizeContext {
                    viewport,
                    font_metrics: FontMetrics::from_font_size(size),
                    root_font_metrics: root_metrics,
                };
                font_size_from_value(value, size, base, &context, config, 1.0).unwrap_or(size)
            }
        };
    }
    size
}

/// [CSS Fonts 4 § 2.2 Relative weights](https://www.w3.org/TR/css-fonts-4/#relative-weights)
fn relative_font_weight(parent: f32, bolder: bool) -> f32 {
    match (bolder, parent) {
        (true, w) if w < 350.0 => 400.0,
        (true, w) if w < 550.0 => 700.0,
        (true, w) => w.max(900.0),
        (false, w) if w < 550.0 => w.min(100.0),
        (false, w) if w < 750.0 => 400.0,
        (false, _) => 700.0,
    }
}

fn font_weight_from_value(value: &StyleValue, parent_weight: f32) -> f32 {
    match value {
        StyleValue::Number(weight) => *weight,
        StyleValue::Keyword(Keyword::Bold) => 700.0,
        StyleValue::Keyword(Keyword::Bolder) => relative_font_weight(parent_weight, true),
        StyleValue::Keyword(Keyword::Lighter) => relative_font_weight(parent_weight, false),
        _ => 400.0,
    }
}

/// [CSS Fonts 4 § 2.4](https://www.w3.org/TR/css-fonts-4/#font-stretch-prop)
fn font_stretch_percentage(value: &StyleValue) -> f32 {
    match value {
        StyleValue::Percentage(percentage) => *percentage,
        StyleValue::Keyword(keyword) => match keyword {
            Keyword::UltraCondensed => 50.0,
            Keyword::ExtraCondensed => 62.5,
            Keyword::Condensed => 75.0,
            Keyword::SemiCondensed => 87.5,
            Keyword::SemiExpanded => 112.5,
            Keyword::Expanded => 125.0,
            Keyword::ExtraExpanded => 150.0,
            Keyword::UltraExpanded => 200.0,
            _ => 100.0,
        },
        _ => 100.0,
    }
}

/// [MathML Core § 3.3](https://w3c.github.io/mathml-core/#the-math-script-level-property)
fn compute_math_depth(computed: &mut ComputedProperties, parent: Option<&ComputedProperties>) {
    let inherited = parent.map_or(0, ComputedProperties::math_depth);
    let depth = match computed.base_value(PropertyId::MathDepth) {
        // "If the specified value of math-depth is auto-add and the
        // inherited value of math-style is compact then the computed value
        // of math-depth of the element is its inherited value plus one."
        StyleValue::MathDepth(MathDepth::AutoAdd) => {
            let compact = parent.is_some_and(|p| p.property(PropertyId::MathStyle).is_keyword(Keyword::Compact));
            if compact { inherited.saturating_add(1) } else { inherited }
        }
        StyleValue::MathDepth(MathDepth::Add(delta)) => inherited.saturating_add(*delta),
        StyleValue::MathDepth(MathDepth::Integer(depth)) | StyleValue::Integer(depth) => *depth,
        _ => inherited,
    };
    let inherited_flag = computed.is_inherited(PropertyId::MathDepth);
    computed.set(PropertyId::MathDepth, StyleValue::Integer(depth), inherited_flag);
    computed.set_math_depth(depth);
}

/// [CSS Fonts 4 § 2](https://www.w3.org/TR/css-fonts-4/#basic-font-props)
///
/// Size, weight, stretch and style, then the font list and its metrics,
/// then `line-height`.
fn compute_font(computed: &mut ComputedProperties, ctx: &mut ResolveContext<'_>) {
    let config = ctx.config;
    let parent_metrics = ctx
        .parent()
        .map_or_else(|| FontMetrics::from_font_size(config.default_user_font_size), |p| *p.font_metrics());
    let parent_size = parent_metrics.font_size;
    let families = FamilyName::list_from_value(computed.base_value(PropertyId::FontFamily));
    let monospace = matches!(families.as_slice(), [FamilyName::Generic(Keyword::Monospace)]);
    let base = if monospace {
        config.default_monospace_font_size
    } else {
        config.default_user_font_size
    };

    let font_size = if computed.is_inherited(PropertyId::FontSize) {
        if monospace {
            monospace_font_size(ctx.ancestors, config, ctx.viewport)
        } else {
            parent_size
        }
    } else {
        let context = AbsolutizeContext {
            viewport: ctx.viewport,
            font_metrics: parent_metrics,
            root_font_metrics: ctx.root_metrics(),
        };
        let math_scale = math_font_size_scale(ctx.parent().map_or(0, ComputedProperties::math_depth), computed.math_depth());
        font_size_from_value(
            computed.base_value(PropertyId::FontSize),
            parent_size,
            base,
            &context,
            config,
            math_scale,
        )
        .unwrap_or(parent_size)
    };
    let font_size = font_size.max(0.0);

    let parent_weight = ctx
        .parent()
        .and_then(|p| p.property(PropertyId::FontWeight).as_number())
        .unwrap_or(400.0);
    let weight = font_weight_from_value(computed.base_value(PropertyId::FontWeight), parent_weight);
    let stretch = font_stretch_percentage(computed.base_value(PropertyId::FontStretch));
    let italic = matches!(
        computed.base_value(PropertyId::FontStyle).as_keyword(),
        Some(Keyword::Italic | Keyword::Oblique)
    );
    let descriptor = FontDescriptor {
        weight,
        italic,
        stretch,
    };
    let font_list = ctx.fonts.resolve(config, &families, descriptor, ctx.fetcher);
    let mut metrics = font_list.metrics(font_size);

    let own_context = AbsolutizeContext {
        viewport: ctx.viewport,
        font_metrics: metrics,
        root_font_metrics: if ctx.is_root { metrics } else { ctx.root_metrics() },
    };
    let line_height_inherited = computed.is_inherited(PropertyId::LineHeight);
    let (line_height, line_height_value) = match computed.base_value(PropertyId::LineHeight) {
        StyleValue::Number(factor) => (factor * font_size, StyleValue::Number(*factor)),
        StyleValue::Length(length) => {
            let px = length.to_px(&own_context);
            (px, StyleValue::px(px))
        }
        StyleValue::Percentage(percentage) => {
            let px = font_size * percentage / 100.0;
            (px, StyleValue::px(px))
        }
        StyleValue::Calculated(node) => {
            let px = node.resolve(&own_context, Some(font_size)).unwrap_or(metrics.line_height);
            (px, StyleValue::px(px))
        }
        _ => (metrics.line_height, StyleValue::Keyword(Keyword::Normal)),
    };
    metrics.line_height = line_height;

    let inherited = |property| computed.is_inherited(property);
    let (size_inherited, weight_inherited, stretch_inherited) = (
        inherited(PropertyId::FontSize),
        inherited(PropertyId::FontWeight),
        inherited(PropertyId::FontStretch),
    );
    computed.set(PropertyId::FontSize, StyleValue::px(font_size), size_inherited);
    computed.set(PropertyId::FontWeight, StyleValue::Number(weight), weight_inherited);
    computed.set(PropertyId::FontStretch, StyleValue::Percentage(stretch), stretch_inherited);
    computed.set(PropertyId::LineHeight, line_height_value, line_height_inherited);
    computed.set_font_list(font_list);
    computed.set_font_metrics(metrics);
}

fn absolutize_all(computed: &mut ComputedProperties, context: &AbsolutizeContext) {
    for property in PropertyId::physical_longhands() {
        let value = computed.base_value(property);
        if matches!(
            value,
            StyleValue::Length(_) | StyleValue::Calculated(_) | StyleValue::List(_)
        ) {
            let absolutized = value.absolutize(context);
            let inherited = computed.is_inherited(property);
            computed.set(property, absolutized, inherited);
        }
    }
}

/// [CSS Backgrounds 3 § 4.3](https://www.w3.org/TR/css-backgrounds-3/#border-width)
///
/// "Computed value: absolute length, snapped as a border width; zero if
/// the border style is none or hidden"
fn compute_border_widths(computed: &mut ComputedProperties) {
    const SIDES: [(PropertyId, PropertyId); 4] = [
        (PropertyId::BorderTopWidth, PropertyId::BorderTopStyle),
        (PropertyId::BorderRightWidth, PropertyId::BorderRightStyle),
        (PropertyId::BorderBottomWidth, PropertyId::BorderBottomStyle),
        (PropertyId::BorderLeftWidth, PropertyId::BorderLeftStyle),
    ];
    for (width, style) in SIDES {
        let no_border = matches!(
            computed.base_value(style).as_keyword(),
            Some(Keyword::None | Keyword::Hidden)
        );
        let px = if no_border {
            0.0
        } else {
            match computed.base_value(width) {
                StyleValue::Keyword(Keyword::Thin) => 1.0,
                StyleValue::Keyword(Keyword::Thick) => 5.0,
                StyleValue::Keyword(_) => 3.0,
                value => match value.as_px() {
                    Some(px) => px,
                    None => continue,
                },
            }
        };
        let inherited = computed.is_inherited(width);
        computed.set(width, StyleValue::px(px), inherited);
    }
}

/// [CSS Color 4 § 4.2](https://www.w3.org/TR/css-color-4/#resolving-other-colors)
///
/// "if currentcolor is the specified value of the color property, it is
/// treated as if it were inherit"
fn compute_current_color(computed: &mut ComputedProperties, parent: Option<&ComputedProperties>) {
    if computed.base_value(PropertyId::Color).is_keyword(Keyword::Currentcolor) {
        let color = parent.map_or_else(
            || PropertyId::Color.initial_value(),
            |parent| parent.property(PropertyId::Color).clone(),
        );
        computed.set(PropertyId::Color, color, true);
    }
}

/// [CSS Display 3 § 2.7](https://www.w3.org/TR/css-display-3/#transformations)
///
/// "Some layout effects require blockification or inlinification of the
/// box type".
fn blockified(display: Keyword) -> Keyword {
    match display {
        // "For legacy reasons, if an inline block box (inline flow-root)
        // is blockified, it becomes a block box".
        Keyword::Inline | Keyword::InlineBlock => Keyword::Block,
        Keyword::InlineFlex => Keyword::Flex,
        Keyword::InlineGrid => Keyword::Grid,
        Keyword::InlineTable => Keyword::Table,
        Keyword::Math | Keyword::InlineMath => Keyword::BlockMath,
        // "If a layout-internal box is blockified, its inner display type
        // converts to flow so that it becomes a block container."
        Keyword::TableRow
        | Keyword::TableCell
        | Keyword::TableRowGroup
        | Keyword::TableHeaderGroup
        | Keyword::TableFooterGroup
        | Keyword::TableColumn
        | Keyword::TableColumnGroup
        | Keyword::TableCaption => Keyword::Block,
        other => other,
    }
}

/// [MathML Core § 2.1.2](https://w3c.github.io/mathml-core/#new-display-math-value)
///
/// `display: math` on non-MathML elements computes to flow; MathML table
/// elements get the matching table display types.
fn math_display(display: Keyword, ctx: &ResolveContext<'_>) -> Keyword {
    let block = display == Keyword::BlockMath;
    let mathml_name = ctx
        .element
        .filter(|element| ctx.pseudo_element.is_none() && element.namespace() == Some(namespace::MATHML))
        .map(ElementData::local_name);
    match mathml_name {
        None => {
            if block {
                Keyword::Block
            } else {
                Keyword::Inline
            }
        }
        Some("mtable") => {
            if block {
                Keyword::Table
            } else {
                Keyword::InlineTable
            }
        }
        Some("mtr") => Keyword::TableRow,
        Some("mtd") => Keyword::TableCell,
        Some(_) => display,
    }
}

fn transform_box_type(computed: &mut ComputedProperties, ctx: &ResolveContext<'_>) {
    let original = computed.display();
    let mut display = original;
    if matches!(display, Keyword::Math | Keyword::InlineMath | Keyword::BlockMath) {
        display = math_display(display, ctx);
    }

    let positioned = matches!(
        computed.base_value(PropertyId::Position).as_keyword(),
        Some(Keyword::Absolute | Keyword::Fixed)
    );
    // [CSS 2.1 § 9.7](https://www.w3.org/TR/CSS21/visuren.html#dis-pos-flo)
    // "Otherwise, if 'position' has the value 'absolute' or 'fixed', the
    // box is absolutely positioned, the computed value of 'float' is 'none'"
    if positioned && !computed.base_value(PropertyId::Float).is_keyword(Keyword::None) {
        computed.set(PropertyId::Float, StyleValue::Keyword(Keyword::None), false);
    }
    let floated = !computed.base_value(PropertyId::Float).is_keyword(Keyword::None);
    let parent_is_flex_or_grid = !ctx.is_root
        && ctx.parent().is_some_and(|parent| {
            matches!(
                parent.display(),
                Keyword::Flex | Keyword::InlineFlex | Keyword::Grid | Keyword::InlineGrid
            )
        });

    display = match display {
        Keyword::None => Keyword::None,
        // "If the root element ... has display: contents, the root
        // element's box is treated as display: block"
        Keyword::Contents if ctx.is_root => Keyword::Block,
        Keyword::Contents => Keyword::Contents,
        // <br> is always inline.
        display if ctx.is_html_element("br") => display,
        display if ctx.is_root || positioned || floated || parent_is_flex_or_grid => blockified(display),
        display => display,
    };
    if display != original {
        let inherited = computed.is_inherited(PropertyId::Display);
        computed.set(PropertyId::Display, StyleValue::Keyword(display), inherited);
    }
}

/// [CSS Overflow 3 § 3](https://www.w3.org/TR/css-overflow-3/#overflow-control)
///
/// "The visible/clip values of overflow compute to auto/hidden
/// (respectively) if one of overflow-x or overflow-y is neither visible
/// nor clip."
fn compute_overflow(computed: &mut ComputedProperties) {
    let x = computed.base_value(PropertyId::OverflowX).as_keyword();
    let y = computed.base_value(PropertyId::OverflowY).as_keyword();
    let visible_or_clip = |keyword: Option<Keyword>| matches!(keyword, Some(Keyword::Visible | Keyword::Clip));
    if visible_or_clip(x) == visible_or_clip(y) {
        return;
    }
    for property in [PropertyId::OverflowX, PropertyId::OverflowY] {
        let fixed = match computed.base_value(property).as_keyword() {
            Some(Keyword::Visible) => Keyword::Auto,
            Some(Keyword::Clip) => Keyword::Hidden,
            _ => continue,
        };
        let inherited = computed.is_inherited(property);
        computed.set(property, StyleValue::Keyword(fixed), inherited);
    }
}

/// [CSS Text 3 § 6.1](https://www.w3.org/TR/css-text-3/#text-align-property)
fn compute_text_align(computed: &mut ComputedProperties, ctx: &ResolveContext<'_>) {
    let resolved = match computed.base_value(PropertyId::TextAlign).as_keyword() {
        // "match-parent: This value behaves the same as inherit (computes
        // to its parent's computed value) except that an inherited start
        // or end keyword is interpreted against the parent's direction
        // value and results in a computed value of either left or right."
        Some(Keyword::MatchParent) => {
            let (value, direction) = ctx.parent().map_or((Keyword::Start, Direction::Ltr), |parent| {
                (
                    parent.property(PropertyId::TextAlign).as_keyword().unwrap_or(Keyword::Start),
                    parent.direction(),
                )
            });
            let rtl = direction == Direction::Rtl;
            match value {
                Keyword::Start if rtl => Keyword::Right,
                Keyword::Start => Keyword::Left,
                Keyword::End if rtl => Keyword::Left,
                Keyword::End => Keyword::Right,
                other => other,
            }
        }
        // Table header cells centre their text unless an ancestor set
        // text-align explicitly, in which case that value is inherited.
        Some(Keyword::InheritOrCenter) => ctx
            .ancestors
            .iter()
            .rev()
            .find(|ancestor| !ancestor.is_inherited(PropertyId::TextAlign))
            .and_then(|ancestor| ancestor.property(PropertyId::TextAlign).as_keyword())
            .unwrap_or(Keyword::Center),
        _ => return,
    };
    let inherited = computed.is_inherited(PropertyId::TextAlign);
    computed.set(PropertyId::TextAlign, StyleValue::Keyword(resolved), inherited);
}

/// Compute every property of an element or pseudo-element.
#[must_use]
pub fn compute_properties(
    cascaded: &CascadedProperties,
    custom_properties: CustomProperties,
    ctx: &mut ResolveContext<'_>,
) -> ComputedProperties {
    let specified = SpecifiedValues::collect(cascaded, &custom_properties, ctx.element);
    let ancestors = ctx.ancestors;
    let parent = ancestors.last().map(AsRef::as_ref);

    let mut computed = ComputedProperties::initial();
    for property in PropertyId::physical_longhands() {
        let entry = specified.get(property);
        let (value, inherited) = default_value(property, entry, parent);
        computed.set(property, value, inherited);
        computed.set_important(property, entry.is_some_and(|entry| entry.important));
    }
    computed.set_custom_properties(custom_properties);
    computed.set_pseudo_element(ctx.pseudo_element);
    computed.set_logical_context(ctx.logical);
    computed.set_specified_font_size(specified.get(PropertyId::FontSize).map(|entry| entry.value.clone()));

    compute_current_color(&mut computed, parent);
    compute_math_depth(&mut computed, parent);
    compute_font(&mut computed, ctx);

    let context = AbsolutizeContext {
        viewport: ctx.viewport,
        font_metrics: *computed.font_metrics(),
        root_font_metrics: if ctx.is_root {
            *computed.font_metrics()
        } else {
            ctx.root_metrics()
        },
    };
    absolutize_all(&mut computed, &context);
    compute_border_widths(&mut computed);
    transform_box_type(&mut computed, ctx);
    compute_overflow(&mut computed);
    compute_text_align(&mut computed, ctx);
    computed
}

/// [CSSOM View § 4](https://www.w3.org/TR/cssom-view-1/#the-initial-containing-block)
///
/// Style of the viewport: initial values with the default font, a block
/// box the size of the viewport.
#[must_use]
pub fn create_document_style(
    config: &StyleConfig,
    viewport: (f32, f32),
    fonts: &mut FontResolver,
    fetcher: Option<&dyn ResourceFetcher>,
) -> ComputedProperties {
    let mut style = ComputedProperties::initial();
    let families = FamilyName::list_from_value(style.base_value(PropertyId::FontFamily));
    let font_size = config.default_user_font_size;
    let font_list = fonts.resolve(config, &families, FontDescriptor::default(), fetcher);
    let metrics = font_list.metrics(font_size);
    style.set(PropertyId::FontSize, StyleValue::px(font_size), false);
    style.set(PropertyId::FontWeight, StyleValue::Number(400.0), false);
    style.set(PropertyId::FontStretch, StyleValue::Percentage(100.0), false);
    style.set(PropertyId::MathDepth, StyleValue::Integer(0), false);
    style.set_math_depth(0);
    style.set_font_list(font_list);
    style.set_font_metrics(metrics);

    let context = AbsolutizeContext {
        viewport,
        font_metrics: metrics,
        root_font_metrics: metrics,
    };
    absolutize_all(&mut style, &context);
    compute_border_widths(&mut style);
    style.set(PropertyId::Width, StyleValue::px(viewport.0), false);
    style.set(PropertyId::Height, StyleValue::px(viewport.1), false);
    style.set(PropertyId::Display, StyleValue::Keyword(Keyword::Block), false);
    style.set_viewport(Some(viewport));
    style
}

#[cfg(test)]
mod tests {
    use wombat_css::parse_component_values;
    use wombat_dom::DomTree;

    use super::*;
    use crate::cascade::{CascadeLayer, CascadedValue};
    use crate::rule_store::CascadeOrigin;

    fn custom(entries: &[(&str, &str)]) -> CascadedCustomProperties {
        entries
            .iter()
            .map(|(name, value)| ((*name).to_string(), parse_component_values(value)))
            .collect()
    }

    fn serialized(properties: &CustomProperties, name: &str) -> Option<String> {
        properties
            .get(name)
            .map(|values| wombat_css::syntax::serialize(values).trim().to_string())
    }

    fn cascaded(entries: &[(PropertyId, &str)]) -> CascadedProperties {
        let mut cascaded = CascadedProperties::new();
        for (property, css) in entries {
            let value = parse_css_value(*property, &parse_component_values(css)).expect("valid value");
            cascaded.set(
                *property,
                CascadedValue {
                    value,
                    origin: CascadeOrigin::Author,
                    layer: CascadeLayer::Unlayered(None),
                    important: false,
                    logical_alias: None,
                    pending: None,
                },
            );
        }
        cascaded
    }

    fn compute(entries: &[(PropertyId, &str)], ancestors: &[Arc<ComputedProperties>]) -> ComputedProperties {
        let config = StyleConfig::default();
        let mut fonts = FontResolver::new();
        let mut ctx = ResolveContext {
            config: &config,
            element: None,
            pseudo_element: None,
            ancestors,
            is_root: ancestors.is_empty(),
            viewport: (800.0, 600.0),
            logical: LogicalAliasMappingContext::default(),
            fonts: &mut fonts,
            fetcher: None,
        };
        compute_properties(&cascaded(entries), CustomProperties::default(), &mut ctx)
    }

    #[test]
    fn test_custom_properties_substitute_and_inherit() {
        let parent = resolve_custom_properties(&custom(&[("--base", "4px")]), None, None);
        let child = resolve_custom_properties(&custom(&[("--gap", "calc(var(--base) * 2)")]), Some(&parent), None);
        assert_eq!(serialized(&child, "--base").as_deref(), Some("4px"));
        assert!(serialized(&child, "--gap").is_some_and(|gap| gap.starts_with("calc(4px")));

        let unchanged = resolve_custom_properties(&CascadedCustomProperties::default(), Some(&parent), None);
        assert!(Arc::ptr_eq(&unchanged, &parent));
    }

    #[test]
    fn test_custom_property_cycle_is_invalid() {
        let resolved = resolve_custom_properties(
            &custom(&[("--a", "var(--b)"), ("--b", "var(--a)"), ("--c", "var(--a, fallback)")]),
            None,
            None,
        );
        assert!(resolved.get("--a").is_none());
        assert!(resolved.get("--b").is_none());
        assert_eq!(serialized(&resolved, "--c").as_deref(), Some("fallback"));
    }

    #[test]
    fn test_custom_property_initial_removes_inherited_value() {
        let parent = resolve_custom_properties(&custom(&[("--x", "1")]), None, None);
        let child = resolve_custom_properties(&custom(&[("--x", "initial")]), Some(&parent), None);
        assert!(child.get("--x").is_none());
    }

    #[test]
    fn test_attr_substitution_reads_element() {
        let mut tree = DomTree::new();
        let element = tree.create_html_element("div");
        let _ = tree.set_attribute(element, "data-size", "12px");
        let data = tree.as_element(element);
        let resolved = resolve_custom_properties(&custom(&[("--size", "attr(data-size)")]), None, data);
        assert!(resolved.get("--size").is_some());
    }

    #[test]
    fn test_font_size_ladder_steps() {
        let ratios = StyleConfig::default().absolute_size_ratios;
        assert!((step_font_size(16.0, 16.0, &ratios, true) - 19.2).abs() < 1e-4);
        assert!((step_font_size(16.0, 16.0, &ratios, false) - 16.0 * 8.0 / 9.0).abs() < 1e-4);
        assert!((step_font_size(100.0, 16.0, &ratios, true) - 120.0).abs() < 1e-4);
        assert!((step_font_size(5.0, 16.0, &ratios, false) - 5.0 / 1.2).abs() < 1e-4);
    }

    #[test]
    fn test_math_scale_is_symmetric() {
        assert!((math_font_size_scale(0, 2) - 0.5041).abs() < 1e-4);
        assert!((math_font_size_scale(2, 0) * math_font_size_scale(0, 2) - 1.0).abs() < 1e-5);
        assert!((math_font_size_scale(3, 3) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_relative_weights() {
        assert!((relative_font_weight(300.0, true) - 400.0).abs() < f32::EPSILON);
        assert!((relative_font_weight(400.0, true) - 700.0).abs() < f32::EPSILON);
        assert!((relative_font_weight(700.0, true) - 900.0).abs() < f32::EPSILON);
        assert!((relative_font_weight(400.0, false) - 100.0).abs() < f32::EPSILON);
        assert!((relative_font_weight(700.0, false) - 400.0).abs() < f32::EPSILON);
        assert!((relative_font_weight(900.0, false) - 700.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_defaulting() {
        let parent = Arc::new(compute(&[(PropertyId::Color, "red"), (PropertyId::Width, "10px")], &[]));
        let child = compute(&[(PropertyId::Width, "inherit")], std::slice::from_ref(&parent));
        assert_eq!(child.property(PropertyId::Color), parent.property(PropertyId::Color));
        assert!(child.is_inherited(PropertyId::Color));
        assert_eq!(child.property(PropertyId::Width), &StyleValue::px(10.0));

        let unset = compute(&[(PropertyId::Color, "unset"), (PropertyId::Width, "unset")], &[parent]);
        assert!(unset.is_inherited(PropertyId::Color));
        assert_eq!(unset.property(PropertyId::Width), &StyleValue::Keyword(Keyword::Auto));
    }

    #[test]
    fn test_em_lengths_use_own_font_size() {
        let style = compute(&[(PropertyId::FontSize, "20px"), (PropertyId::MarginTop, "2em")], &[]);
        assert_eq!(style.property(PropertyId::MarginTop), &StyleValue::px(40.0));
        assert!((style.font_size() - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_border_width_zero_without_style() {
        let style = compute(
            &[
                (PropertyId::BorderTopWidth, "thick"),
                (PropertyId::BorderTopStyle, "solid"),
                (PropertyId::BorderLeftWidth, "thick"),
            ],
            &[],
        );
        assert_eq!(style.property(PropertyId::BorderTopWidth), &StyleValue::px(5.0));
        assert_eq!(style.property(PropertyId::BorderLeftWidth), &StyleValue::px(0.0));
    }

    #[test]
    fn test_overflow_pairs() {
        let style = compute(&[(PropertyId::OverflowX, "clip"), (PropertyId::OverflowY, "scroll")], &[]);
        assert_eq!(style.property(PropertyId::OverflowX), &StyleValue::Keyword(Keyword::Hidden));
        let style = compute(&[(PropertyId::OverflowX, "visible"), (PropertyId::OverflowY, "clip")], &[]);
        assert_eq!(style.property(PropertyId::OverflowX), &StyleValue::Keyword(Keyword::Visible));
    }

    #[test]
    fn test_root_is_blockified() {
        let root = compute(&[(PropertyId::Display, "inline-flex")], &[]);
        assert_eq!(root.display(), Keyword::Flex);
        let root = compute(&[(PropertyId::Display, "contents")], &[]);
        assert_eq!(root.display(), Keyword::Block);
    }

    #[test]
    fn test_absolute_position_clears_float() {
        let parent = Arc::new(compute(&[], &[]));
        let style = compute(
            &[
                (PropertyId::Position, "absolute"),
                (PropertyId::Float, "left"),
                (PropertyId::Display, "inline-block"),
            ],
            &[parent],
        );
        assert_eq!(style.property(PropertyId::Float), &StyleValue::Keyword(Keyword::None));
        assert_eq!(style.display(), Keyword::Block);
    }

    #[test]
    fn test_document_style_covers_viewport() {
        let mut fonts = FontResolver::new();
        let style = create_document_style(&StyleConfig::default(), (1024.0, 768.0), &mut fonts, None);
        assert_eq!(style.display(), Keyword::Block);
        assert_eq!(style.property(PropertyId::Width), &StyleValue::px(1024.0));
        assert_eq!(style.viewport(), Some((1024.0, 768.0)));
        assert!((style.font_size() - 16.0).abs() < f32::EPSILON);
    }
}
