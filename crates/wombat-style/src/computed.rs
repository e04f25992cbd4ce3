//! Computed values for one element or pseudo-element.
//!
//! [§ 4.4 Computed Values](https://www.w3.org/TR/css-cascade-5/#computed)
//! "The computed value is the result of resolving the specified value as
//! defined in the 'Computed Value' line of the property definition table,
//! generally absolutizing it in preparation for inheritance."
//!
//! Every physical longhand has a slot in a dense array indexed by
//! [`PropertyId::index`]. Animations write to a parallel set of slots that
//! shadow the base value unless the base value was declared `!important`.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use wombat_css::property::PHYSICAL_LONGHAND_COUNT;
use wombat_css::{
    Color, ComponentValue, Direction, FontMetrics, Keyword, LogicalAliasMappingContext, PropertyId,
    PseudoClassBitmap, PseudoElement, StyleValue, WritingMode,
};

use crate::font::FontList;

/// Computed custom properties, shared between an element and the children
/// that inherit them unchanged.
pub type CustomProperties = Arc<FxHashMap<String, Vec<ComponentValue>>>;

/// Computed properties of an element.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedProperties {
    values: Vec<StyleValue>,
    animated: Vec<Option<StyleValue>>,
    important: Vec<bool>,
    inherited: Vec<bool>,
    custom_properties: CustomProperties,
    font_list: FontList,
    font_metrics: FontMetrics,
    math_depth: i32,
    writing_mode: WritingMode,
    direction: Direction,
    attempted_pseudo_classes: PseudoClassBitmap,
    pseudo_element: Option<PseudoElement>,
    viewport: Option<(f32, f32)>,
    specified_font_size: Option<StyleValue>,
}

impl Default for ComputedProperties {
    fn default() -> Self {
        Self::initial()
    }
}

impl ComputedProperties {
    /// Every property at its initial value.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            values: PropertyId::physical_longhands().map(PropertyId::initial_value).collect(),
            animated: vec![None; PHYSICAL_LONGHAND_COUNT],
            important: vec![false; PHYSICAL_LONGHAND_COUNT],
            inherited: vec![false; PHYSICAL_LONGHAND_COUNT],
            custom_properties: CustomProperties::default(),
            font_list: FontList::default(),
            font_metrics: FontMetrics::default(),
            math_depth: 0,
            writing_mode: WritingMode::default(),
            direction: Direction::default(),
            attempted_pseudo_classes: PseudoClassBitmap::default(),
            pseudo_element: None,
            viewport: None,
            specified_font_size: None,
        }
    }

    fn slot(property: PropertyId) -> usize {
        debug_assert!(property.is_physical_longhand(), "{property} has no computed slot");
        property.index().unwrap_or_default()
    }

    /// The value with animations applied.
    #[must_use]
    pub fn property(&self, property: PropertyId) -> &StyleValue {
        let slot = Self::slot(property);
        match &self.animated[slot] {
            Some(animated) if !self.important[slot] => animated,
            _ => &self.values[slot],
        }
    }

    /// The value without animations.
    #[must_use]
    pub fn base_value(&self, property: PropertyId) -> &StyleValue {
        &self.values[Self::slot(property)]
    }

    /// Set a base value. `inherited` records that it came from the parent.
    pub fn set(&mut self, property: PropertyId, value: StyleValue, inherited: bool) {
        let slot = Self::slot(property);
        self.values[slot] = value;
        self.inherited[slot] = inherited;
    }

    /// Whether the base value came from inheritance rather than a
    /// declaration. Inherited properties with nothing declared count as
    /// inherited even on the root.
    #[must_use]
    pub fn is_inherited(&self, property: PropertyId) -> bool {
        self.inherited[Self::slot(property)]
    }

    /// Mark the base value as declared `!important`, which makes it win
    /// over animations.
    pub fn set_important(&mut self, property: PropertyId, important: bool) {
        self.important[Self::slot(property)] = important;
    }

    /// Whether the base value was declared `!important`.
    #[must_use]
    pub fn is_important(&self, property: PropertyId) -> bool {
        self.important[Self::slot(property)]
    }

    /// Set an animated value.
    pub fn set_animated(&mut self, property: PropertyId, value: StyleValue) {
        self.animated[Self::slot(property)] = Some(value);
    }

    /// The animated value, if any.
    #[must_use]
    pub fn animated_value(&self, property: PropertyId) -> Option<&StyleValue> {
        self.animated[Self::slot(property)].as_ref()
    }

    /// Drop every animated value.
    pub fn clear_animated(&mut self) {
        self.animated.iter_mut().for_each(|slot| *slot = None);
    }

    /// Whether any animated value is present.
    #[must_use]
    pub fn has_animated_values(&self) -> bool {
        self.animated.iter().any(Option::is_some)
    }

    /// [§ 4.2 currentcolor](https://www.w3.org/TR/css-color-4/#currentcolor-color)
    ///
    /// A colour-valued property as a colour. `currentcolor` resolves to
    /// this element's `color`.
    #[must_use]
    pub fn color_value(&self, property: PropertyId) -> Option<Color> {
        match self.property(property) {
            StyleValue::Color(color) => Some(*color),
            StyleValue::Keyword(Keyword::Currentcolor) if property != PropertyId::Color => {
                self.color_value(PropertyId::Color)
            }
            _ => None,
        }
    }

    /// The `display` keyword.
    #[must_use]
    pub fn display(&self) -> Keyword {
        self.property(PropertyId::Display).as_keyword().unwrap_or(Keyword::Inline)
    }

    /// Computed font size in pixels.
    #[must_use]
    pub const fn font_size(&self) -> f32 {
        self.font_metrics.font_size
    }

    /// Computed line height in pixels.
    #[must_use]
    pub const fn line_height(&self) -> f32 {
        self.font_metrics.line_height
    }

    /// Metrics for font-relative units.
    #[must_use]
    pub const fn font_metrics(&self) -> &FontMetrics {
        &self.font_metrics
    }

    /// Set the metrics for font-relative units.
    pub const fn set_font_metrics(&mut self, metrics: FontMetrics) {
        self.font_metrics = metrics;
    }

    /// The resolved font list.
    #[must_use]
    pub const fn font_list(&self) -> &FontList {
        &self.font_list
    }

    /// Set the resolved font list.
    pub fn set_font_list(&mut self, fonts: FontList) {
        self.font_list = fonts;
    }

    /// Computed `math-depth`.
    #[must_use]
    pub const fn math_depth(&self) -> i32 {
        self.math_depth
    }

    /// Set the computed `math-depth`.
    pub const fn set_math_depth(&mut self, depth: i32) {
        self.math_depth = depth;
    }

    /// Computed `writing-mode`.
    #[must_use]
    pub const fn writing_mode(&self) -> WritingMode {
        self.writing_mode
    }

    /// Computed `direction`.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Record the writing mode and direction.
    pub const fn set_logical_context(&mut self, context: LogicalAliasMappingContext) {
        self.writing_mode = context.writing_mode;
        self.direction = context.direction;
    }

    /// The context logical properties of this element map through.
    #[must_use]
    pub const fn logical_alias_mapping_context(&self) -> LogicalAliasMappingContext {
        LogicalAliasMappingContext {
            writing_mode: self.writing_mode,
            direction: self.direction,
        }
    }

    /// Pseudo-classes the matcher consulted while matching this element.
    #[must_use]
    pub const fn attempted_pseudo_classes(&self) -> PseudoClassBitmap {
        self.attempted_pseudo_classes
    }

    /// Record the consulted pseudo-classes.
    pub const fn set_attempted_pseudo_classes(&mut self, attempted: PseudoClassBitmap) {
        self.attempted_pseudo_classes = attempted;
    }

    /// Computed custom properties.
    #[must_use]
    pub const fn custom_properties(&self) -> &CustomProperties {
        &self.custom_properties
    }

    /// One computed custom property.
    #[must_use]
    pub fn custom_property(&self, name: &str) -> Option<&[ComponentValue]> {
        self.custom_properties.get(name).map(Vec::as_slice)
    }

    /// Set the computed custom properties.
    pub fn set_custom_properties(&mut self, properties: CustomProperties) {
        self.custom_properties = properties;
    }

    /// The pseudo-element these properties belong to.
    #[must_use]
    pub const fn pseudo_element(&self) -> Option<PseudoElement> {
        self.pseudo_element
    }

    /// Set the pseudo-element.
    pub const fn set_pseudo_element(&mut self, pseudo: Option<PseudoElement>) {
        self.pseudo_element = pseudo;
    }

    /// Viewport size, recorded on the document style only.
    #[must_use]
    pub const fn viewport(&self) -> Option<(f32, f32)> {
        self.viewport
    }

    /// Record the viewport size.
    pub const fn set_viewport(&mut self, viewport: Option<(f32, f32)>) {
        self.viewport = viewport;
    }

    /// The declared `font-size` after substitution, kept so descendants
    /// can recompute sizes against a different monospace base.
    #[must_use]
    pub const fn specified_font_size(&self) -> Option<&StyleValue> {
        self.specified_font_size.as_ref()
    }

    /// Record the declared `font-size`.
    pub fn set_specified_font_size(&mut self, value: Option<StyleValue>) {
        self.specified_font_size = value;
    }
}

impl Serialize for ComputedProperties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for property in PropertyId::physical_longhands() {
            map.serialize_entry(property.name(), self.property(property))?;
        }
        let mut custom: Vec<_> = self.custom_properties.iter().collect();
        custom.sort_by(|a, b| a.0.cmp(b.0));
        for (name, value) in custom {
            map.serialize_entry(name, &wombat_css::syntax::serialize(value))?;
        }
        map.serialize_entry("-wombat-font-list", &self.font_list)?;
        map.serialize_entry("-wombat-line-height", &self.font_metrics.line_height)?;
        map.serialize_entry("-wombat-math-depth", &self.math_depth)?;
        if let Some(pseudo) = self.pseudo_element {
            map.serialize_entry("-wombat-pseudo-element", &pseudo)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_animated_value_shadows_base_unless_important() {
        let mut properties = ComputedProperties::initial();
        properties.set(PropertyId::Opacity, StyleValue::Number(1.0), false);
        properties.set_animated(PropertyId::Opacity, StyleValue::Number(0.5));
        assert_eq!(properties.property(PropertyId::Opacity), &StyleValue::Number(0.5));
        assert_eq!(properties.base_value(PropertyId::Opacity), &StyleValue::Number(1.0));

        properties.set_important(PropertyId::Opacity, true);
        assert_eq!(properties.property(PropertyId::Opacity), &StyleValue::Number(1.0));

        properties.clear_animated();
        assert!(!properties.has_animated_values());
    }

    #[test]
    fn test_currentcolor_resolves_against_color() {
        let mut properties = ComputedProperties::initial();
        properties.set(PropertyId::Color, StyleValue::Color(Color::rgb(1, 2, 3)), false);
        assert_eq!(properties.color_value(PropertyId::BorderTopColor), Some(Color::rgb(1, 2, 3)));
    }

    #[test]
    fn test_serializes_as_json_object() {
        let properties = ComputedProperties::initial();
        let json = serde_json::to_value(&properties).unwrap();
        assert_eq!(json["display"]["value"], "inline");
        assert_eq!(json["-wombat-math-depth"], 0);
    }
}
