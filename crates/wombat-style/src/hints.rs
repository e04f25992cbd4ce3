//! Presentational hints from HTML attributes.
//!
//! [HTML § 15.3 Non-replaced elements](https://html.spec.whatwg.org/multipage/rendering.html#non-replaced-elements)
//!
//! "Some attributes are said to map to a CSS property. The user agent is
//! expected to treat such attributes as presentational hints."
//!
//! Hints enter the cascade as author-origin declarations below every author
//! rule. They are never applied to pseudo-elements.

use wombat_css::{
    Declaration, DeclarationBlock, Keyword, PropertyId, StyleValue, parse_component_values, parse_css_value,
};
use wombat_dom::{DomTree, ElementData, NodeId};

/// Source of presentational hints for an element.
pub trait PresentationalHints {
    /// Hints for `element`, or `None` if it has none.
    fn presentational_hints(&self, tree: &DomTree, element: NodeId) -> Option<DeclarationBlock>;

    /// Whether changing attribute `name` can change the hints.
    fn is_presentational_attribute(&self, _name: &str) -> bool {
        false
    }
}

/// The hints HTML defines for the attributes the engine understands:
/// dimension attributes, `bgcolor`, cell `align` and `hidden`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlPresentationalHints;

/// [HTML § 2.3.4.4 Rules for parsing dimension values](https://html.spec.whatwg.org/multipage/common-microsyntaxes.html#rules-for-parsing-dimension-values)
fn parse_dimension_value(input: &str) -> Option<StyleValue> {
    let input = input.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let digits = input.find(|c: char| !c.is_ascii_digit()).unwrap_or(input.len());
    if digits == 0 {
        return None;
    }
    let mut end = digits;
    let rest = &input[digits..];
    if let Some(fraction) = rest.strip_prefix('.') {
        let fraction_digits = fraction.find(|c: char| !c.is_ascii_digit()).unwrap_or(fraction.len());
        if fraction_digits > 0 {
            end += 1 + fraction_digits;
        }
    }
    let value: f32 = input[..end].parse().ok()?;
    if input[end..].starts_with('%') {
        Some(StyleValue::Percentage(value))
    } else {
        Some(StyleValue::px(value))
    }
}

/// [HTML § 2.3.6 Colors](https://html.spec.whatwg.org/multipage/common-microsyntaxes.html#rules-for-parsing-a-legacy-colour-value)
///
/// Named and hex colours; hex digits without a `#` are accepted as well.
fn parse_legacy_color(input: &str) -> Option<StyleValue> {
    let input = input.trim();
    if input.is_empty() || input.eq_ignore_ascii_case("transparent") {
        return None;
    }
    let css = if matches!(input.len(), 3 | 6) && input.chars().all(|c| c.is_ascii_hexdigit()) {
        format!("#{input}")
    } else {
        input.to_string()
    };
    parse_css_value(PropertyId::BackgroundColor, &parse_component_values(&css))
}

fn text_align_hint(input: &str) -> Option<StyleValue> {
    let keyword = match input.trim().to_ascii_lowercase().as_str() {
        "left" => Keyword::Left,
        "right" => Keyword::Right,
        "center" | "middle" => Keyword::Center,
        "justify" => Keyword::Justify,
        _ => return None,
    };
    Some(StyleValue::Keyword(keyword))
}

fn element_hints(element: &ElementData) -> Vec<Declaration> {
    let mut hints = Vec::new();
    let mut push = |property, value| {
        hints.push(Declaration {
            property,
            value,
            important: false,
        });
    };
    if !element.is_html() {
        return Vec::new();
    }
    let name = element.local_name();

    if element.has_attribute("hidden") {
        push(PropertyId::Display, StyleValue::Keyword(Keyword::None));
    }
    if matches!(name, "img" | "video" | "canvas" | "iframe" | "table" | "td" | "th") {
        if let Some(width) = element.attribute("width").and_then(parse_dimension_value) {
            push(PropertyId::Width, width);
        }
        if let Some(height) = element.attribute("height").and_then(parse_dimension_value) {
            push(PropertyId::Height, height);
        }
    }
    if matches!(name, "body" | "table" | "thead" | "tbody" | "tfoot" | "tr" | "td" | "th")
        && let Some(color) = element.attribute("bgcolor").and_then(parse_legacy_color)
    {
        push(PropertyId::BackgroundColor, color);
    }
    if matches!(name, "td" | "th")
        && let Some(align) = element.attribute("align").and_then(text_align_hint)
    {
        push(PropertyId::TextAlign, align);
    }
    hints
}

impl PresentationalHints for HtmlPresentationalHints {
    fn presentational_hints(&self, tree: &DomTree, element: NodeId) -> Option<DeclarationBlock> {
        let declarations = element_hints(tree.as_element(element)?);
        (!declarations.is_empty()).then(|| DeclarationBlock {
            declarations,
            custom_properties: Vec::new(),
        })
    }

    fn is_presentational_attribute(&self, name: &str) -> bool {
        ["hidden", "width", "height", "bgcolor", "align"]
            .iter()
            .any(|attribute| attribute.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints(tag: &str, attributes: &[(&str, &str)]) -> Vec<Declaration> {
        let mut tree = DomTree::new();
        let element = tree.create_html_element(tag);
        for (name, value) in attributes {
            let _ = tree.set_attribute(element, name, value);
        }
        HtmlPresentationalHints
            .presentational_hints(&tree, element)
            .map(|block| block.declarations)
            .unwrap_or_default()
    }

    #[test]
    fn test_dimension_values() {
        assert_eq!(parse_dimension_value("  120px"), Some(StyleValue::px(120.0)));
        assert_eq!(parse_dimension_value("50%"), Some(StyleValue::Percentage(50.0)));
        assert_eq!(parse_dimension_value("12.5"), Some(StyleValue::px(12.5)));
        assert_eq!(parse_dimension_value("12."), Some(StyleValue::px(12.0)));
        assert_eq!(parse_dimension_value("abc"), None);
    }

    #[test]
    fn test_image_dimensions() {
        let declarations = hints("img", &[("width", "100"), ("height", "25%")]);
        assert_eq!(declarations.len(), 2);
        assert_eq!(declarations[0].property, PropertyId::Width);
        assert_eq!(declarations[1].value, StyleValue::Percentage(25.0));
        assert!(hints("div", &[("width", "100")]).is_empty());
    }

    #[test]
    fn test_cell_attributes() {
        let declarations = hints("td", &[("bgcolor", "ff0000"), ("align", "middle")]);
        assert_eq!(declarations[0].property, PropertyId::BackgroundColor);
        assert!(matches!(declarations[0].value, StyleValue::Color(c) if c.r == 255 && c.g == 0));
        assert_eq!(declarations[1].value, StyleValue::Keyword(Keyword::Center));
    }

    #[test]
    fn test_hidden_maps_to_display_none() {
        let declarations = hints("p", &[("hidden", "")]);
        assert_eq!(declarations[0].property, PropertyId::Display);
        assert_eq!(declarations[0].value, StyleValue::Keyword(Keyword::None));
    }
}
