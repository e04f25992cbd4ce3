//! The stylesheet object model.
//!
//! [CSS Object Model § 6.4](https://www.w3.org/TR/cssom-1/#css-rules)
//!
//! [`Stylesheet::parse`] runs the generic parser and then interprets each
//! raw rule: selectors are parsed and absolutized against their parent
//! style rule, declarations are parsed into [`StyleValue`]s, layer names
//! are qualified, and `@supports` conditions are decided. Anything the
//! engine does not understand is dropped, per CSS error recovery.

use std::sync::atomic::{AtomicUsize, Ordering};

use wombat_common::url::resolve_url;
use wombat_common::warning::warn_once;

use crate::media::MediaQueryList;
use crate::parse_value::parse_css_value;
use crate::property::{PropertyId, is_custom_property_name};
use crate::selector::{SelectorList, parse_selector_list};
use crate::supports::evaluate_supports_condition;
use crate::syntax::{
    BlockItem, CSSParser, ComponentValue, RawDeclaration, RawRule, parse_declaration_list, serialize,
    split_on_commas,
};
use crate::tokenizer::CSSToken;
use crate::value::StyleValue;

/// Anonymous layers get unique names so they never merge with each other.
static ANONYMOUS_LAYER_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// [§ 6.4.1 CSS declarations](https://www.w3.org/TR/cssom-1/#css-declarations)
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// The property, possibly a shorthand or a logical alias.
    pub property: PropertyId,
    /// The parsed value.
    pub value: StyleValue,
    /// `!important`
    pub important: bool,
}

/// A custom property declaration. The value stays as raw component values.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomPropertyDeclaration {
    /// Name including the leading `--`. Case-sensitive.
    pub name: String,
    /// Raw value.
    pub value: Vec<ComponentValue>,
    /// `!important`
    pub important: bool,
}

/// [§ 6.6 CSS Declaration Blocks](https://www.w3.org/TR/cssom-1/#css-declaration-blocks)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeclarationBlock {
    /// Regular declarations in source order.
    pub declarations: Vec<Declaration>,
    /// Custom property declarations in source order.
    pub custom_properties: Vec<CustomPropertyDeclaration>,
}

impl DeclarationBlock {
    /// Interpret raw declarations. Unknown properties and invalid values
    /// are dropped.
    #[must_use]
    pub fn from_raw(raw: Vec<RawDeclaration>) -> Self {
        let mut block = Self::default();
        for declaration in raw {
            if is_custom_property_name(&declaration.name) {
                block.custom_properties.push(CustomPropertyDeclaration {
                    name: declaration.name,
                    value: declaration.value,
                    important: declaration.important,
                });
                continue;
            }
            let Some(property) = PropertyId::parse(&declaration.name) else {
                warn_once("CSS", &format!("unsupported property '{}'", declaration.name));
                continue;
            };
            match parse_css_value(property, &declaration.value) {
                Some(value) => block.declarations.push(Declaration {
                    property,
                    value,
                    important: declaration.important,
                }),
                None => log::debug!(
                    target: "wombat::css",
                    "dropping invalid declaration {}: {}",
                    declaration.name,
                    serialize(&declaration.value)
                ),
            }
        }
        block
    }

    /// [§ 6.7.1 The style attribute](https://www.w3.org/TR/cssom-1/#the-elementcssinlinestyle-mixin)
    #[must_use]
    pub fn parse_style_attribute(css: &str) -> Self {
        Self::from_raw(parse_declaration_list(css))
    }

    /// Whether the block has no declarations at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty() && self.custom_properties.is_empty()
    }
}

/// [§ 6.4.3 CSSStyleRule](https://www.w3.org/TR/cssom-1/#the-cssstylerule-interface)
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    /// Selectors as written. Nested rules may use `&` or a leading combinator.
    pub selectors: SelectorList,
    /// Selectors with `&` replaced by the parent rule's selectors.
    pub absolutized_selectors: SelectorList,
    /// Declarations that appear before any nested rule.
    pub declarations: DeclarationBlock,
    /// Nested rules, in order.
    pub child_rules: Vec<CssRule>,
    /// Qualified name of the enclosing cascade layer.
    pub layer: Option<String>,
    /// Position in the sheet, in pre-order.
    pub index: usize,
}

/// [CSS Nesting § 3.2](https://www.w3.org/TR/css-nesting-1/#nested-declarations-rule)
///
/// Declarations that follow a nested rule inside a style rule. They apply
/// with the parent rule's selectors but keep their own position.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedDeclarationsRule {
    /// The parent style rule's absolutized selectors.
    pub parent_selectors: SelectorList,
    /// The declarations.
    pub declarations: DeclarationBlock,
    /// Qualified name of the enclosing cascade layer.
    pub layer: Option<String>,
    /// Position in the sheet, in pre-order.
    pub index: usize,
}

/// One `src` entry of an `@font-face` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontFaceSource {
    /// `url(...) format(...)?`, already resolved against the sheet.
    Url {
        /// Absolute URL.
        url: String,
        /// The `format()` hint, lowercased.
        format: Option<String>,
    },
    /// `local(...)`
    Local(String),
}

/// [CSS Fonts 4 § 4.1](https://www.w3.org/TR/css-fonts-4/#font-face-rule)
#[derive(Debug, Clone, PartialEq)]
pub struct FontFaceRule {
    /// `font-family` descriptor.
    pub family: String,
    /// `src` descriptor.
    pub sources: Vec<FontFaceSource>,
    /// `font-weight` descriptor as an inclusive range.
    pub weight: (u16, u16),
    /// `font-style`: true for italic or oblique.
    pub italic: bool,
    /// `font-stretch` as a percentage.
    pub stretch: f32,
}

/// A keyframe block inside `@keyframes`.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    /// Offsets in `[0, 1]`. `from, 50%` gives two offsets.
    pub offsets: Vec<f32>,
    /// Declarations, with `!important` ones removed.
    pub declarations: DeclarationBlock,
}

/// [CSS Animations § 3](https://www.w3.org/TR/css-animations-1/#keyframes)
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframesRule {
    /// The animation name.
    pub name: String,
    /// Keyframe blocks in source order.
    pub keyframes: Vec<Keyframe>,
    /// Qualified name of the enclosing cascade layer.
    pub layer: Option<String>,
}

/// [CSS Cascade 5 § 6.4.2](https://www.w3.org/TR/css-cascade-5/#layer-block)
#[derive(Debug, Clone, PartialEq)]
pub struct LayerBlockRule {
    /// Qualified layer name. Anonymous layers get a generated name.
    pub name: String,
    /// Rules inside the block.
    pub rules: Vec<CssRule>,
}

/// [CSS Cascade 5 § 6.4.2](https://www.w3.org/TR/css-cascade-5/#layer-empty)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerStatementRule {
    /// Qualified layer names, in declaration order.
    pub names: Vec<String>,
}

/// [CSS Cascade 5 § 2](https://www.w3.org/TR/css-cascade-5/#at-import)
///
/// Imports are recorded but never fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRule {
    /// Absolute URL, when it resolves.
    pub url: String,
    /// `layer` or `layer(name)`, qualified.
    pub layer: Option<String>,
    /// Media the import applies to.
    pub media: MediaQueryList,
}

/// [CSS Conditional 3 § 5](https://www.w3.org/TR/css-conditional-3/#at-media)
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRule {
    /// The media query list.
    pub queries: MediaQueryList,
    /// Rules inside the block.
    pub rules: Vec<CssRule>,
}

/// [CSS Conditional 3 § 6](https://www.w3.org/TR/css-conditional-3/#at-supports)
#[derive(Debug, Clone, PartialEq)]
pub struct SupportsRule {
    /// The condition as written.
    pub condition_text: String,
    /// Whether the condition holds.
    pub matches: bool,
    /// Rules inside the block.
    pub rules: Vec<CssRule>,
}

/// [CSS Namespaces § 2](https://www.w3.org/TR/css-namespaces-3/#declaration)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceRule {
    /// The prefix, or `None` for the default namespace.
    pub prefix: Option<String>,
    /// The namespace URI.
    pub uri: String,
}

/// A rule after interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum CssRule {
    /// A style rule.
    Style(StyleRule),
    /// Nested declarations.
    NestedDeclarations(NestedDeclarationsRule),
    /// `@font-face`
    FontFace(FontFaceRule),
    /// `@keyframes`
    Keyframes(KeyframesRule),
    /// `@layer name { }`
    LayerBlock(LayerBlockRule),
    /// `@layer a, b;`
    LayerStatement(LayerStatementRule),
    /// `@import`
    Import(ImportRule),
    /// `@media`
    Media(MediaRule),
    /// `@supports`
    Supports(SupportsRule),
    /// `@namespace`
    Namespace(NamespaceRule),
}

/// [§ 6.1 CSS Style Sheets](https://www.w3.org/TR/cssom-1/#css-style-sheets)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stylesheet {
    /// Top-level rules.
    pub rules: Vec<CssRule>,
    /// The sheet's location, for resolving URLs.
    pub location: Option<String>,
    /// Namespace declared by `@namespace "uri";`.
    pub default_namespace: Option<String>,
    /// Prefixed namespaces, in declaration order.
    pub namespaces: Vec<(String, String)>,
}

impl Stylesheet {
    /// Parse and interpret a stylesheet.
    #[must_use]
    pub fn parse(css: &str, location: Option<&str>) -> Self {
        let raw = crate::syntax::parse_stylesheet(css);
        let mut interpreter = Interpreter {
            location: location.map(str::to_string),
            next_index: 0,
        };
        let rules = interpreter.top_level(raw);
        let mut sheet = Self {
            rules,
            location: location.map(str::to_string),
            default_namespace: None,
            namespaces: Vec::new(),
        };
        for rule in &sheet.rules {
            if let CssRule::Namespace(namespace) = rule {
                match &namespace.prefix {
                    None => sheet.default_namespace = Some(namespace.uri.clone()),
                    Some(prefix) => sheet.namespaces.push((prefix.clone(), namespace.uri.clone())),
                }
            }
        }
        sheet
    }

    /// Look up a declared namespace prefix. Later declarations win.
    #[must_use]
    pub fn namespace_uri(&self, prefix: &str) -> Option<&str> {
        self.namespaces
            .iter()
            .rev()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }
}

/// Where a rule sits while it is interpreted.
#[derive(Clone, Default)]
struct Context {
    parent_selectors: Option<SelectorList>,
    layer: Option<String>,
}

impl Context {
    fn qualify(&self, name: &str) -> String {
        match &self.layer {
            Some(parent) => format!("{parent}.{name}"),
            None => name.to_string(),
        }
    }
}

struct Interpreter {
    location: Option<String>,
    next_index: usize,
}

impl Interpreter {
    /// [§ 2 @import](https://www.w3.org/TR/css-cascade-5/#at-import)
    ///
    /// "Any @import rules must precede all other valid at-rules and style
    /// rules in a style sheet (ignoring @charset and @layer statement
    /// rules)". `@namespace` must come after imports and before the rest.
    fn top_level(&mut self, raw: Vec<RawRule>) -> Vec<CssRule> {
        let context = Context::default();
        let mut rules = Vec::new();
        let mut imports_allowed = true;
        let mut namespaces_allowed = true;
        for rule in raw {
            let Some(rule) = self.rule(rule, &context) else {
                continue;
            };
            match &rule {
                CssRule::Import(_) if !imports_allowed => continue,
                CssRule::Namespace(_) if !namespaces_allowed => continue,
                CssRule::Import(_) | CssRule::LayerStatement(_) => {}
                CssRule::Namespace(_) => imports_allowed = false,
                _ => {
                    imports_allowed = false;
                    namespaces_allowed = false;
                }
            }
            rules.push(rule);
        }
        rules
    }

    fn rules(&mut self, raw: Vec<RawRule>, context: &Context) -> Vec<CssRule> {
        raw.into_iter()
            .filter_map(|rule| self.rule(rule, context))
            .filter(|rule| !matches!(rule, CssRule::Import(_) | CssRule::Namespace(_)))
            .collect()
    }

    fn rule(&mut self, raw: RawRule, context: &Context) -> Option<CssRule> {
        match raw {
            RawRule::Qualified { prelude, block } => self.style_rule(&prelude, block, context),
            RawRule::At { name, prelude, block } => self.at_rule(&name, &prelude, block, context),
        }
    }

    const fn take_index(&mut self) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    fn style_rule(&mut self, prelude: &[ComponentValue], block: Vec<BlockItem>, context: &Context) -> Option<CssRule> {
        let Some(selectors) = parse_selector_list(prelude) else {
            log::debug!(target: "wombat::css", "dropping rule with invalid selector '{}'", serialize(prelude));
            return None;
        };
        let absolutized_selectors: SelectorList = selectors
            .iter()
            .map(|selector| selector.absolutized(context.parent_selectors.as_ref()))
            .collect();
        let index = self.take_index();
        let child_context = Context {
            parent_selectors: Some(absolutized_selectors.clone()),
            layer: context.layer.clone(),
        };
        let (declarations, child_rules) = self.style_block(block, &child_context);
        Some(CssRule::Style(StyleRule {
            selectors,
            absolutized_selectors,
            declarations,
            child_rules,
            layer: context.layer.clone(),
            index,
        }))
    }

    /// Split a style rule's block into its own declarations and nested
    /// rules. Declarations after the first nested rule become
    /// [`NestedDeclarationsRule`]s.
    fn style_block(&mut self, block: Vec<BlockItem>, context: &Context) -> (DeclarationBlock, Vec<CssRule>) {
        let mut own = None;
        let mut pending = Vec::new();
        let mut children = Vec::new();
        for item in block {
            match item {
                BlockItem::Declaration(declaration) => pending.push(declaration),
                BlockItem::Rule(rule) => {
                    self.flush_declarations(&mut own, &mut pending, &mut children, context);
                    children.extend(self.rule(rule, context));
                }
            }
        }
        self.flush_declarations(&mut own, &mut pending, &mut children, context);
        (own.unwrap_or_default(), children)
    }

    fn flush_declarations(
        &mut self,
        own: &mut Option<DeclarationBlock>,
        pending: &mut Vec<RawDeclaration>,
        children: &mut Vec<CssRule>,
        context: &Context,
    ) {
        if own.is_none() {
            *own = Some(DeclarationBlock::from_raw(std::mem::take(pending)));
            return;
        }
        if pending.is_empty() {
            return;
        }
        let declarations = DeclarationBlock::from_raw(std::mem::take(pending));
        if declarations.is_empty() {
            return;
        }
        let index = self.take_index();
        children.push(CssRule::NestedDeclarations(NestedDeclarationsRule {
            parent_selectors: context.parent_selectors.clone().unwrap_or_default(),
            declarations,
            layer: context.layer.clone(),
            index,
        }));
    }

    /// Contents of a conditional or layer block. Inside a style rule the
    /// block may hold declarations too.
    fn group_block(&mut self, block: &[ComponentValue], context: &Context) -> Vec<CssRule> {
        let mut parser = CSSParser::from_component_values(block);
        if context.parent_selectors.is_none() {
            return self.rules(parser.parse_rule_list(), context);
        }
        let (declarations, mut rules) = self.style_block(parser.parse_block_contents(), context);
        if !declarations.is_empty() {
            let index = self.take_index();
            rules.insert(
                0,
                CssRule::NestedDeclarations(NestedDeclarationsRule {
                    parent_selectors: context.parent_selectors.clone().unwrap_or_default(),
                    declarations,
                    layer: context.layer.clone(),
                    index,
                }),
            );
        }
        rules
    }

    fn at_rule(
        &mut self,
        name: &str,
        prelude: &[ComponentValue],
        block: Option<Vec<ComponentValue>>,
        context: &Context,
    ) -> Option<CssRule> {
        let lower = name.to_ascii_lowercase();
        match (lower.as_str(), block) {
            ("media", Some(block)) => Some(CssRule::Media(MediaRule {
                queries: MediaQueryList::parse(prelude),
                rules: self.group_block(&block, context),
            })),
            ("supports", Some(block)) => {
                let matches = evaluate_supports_condition(prelude)?;
                Some(CssRule::Supports(SupportsRule {
                    condition_text: serialize(prelude),
                    matches,
                    rules: self.group_block(&block, context),
                }))
            }
            ("layer", Some(block)) => {
                let name = match prelude.iter().filter(|v| !v.is_whitespace()).count() {
                    0 => format!(
                        "#anonymous-{}",
                        ANONYMOUS_LAYER_COUNTER.fetch_add(1, Ordering::Relaxed)
                    ),
                    _ => layer_name(prelude)?,
                };
                let name = context.qualify(&name);
                let inner = Context {
                    parent_selectors: context.parent_selectors.clone(),
                    layer: Some(name.clone()),
                };
                Some(CssRule::LayerBlock(LayerBlockRule {
                    name,
                    rules: self.group_block(&block, &inner),
                }))
            }
            ("layer", None) => {
                let names = split_on_commas(prelude)
                    .iter()
                    .map(|name| layer_name(name).map(|n| context.qualify(&n)))
                    .collect::<Option<Vec<_>>>()?;
                (!names.is_empty()).then_some(CssRule::LayerStatement(LayerStatementRule { names }))
            }
            ("font-face", Some(block)) if context.parent_selectors.is_none() => self.font_face(&block),
            ("keyframes" | "-webkit-keyframes", Some(block)) if context.parent_selectors.is_none() => {
                Some(CssRule::Keyframes(KeyframesRule {
                    name: keyframes_name(prelude)?,
                    keyframes: keyframes(&block),
                    layer: context.layer.clone(),
                }))
            }
            ("import", None) => self.import(prelude, context),
            ("namespace", None) => namespace(prelude),
            ("charset", None) => None,
            _ => {
                warn_once("CSS", &format!("unsupported at-rule '@{lower}'"));
                None
            }
        }
    }

    fn resolve(&self, url: &str) -> String {
        resolve_url(url, self.location.as_deref()).unwrap_or_else(|| url.to_string())
    }

    fn import(&self, prelude: &[ComponentValue], context: &Context) -> Option<CssRule> {
        let mut items = prelude.iter().filter(|v| !v.is_whitespace()).peekable();
        let url = match items.next()? {
            ComponentValue::Token(CSSToken::String(url) | CSSToken::Url(url)) => url.clone(),
            ComponentValue::Function { name, value } if name.eq_ignore_ascii_case("url") => {
                match value.iter().find(|v| !v.is_whitespace())? {
                    ComponentValue::Token(CSSToken::String(url)) => url.clone(),
                    _ => return None,
                }
            }
            _ => return None,
        };
        let mut layer = None;
        let mut rest = Vec::new();
        for item in items {
            match item {
                layer_keyword if layer_keyword.as_ident().is_some_and(|s| s.eq_ignore_ascii_case("layer")) => {
                    layer = Some(context.qualify(&format!(
                        "#anonymous-{}",
                        ANONYMOUS_LAYER_COUNTER.fetch_add(1, Ordering::Relaxed)
                    )));
                }
                ComponentValue::Function { name, value } if name.eq_ignore_ascii_case("layer") => {
                    layer = Some(context.qualify(&layer_name(value)?));
                }
                ComponentValue::Function { name, .. } if name.eq_ignore_ascii_case("supports") => {}
                other => rest.push(other.clone()),
            }
        }
        Some(CssRule::Import(ImportRule {
            url: self.resolve(&url),
            layer,
            media: MediaQueryList::parse(&rest),
        }))
    }

    /// [CSS Fonts 4 § 4.1](https://www.w3.org/TR/css-fonts-4/#font-face-rule)
    fn font_face(&self, block: &[ComponentValue]) -> Option<CssRule> {
        let mut family = None;
        let mut sources = Vec::new();
        let mut weight = (400, 400);
        let mut italic = false;
        let mut stretch = 100.0;
        for declaration in CSSParser::from_component_values(block).parse_block_contents() {
            let BlockItem::Declaration(declaration) = declaration else {
                continue;
            };
            let values: Vec<&ComponentValue> = declaration.value.iter().filter(|v| !v.is_whitespace()).collect();
            match declaration.name.to_ascii_lowercase().as_str() {
                "font-family" => {
                    family = match values.as_slice() {
                        [ComponentValue::Token(CSSToken::String(name))] => Some(name.clone()),
                        idents => idents
                            .iter()
                            .map(|v| v.as_ident())
                            .collect::<Option<Vec<_>>>()
                            .map(|names| names.join(" ")),
                    };
                }
                "src" => {
                    sources = split_on_commas(&declaration.value)
                        .iter()
                        .filter_map(|source| self.font_source(source))
                        .collect();
                }
                "font-weight" => {
                    let weights: Vec<u16> = values.iter().filter_map(|v| font_weight_descriptor(v)).collect();
                    weight = match weights.as_slice() {
                        [single] => (*single, *single),
                        [low, high] => (*low.min(high), *low.max(high)),
                        _ => weight,
                    };
                }
                "font-style" => {
                    italic = values
                        .first()
                        .and_then(|v| v.as_ident())
                        .is_some_and(|s| s.eq_ignore_ascii_case("italic") || s.eq_ignore_ascii_case("oblique"));
                }
                "font-stretch" | "font-width" => {
                    if let Some(ComponentValue::Token(CSSToken::Percentage(p))) = values.first() {
                        stretch = *p as f32;
                    }
                }
                _ => {}
            }
        }
        let family = family?;
        if sources.is_empty() {
            return None;
        }
        Some(CssRule::FontFace(FontFaceRule {
            family,
            sources,
            weight,
            italic,
            stretch,
        }))
    }

    fn font_source(&self, source: &[ComponentValue]) -> Option<FontFaceSource> {
        let mut items = source.iter().filter(|v| !v.is_whitespace());
        let url = match items.next()? {
            ComponentValue::Token(CSSToken::Url(url)) => url.clone(),
            ComponentValue::Function { name, value } if name.eq_ignore_ascii_case("url") => {
                match value.iter().find(|v| !v.is_whitespace())? {
                    ComponentValue::Token(CSSToken::String(url)) => url.clone(),
                    _ => return None,
                }
            }
            ComponentValue::Function { name, value } if name.eq_ignore_ascii_case("local") => {
                let family = match value.iter().find(|v| !v.is_whitespace())? {
                    ComponentValue::Token(CSSToken::String(family) | CSSToken::Ident(family)) => family.clone(),
                    _ => return None,
                };
                return Some(FontFaceSource::Local(family));
            }
            _ => return None,
        };
        let format = items.find_map(|item| match item {
            ComponentValue::Function { name, value } if name.eq_ignore_ascii_case("format") => {
                value.iter().find_map(|v| match v {
                    ComponentValue::Token(CSSToken::String(format) | CSSToken::Ident(format)) => {
                        Some(format.to_ascii_lowercase())
                    }
                    _ => None,
                })
            }
            _ => None,
        });
        Some(FontFaceSource::Url {
            url: self.resolve(&url),
            format,
        })
    }
}

fn font_weight_descriptor(value: &ComponentValue) -> Option<u16> {
    match value {
        ComponentValue::Token(CSSToken::Number { value, .. }) if (1.0..=1000.0).contains(value) => {
            Some(*value as u16)
        }
        ComponentValue::Token(CSSToken::Ident(ident)) if ident.eq_ignore_ascii_case("normal") => Some(400),
        ComponentValue::Token(CSSToken::Ident(ident)) if ident.eq_ignore_ascii_case("bold") => Some(700),
        _ => None,
    }
}

/// `<layer-name> = <ident> [ '.' <ident> ]*`, with no whitespace inside.
fn layer_name(values: &[ComponentValue]) -> Option<String> {
    let values = crate::syntax::trim_whitespace(values.to_vec());
    let mut name = String::new();
    let mut expect_ident = true;
    for value in &values {
        match (value, expect_ident) {
            (ComponentValue::Token(CSSToken::Ident(ident)), true) => {
                // CSS-wide keywords are not valid layer names.
                if ["initial", "inherit", "unset", "revert", "revert-layer"]
                    .iter()
                    .any(|k| ident.eq_ignore_ascii_case(k))
                {
                    return None;
                }
                name.push_str(ident);
            }
            (ComponentValue::Token(CSSToken::Delim('.')), false) => name.push('.'),
            _ => return None,
        }
        expect_ident = !expect_ident;
    }
    (!name.is_empty() && !expect_ident).then_some(name)
}

fn keyframes_name(prelude: &[ComponentValue]) -> Option<String> {
    let mut items = prelude.iter().filter(|v| !v.is_whitespace());
    let name = match items.next()? {
        ComponentValue::Token(CSSToken::Ident(name)) if !name.eq_ignore_ascii_case("none") => name.clone(),
        ComponentValue::Token(CSSToken::String(name)) => name.clone(),
        _ => return None,
    };
    items.next().is_none().then_some(name)
}

/// [CSS Animations § 3.1](https://www.w3.org/TR/css-animations-1/#typedef-keyframe-selector)
fn keyframes(block: &[ComponentValue]) -> Vec<Keyframe> {
    CSSParser::from_component_values(block)
        .parse_rule_list()
        .into_iter()
        .filter_map(|rule| {
            let RawRule::Qualified { prelude, block } = rule else {
                return None;
            };
            let offsets = split_on_commas(&prelude)
                .iter()
                .map(|selector| match selector.as_slice() {
                    [ComponentValue::Token(CSSToken::Ident(ident))] if ident.eq_ignore_ascii_case("from") => Some(0.0),
                    [ComponentValue::Token(CSSToken::Ident(ident))] if ident.eq_ignore_ascii_case("to") => Some(1.0),
                    [ComponentValue::Token(CSSToken::Percentage(p))] if (0.0..=100.0).contains(p) => {
                        Some(*p as f32 / 100.0)
                    }
                    _ => None,
                })
                .collect::<Option<Vec<f32>>>()?;
            // "The <declaration-list> inside of <keyframe-block> accepts any
            // CSS property except those defined in this specification ...
            // Properties with !important are ignored."
            let raw = block
                .into_iter()
                .filter_map(|item| match item {
                    BlockItem::Declaration(declaration) if !declaration.important => Some(declaration),
                    _ => None,
                })
                .collect();
            let mut declarations = DeclarationBlock::from_raw(raw);
            declarations.declarations.retain(|d| {
                !matches!(
                    d.property,
                    PropertyId::AnimationName
                        | PropertyId::AnimationDuration
                        | PropertyId::AnimationDelay
                        | PropertyId::AnimationDirection
                        | PropertyId::AnimationFillMode
                        | PropertyId::AnimationIterationCount
                        | PropertyId::AnimationPlayState
                        | PropertyId::Animation
                )
            });
            Some(Keyframe { offsets, declarations })
        })
        .collect()
}

fn namespace(prelude: &[ComponentValue]) -> Option<CssRule> {
    let items: Vec<&ComponentValue> = prelude.iter().filter(|v| !v.is_whitespace()).collect();
    let uri = |value: &ComponentValue| match value {
        ComponentValue::Token(CSSToken::String(uri) | CSSToken::Url(uri)) => Some(uri.clone()),
        ComponentValue::Function { name, value } if name.eq_ignore_ascii_case("url") => {
            value.iter().find_map(|v| match v {
                ComponentValue::Token(CSSToken::String(uri)) => Some(uri.clone()),
                _ => None,
            })
        }
        _ => None,
    };
    let (prefix, uri) = match items.as_slice() {
        [only] => (None, uri(only)?),
        [prefix, value] => (Some(prefix.as_ident()?.to_string()), uri(value)?),
        _ => return None,
    };
    Some(CssRule::Namespace(NamespaceRule { prefix, uri }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style_rules(rules: &[CssRule]) -> Vec<&StyleRule> {
        rules
            .iter()
            .filter_map(|rule| match rule {
                CssRule::Style(style) => Some(style),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn declarations_are_parsed() {
        let sheet = Stylesheet::parse("p { color: red; margin: 1px 2px; --x: 3; bogus: 1 }", None);
        let rule = style_rules(&sheet.rules)[0];
        assert_eq!(rule.declarations.declarations.len(), 2);
        assert_eq!(rule.declarations.custom_properties[0].name, "--x");
    }

    #[test]
    fn nested_rules_get_pre_order_indices() {
        let sheet = Stylesheet::parse(".a { color: red; .b { color: blue } color: green } .c {}", None);
        let outer = style_rules(&sheet.rules)[0];
        assert_eq!(outer.index, 0);
        let CssRule::Style(inner) = &outer.child_rules[0] else {
            panic!("expected nested style rule");
        };
        assert_eq!(inner.index, 1);
        let CssRule::NestedDeclarations(trailing) = &outer.child_rules[1] else {
            panic!("expected nested declarations");
        };
        assert_eq!(trailing.index, 2);
        assert_eq!(style_rules(&sheet.rules)[1].index, 3);
    }

    #[test]
    fn layer_names_are_qualified() {
        let sheet = Stylesheet::parse("@layer a { @layer b { p {} } } @layer a.c, d;", None);
        let CssRule::LayerBlock(outer) = &sheet.rules[0] else {
            panic!("expected layer block");
        };
        let CssRule::LayerBlock(inner) = &outer.rules[0] else {
            panic!("expected nested layer block");
        };
        assert_eq!(inner.name, "a.b");
        assert_eq!(style_rules(&inner.rules)[0].layer.as_deref(), Some("a.b"));
        let CssRule::LayerStatement(statement) = &sheet.rules[1] else {
            panic!("expected layer statement");
        };
        assert_eq!(statement.names, vec!["a.c".to_string(), "d".to_string()]);
    }

    #[test]
    fn keyframes_drop_important_declarations() {
        let sheet = Stylesheet::parse(
            "@keyframes fade { from { opacity: 0 } 50%, to { opacity: 1; color: red !important } }",
            None,
        );
        let CssRule::Keyframes(keyframes) = &sheet.rules[0] else {
            panic!("expected keyframes");
        };
        assert_eq!(keyframes.name, "fade");
        assert_eq!(keyframes.keyframes[1].offsets, vec![0.5, 1.0]);
        assert_eq!(keyframes.keyframes[1].declarations.declarations.len(), 1);
    }

    #[test]
    fn font_face_sources_resolve_against_sheet() {
        let sheet = Stylesheet::parse(
            "@font-face { font-family: \"Test Sans\"; src: local(Foo), url(fonts/a.woff) format('woff'); font-weight: 100 900 }",
            Some("https://example.com/css/site.css"),
        );
        let CssRule::FontFace(face) = &sheet.rules[0] else {
            panic!("expected font-face");
        };
        assert_eq!(face.family, "Test Sans");
        assert_eq!(face.weight, (100, 900));
        assert_eq!(
            face.sources[1],
            FontFaceSource::Url {
                url: "https://example.com/css/fonts/a.woff".to_string(),
                format: Some("woff".to_string()),
            }
        );
    }

    #[test]
    fn imports_must_come_first() {
        let sheet = Stylesheet::parse("@import 'a.css'; p {} @import 'b.css';", Some("https://example.com/"));
        let imports = sheet.rules.iter().filter(|r| matches!(r, CssRule::Import(_))).count();
        assert_eq!(imports, 1);
    }

    #[test]
    fn namespaces_are_recorded() {
        let sheet = Stylesheet::parse("@namespace url(http://www.w3.org/1999/xhtml); @namespace svg url(http://www.w3.org/2000/svg);", None);
        assert_eq!(sheet.default_namespace.as_deref(), Some("http://www.w3.org/1999/xhtml"));
        assert_eq!(sheet.namespace_uri("svg"), Some("http://www.w3.org/2000/svg"));
    }
}
