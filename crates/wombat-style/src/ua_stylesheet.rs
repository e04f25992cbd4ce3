//! User-Agent Stylesheets
//!
//! [WHATWG HTML § 15 Rendering](https://html.spec.whatwg.org/multipage/rendering.html)
//!
//! "User agents are expected to have a default style sheet that presents elements
//! of HTML documents in ways consistent with general user expectations."
//!
//! Four sheets make up the user-agent origin, always in this order: the
//! default HTML sheet, the quirks-mode sheet (only for documents in quirks
//! mode), the MathML sheet and the SVG sheet. Each is parsed once.

use std::sync::{Arc, OnceLock};

use wombat_css::Stylesheet;

/// [WHATWG HTML § 15.3.1 Suggested default style sheet](https://html.spec.whatwg.org/multipage/rendering.html#the-css-user-agent-style-sheet-and-presentational-hints)
const DEFAULT_CSS: &str = r#"
@namespace url(http://www.w3.org/1999/xhtml);

/* [§ 15.3.1 Hidden elements](https://html.spec.whatwg.org/multipage/rendering.html#hidden-elements) */
/* "The following elements must have their 'display' property set to 'none'." */
area, base, basefont, datalist, head, link, meta, noembed,
noframes, param, rp, script, style, template, title {
    display: none;
}

/* [§ 15.3.3 Flow content](https://html.spec.whatwg.org/multipage/rendering.html#flow-content-3) */
/* "The following elements must have their 'display' property set to 'block'." */
address, article, aside, blockquote, body, center, dd, details,
dialog, dir, div, dl, dt, fieldset, figcaption, figure, footer,
form, h1, h2, h3, h4, h5, h6, header, hgroup, hr, html, legend,
listing, main, menu, nav, ol, p, plaintext, pre, search,
section, summary, ul, xmp {
    display: block;
}

/* [§ 15.3.4 The page](https://html.spec.whatwg.org/multipage/rendering.html#the-page) */
/* "body { margin: 8px; }" */
body {
    margin: 8px;
}

/* [§ 15.3.5 Grouping content](https://html.spec.whatwg.org/multipage/rendering.html#grouping-content) */
p, blockquote, figure, listing, plaintext, pre, xmp {
    margin-block-start: 1em;
    margin-block-end: 1em;
}

blockquote, figure {
    margin-inline-start: 40px;
    margin-inline-end: 40px;
}

/* "listing, plaintext, pre, xmp { font-family: monospace; white-space: pre; }" */
listing, plaintext, pre, xmp, code, kbd, samp, tt {
    font-family: monospace;
}

listing, plaintext, pre, xmp {
    white-space: pre;
}

/* [§ 15.3.6 Sections and headings](https://html.spec.whatwg.org/multipage/rendering.html#sections-and-headings) */
h1 { margin-block-start: 0.67em; margin-block-end: 0.67em; font-size: 2.00em; font-weight: bold; }
h2 { margin-block-start: 0.83em; margin-block-end: 0.83em; font-size: 1.50em; font-weight: bold; }
h3 { margin-block-start: 1.00em; margin-block-end: 1.00em; font-size: 1.17em; font-weight: bold; }
h4 { margin-block-start: 1.33em; margin-block-end: 1.33em; font-size: 1.00em; font-weight: bold; }
h5 { margin-block-start: 1.67em; margin-block-end: 1.67em; font-size: 0.83em; font-weight: bold; }
h6 { margin-block-start: 2.33em; margin-block-end: 2.33em; font-size: 0.67em; font-weight: bold; }

/* [§ 15.3.7 Lists](https://html.spec.whatwg.org/multipage/rendering.html#lists) */
li {
    display: list-item;
}

ol, ul, menu {
    margin-block-start: 1em;
    margin-block-end: 1em;
    padding-inline-start: 40px;
}

ul, menu {
    list-style-type: disc;
}

ol {
    list-style-type: decimal;
}

/* [§ 15.3.8 Text-level semantics](https://html.spec.whatwg.org/multipage/rendering.html#text-level-semantics) */
/* "b, strong { font-weight: bolder; }" */
b, strong {
    font-weight: bolder;
}

/* "i, cite, em, var, dfn { font-style: italic; }" */
em, i, cite, dfn, var {
    font-style: italic;
}

small {
    font-size: smaller;
}

big {
    font-size: larger;
}

/* "a:link, a:visited { color: ...; text-decoration: underline; cursor: pointer; }" */
a:any-link {
    text-decoration: underline;
    cursor: pointer;
}

/* [§ 15.3.10 Tables](https://html.spec.whatwg.org/multipage/rendering.html#tables-2) */
table { display: table; box-sizing: border-box; }
caption { display: table-caption; text-align: center; }
colgroup { display: table-column-group; }
col { display: table-column; }
thead { display: table-header-group; }
tbody { display: table-row-group; }
tfoot { display: table-footer-group; }
tr { display: table-row; }
td, th { display: table-cell; padding: 1px; }

/* "th { font-weight: bold; }" and centred unless an ancestor says otherwise. */
th {
    font-weight: bold;
    text-align: -wombat-inherit-or-center;
}

/* [§ 15.5.12–15.5.15 Form controls](https://html.spec.whatwg.org/multipage/rendering.html#the-input-element-as-a-form-control) */
input, textarea, select, button {
    display: inline-block;
    border: 2px inset;
    padding: 1px 2px;
}

button {
    padding: 1px 6px;
}

/* [§ 15.3.14 The hr element](https://html.spec.whatwg.org/multipage/rendering.html#the-hr-element-2) */
hr {
    border-style: inset;
    border-width: 1px;
    margin-block-start: 0.5em;
    margin-block-end: 0.5em;
}

/* [§ 15.3.5 Bidirectional text](https://html.spec.whatwg.org/multipage/rendering.html#bidi-rendering) */
[dir=rtl i] { direction: rtl; }
[dir=ltr i] { direction: ltr; }
"#;

/// [WHATWG HTML § 15.3.2 The page in quirks mode](https://html.spec.whatwg.org/multipage/rendering.html#tables-2)
///
/// "In quirks mode, the following rules are also expected to apply."
const QUIRKS_CSS: &str = r#"
@namespace url(http://www.w3.org/1999/xhtml);

/* "table { font-weight: initial; font-style: initial; font-variant: initial;
      font-size: initial; line-height: initial; white-space: initial;
      text-align: initial; }" */
table {
    font-weight: initial;
    font-style: initial;
    font-size: initial;
    line-height: initial;
    white-space: initial;
    text-align: initial;
}

/* "form { margin-block-end: 1em; }" */
form {
    margin-block-end: 1em;
}
"#;

/// [MathML Core § A User Agent Stylesheet](https://w3c.github.io/mathml-core/#user-agent-stylesheet)
const MATHML_CSS: &str = r#"
@namespace url(http://www.w3.org/1998/Math/MathML);

/* "math { direction: ltr; writing-mode: horizontal-tb; text-indent: 0;
      font-style: normal; font-weight: normal; line-height: normal;
      font-size: inherit; font-size: math; math-style: compact; ... }" */
math {
    direction: ltr;
    writing-mode: horizontal-tb;
    text-indent: 0;
    font-style: normal;
    font-weight: normal;
    line-height: normal;
    font-family: math;
    display: inline math;
    math-style: compact;
}

math[display="block" i] {
    display: block math;
    math-style: normal;
}

* {
    font-size: math;
    display: block math;
}

mtable { display: inline-table; math-style: compact; }
mtr { display: table-row; }
mtd { display: table-cell; text-align: center; padding: 0.5ex 0.4em; }

/* "mfrac > * { math-depth: auto-add; math-style: compact; }" */
mfrac > * {
    math-depth: auto-add;
    math-style: compact;
}

/* "msub > :not(:first-child), msup > :not(:first-child), ...
      { math-depth: add(1); math-style: compact; }" */
msub > :not(:first-child),
msup > :not(:first-child),
msubsup > :not(:first-child),
mmultiscripts > :not(:first-child),
munder > :not(:first-child),
mover > :not(:first-child),
munderover > :not(:first-child) {
    math-depth: add(1);
    math-style: compact;
}

/* "mroot > :not(:first-child) { math-depth: add(2); }" */
mroot > :not(:first-child) {
    math-depth: add(2);
}

annotation, annotation-xml, semantics > :not(:first-child) {
    display: none;
}
"#;

/// [SVG 2 § Appendix D User Agent Style Sheet](https://www.w3.org/TR/SVG2/styling.html#UAStyleSheet)
const SVG_CSS: &str = r#"
@namespace url(http://www.w3.org/2000/svg);

/* "svg:not(:root), image, marker, pattern, symbol { overflow: hidden }" */
svg:not(:root), image, marker, pattern, symbol {
    overflow: hidden;
}

/* "clipPath, defs, desc, linearGradient, ... { display: none }" */
clippath, defs, desc, lineargradient, mask, metadata,
radialgradient, script, style, symbol, title {
    display: none;
}

foreignobject {
    display: block;
}
"#;

fn parse_once(cell: &'static OnceLock<Arc<Stylesheet>>, css: &str) -> Arc<Stylesheet> {
    Arc::clone(cell.get_or_init(|| Arc::new(Stylesheet::parse(css, None))))
}

/// The default HTML sheet.
pub fn default_stylesheet() -> Arc<Stylesheet> {
    static STYLESHEET: OnceLock<Arc<Stylesheet>> = OnceLock::new();
    parse_once(&STYLESHEET, DEFAULT_CSS)
}

/// Extra rules for documents in quirks mode.
pub fn quirks_mode_stylesheet() -> Arc<Stylesheet> {
    static STYLESHEET: OnceLock<Arc<Stylesheet>> = OnceLock::new();
    parse_once(&STYLESHEET, QUIRKS_CSS)
}

/// Rules for MathML elements.
pub fn mathml_stylesheet() -> Arc<Stylesheet> {
    static STYLESHEET: OnceLock<Arc<Stylesheet>> = OnceLock::new();
    parse_once(&STYLESHEET, MATHML_CSS)
}

/// Rules for SVG elements.
pub fn svg_stylesheet() -> Arc<Stylesheet> {
    static STYLESHEET: OnceLock<Arc<Stylesheet>> = OnceLock::new();
    parse_once(&STYLESHEET, SVG_CSS)
}

/// [CSS Cascading § 6.1](https://www.w3.org/TR/css-cascade-4/#cascade-sort)
///
/// The user-agent sheets in cascade order.
#[must_use]
pub fn user_agent_stylesheets(quirks_mode: bool) -> Vec<Arc<Stylesheet>> {
    let mut sheets = vec![default_stylesheet()];
    if quirks_mode {
        sheets.push(quirks_mode_stylesheet());
    }
    sheets.push(mathml_stylesheet());
    sheets.push(svg_stylesheet());
    sheets
}
