//! CSS selectors.
//!
//! This module holds the selector model per
//! [Selectors Level 4](https://www.w3.org/TR/selectors-4/) together with
//! specificity. Parsing lives in [`parse`]; matching against a document
//! tree is the style engine's job.

mod parse;

use core::fmt;

use serde::Serialize;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

pub use parse::{parse_relative_selector_list, parse_selector_list};

/// [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-nmsp)
///
/// The namespace component of a type or universal selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NamespacePrefix {
    /// No prefix: the sheet's default namespace applies, if any.
    Default,
    /// `*|`: any namespace.
    Any,
    /// `|`: elements without a namespace.
    None,
    /// `ns|`: the namespace declared for `ns`.
    Named(String),
}

/// [§ 6.1 Attribute presence and value selectors](https://www.w3.org/TR/selectors-4/#attribute-representation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeOperator {
    /// `[att]`
    Exists,
    /// `[att=val]`
    Equals,
    /// `[att~=val]`
    Includes,
    /// `[att|=val]`
    DashMatch,
    /// `[att^=val]`
    Prefix,
    /// `[att$=val]`
    Suffix,
    /// `[att*=val]`
    Substring,
}

/// [§ 6.3 Case-sensitivity](https://www.w3.org/TR/selectors-4/#attribute-case)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CaseSensitivity {
    /// Document-language rules decide.
    #[default]
    Default,
    /// `i` flag.
    Insensitive,
    /// `s` flag.
    Sensitive,
}

/// An attribute selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeSelector {
    /// Attribute name, ASCII-lowercased.
    pub name: String,
    /// The comparison.
    pub operator: AttributeOperator,
    /// The value to compare against; empty for [`AttributeOperator::Exists`].
    pub value: String,
    /// The `i`/`s` flag.
    pub case: CaseSensitivity,
}

/// `An+B` from [§ 6 The An+B microsyntax](https://www.w3.org/TR/css-syntax-3/#anb-microsyntax).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnPlusB {
    /// Step.
    pub a: i32,
    /// Offset.
    pub b: i32,
}

impl AnPlusB {
    /// Whether 1-based position `index` is selected.
    #[must_use]
    pub fn matches(self, index: i32) -> bool {
        if self.a == 0 {
            return index == self.b;
        }
        let n = index - self.b;
        n % self.a == 0 && n / self.a >= 0
    }
}

/// Pseudo-class kinds without arguments, used as keys for invalidation
/// and for the "attempted pseudo-classes" record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum PseudoClassKind {
    Root,
    Empty,
    FirstChild,
    LastChild,
    OnlyChild,
    FirstOfType,
    LastOfType,
    OnlyOfType,
    NthChild,
    NthLastChild,
    NthOfType,
    NthLastOfType,
    Link,
    AnyLink,
    Hover,
    Focus,
    FocusWithin,
    Active,
    Checked,
    Disabled,
    Enabled,
    Scope,
    Host,
    Is,
    Where,
    Not,
    Has,
}

impl PseudoClassKind {
    /// Bit for [`PseudoClassBitmap`].
    #[must_use]
    pub const fn bit(self) -> u64 {
        1 << self as u32
    }
}

/// A set of [`PseudoClassKind`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct PseudoClassBitmap(pub u64);

impl PseudoClassBitmap {
    /// Add a kind.
    pub fn insert(&mut self, kind: PseudoClassKind) {
        self.0 |= kind.bit();
    }

    /// Whether a kind is present.
    #[must_use]
    pub const fn contains(self, kind: PseudoClassKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Union.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// [§ 3.6 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PseudoClass {
    /// A pseudo-class without arguments.
    Simple(PseudoClassKind),
    /// `:nth-child(An+B [of S]?)`
    NthChild(AnPlusB, Option<SelectorList>),
    /// `:nth-last-child(An+B [of S]?)`
    NthLastChild(AnPlusB, Option<SelectorList>),
    /// `:nth-of-type(An+B)`
    NthOfType(AnPlusB),
    /// `:nth-last-of-type(An+B)`
    NthLastOfType(AnPlusB),
    /// `:is(...)`, forgiving.
    Is(SelectorList),
    /// `:where(...)`, forgiving, zero specificity.
    Where(SelectorList),
    /// `:not(...)`
    Not(SelectorList),
    /// `:has(<relative-selector-list>)`
    Has(Vec<RelativeSelector>),
    /// `:host` or `:host(<compound-selector>)`
    Host(Option<SelectorList>),
}

impl PseudoClass {
    /// The kind, ignoring arguments.
    #[must_use]
    pub const fn kind(&self) -> PseudoClassKind {
        match self {
            Self::Simple(kind) => *kind,
            Self::NthChild(..) => PseudoClassKind::NthChild,
            Self::NthLastChild(..) => PseudoClassKind::NthLastChild,
            Self::NthOfType(_) => PseudoClassKind::NthOfType,
            Self::NthLastOfType(_) => PseudoClassKind::NthLastOfType,
            Self::Is(_) => PseudoClassKind::Is,
            Self::Where(_) => PseudoClassKind::Where,
            Self::Not(_) => PseudoClassKind::Not,
            Self::Has(_) => PseudoClassKind::Has,
            Self::Host(_) => PseudoClassKind::Host,
        }
    }
}

/// [§ 3.6.1 Pseudo-elements](https://www.w3.org/TR/selectors-4/#pseudo-elements)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, EnumIter, IntoStaticStr, Serialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum PseudoElement {
    Before,
    After,
    Marker,
    Placeholder,
    Selection,
    FirstLine,
    FirstLetter,
    Backdrop,
}

impl PseudoElement {
    /// Pseudo-elements that CSS 2 allowed with a single colon.
    #[must_use]
    pub const fn has_legacy_single_colon_form(self) -> bool {
        matches!(self, Self::Before | Self::After | Self::FirstLine | Self::FirstLetter)
    }

    /// Whether the pseudo-element only exists when `content` generates a box.
    #[must_use]
    pub const fn is_generated_content(self) -> bool {
        matches!(self, Self::Before | Self::After | Self::Marker)
    }
}

/// A simple selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimpleSelector {
    /// [§ 5.2 Universal selector](https://www.w3.org/TR/selectors-4/#universal-selector)
    Universal(NamespacePrefix),
    /// [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors)
    Type {
        /// Local name, ASCII-lowercased.
        name: String,
        /// Namespace prefix.
        namespace: NamespacePrefix,
    },
    /// [§ 6.7 ID selector](https://www.w3.org/TR/selectors-4/#id-selectors)
    Id(String),
    /// [§ 6.6 Class selector](https://www.w3.org/TR/selectors-4/#class-html)
    Class(String),
    /// [§ 6 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
    Attribute(AttributeSelector),
    /// A pseudo-class.
    PseudoClass(PseudoClass),
    /// A known pseudo-element.
    PseudoElement(PseudoElement),
    /// A pseudo-element this engine does not know; never matches.
    UnknownPseudoElement(String),
    /// [§ 3.1 Nesting selector](https://drafts.csswg.org/css-nesting-1/#nest-selector) `&`
    Nesting,
    /// The anchor element of a `:has()` argument.
    RelativeAnchor,
}

/// A sequence of simple selectors with no combinator between them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CompoundSelector {
    /// The simple selectors.
    pub simple_selectors: Vec<SimpleSelector>,
}

impl CompoundSelector {
    /// The pseudo-element this compound targets, if any.
    #[must_use]
    pub fn pseudo_element(&self) -> Option<PseudoElement> {
        self.simple_selectors.iter().find_map(|simple| match simple {
            SimpleSelector::PseudoElement(pseudo) => Some(*pseudo),
            _ => None,
        })
    }
}

/// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// `A B`
    Descendant,
    /// `A > B`
    Child,
    /// `A + B`
    NextSibling,
    /// `A ~ B`
    SubsequentSibling,
}

/// [§ 17 Calculating Specificity](https://www.w3.org/TR/selectors-4/#specificity-rules)
///
/// "Specificities are compared by comparing the three components in order."
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl Specificity {
    /// Create a new specificity with (A, B, C) components.
    #[must_use]
    pub const fn new(a: u32, b: u32, c: u32) -> Self {
        Self(a, b, c)
    }

    const fn add(self, other: Self) -> Self {
        Self(self.0 + other.0, self.1 + other.1, self.2 + other.2)
    }
}

/// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
///
/// Stored right to left: `subject` is the rightmost compound and
/// `combinators` walks outward from it. For `A > B C`, the subject is `C`
/// and the chain is `[(Descendant, B), (Child, A)]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    /// The rightmost compound selector.
    pub subject: CompoundSelector,
    /// (combinator, compound) pairs going left from the subject.
    pub combinators: Vec<(Combinator, CompoundSelector)>,
}

/// A comma-separated list of selectors.
pub type SelectorList = Vec<Selector>;

/// A `:has()` argument: a selector anchored at the `:has()` subject.
pub type RelativeSelector = Selector;

impl Selector {
    /// A selector of a single compound.
    #[must_use]
    pub const fn from_compound(subject: CompoundSelector) -> Self {
        Self {
            subject,
            combinators: Vec::new(),
        }
    }

    /// All compounds, right to left.
    pub fn compounds(&self) -> impl Iterator<Item = &CompoundSelector> {
        core::iter::once(&self.subject).chain(self.combinators.iter().map(|(_, compound)| compound))
    }

    /// The pseudo-element the selector targets, if any.
    #[must_use]
    pub fn pseudo_element(&self) -> Option<PseudoElement> {
        self.subject.pseudo_element()
    }

    /// Whether the subject names a pseudo-element this engine does not know.
    #[must_use]
    pub fn has_unknown_pseudo_element(&self) -> bool {
        self.subject
            .simple_selectors
            .iter()
            .any(|s| matches!(s, SimpleSelector::UnknownPseudoElement(_)))
    }

    /// Whether `&` appears anywhere, including inside pseudo-class arguments.
    #[must_use]
    pub fn contains_nesting_selector(&self) -> bool {
        self.compounds()
            .flat_map(|c| &c.simple_selectors)
            .any(|simple| match simple {
                SimpleSelector::Nesting => true,
                SimpleSelector::PseudoClass(pseudo) => pseudo_class_arguments(pseudo)
                    .iter()
                    .any(|list| list.iter().any(Self::contains_nesting_selector)),
                _ => false,
            })
    }

    /// [§ 17 Calculating Specificity](https://www.w3.org/TR/selectors-4/#specificity-rules)
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        self.compounds()
            .flat_map(|compound| &compound.simple_selectors)
            .map(simple_specificity)
            .fold(Specificity::default(), Specificity::add)
    }

    /// [§ 3.2 Nesting Selector](https://drafts.csswg.org/css-nesting-1/#nest-selector)
    ///
    /// Replace `&` with `:is(<parent>)`. A nested selector without `&` is
    /// made relative to the parent with a descendant combinator. At the top
    /// level `&` means `:scope` with zero specificity.
    #[must_use]
    pub fn absolutized(&self, parent: Option<&SelectorList>) -> Self {
        let replacement = match parent {
            Some(parent) => SimpleSelector::PseudoClass(PseudoClass::Is(parent.clone())),
            None => SimpleSelector::PseudoClass(PseudoClass::Where(vec![Self::from_compound(CompoundSelector {
                simple_selectors: vec![SimpleSelector::PseudoClass(PseudoClass::Simple(PseudoClassKind::Scope))],
            })])),
        };
        let mut absolutized = self.replace_nesting(&replacement);
        if let Some(parent) = parent
            && !self.contains_nesting_selector()
        {
            absolutized.combinators.push((
                Combinator::Descendant,
                CompoundSelector {
                    simple_selectors: vec![SimpleSelector::PseudoClass(PseudoClass::Is(parent.clone()))],
                },
            ));
        }
        absolutized
    }

    fn replace_nesting(&self, replacement: &SimpleSelector) -> Self {
        let replace_compound = |compound: &CompoundSelector| CompoundSelector {
            simple_selectors: compound
                .simple_selectors
                .iter()
                .map(|simple| match simple {
                    SimpleSelector::Nesting => replacement.clone(),
                    SimpleSelector::PseudoClass(pseudo) => {
                        SimpleSelector::PseudoClass(map_pseudo_class_arguments(pseudo, |selector| {
                            selector.replace_nesting(replacement)
                        }))
                    }
                    other => other.clone(),
                })
                .collect(),
        };
        Self {
            subject: replace_compound(&self.subject),
            combinators: self
                .combinators
                .iter()
                .map(|(combinator, compound)| (*combinator, replace_compound(compound)))
                .collect(),
        }
    }
}

/// Selector-list arguments of a functional pseudo-class.
#[must_use]
pub fn pseudo_class_arguments(pseudo: &PseudoClass) -> Vec<&SelectorList> {
    match pseudo {
        PseudoClass::Is(list) | PseudoClass::Where(list) | PseudoClass::Not(list) | PseudoClass::Has(list) => {
            vec![list]
        }
        PseudoClass::NthChild(_, Some(list)) | PseudoClass::NthLastChild(_, Some(list)) | PseudoClass::Host(Some(list)) => {
            vec![list]
        }
        _ => Vec::new(),
    }
}

fn map_pseudo_class_arguments(pseudo: &PseudoClass, f: impl Fn(&Selector) -> Selector) -> PseudoClass {
    let map = |list: &SelectorList| list.iter().map(&f).collect::<SelectorList>();
    match pseudo {
        PseudoClass::Is(list) => PseudoClass::Is(map(list)),
        PseudoClass::Where(list) => PseudoClass::Where(map(list)),
        PseudoClass::Not(list) => PseudoClass::Not(map(list)),
        PseudoClass::Has(list) => PseudoClass::Has(map(list)),
        PseudoClass::NthChild(step, Some(list)) => PseudoClass::NthChild(*step, Some(map(list))),
        PseudoClass::NthLastChild(step, Some(list)) => PseudoClass::NthLastChild(*step, Some(map(list))),
        PseudoClass::Host(Some(list)) => PseudoClass::Host(Some(map(list))),
        other => other.clone(),
    }
}

fn max_specificity(list: &SelectorList) -> Specificity {
    list.iter().map(Selector::specificity).max().unwrap_or_default()
}

fn simple_specificity(simple: &SimpleSelector) -> Specificity {
    match simple {
        // "count the number of ID selectors in the selector (= A)"
        SimpleSelector::Id(_) => Specificity(1, 0, 0),
        // "count the number of class selectors, attributes selectors, and
        // pseudo-classes in the selector (= B)"
        SimpleSelector::Class(_) | SimpleSelector::Attribute(_) => Specificity(0, 1, 0),
        SimpleSelector::PseudoClass(pseudo) => match pseudo {
            // "The specificity of an :is(), :not(), or :has() pseudo-class is
            // replaced by the specificity of the most specific complex
            // selector in its selector list argument."
            PseudoClass::Is(list) | PseudoClass::Not(list) | PseudoClass::Has(list) => max_specificity(list),
            // "The specificity of a :where() pseudo-class is replaced by zero."
            PseudoClass::Where(_) => Specificity::default(),
            // "The specificity of an :nth-child() or :nth-last-child()
            // selector is the specificity of the pseudo class itself (counting
            // as one pseudo-class selector) plus the specificity of the most
            // specific complex selector in its selector list argument (if any)."
            PseudoClass::NthChild(_, Some(list))
            | PseudoClass::NthLastChild(_, Some(list))
            | PseudoClass::Host(Some(list)) => Specificity(0, 1, 0).add(max_specificity(list)),
            _ => Specificity(0, 1, 0),
        },
        // "count the number of type selectors and pseudo-elements in the
        // selector (= C)"
        SimpleSelector::Type { .. } | SimpleSelector::PseudoElement(_) | SimpleSelector::UnknownPseudoElement(_) => {
            Specificity(0, 0, 1)
        }
        // "ignore the universal selector"
        SimpleSelector::Universal(_) | SimpleSelector::Nesting | SimpleSelector::RelativeAnchor => {
            Specificity::default()
        }
    }
}

impl fmt::Display for Specificity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0, self.1, self.2)
    }
}
