//! Style computation for the Wombat engine.
//!
//! # Scope
//!
//! This crate implements:
//! - **Rule store and rule caches**: stylesheets by origin and tree scope,
//!   bucketed by id, class, tag and attribute, with a counting bloom
//!   filter over ancestors
//! - **Selector matching** ([Selectors Level 4](https://www.w3.org/TR/selectors-4/))
//!   including `:is()`, `:where()`, `:not()`, `:has()` and `:host`
//! - **Invalidation**: per-feature descendant invalidation sets
//! - **Cascade** ([CSS Cascading Level 5](https://www.w3.org/TR/css-cascade-5/))
//!   - Origins, importance, shadow tree contexts and `@layer`
//!   - `revert`, `revert-layer`, logical property mapping
//!   - Presentational hints and the `style` attribute
//! - **Value resolution** ([CSS Values Level 4](https://www.w3.org/TR/css-values-4/))
//!   - Custom properties, `var()`/`env()`/`attr()` substitution
//!   - Font size keywords, `math-depth`, absolute lengths
//!   - Box type fixups (blockification, `float`/`position` interplay)
//! - **Fonts**: family resolution, `@font-face` loading (TTF, OTF, WOFF)
//! - **Animations** ([CSS Animations](https://www.w3.org/TR/css-animations-1/),
//!   [CSS Transitions](https://www.w3.org/TR/css-transitions-1/))
//!
//! # Not Yet Implemented
//!
//! - `@container`, `@scope` and `@property`
//! - Web Animations API objects beyond the CSS-created ones
//! - WOFF2 decoding

/// CSS animations, transitions and the timing model.
pub mod animation;
/// Counting bloom filter over ancestor features.
pub mod bloom;
/// The cascade per [CSS Cascading Level 5](https://www.w3.org/TR/css-cascade-5/).
pub mod cascade;
/// Computed property storage.
pub mod computed;
/// Engine configuration.
pub mod config;
/// The style engine.
pub mod engine;
/// Font selection and web font loading.
pub mod font;
/// HTML presentational hints.
pub mod hints;
/// Style invalidation sets.
pub mod invalidation;
/// Selector matching per [Selectors Level 4](https://www.w3.org/TR/selectors-4/).
pub mod matcher;
/// Computed value resolution per [CSS Values Level 4](https://www.w3.org/TR/css-values-4/).
pub mod resolver;
/// Per-origin rule indexes.
pub mod rule_cache;
/// Stylesheets by origin and scope.
pub mod rule_store;
/// User-agent stylesheets per [WHATWG HTML § 15 Rendering](https://html.spec.whatwg.org/multipage/rendering.html).
pub mod ua_stylesheet;

pub use animation::{AnimationEngine, AnimationEvent, AnimationEventKind, AnimationKey};
pub use cascade::{CascadeLayer, CascadeSources, CascadedProperties, MatchedRules};
pub use computed::{ComputedProperties, CustomProperties};
pub use config::{ConfigError, StyleConfig, Viewport};
pub use engine::StyleEngine;
pub use font::{FamilyName, FontDescriptor, FontList, FontResolver};
pub use hints::{HtmlPresentationalHints, PresentationalHints};
pub use invalidation::{InvalidationProperty, InvalidationSet, StyleInvalidationData};
pub use matcher::{MatchContext, matches, matches_any};
pub use rule_cache::{MatchingRule, RuleCache};
pub use rule_store::{CascadeOrigin, RuleStore, SheetId};
