//! Font selection.
//!
//! [CSS Fonts 4 § 5 Font Matching Algorithm](https://www.w3.org/TR/css-fonts-4/#font-matching-algorithm)
//!
//! The resolver turns a computed `font-family` list plus style, weight and
//! stretch into a [`FontList`]: one entry per family that has a usable
//! face, then the configured default and emoji fonts as a last resort.
//! Web fonts come from `@font-face` [loaders](loader::FontLoader); system
//! faces are described by [`StyleConfig::system_fonts`]. Only web fonts
//! carry decoded outlines, so only they contribute real metrics.

/// `@font-face` loading.
pub mod loader;

use std::fmt;
use std::sync::Arc;

use fontdue::FontSettings;
use serde::Serialize;
use wombat_common::fetch::{CompletedFetch, ResourceFetcher};
use wombat_css::{FontFaceRule, FontMetrics, Keyword, StyleValue};

use crate::config::StyleConfig;
pub use loader::{FontFormat, FontLoadError, FontLoadState, FontLoader, sniff_font_format, try_load_font, woff_to_sfnt};

/// A decoded font file.
pub struct Typeface {
    family: String,
    font: fontdue::Font,
}

impl fmt::Debug for Typeface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Typeface")
            .field("family", &self.family)
            .field("glyphs", &self.font.glyph_count())
            .finish_non_exhaustive()
    }
}

impl Typeface {
    /// Decode an sfnt (TrueType, OpenType or the first face of a
    /// collection).
    ///
    /// # Errors
    ///
    /// Returns [`FontLoadError::Decode`] with the parser's message.
    pub fn from_bytes(family: &str, bytes: &[u8]) -> Result<Self, FontLoadError> {
        let font = fontdue::Font::from_bytes(bytes, FontSettings::default())
            .map_err(|message| FontLoadError::Decode(message.to_string()))?;
        Ok(Self {
            family: family.to_string(),
            font,
        })
    }

    /// The family this face was loaded for.
    #[must_use]
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Whether the face has a glyph for `c`.
    #[must_use]
    pub fn has_glyph(&self, c: char) -> bool {
        self.font.lookup_glyph_index(c) != 0
    }

    /// [§ 6.1.1 Font-relative Lengths](https://www.w3.org/TR/css-values-4/#font-relative-lengths)
    ///
    /// "ex: Equal to the used x-height of the first available font."
    /// "ch: Equal to the used advance measure of the '0' glyph."
    ///
    /// Missing glyphs keep the 0.5em fallback.
    #[must_use]
    pub fn metrics(&self, font_size: f32) -> FontMetrics {
        let mut metrics = FontMetrics::from_font_size(font_size);
        if self.has_glyph('x') {
            metrics.x_height = self.font.metrics('x', font_size).bounds.height;
        }
        if self.has_glyph('0') {
            metrics.zero_advance = self.font.metrics('0', font_size).advance_width;
        }
        if let Some(line) = self.font.horizontal_line_metrics(font_size) {
            metrics.line_height = line.new_line_size;
        }
        metrics
    }
}

/// One entry of a `font-family` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FamilyName {
    /// A concrete family name.
    Named(String),
    /// A generic family keyword.
    Generic(Keyword),
}

impl FamilyName {
    /// Read a computed `font-family` value.
    #[must_use]
    pub fn list_from_value(value: &StyleValue) -> Vec<Self> {
        value
            .as_slice()
            .iter()
            .filter_map(|item| match item {
                StyleValue::Keyword(keyword) if keyword.is_generic_font_family() => Some(Self::Generic(*keyword)),
                StyleValue::String(name) | StyleValue::CustomIdent(name) => Some(Self::Named(name.clone())),
                _ => None,
            })
            .collect()
    }
}

/// The style a font is wanted in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontDescriptor {
    /// `font-weight`, 1 to 1000.
    pub weight: f32,
    /// `font-style` is `italic` or `oblique`.
    pub italic: bool,
    /// `font-stretch` as a percentage.
    pub stretch: f32,
}

impl Default for FontDescriptor {
    fn default() -> Self {
        Self {
            weight: 400.0,
            italic: false,
            stretch: 100.0,
        }
    }
}

/// What a candidate face offers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceTraits {
    /// Supported weights, inclusive.
    pub weight: (u16, u16),
    /// Italic or oblique.
    pub italic: bool,
    /// Width percentage.
    pub stretch: f32,
}

/// Rank of a candidate along one axis: lower tier first, then smaller
/// distance.
type AxisRank = (u8, f32);

fn stretch_rank(available: f32, desired: f32) -> AxisRank {
    if (available - desired).abs() < f32::EPSILON {
        (0, 0.0)
    } else if (desired <= 100.0) == (available < desired) {
        // Narrower first for normal-or-condensed requests, wider first otherwise.
        (1, (available - desired).abs())
    } else {
        (2, (available - desired).abs())
    }
}

fn weight_rank((low, high): (u16, u16), desired: f32) -> AxisRank {
    let (low, high) = (f32::from(low), f32::from(high));
    if (low..=high).contains(&desired) {
        return (0, 0.0);
    }
    let above = low > desired;
    let distance = if above { low - desired } else { desired - high };
    if (400.0..=500.0).contains(&desired) {
        // Heavier up to 500, then lighter, then heavier than 500.
        match (above, low <= 500.0) {
            (true, true) => (1, distance),
            (false, _) => (2, distance),
            (true, false) => (3, distance),
        }
    } else if desired < 400.0 {
        if above { (2, distance) } else { (1, distance) }
    } else if above {
        (1, distance)
    } else {
        (2, distance)
    }
}

fn keep_best(candidates: &[FaceTraits], indices: &mut Vec<usize>, rank: impl Fn(&FaceTraits) -> AxisRank) {
    let Some(best) = indices
        .iter()
        .map(|&i| rank(&candidates[i]))
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    else {
        return;
    };
    indices.retain(|&i| rank(&candidates[i]) == best);
}

/// [CSS Fonts 4 § 5.2 step 4](https://www.w3.org/TR/css-fonts-4/#font-style-matching)
///
/// Narrow the faces of one family by width, then style, then weight, and
/// return the index of the winner.
#[must_use]
pub fn match_font_face(candidates: &[FaceTraits], desired: FontDescriptor) -> Option<usize> {
    let mut indices: Vec<usize> = (0..candidates.len()).collect();
    keep_best(candidates, &mut indices, |face| stretch_rank(face.stretch, desired.stretch));
    keep_best(candidates, &mut indices, |face| (u8::from(face.italic != desired.italic), 0.0));
    keep_best(candidates, &mut indices, |face| weight_rank(face.weight, desired.weight));
    indices.first().copied()
}

/// Where a [`Font`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontSource {
    /// An `@font-face` rule.
    Web,
    /// A platform face named by the family list.
    System,
    /// The default or emoji font appended to every list.
    Fallback,
}

/// One resolved font.
#[derive(Debug, Clone, Serialize)]
pub struct Font {
    /// Family name.
    pub family: String,
    /// Weight actually used.
    pub weight: u16,
    /// Italic face.
    pub italic: bool,
    /// Width percentage.
    pub stretch: f32,
    /// Origin of the face.
    pub source: FontSource,
    /// Decoded outlines, for web fonts.
    #[serde(skip)]
    pub typeface: Option<Arc<Typeface>>,
}

impl PartialEq for Font {
    fn eq(&self, other: &Self) -> bool {
        self.family == other.family
            && self.weight == other.weight
            && self.italic == other.italic
            && self.stretch == other.stretch
            && self.source == other.source
            && match (&self.typeface, &other.typeface) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            }
    }
}

/// Primary font followed by fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FontList {
    fonts: Vec<Font>,
}

impl FontList {
    /// The first font.
    #[must_use]
    pub fn primary(&self) -> Option<&Font> {
        self.fonts.first()
    }

    /// All fonts in order.
    pub fn iter(&self) -> impl Iterator<Item = &Font> {
        self.fonts.iter()
    }

    /// Number of fonts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Family names in order.
    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.fonts.iter().map(|font| font.family.as_str())
    }

    /// Metrics of the first font with outlines; synthesised from the size
    /// when there is none.
    #[must_use]
    pub fn metrics(&self, font_size: f32) -> FontMetrics {
        self.fonts
            .iter()
            .find_map(|font| font.typeface.as_ref())
            .map_or_else(|| FontMetrics::from_font_size(font_size), |typeface| typeface.metrics(font_size))
    }

    fn contains_family(&self, family: &str) -> bool {
        self.fonts.iter().any(|font| font.family.eq_ignore_ascii_case(family))
    }
}

fn used_weight((low, high): (u16, u16), desired: f32) -> u16 {
    (desired.round() as u16).clamp(low, high)
}

/// Owns the `@font-face` loaders and picks faces for computed styles.
#[derive(Debug)]
pub struct FontResolver {
    loaders: Vec<FontLoader>,
    next_token: u64,
}

impl Default for FontResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl FontResolver {
    /// A resolver with no web fonts.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            loaders: Vec::new(),
            next_token: 1,
        }
    }

    /// The current loaders.
    #[must_use]
    pub fn loaders(&self) -> &[FontLoader] {
        &self.loaders
    }

    /// Bring the loader set in line with the `@font-face` rules in force.
    /// Loaders for unchanged rules survive with their state; loaders for
    /// rules that went away are cancelled.
    pub fn set_font_faces<'a>(
        &mut self,
        faces: impl IntoIterator<Item = &'a FontFaceRule>,
        fetcher: Option<&dyn ResourceFetcher>,
    ) {
        let mut previous = std::mem::take(&mut self.loaders);
        for face in faces {
            if face.sources.is_empty() {
                continue;
            }
            match previous.iter().position(|loader| loader.face() == face) {
                Some(index) => self.loaders.push(previous.swap_remove(index)),
                None => self.loaders.push(FontLoader::new(face)),
            }
        }
        for mut loader in previous {
            loader.cancel(fetcher);
        }
    }

    /// Route a completed fetch to its loader. Returns the family that just
    /// became available, if any.
    pub fn did_complete_fetch(
        &mut self,
        completed: CompletedFetch,
        fetcher: Option<&dyn ResourceFetcher>,
    ) -> Option<String> {
        let loader = self
            .loaders
            .iter_mut()
            .find(|loader| loader.pending_token() == Some(completed.token))?;
        loader
            .did_complete_fetch(completed, fetcher, &mut self.next_token)
            .then(|| loader.face().family.clone())
    }

    /// Start every idle loader. Returns whether any face became ready
    /// synchronously (from a `data:` URL).
    pub fn start_pending_loads(&mut self, fetcher: Option<&dyn ResourceFetcher>) -> bool {
        let mut loaded = false;
        for loader in &mut self.loaders {
            loaded |= loader.start_loading_next_url(fetcher, &mut self.next_token);
        }
        loaded
    }

    /// Cancel all outstanding fetches.
    pub fn cancel_all(&mut self, fetcher: Option<&dyn ResourceFetcher>) {
        for loader in &mut self.loaders {
            loader.cancel(fetcher);
        }
    }

    /// Web font for `family`, if a matching face is ready. A matching face
    /// that is still idle starts loading.
    fn web_font(
        &mut self,
        family: &str,
        desired: FontDescriptor,
        fetcher: Option<&dyn ResourceFetcher>,
    ) -> Option<Option<Font>> {
        let indices: Vec<usize> = self
            .loaders
            .iter()
            .enumerate()
            .filter(|(_, loader)| loader.face().family.eq_ignore_ascii_case(family))
            .map(|(i, _)| i)
            .collect();
        if indices.is_empty() {
            return None;
        }
        let traits: Vec<FaceTraits> = indices
            .iter()
            .map(|&i| {
                let face = self.loaders[i].face();
                FaceTraits {
                    weight: face.weight,
                    italic: face.italic,
                    stretch: face.stretch,
                }
            })
            .collect();
        let chosen = indices[match_font_face(&traits, desired)?];
        let loader = &mut self.loaders[chosen];
        if matches!(loader.state(), FontLoadState::Idle) {
            let _ = loader.start_loading_next_url(fetcher, &mut self.next_token);
        }
        let face = loader.face();
        Some(loader.typeface().map(|typeface| Font {
            family: face.family.clone(),
            weight: used_weight(face.weight, desired.weight),
            italic: face.italic,
            stretch: face.stretch,
            source: FontSource::Web,
            typeface: Some(Arc::clone(typeface)),
        }))
    }

    fn system_font(config: &StyleConfig, family: &str, desired: FontDescriptor, source: FontSource) -> Option<Font> {
        let faces: Vec<_> = config
            .system_fonts
            .iter()
            .filter(|face| face.family.eq_ignore_ascii_case(family))
            .collect();
        let traits: Vec<FaceTraits> = faces
            .iter()
            .map(|face| FaceTraits {
                weight: (face.weight, face.weight),
                italic: face.italic,
                stretch: face.stretch,
            })
            .collect();
        let face = faces[match_font_face(&traits, desired)?];
        Some(Font {
            family: face.family.clone(),
            weight: face.weight,
            italic: face.italic,
            stretch: face.stretch,
            source,
            typeface: None,
        })
    }

    /// [CSS Fonts 4 § 5](https://www.w3.org/TR/css-fonts-4/#font-matching-algorithm)
    ///
    /// Build the font list for a family list. Generic families map through
    /// the configuration; families with no usable face are skipped.
    pub fn resolve(
        &mut self,
        config: &StyleConfig,
        families: &[FamilyName],
        desired: FontDescriptor,
        fetcher: Option<&dyn ResourceFetcher>,
    ) -> FontList {
        let mut list = FontList::default();
        for family in families {
            let name = match family {
                FamilyName::Named(name) => name.as_str(),
                FamilyName::Generic(generic) => match config.generic_family(&generic.to_string()) {
                    Some(concrete) => concrete,
                    None => continue,
                },
            };
            if list.contains_family(name) {
                continue;
            }
            let font = match self.web_font(name, desired, fetcher) {
                Some(web) => web,
                None => Self::system_font(config, name, desired, FontSource::System),
            };
            list.fonts.extend(font);
        }

        for fallback in [&config.default_font, &config.emoji_font] {
            if list.contains_family(fallback) {
                continue;
            }
            let font = Self::system_font(config, fallback, desired, FontSource::Fallback).unwrap_or_else(|| Font {
                family: fallback.clone(),
                weight: desired.weight.round() as u16,
                italic: desired.italic,
                stretch: desired.stretch,
                source: FontSource::Fallback,
                typeface: None,
            });
            list.fonts.push(font);
        }
        log::trace!(target: "wombat::style", "font list: {:?}", list.families().collect::<Vec<_>>());
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn faces(weights: &[u16]) -> Vec<FaceTraits> {
        weights
            .iter()
            .map(|&w| FaceTraits {
                weight: (w, w),
                italic: false,
                stretch: 100.0,
            })
            .collect()
    }

    fn pick(weights: &[u16], desired: f32) -> u16 {
        let candidates = faces(weights);
        let descriptor = FontDescriptor {
            weight: desired,
            ..FontDescriptor::default()
        };
        candidates[match_font_face(&candidates, descriptor).unwrap()].weight.0
    }

    #[test]
    fn test_weight_staircase_between_400_and_500() {
        assert_eq!(pick(&[300, 500, 600], 400.0), 500);
        assert_eq!(pick(&[300, 600], 450.0), 300);
        assert_eq!(pick(&[600, 700], 400.0), 600);
    }

    #[test]
    fn test_weight_staircase_light_and_bold() {
        assert_eq!(pick(&[200, 500], 300.0), 200);
        assert_eq!(pick(&[400, 500], 300.0), 400);
        assert_eq!(pick(&[400, 800], 600.0), 800);
        assert_eq!(pick(&[400, 500], 600.0), 500);
    }

    #[test]
    fn test_weight_range_contains_desired() {
        let candidates = vec![
            FaceTraits {
                weight: (100, 900),
                italic: false,
                stretch: 100.0,
            },
            FaceTraits {
                weight: (700, 700),
                italic: false,
                stretch: 100.0,
            },
        ];
        let desired = FontDescriptor {
            weight: 700.0,
            ..FontDescriptor::default()
        };
        assert_eq!(match_font_face(&candidates, desired), Some(0));
    }

    #[test]
    fn test_style_beats_weight() {
        let candidates = vec![
            FaceTraits {
                weight: (400, 400),
                italic: false,
                stretch: 100.0,
            },
            FaceTraits {
                weight: (700, 700),
                italic: true,
                stretch: 100.0,
            },
        ];
        let desired = FontDescriptor {
            weight: 400.0,
            italic: true,
            stretch: 100.0,
        };
        assert_eq!(match_font_face(&candidates, desired), Some(1));
    }

    #[test]
    fn test_generic_families_and_fallbacks() {
        let config = StyleConfig::default();
        let mut resolver = FontResolver::new();
        let families = [
            FamilyName::Named("Nonexistent".to_string()),
            FamilyName::Generic(Keyword::Monospace),
        ];
        let list = resolver.resolve(&config, &families, FontDescriptor::default(), None);
        let names: Vec<&str> = list.families().collect();
        assert_eq!(names, ["Courier New", "Times New Roman", "Noto Color Emoji"]);
        assert_eq!(list.primary().unwrap().source, FontSource::System);
        assert_eq!(list.metrics(20.0), FontMetrics::from_font_size(20.0));
    }

    #[test]
    fn test_bold_request_picks_bold_system_face() {
        let config = StyleConfig::default();
        let mut resolver = FontResolver::new();
        let desired = FontDescriptor {
            weight: 700.0,
            ..FontDescriptor::default()
        };
        let list = resolver.resolve(&config, &[FamilyName::Named("arial".into())], desired, None);
        let primary = list.primary().unwrap();
        assert_eq!(primary.family, "Arial");
        assert_eq!(primary.weight, 700);
    }

    #[test]
    fn test_loaders_survive_unchanged_rules() {
        let face = FontFaceRule {
            family: "Web".to_string(),
            sources: vec![wombat_css::FontFaceSource::Url {
                url: "https://fonts.test/web.ttf".to_string(),
                format: None,
            }],
            weight: (400, 400),
            italic: false,
            stretch: 100.0,
        };
        let mut resolver = FontResolver::new();
        resolver.set_font_faces([&face], None);
        resolver.set_font_faces([&face], None);
        assert_eq!(resolver.loaders().len(), 1);
        resolver.set_font_faces([], None);
        assert!(resolver.loaders().is_empty());
    }
}
