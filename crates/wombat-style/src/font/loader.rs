//! Web font loading for `@font-face`.
//!
//! [CSS Fonts 4 § 4.8.1 Fetching a font](https://drafts.csswg.org/css-fonts-4/#fetch-a-font)
//!
//! "To fetch a font given a selected `<url>` url for @font-face rule, fetch
//! url, with stylesheet being rule's parent CSS style sheet, destination
//! "font", CORS mode "cors" ..."
//!
//! A [`FontLoader`] walks its source URLs one at a time. Every response is
//! sniffed and decoded; a failure moves on to the next URL, and only when
//! the list runs dry does the loader give up. Loading never blocks style
//! computation: until a face is ready the family simply falls back.

use std::collections::VecDeque;
use std::io::Read;
use std::sync::Arc;

use flate2::read::ZlibDecoder;
use thiserror::Error;
use wombat_common::fetch::{CompletedFetch, DataUrl, Destination, FetchError, FetchRequest, RequestMode, ResourceFetcher};
use wombat_common::warning::warn_once;
use wombat_css::{FontFaceRule, FontFaceSource};

use super::Typeface;

/// Errors produced while loading one font source.
#[derive(Debug, Error)]
pub enum FontLoadError {
    /// The fetch itself failed.
    #[error("font fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Neither the MIME type nor the leading bytes identify a font format.
    #[error("automatic font format detection failed")]
    UnknownFormat,

    /// A recognised format the engine cannot decode.
    #[error("unsupported font format: {0}")]
    UnsupportedFormat(&'static str),

    /// The bytes claimed a format but did not decode as one.
    #[error("malformed font data: {0}")]
    Decode(String),

    /// Every source of the face failed.
    #[error("no usable source for font family `{0}`")]
    Exhausted(String),
}

/// A font container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFormat {
    /// TrueType outlines in an sfnt.
    TrueType,
    /// CFF outlines in an sfnt.
    OpenType,
    /// A TrueType/OpenType collection.
    Collection,
    /// [WOFF 1.0](https://www.w3.org/TR/WOFF/)
    Woff,
    /// [WOFF 2.0](https://www.w3.org/TR/WOFF2/)
    Woff2,
}

impl FontFormat {
    /// Format named by a MIME essence, if it is a font type.
    #[must_use]
    pub fn from_mime_type(essence: &str) -> Option<Self> {
        match essence.trim().to_ascii_lowercase().as_str() {
            "font/ttf" | "application/x-font-ttf" | "application/x-font-truetype" => Some(Self::TrueType),
            "font/otf" | "application/vnd.ms-opentype" | "application/x-font-opentype" => Some(Self::OpenType),
            "font/collection" => Some(Self::Collection),
            "font/woff" | "application/font-woff" => Some(Self::Woff),
            "font/woff2" | "application/font-woff2" => Some(Self::Woff2),
            _ => None,
        }
    }

    /// Short lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TrueType => "ttf",
            Self::OpenType => "otf",
            Self::Collection => "collection",
            Self::Woff => "woff",
            Self::Woff2 => "woff2",
        }
    }
}

/// [MIME Sniffing § 7.3](https://mimesniff.spec.whatwg.org/#matching-a-font-type-pattern)
///
/// Identify a font by its leading bytes.
#[must_use]
pub fn sniff_font_format(bytes: &[u8]) -> Option<FontFormat> {
    match bytes.get(..4)? {
        [0x00, 0x01, 0x00, 0x00] | b"true" => Some(FontFormat::TrueType),
        b"OTTO" => Some(FontFormat::OpenType),
        b"ttcf" => Some(FontFormat::Collection),
        b"wOFF" => Some(FontFormat::Woff),
        b"wOF2" => Some(FontFormat::Woff2),
        _ => None,
    }
}

/// Decode a response body into a typeface. A MIME type that names a font
/// format is trusted; anything else (commonly `application/octet-stream`)
/// falls back to sniffing.
///
/// # Errors
///
/// Returns [`FontLoadError::UnknownFormat`] when the format cannot be
/// identified, [`FontLoadError::UnsupportedFormat`] for WOFF2 and
/// [`FontLoadError::Decode`] for malformed data.
pub fn try_load_font(family: &str, mime_type: Option<&str>, bytes: &[u8]) -> Result<Typeface, FontLoadError> {
    let format = mime_type
        .and_then(FontFormat::from_mime_type)
        .or_else(|| sniff_font_format(bytes))
        .ok_or(FontLoadError::UnknownFormat)?;
    match format {
        FontFormat::TrueType | FontFormat::OpenType | FontFormat::Collection => Typeface::from_bytes(family, bytes),
        FontFormat::Woff => Typeface::from_bytes(family, &woff_to_sfnt(bytes)?),
        FontFormat::Woff2 => Err(FontLoadError::UnsupportedFormat(format.name())),
    }
}

fn read_u16(bytes: &[u8], offset: usize) -> Result<u16, FontLoadError> {
    bytes
        .get(offset..offset + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| FontLoadError::Decode(format!("truncated at offset {offset}")))
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, FontLoadError> {
    bytes
        .get(offset..offset + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| FontLoadError::Decode(format!("truncated at offset {offset}")))
}

const WOFF_HEADER_SIZE: usize = 44;
const WOFF_TABLE_ENTRY_SIZE: usize = 20;
const SFNT_HEADER_SIZE: usize = 12;
const SFNT_TABLE_RECORD_SIZE: usize = 16;

/// [WOFF 1.0 § 4-5](https://www.w3.org/TR/WOFF/#WOFFHeader)
///
/// Rebuild the sfnt a WOFF file wraps. Tables whose compressed length is
/// smaller than their original length are zlib streams.
///
/// # Errors
///
/// Returns [`FontLoadError::Decode`] for truncated input, bad signatures or
/// tables that do not inflate to their declared size.
pub fn woff_to_sfnt(woff: &[u8]) -> Result<Vec<u8>, FontLoadError> {
    if woff.get(..4) != Some(b"wOFF".as_slice()) {
        return Err(FontLoadError::Decode("missing wOFF signature".to_string()));
    }
    let flavor = read_u32(woff, 4)?;
    let num_tables = read_u16(woff, 12)?;
    let table_count = usize::from(num_tables);

    let mut tables = Vec::with_capacity(table_count);
    for i in 0..table_count {
        let entry = WOFF_HEADER_SIZE + i * WOFF_TABLE_ENTRY_SIZE;
        let tag = read_u32(woff, entry)?;
        let offset = read_u32(woff, entry + 4)? as usize;
        let compressed_length = read_u32(woff, entry + 8)? as usize;
        let original_length = read_u32(woff, entry + 12)? as usize;
        let checksum = read_u32(woff, entry + 16)?;
        let data = woff
            .get(offset..offset + compressed_length)
            .ok_or_else(|| FontLoadError::Decode(format!("table {tag:08x} out of bounds")))?;

        let table = if compressed_length < original_length {
            let mut inflated = Vec::with_capacity(original_length);
            let _ = ZlibDecoder::new(data)
                .read_to_end(&mut inflated)
                .map_err(|e| FontLoadError::Decode(format!("table {tag:08x}: {e}")))?;
            if inflated.len() != original_length {
                return Err(FontLoadError::Decode(format!(
                    "table {tag:08x} inflated to {} bytes, expected {original_length}",
                    inflated.len()
                )));
            }
            inflated
        } else if compressed_length == original_length {
            data.to_vec()
        } else {
            return Err(FontLoadError::Decode(format!("table {tag:08x} grew when compressed")));
        };
        tables.push((tag, checksum, table));
    }

    // Offset table: searchRange is the largest power of two <= numTables, times 16.
    let entry_selector = if num_tables == 0 { 0 } else { num_tables.ilog2() as u16 };
    let search_range = (1u16 << entry_selector) * 16;
    let range_shift = num_tables * 16 - search_range.min(num_tables * 16);

    let mut sfnt = Vec::new();
    sfnt.extend_from_slice(&flavor.to_be_bytes());
    sfnt.extend_from_slice(&num_tables.to_be_bytes());
    sfnt.extend_from_slice(&search_range.to_be_bytes());
    sfnt.extend_from_slice(&entry_selector.to_be_bytes());
    sfnt.extend_from_slice(&range_shift.to_be_bytes());

    let mut data_offset = SFNT_HEADER_SIZE + table_count * SFNT_TABLE_RECORD_SIZE;
    for (tag, checksum, table) in &tables {
        sfnt.extend_from_slice(&tag.to_be_bytes());
        sfnt.extend_from_slice(&checksum.to_be_bytes());
        sfnt.extend_from_slice(&(data_offset as u32).to_be_bytes());
        sfnt.extend_from_slice(&(table.len() as u32).to_be_bytes());
        data_offset += table.len().next_multiple_of(4);
    }
    for (_, _, table) in &tables {
        sfnt.extend_from_slice(table);
        sfnt.resize(sfnt.len().next_multiple_of(4), 0);
    }
    Ok(sfnt)
}

/// Where a [`FontLoader`] is in its life.
#[derive(Debug, Clone)]
pub enum FontLoadState {
    /// Nothing requested yet.
    Idle,
    /// Waiting for the fetch collaborator.
    Fetching {
        /// The URL being fetched.
        url: String,
        /// Token the completion will carry.
        token: u64,
    },
    /// Bytes arrived and are being decoded.
    Decoding,
    /// A face decoded successfully.
    Ready(Arc<Typeface>),
    /// Every source failed.
    Failed,
}

/// Loads one `@font-face` rule.
#[derive(Debug)]
pub struct FontLoader {
    face: FontFaceRule,
    pending_urls: VecDeque<String>,
    state: FontLoadState,
}

impl FontLoader {
    /// A loader for `face`. `local()` sources are not supported and are
    /// dropped with a warning.
    #[must_use]
    pub fn new(face: &FontFaceRule) -> Self {
        let mut pending_urls = VecDeque::new();
        for source in &face.sources {
            match source {
                FontFaceSource::Url { url, .. } => pending_urls.push_back(url.clone()),
                FontFaceSource::Local(_) => warn_once("CSS", "local() font sources are not supported"),
            }
        }
        Self {
            face: face.clone(),
            pending_urls,
            state: FontLoadState::Idle,
        }
    }

    /// The rule this loader serves.
    #[must_use]
    pub const fn face(&self) -> &FontFaceRule {
        &self.face
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &FontLoadState {
        &self.state
    }

    /// The decoded face, once ready.
    #[must_use]
    pub const fn typeface(&self) -> Option<&Arc<Typeface>> {
        match &self.state {
            FontLoadState::Ready(typeface) => Some(typeface),
            _ => None,
        }
    }

    /// Whether a fetch is outstanding.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self.state, FontLoadState::Fetching { .. } | FontLoadState::Decoding)
    }

    /// Token of the outstanding fetch, if any.
    #[must_use]
    pub const fn pending_token(&self) -> Option<u64> {
        match self.state {
            FontLoadState::Fetching { token, .. } => Some(token),
            _ => None,
        }
    }

    /// Start the next source, unless a fetch is already in flight or the
    /// face is settled. `data:` URLs decode on the spot. Without a fetcher
    /// network sources wait until one is provided.
    ///
    /// Returns true if a face became ready during this call.
    pub fn start_loading_next_url(&mut self, fetcher: Option<&dyn ResourceFetcher>, next_token: &mut u64) -> bool {
        if !matches!(self.state, FontLoadState::Idle) {
            return false;
        }
        while let Some(url) = self.pending_urls.pop_front() {
            if url.starts_with("data:") {
                self.state = FontLoadState::Decoding;
                let result = DataUrl::parse(&url)
                    .and_then(|data_url| Ok((data_url.mime_type, data_url.decode()?)))
                    .map_err(FontLoadError::from)
                    .and_then(|(mime, body)| {
                        let mime = (!mime.is_empty()).then_some(mime);
                        try_load_font(&self.face.family, mime, &body)
                    });
                match result {
                    Ok(typeface) => {
                        self.state = FontLoadState::Ready(Arc::new(typeface));
                        log::debug!(target: "wombat::style", "font `{}` loaded from data: URL", self.face.family);
                        return true;
                    }
                    Err(error) => {
                        log::warn!(target: "wombat::style", "font `{}`: {error}", self.face.family);
                        continue;
                    }
                }
            }

            let Some(fetcher) = fetcher else {
                self.pending_urls.push_front(url);
                self.state = FontLoadState::Idle;
                return false;
            };
            let token = *next_token;
            *next_token += 1;
            self.state = FontLoadState::Fetching {
                url: url.clone(),
                token,
            };
            fetcher.fetch(FetchRequest {
                token,
                url,
                destination: Destination::Font,
                mode: RequestMode::Cors,
            });
            return false;
        }
        self.fail();
        false
    }

    fn fail(&mut self) {
        let error = FontLoadError::Exhausted(self.face.family.clone());
        log::warn!(target: "wombat::style", "{error}");
        self.state = FontLoadState::Failed;
    }

    /// Feed a completed fetch. Ignored unless it answers the outstanding
    /// request. On failure the next source is started.
    ///
    /// Returns true if the face became ready.
    pub fn did_complete_fetch(
        &mut self,
        completed: CompletedFetch,
        fetcher: Option<&dyn ResourceFetcher>,
        next_token: &mut u64,
    ) -> bool {
        if self.pending_token() != Some(completed.token) {
            return false;
        }
        self.state = FontLoadState::Decoding;
        let result = completed
            .result
            .map_err(FontLoadError::from)
            .and_then(|response| try_load_font(&self.face.family, response.mime_type.as_deref(), &response.body));
        match result {
            Ok(typeface) => {
                log::debug!(target: "wombat::style", "font `{}` loaded", self.face.family);
                self.state = FontLoadState::Ready(Arc::new(typeface));
                true
            }
            Err(error) => {
                log::warn!(target: "wombat::style", "font `{}`: {error}", self.face.family);
                self.state = FontLoadState::Idle;
                self.start_loading_next_url(fetcher, next_token)
            }
        }
    }

    /// Abort an outstanding fetch. Its URL is retried on the next start.
    pub fn cancel(&mut self, fetcher: Option<&dyn ResourceFetcher>) {
        if let (Some(token), Some(fetcher)) = (self.pending_token(), fetcher) {
            fetcher.cancel(token);
        }
        if let FontLoadState::Fetching { url, .. } = &self.state {
            self.pending_urls.push_front(url.clone());
        }
        if self.is_loading() {
            self.state = FontLoadState::Idle;
        }
    }
}
