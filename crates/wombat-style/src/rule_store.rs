//! The set of stylesheets that take part in the cascade.
//!
//! [CSS Cascading § 6.2 Cascade Origins](https://www.w3.org/TR/css-cascade-5/#cascading-origins)
//!
//! "Each style rule has a cascade origin, which determines where it enters
//! the cascade."

use std::cell::OnceCell;
use std::sync::Arc;

use serde::Serialize;
use wombat_css::Stylesheet;
use wombat_dom::NodeId;

use crate::ua_stylesheet::user_agent_stylesheets;

/// [§ 6.2 Cascade Origins](https://www.w3.org/TR/css-cascade-5/#cascading-origins)
///
/// Ordered from lowest to highest precedence for normal declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CascadeOrigin {
    /// The browser's default sheets.
    UserAgent,
    /// Sheets supplied by the user.
    User,
    /// Sheets supplied by the document.
    Author,
}

/// Handle to an author sheet, returned by [`RuleStore::add_sheet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SheetId(usize);

/// A stylesheet together with where it enters the cascade.
#[derive(Debug, Clone)]
pub struct SheetEntry {
    /// The parsed sheet.
    pub sheet: Arc<Stylesheet>,
    /// Cascade origin.
    pub origin: CascadeOrigin,
    /// Shadow root the sheet is scoped to; `None` for document sheets.
    pub scope: Option<NodeId>,
    /// Position used to break cascade ties ("order of appearance").
    /// Increases with every added sheet and survives replacement.
    pub index: usize,
}

/// All stylesheets known to an engine, by origin.
///
/// User-agent sheets are not stored: they are the same for every document
/// and are enumerated from the built-in set, with the quirks-mode sheet
/// only present for documents in quirks mode.
#[derive(Debug, Default)]
pub struct RuleStore {
    author: Vec<SheetEntry>,
    user_source: Option<String>,
    user_sheet: OnceCell<Option<Arc<Stylesheet>>>,
    next_index: usize,
}

/// Indices below this are reserved for the user-agent and user sheets.
const FIRST_AUTHOR_INDEX: usize = 8;

impl RuleStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_index: FIRST_AUTHOR_INDEX,
            ..Self::default()
        }
    }

    /// Add an author sheet after all existing ones. `scope` is the shadow
    /// root the sheet belongs to, if any.
    pub fn add_sheet(&mut self, sheet: Arc<Stylesheet>, scope: Option<NodeId>) -> SheetId {
        let index = self.next_index.max(FIRST_AUTHOR_INDEX);
        self.next_index = index + 1;
        self.author.push(SheetEntry {
            sheet,
            origin: CascadeOrigin::Author,
            scope,
            index,
        });
        SheetId(index)
    }

    /// Remove an author sheet. Returns whether it was present.
    pub fn remove_sheet(&mut self, id: SheetId) -> bool {
        let before = self.author.len();
        self.author.retain(|entry| entry.index != id.0);
        self.author.len() != before
    }

    /// Swap the contents of an author sheet, keeping its cascade position.
    /// Returns whether the sheet was present.
    pub fn replace_sheet(&mut self, id: SheetId, sheet: Arc<Stylesheet>) -> bool {
        match self.author.iter_mut().find(|entry| entry.index == id.0) {
            Some(entry) => {
                entry.sheet = sheet;
                true
            }
            None => false,
        }
    }

    /// The sheet behind a handle.
    #[must_use]
    pub fn sheet(&self, id: SheetId) -> Option<&Arc<Stylesheet>> {
        self.author.iter().find(|entry| entry.index == id.0).map(|entry| &entry.sheet)
    }

    /// Set the user style sheet source. It is parsed the first time the
    /// user origin is enumerated.
    pub fn set_user_style_sheet(&mut self, css: Option<String>) {
        self.user_source = css;
        self.user_sheet = OnceCell::new();
    }

    fn user_sheet(&self) -> Option<&Arc<Stylesheet>> {
        self.user_sheet
            .get_or_init(|| {
                self.user_source.as_deref().map(|css| {
                    log::debug!(target: "wombat::style", "parsing user style sheet ({} bytes)", css.len());
                    Arc::new(Stylesheet::parse(css, None))
                })
            })
            .as_ref()
    }

    /// Shadow roots that own at least one author sheet.
    pub fn scopes(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut seen = Vec::new();
        self.author.iter().filter_map(move |entry| {
            let scope = entry.scope?;
            if seen.contains(&scope) {
                None
            } else {
                seen.push(scope);
                Some(scope)
            }
        })
    }

    /// Number of author sheets.
    #[must_use]
    pub fn author_sheet_count(&self) -> usize {
        self.author.len()
    }

    /// Visit every sheet of one origin in cascade order.
    ///
    /// For [`CascadeOrigin::Author`] only sheets whose scope equals `scope`
    /// are visited; the other origins ignore it.
    pub fn for_each_sheet(
        &self,
        origin: CascadeOrigin,
        quirks_mode: bool,
        scope: Option<NodeId>,
        mut visitor: impl FnMut(&SheetEntry),
    ) {
        match origin {
            CascadeOrigin::UserAgent => {
                for (index, sheet) in user_agent_stylesheets(quirks_mode).into_iter().enumerate() {
                    visitor(&SheetEntry {
                        sheet,
                        origin,
                        scope: None,
                        index,
                    });
                }
            }
            CascadeOrigin::User => {
                if let Some(sheet) = self.user_sheet() {
                    visitor(&SheetEntry {
                        sheet: Arc::clone(sheet),
                        origin,
                        scope: None,
                        index: FIRST_AUTHOR_INDEX - 1,
                    });
                }
            }
            CascadeOrigin::Author => {
                for entry in self.author.iter().filter(|entry| entry.scope == scope) {
                    visitor(entry);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(css: &str) -> Arc<Stylesheet> {
        Arc::new(Stylesheet::parse(css, None))
    }

    fn author_indices(store: &RuleStore) -> Vec<usize> {
        let mut indices = Vec::new();
        store.for_each_sheet(CascadeOrigin::Author, false, None, |entry| indices.push(entry.index));
        indices
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut store = RuleStore::new();
        let first = store.add_sheet(sheet("a {}"), None);
        let _ = store.add_sheet(sheet("b {}"), None);
        let before = author_indices(&store);
        assert!(store.replace_sheet(first, sheet("c {}")));
        assert_eq!(author_indices(&store), before);
        assert!(store.remove_sheet(first));
        assert!(!store.remove_sheet(first));
        assert_eq!(author_indices(&store).len(), 1);
    }

    #[test]
    fn test_quirks_sheet_only_in_quirks_mode() {
        let store = RuleStore::new();
        let mut standards = 0;
        store.for_each_sheet(CascadeOrigin::UserAgent, false, None, |_| standards += 1);
        let mut quirks = 0;
        store.for_each_sheet(CascadeOrigin::UserAgent, true, None, |_| quirks += 1);
        assert_eq!(quirks, standards + 1);
    }

    #[test]
    fn test_user_sheet_is_parsed_lazily() {
        let mut store = RuleStore::new();
        store.set_user_style_sheet(Some("p { color: red }".to_string()));
        assert!(store.user_sheet.get().is_none());
        let mut seen = 0;
        store.for_each_sheet(CascadeOrigin::User, false, None, |entry| {
            assert_eq!(entry.origin, CascadeOrigin::User);
            seen += 1;
        });
        assert_eq!(seen, 1);
    }

    #[test]
    fn test_scoped_sheets_are_separate() {
        let mut store = RuleStore::new();
        let _ = store.add_sheet(sheet("a {}"), None);
        let _ = store.add_sheet(sheet("b {}"), Some(NodeId(7)));
        assert_eq!(author_indices(&store).len(), 1);
        assert_eq!(store.scopes().collect::<Vec<_>>(), vec![NodeId(7)]);
    }
}
