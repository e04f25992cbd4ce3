//! Common utilities for the Wombat style engine.
//!
//! This crate provides shared infrastructure used by the other crates:
//! - **Warning System** - deduplicated, coloured reports of unsupported CSS
//! - **Fetch** - the resource fetch collaborator used for web fonts
//! - **URL** - resolution of stylesheet-relative URLs

pub mod fetch;
pub mod url;
pub mod warning;
