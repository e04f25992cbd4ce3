//! Tests for the deduplicating warning system.

use wombat_common::warning::{clear_warnings, warn_once, was_warned};

#[test]
fn test_warn_once_records_and_clears() {
    warn_once("CSS", "unsupported pseudo-class ':host-context'");
    assert!(was_warned("CSS", "unsupported pseudo-class ':host-context'"));
    assert!(!was_warned("Fonts", "unsupported pseudo-class ':host-context'"));

    clear_warnings();
    assert!(!was_warned("CSS", "unsupported pseudo-class ':host-context'"));
}
