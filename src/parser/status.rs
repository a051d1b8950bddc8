use crate::config::SportProfile;
use crate::types::SlotStatus;

/// True when some token is `<prefix><suffix>` with a non-empty prefix,
/// e.g. `tennis_int_libre` for the suffix `_libre`.
fn has_marker(tokens: &[&str], suffix: &str) -> bool {
    tokens
        .iter()
        .any(|t| t.len() > suffix.len() && t.ends_with(suffix))
}

/// Map a cell's class tokens to a slot status.
///
/// Free is tested before unavailable, and anything else is booked; some cells
/// carry several marker-like tokens at once.
pub fn classify(tokens: &[&str], profile: &SportProfile) -> SlotStatus {
    if has_marker(tokens, &profile.free_suffix) {
        SlotStatus::Free
    } else if has_marker(tokens, &profile.unavailable_suffix) {
        SlotStatus::Unavailable
    } else {
        SlotStatus::Booked
    }
}

/// Court header and footer cells carry a `<sport>_base` token
pub fn is_header_or_footer(tokens: &[&str], profile: &SportProfile) -> bool {
    has_marker(tokens, &profile.header_suffix)
}
