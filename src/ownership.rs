//! Deciding which booked cells belong to the caller, and who they play with.
//!
//! The portal abbreviates names inconsistently ("C Berchier", "Berchier C."),
//! so matching is a case-insensitive substring test, never equality.

/// Separators the occupants field may use between names
const NAME_SEPARATORS: [char; 3] = ['\n', '/', ','];

/// Case-insensitive "does `name` contain `display_name`"
pub fn name_matches(name: &str, display_name: &str) -> bool {
    name.to_lowercase().contains(&display_name.to_lowercase())
}

pub fn any_name_matches<S: AsRef<str>>(names: &[S], display_name: &str) -> bool {
    names.iter().any(|n| name_matches(n.as_ref(), display_name))
}

/// Split an occupants string into trimmed, non-empty names in document order.
pub fn split_occupants(occupants: &str) -> Vec<&str> {
    occupants
        .split(&NAME_SEPARATORS[..])
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .collect()
}

/// First occupant that is not the caller.
///
/// On slots with three or more people only the first non-matching name is
/// returned; the others are dropped.
pub fn extract_partner(occupants: &str, display_name: &str) -> Option<String> {
    split_occupants(occupants)
        .into_iter()
        .find(|n| !name_matches(n, display_name))
        .map(str::to_string)
}
