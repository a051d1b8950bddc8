//! Site-coupling constants for the FairPlay reservation portal.
//! Everything here is a default; the config file can override each value.

pub const FAIRPLAY_BASE_URL: &str = "https://online.centrefairplay.ch";

/// Page the free cells' click handlers point at to start a reservation
pub const BOOKING_ACTION: &str = "reservation1.php";

pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; FairPlayReader/1.0)";
pub const FETCH_TIMEOUT_SECONDS: u64 = 15;

// Marker-token suffixes shared by every sport page today
pub const FREE_SUFFIX: &str = "_libre";
pub const UNAVAILABLE_SUFFIX: &str = "_indisp";
pub const HEADER_SUFFIX: &str = "_base";

// Schedule pages per sport
pub const TENNIS_INT_PAGE: &str = "tableau_int.php";
pub const TENNIS_EXT_PAGE: &str = "tableau.php";
pub const SQUASH_PAGE: &str = "tableau_squash.php";
pub const BADMINTON_PAGE: &str = "tableau_bad.php";
pub const PADEL_PAGE: &str = "tableau_padel.php";

/// Separator used when joining the names found on one cell
pub const OCCUPANT_SEPARATOR: &str = " / ";

pub const DEFAULT_DB_PATH: &str = "data/bookings.db";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
