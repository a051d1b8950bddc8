use crate::constants;
use crate::error::{Result, SyncError};
use crate::types::Sport;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Marker-token conventions and page id for one sport.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SportProfile {
    pub page: String,
    #[serde(default = "default_free_suffix")]
    pub free_suffix: String,
    #[serde(default = "default_unavailable_suffix")]
    pub unavailable_suffix: String,
    #[serde(default = "default_header_suffix")]
    pub header_suffix: String,
}

fn default_free_suffix() -> String {
    constants::FREE_SUFFIX.to_string()
}

fn default_unavailable_suffix() -> String {
    constants::UNAVAILABLE_SUFFIX.to_string()
}

fn default_header_suffix() -> String {
    constants::HEADER_SUFFIX.to_string()
}

impl SportProfile {
    pub fn for_page(page: &str) -> Self {
        Self {
            page: page.to_string(),
            free_suffix: default_free_suffix(),
            unavailable_suffix: default_unavailable_suffix(),
            header_suffix: default_header_suffix(),
        }
    }

    pub fn builtin(sport: Sport) -> Self {
        let page = match sport {
            Sport::TennisIndoor => constants::TENNIS_INT_PAGE,
            Sport::TennisOutdoor => constants::TENNIS_EXT_PAGE,
            Sport::Squash => constants::SQUASH_PAGE,
            Sport::Badminton => constants::BADMINTON_PAGE,
            Sport::Padel => constants::PADEL_PAGE,
        };
        Self::for_page(page)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    pub booking_action: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: constants::FAIRPLAY_BASE_URL.to_string(),
            booking_action: constants::BOOKING_ACTION.to_string(),
            user_agent: constants::USER_AGENT.to_string(),
            timeout_seconds: constants::FETCH_TIMEOUT_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(constants::DEFAULT_DB_PATH),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub database: DatabaseConfig,
    /// Name as it appears in the grid cells, e.g. "C Berchier"
    pub display_name: Option<String>,
    /// Per-sport overrides; sports not listed use the built-in profile
    pub sports: HashMap<String, SportProfile>,
}

impl Config {
    /// Loads `path`, else `COURT_SYNC_CONFIG`, else `config.toml`. A missing
    /// file means defaults; environment overrides are applied last.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => std::env::var("COURT_SYNC_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(constants::DEFAULT_CONFIG_PATH)),
        };
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml(&config_content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(db) = std::env::var("COURT_SYNC_DB") {
            self.database.path = PathBuf::from(db);
        }
        if let Ok(name) = std::env::var("COURT_SYNC_DISPLAY_NAME") {
            self.display_name = Some(name);
        }
        if let Ok(base) = std::env::var("COURT_SYNC_BASE_URL") {
            self.site.base_url = base;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.site.base_url.trim().is_empty() {
            return Err(SyncError::Config("site.base_url must not be empty".into()));
        }
        for (sport, profile) in &self.sports {
            sport.parse::<Sport>()?;
            let suffixes = [
                &profile.free_suffix,
                &profile.unavailable_suffix,
                &profile.header_suffix,
            ];
            if profile.page.trim().is_empty() || suffixes.iter().any(|s| s.is_empty()) {
                return Err(SyncError::Config(format!(
                    "sport profile '{}' needs a page and non-empty marker suffixes",
                    sport
                )));
            }
        }
        Ok(())
    }

    pub fn profile(&self, sport: Sport) -> SportProfile {
        self.sports
            .get(sport.as_str())
            .cloned()
            .unwrap_or_else(|| SportProfile::builtin(sport))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_builtin_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.site.base_url, constants::FAIRPLAY_BASE_URL);
        assert_eq!(config.profile(Sport::Badminton).page, "tableau_bad.php");
        assert_eq!(config.profile(Sport::Padel).free_suffix, "_libre");
        assert!(config.display_name.is_none());
    }

    #[test]
    fn sport_override_keeps_default_suffixes() {
        let config = Config::from_toml(
            r#"
            display_name = "C Berchier"

            [site]
            base_url = "https://example.test"

            [sports.padel]
            page = "tableau_padel2.php"
            unavailable_suffix = "_ferme"
            "#,
        )
        .unwrap();

        let padel = config.profile(Sport::Padel);
        assert_eq!(padel.page, "tableau_padel2.php");
        assert_eq!(padel.unavailable_suffix, "_ferme");
        assert_eq!(padel.free_suffix, "_libre");
        assert_eq!(config.profile(Sport::Squash).page, "tableau_squash.php");
        assert_eq!(config.site.booking_action, "reservation1.php");
        assert_eq!(config.display_name.as_deref(), Some("C Berchier"));
    }

    #[test]
    fn empty_marker_suffix_is_rejected() {
        let err = Config::from_toml(
            r#"
            [sports.squash]
            page = "tableau_squash.php"
            free_suffix = ""
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }

    #[test]
    fn unknown_sport_key_is_rejected() {
        let err = Config::from_toml("[sports.golf]\npage = \"x.php\"").unwrap_err();
        assert!(matches!(err, SyncError::UnknownSport(_)));
    }

    #[test]
    fn load_from_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("court_sync.toml");
        fs::write(&path, "[site]\ntimeout_seconds = 5\n").unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.site.timeout_seconds, 5);
        assert_eq!(config.site.user_agent, constants::USER_AGENT);
    }

    #[test]
    fn load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.site.booking_action, constants::BOOKING_ACTION);
        assert_eq!(config.site.timeout_seconds, constants::FETCH_TIMEOUT_SECONDS);
    }
}
