//! Time zone settings consulted by date and datetime coercion.
//!
//! Settings are resolved per call: [`crate::SerializeOptions`] and
//! [`crate::DeserializeOptions`] may carry their own [`Settings`], otherwise
//! the process-wide value installed with [`configure`] is used.

use std::path::PathBuf;
use std::sync::Arc;

use chrono_tz::Tz;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Environment variable enabling time zone support.
pub const ENV_USE_TZ: &str = "SERIALIZERS_USE_TZ";
/// Environment variable naming the default time zone.
pub const ENV_TIME_ZONE: &str = "SERIALIZERS_TIME_ZONE";

/// Serialization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	/// When true, naive datetimes produced during reversion are made aware.
	pub use_tz: bool,
	/// Zone used to interpret naive datetimes when `use_tz` is active.
	pub time_zone: Tz,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			use_tz: false,
			time_zone: Tz::UTC,
		}
	}
}

impl Settings {
	/// Enables or disables time zone support.
	pub fn with_use_tz(mut self, use_tz: bool) -> Self {
		self.use_tz = use_tz;
		self
	}

	/// Sets the default time zone.
	pub fn with_time_zone(mut self, time_zone: Tz) -> Self {
		self.time_zone = time_zone;
		self
	}

	/// Parses settings from a TOML document.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_serializers::Settings;
	///
	/// let settings = Settings::from_toml_str("use_tz = true\ntime_zone = \"Europe/London\"").unwrap();
	/// assert!(settings.use_tz);
	/// assert_eq!(settings.time_zone, chrono_tz::Europe::London);
	/// ```
	pub fn from_toml_str(contents: &str) -> Result<Self, SettingsError> {
		toml::from_str(contents).map_err(|e| SettingsError::ParseError(e.to_string()))
	}

	/// Loads settings from a TOML file.
	pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
		let path = path.into();
		let contents = std::fs::read_to_string(&path).map_err(|e| {
			SettingsError::FileError(format!("Failed to read {}: {}", path.display(), e))
		})?;
		Self::from_toml_str(&contents)
	}

	/// Load settings from environment variables
	///
	/// Unset variables keep their defaults.
	pub fn from_env() -> Result<Self, SettingsError> {
		let mut settings = Self::default();

		if let Ok(use_tz) = std::env::var(ENV_USE_TZ) {
			settings.use_tz = parse_flag(ENV_USE_TZ, &use_tz)?;
		}

		if let Ok(zone) = std::env::var(ENV_TIME_ZONE) {
			settings.time_zone = zone
				.trim()
				.parse::<Tz>()
				.map_err(|_| SettingsError::InvalidTimeZone(zone.clone()))?;
		}

		Ok(settings)
	}
}

fn parse_flag(name: &str, value: &str) -> Result<bool, SettingsError> {
	match value.trim().to_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" | "" => Ok(false),
		_ => Err(SettingsError::ValidationError(format!(
			"{} must be a boolean, got '{}'",
			name, value
		))),
	}
}

/// Errors raised while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("File error: {0}")]
	FileError(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Unknown time zone: {0}")]
	InvalidTimeZone(String),
}

static CURRENT: Lazy<RwLock<Arc<Settings>>> =
	Lazy::new(|| RwLock::new(Arc::new(Settings::default())));

/// Installs the process-wide settings.
pub fn configure(settings: Settings) {
	*CURRENT.write() = Arc::new(settings);
}

/// Returns the process-wide settings.
pub fn current() -> Arc<Settings> {
	CURRENT.read().clone()
}
