//! Display defaults for fields the backend omits or zeroes.
//!
//! The tables are plain configuration loaded at startup: the compiled-in
//! `fallbacks.toml` by default, or an override file passed to
//! [`FallbackConfig::load`]. Nothing in the derived-metrics layer hard-codes
//! a default value.

use std::collections::BTreeMap;
use std::path::Path;

use britmetrics_api_models::{PlacesSnapshot, WeatherSnapshot};
use serde::Deserialize;
use thiserror::Error;

const EMBEDDED_FALLBACKS: &str = include_str!("../fallbacks.toml");

/// Errors loading a fallback table.
#[derive(Debug, Error)]
pub enum FallbackError {
    /// The file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a valid fallback table.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Weather shown when live conditions are unavailable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FallbackWeather {
    pub condition: String,
    pub temperature_c: f64,
    pub visibility_km: f64,
    pub wind_kph: f64,
}

impl From<&FallbackWeather> for WeatherSnapshot {
    fn from(value: &FallbackWeather) -> Self {
        Self {
            condition: value.condition.clone(),
            temperature_c: value.temperature_c,
            visibility_km: value.visibility_km,
            wind_kph: value.wind_kph,
            ..Self::default()
        }
    }
}

/// Nearby place shown when live place data is unavailable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FallbackPlace {
    pub place_name: String,
    pub rating: f64,
    pub user_ratings_total: u64,
    pub popularity_score: f64,
}

impl From<&FallbackPlace> for PlacesSnapshot {
    fn from(value: &FallbackPlace) -> Self {
        Self {
            place_name: value.place_name.clone(),
            rating: value.rating,
            user_ratings_total: value.user_ratings_total,
            popularity_score: value.popularity_score,
            ..Self::default()
        }
    }
}

/// Entries used when neither the backend nor a keyed entry has data.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenericFallbacks {
    pub weather: FallbackWeather,
    pub places: FallbackPlace,
}

/// All fallback tables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FallbackConfig {
    /// Audience match for campaigns missing from [`Self::campaigns`].
    pub default_audience_match: u8,
    /// Audience match percentage by campaign id.
    #[serde(default)]
    pub campaigns: BTreeMap<String, u8>,
    /// Weather by city id.
    #[serde(default)]
    pub weather: BTreeMap<String, FallbackWeather>,
    /// Most popular place by area id.
    #[serde(default)]
    pub places: BTreeMap<String, FallbackPlace>,
    pub generic: GenericFallbacks,
}

impl FallbackConfig {
    /// Parses a fallback table from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`FallbackError::Toml`] if the text is malformed.
    pub fn from_toml_str(text: &str) -> Result<Self, FallbackError> {
        Ok(toml::de::from_str(text)?)
    }

    /// Reads a fallback table from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`FallbackError`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FallbackError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::info!(
            "Loaded fallback tables from {} ({} campaigns)",
            path.display(),
            config.campaigns.len()
        );
        Ok(config)
    }

    /// The compiled-in fallback tables.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (covered by tests, since the
    /// file is compiled in).
    #[must_use]
    pub fn embedded() -> Self {
        Self::from_toml_str(EMBEDDED_FALLBACKS)
            .unwrap_or_else(|e| panic!("Failed to parse embedded fallbacks: {e}"))
    }

    /// Audience match percentage for a campaign id, or the default.
    #[must_use]
    pub fn audience_match_for(&self, campaign_id: &str) -> u8 {
        self.campaigns
            .get(campaign_id)
            .copied()
            .unwrap_or(self.default_audience_match)
    }

    /// Weather for a city, falling back to the generic entry.
    #[must_use]
    pub fn weather_for(&self, city_id: &str) -> &FallbackWeather {
        self.weather
            .get(city_id)
            .unwrap_or(&self.generic.weather)
    }

    /// Place for an area, falling back to the generic entry.
    #[must_use]
    pub fn places_for(&self, area_id: &str) -> &FallbackPlace {
        self.places.get(area_id).unwrap_or(&self.generic.places)
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self::embedded()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn embedded_table_parses() {
        let config = FallbackConfig::embedded();
        assert_eq!(config.default_audience_match, 65);
        assert_eq!(config.campaigns.len(), 10);
        assert!(config.weather.contains_key("manchester"));
        assert!(config.places.contains_key("albert-square"));
    }

    #[test]
    fn campaign_percentages_are_valid() {
        let config = FallbackConfig::embedded();
        for (id, pct) in &config.campaigns {
            assert!(*pct > 0 && *pct <= 100, "Bad percentage for {id}: {pct}");
        }
        let unique: BTreeSet<_> = config.campaigns.keys().collect();
        assert_eq!(unique.len(), config.campaigns.len());
    }

    #[test]
    fn unknown_campaign_uses_default() {
        let config = FallbackConfig::embedded();
        assert_eq!(config.audience_match_for("tech-startup"), 74);
        assert_eq!(config.audience_match_for("tech-startup"), 74);
        assert_eq!(config.audience_match_for("no-such-campaign"), 65);
        assert_eq!(config.audience_match_for(""), 65);
    }

    #[test]
    fn unknown_city_and_area_use_generic_entries() {
        let config = FallbackConfig::embedded();
        assert_eq!(config.weather_for("leeds"), &config.generic.weather);
        assert_eq!(config.places_for("headingley"), &config.generic.places);
        assert_eq!(config.weather_for("london").condition, "Overcast");
    }

    #[test]
    fn loads_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fallbacks.toml");
        std::fs::write(
            &path,
            r#"
default_audience_match = 50

[campaigns]
"pop-up-store" = 88

[generic.weather]
condition = "Sunny"
temperature_c = 20.0
visibility_km = 10.0
wind_kph = 5.0

[generic.places]
place_name = "Market"
rating = 4.0
user_ratings_total = 10
popularity_score = 60.0
"#,
        )
        .unwrap();

        let config = FallbackConfig::load(&path).unwrap();
        assert_eq!(config.audience_match_for("pop-up-store"), 88);
        assert_eq!(config.audience_match_for("tech-startup"), 50);
        assert!(config.places.is_empty());
    }

    #[test]
    fn rejects_malformed_override() {
        let err = FallbackConfig::from_toml_str("default_audience_match = \"high\"").unwrap_err();
        assert!(matches!(err, FallbackError::Toml(_)));
    }

    #[test]
    fn converts_into_snapshots() {
        let config = FallbackConfig::embedded();
        let weather = WeatherSnapshot::from(config.weather_for("manchester"));
        assert_eq!(weather.condition, "Light rain");
        assert!(weather.api_status.is_none());

        let place = PlacesSnapshot::from(config.places_for("camden-town"));
        assert_eq!(place.place_name, "Camden Market");
        assert_eq!(place.user_ratings_total, 87_000);
    }
}
