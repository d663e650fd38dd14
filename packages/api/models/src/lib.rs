#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Request and response types for the `BritMetrics` REST API.
//!
//! These mirror the JSON bodies served under `/api/*`. Everything fetched
//! from the backend is immutable once received: campaigns and cities are
//! catalog data, and every [`Prediction`] replaces the previous one in full.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// A marketing audience profile used to bias recommendations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    /// Slug identifier (e.g. `"tech-startup"`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// One-line summary of the creative direction.
    #[serde(default)]
    pub summary: String,
    /// Ordered highlight bullets.
    #[serde(default)]
    pub highlights: Vec<String>,
    /// Location factors this campaign performs best with.
    #[serde(default)]
    pub ideal_factors: Vec<String>,
    /// Demographics the campaign is aimed at.
    #[serde(default)]
    pub target_demographics: Vec<String>,
}

/// Response body of `GET /api/campaigns`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignCatalog {
    /// All campaigns in display order.
    pub campaigns: Vec<Campaign>,
    /// Campaign the backend suggests selecting first.
    #[serde(default)]
    pub default_campaign_id: Option<String>,
}

impl CampaignCatalog {
    /// Looks up a campaign by id.
    #[must_use]
    pub fn campaign(&self, id: &str) -> Option<&Campaign> {
        self.campaigns.iter().find(|c| c.id == id)
    }

    /// The declared default campaign id, falling back to the first entry.
    #[must_use]
    pub fn default_id(&self) -> Option<&str> {
        self.default_campaign_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| self.campaigns.first().map(|c| c.id.as_str()))
    }
}

/// Geographic centre of an area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

/// A named sub-zone of a [`City`] with footfall and population statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    /// Slug identifier, unique within its city.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Short description of the audience found here.
    #[serde(default)]
    pub description: String,
    /// Average daily pedestrian footfall.
    #[serde(default)]
    pub footfall_daily: u64,
    /// Resident population.
    #[serde(default)]
    pub population: u64,
    /// Area centre, when the backend provides one.
    #[serde(default)]
    pub center: Option<Coordinates>,
    /// Free-text note shown under the area snapshot.
    #[serde(default)]
    pub meta: String,
}

/// A city and the areas it contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    /// Slug identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Areas in display order. Areas are owned by exactly one city.
    #[serde(default)]
    pub areas: Vec<Area>,
}

impl City {
    /// Looks up one of this city's areas by id.
    #[must_use]
    pub fn area(&self, id: &str) -> Option<&Area> {
        self.areas.iter().find(|a| a.id == id)
    }

    /// The first area in display order, if any.
    #[must_use]
    pub fn first_area(&self) -> Option<&Area> {
        self.areas.first()
    }
}

/// Response body of `GET /api/cities`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityCatalog {
    /// All cities in display order.
    pub cities: Vec<City>,
    /// City the backend suggests selecting first.
    #[serde(default)]
    pub default_city_id: Option<String>,
}

impl CityCatalog {
    /// Looks up a city by id.
    #[must_use]
    pub fn city(&self, id: &str) -> Option<&City> {
        self.cities.iter().find(|c| c.id == id)
    }

    /// The declared default city id, falling back to the first entry.
    #[must_use]
    pub fn default_id(&self) -> Option<&str> {
        self.default_city_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| self.cities.first().map(|c| c.id.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Prediction
// ---------------------------------------------------------------------------

/// Body of `POST /api/predict`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictRequest {
    /// Selected city.
    pub city_id: String,
    /// Selected area (must belong to `city_id`).
    pub area_id: String,
    /// Selected campaign; omitted for a generic analysis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
}

/// The backend's forecast for one campaign/city/area combination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    /// Success score, 0–100.
    #[serde(default)]
    pub success_score: f64,
    /// Human-readable label for the score band (e.g. "Excellent").
    #[serde(default)]
    pub success_level: String,
    /// Demographic fit percentage, 0–100, absent for generic analyses.
    #[serde(default)]
    pub audience_match: Option<f64>,
    /// Estimated impressions per hour.
    #[serde(default)]
    pub impressions_per_hour: Option<f64>,
    /// Estimated core-audience reach per hour.
    #[serde(default)]
    pub target_audience_size: Option<f64>,
    /// Impressions before weather and traffic adjustments.
    #[serde(default)]
    pub base_impressions_per_hour: Option<f64>,
    /// Why this area works for the campaign.
    #[serde(default)]
    pub key_reasons: Vec<String>,
    /// Campaign-specific tactics.
    #[serde(default)]
    pub personalized_tips: Vec<String>,
    /// Creative direction suggestions.
    #[serde(default)]
    pub creative_recommendations: Vec<String>,
    /// Live weather at the area centre.
    #[serde(default)]
    pub weather: Option<WeatherSnapshot>,
    /// Live traffic at the area centre.
    #[serde(default)]
    pub traffic: Option<TrafficSnapshot>,
    /// Most popular nearby place.
    #[serde(default)]
    pub places: Option<PlacesSnapshot>,
    /// Nearby events.
    #[serde(default)]
    pub events: Vec<EventSummary>,
    /// When the backend computed this prediction.
    #[serde(default)]
    pub refreshed_at: Option<DateTime<Utc>>,
    /// Area statistics echoed back by the backend.
    #[serde(default)]
    pub area: Option<PredictionArea>,
}

/// Weather conditions reported alongside a prediction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeatherSnapshot {
    /// Condition text (e.g. "Partly cloudy").
    pub condition: String,
    /// Temperature in degrees Celsius.
    pub temperature_c: f64,
    /// Visibility in kilometres.
    pub visibility_km: f64,
    /// Wind speed in kilometres per hour.
    pub wind_kph: f64,
    /// Precipitation in millimetres.
    pub precip_mm: Option<f64>,
    /// Relative humidity percentage.
    pub humidity: Option<f64>,
    /// UV index.
    pub uv_index: Option<f64>,
    /// `1` during daytime, `0` at night.
    pub is_day: Option<u8>,
    /// Upstream provider status.
    pub api_status: Option<String>,
}

impl WeatherSnapshot {
    /// Whether the provider reported daytime, if it said at all.
    #[must_use]
    pub fn daytime(&self) -> Option<bool> {
        self.is_day.map(|flag| flag != 0)
    }
}

/// Traffic conditions reported alongside a prediction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrafficSnapshot {
    /// Current average speed.
    pub current_speed: f64,
    /// Uncongested speed for the same road.
    pub free_flow_speed: f64,
    /// Congestion label (e.g. "Moderate").
    pub congestion_level: String,
    /// Colour used to render the congestion label.
    pub congestion_color: String,
    /// `current_speed / free_flow_speed`.
    pub speed_ratio: f64,
    /// Provider confidence, 0–1.
    pub confidence: f64,
    /// Delay compared to free flow.
    pub delay_minutes: f64,
    /// Relative vehicle density.
    pub traffic_density: f64,
    /// Upstream provider status.
    pub api_status: Option<String>,
    /// Provider timestamp.
    pub last_updated: Option<String>,
}

/// The most popular place near an area.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlacesSnapshot {
    /// Provider place id.
    pub place_id: Option<String>,
    /// Display name.
    pub place_name: String,
    /// Average rating, 0–5.
    pub rating: f64,
    /// Number of ratings.
    pub user_ratings_total: u64,
    /// Postal address.
    pub formatted_address: Option<String>,
    /// Provider place types.
    pub types: Vec<String>,
    /// Popularity score, 0–100.
    pub popularity_score: f64,
    /// Upstream provider status.
    pub api_status: Option<String>,
}

/// An event happening near an area.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventSummary {
    /// Provider event id.
    pub id: String,
    /// Event name.
    pub name: String,
    /// Start time as sent by the provider.
    pub start: Option<String>,
    /// End time as sent by the provider.
    pub end: Option<String>,
    /// Venue name or address.
    pub venue: Option<String>,
    /// Link to the event page.
    pub url: Option<String>,
    /// Provider status.
    pub status: Option<String>,
}

/// Area statistics attached to a prediction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PredictionArea {
    /// Area display name.
    pub name: String,
    /// Resident population.
    pub population: u64,
    /// Average daily footfall.
    pub footfall_daily: u64,
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

/// Response body of `GET /api/analytics`: aggregates over recent analyses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsSummary {
    /// Number of analyses in the aggregation window.
    pub total_analyses: u64,
    /// Mean success score across the window.
    pub average_success_score: f64,
    /// Sum of impressions per hour across the window.
    pub total_impressions: u64,
    /// Per city/area aggregates.
    pub location_performance: Vec<LocationPerformance>,
    /// Per campaign aggregates.
    pub campaign_performance: Vec<CampaignPerformance>,
    /// Most recent analyses, oldest first.
    pub recent_analyses: Vec<AnalysisRecord>,
}

impl AnalyticsSummary {
    /// Whether no analyses have been recorded yet.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_analyses == 0
    }

    /// The location with the highest success score.
    #[must_use]
    pub fn top_location(&self) -> Option<&LocationPerformance> {
        self.location_performance
            .iter()
            .max_by(|a, b| a.success_score.total_cmp(&b.success_score))
    }
}

/// Aggregate performance of one city/area pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationPerformance {
    /// `"<city> - <area>"`.
    pub location: String,
    /// City display name.
    pub city_name: String,
    /// Area display name.
    pub area_name: String,
    /// Daily footfall of the area.
    pub footfall: u64,
    /// Smoothed success score.
    pub success_score: f64,
    /// Smoothed audience match, absent if never reported.
    pub audience_match: Option<f64>,
    /// Number of analyses for this location.
    pub count: u64,
}

/// Aggregate performance of one campaign.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignPerformance {
    /// Campaign display name.
    pub campaign: String,
    /// Smoothed success score.
    pub success_score: f64,
    /// Smoothed audience match, absent if never reported.
    pub audience_match: Option<f64>,
    /// Number of analyses for this campaign.
    pub count: u64,
}

/// One stored analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisRecord {
    /// When the analysis ran.
    pub timestamp: Option<DateTime<Utc>>,
    /// City id.
    pub city_id: String,
    /// City display name.
    pub city_name: String,
    /// Area id.
    pub area_id: String,
    /// Area display name.
    pub area_name: String,
    /// Campaign id, absent for generic analyses.
    pub campaign_id: Option<String>,
    /// Campaign display name.
    pub campaign_name: String,
    /// Success score.
    pub success_score: f64,
    /// Audience match.
    pub audience_match: Option<f64>,
    /// Impressions per hour.
    pub impressions_per_hour: f64,
    /// Target audience per hour.
    pub target_audience_size: Option<f64>,
    /// Area footfall.
    pub footfall_daily: u64,
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Body of `POST /api/auth/create-account`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    /// Account email.
    pub email: String,
    /// Whether this is a no-payment trial account.
    pub trial: bool,
}

/// Response of account creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Session token to persist.
    pub token: String,
    /// Account email, when echoed back.
    #[serde(default)]
    pub email: Option<String>,
    /// Trial flag, when echoed back.
    #[serde(default)]
    pub trial: Option<bool>,
}

/// Body of `POST /api/auth/create-checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Email the subscription is for.
    pub email: String,
}

/// A paid-checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    /// Hosted checkout page to send the user to.
    pub checkout_url: String,
    /// Payment provider session id.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Response of `GET /api/auth/verify-session`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentVerification {
    /// Whether the checkout session was paid.
    pub paid: bool,
    /// Email attached to the checkout.
    pub email: Option<String>,
    /// Session token issued for the paid account.
    pub token: Option<String>,
}

/// Body of the session-token validation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenCheckRequest {
    /// Stored session token.
    pub token: String,
}

/// Result of a session-token validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenCheck {
    /// Whether the token still identifies an account.
    pub valid: bool,
    /// Account email.
    pub email: Option<String>,
    /// Whether the account is on the trial tier.
    pub trial: Option<bool>,
}

// ---------------------------------------------------------------------------
// Misc
// ---------------------------------------------------------------------------

/// Response of `GET /api/health`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiHealth {
    /// `"ok"` when healthy.
    pub status: String,
    /// Server time.
    pub timestamp: Option<String>,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiErrorBody {
    /// `FastAPI`-style error detail.
    pub detail: Option<String>,
    /// Generic error message.
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// The human-readable error text, preferring `detail` over `message`.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.detail
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.message.as_deref().filter(|s| !s.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_campaign_catalog_with_default() {
        let body = serde_json::json!({
            "campaigns": [
                {"id": "generic", "name": "None (Generic Analysis)", "summary": "Baseline",
                 "highlights": ["a", "b"], "idealFactors": [], "targetDemographics": []},
                {"id": "tech-startup", "name": "Tech Startup", "summary": "Bold",
                 "highlights": [], "idealFactors": ["young"]}
            ],
            "defaultCampaignId": "generic"
        });
        let catalog: CampaignCatalog = serde_json::from_value(body).unwrap();
        assert_eq!(catalog.campaigns.len(), 2);
        assert_eq!(catalog.default_id(), Some("generic"));
        assert_eq!(
            catalog.campaign("tech-startup").unwrap().ideal_factors,
            vec!["young".to_string()]
        );
    }

    #[test]
    fn default_id_falls_back_to_first_entry() {
        let catalog = CityCatalog {
            cities: vec![City {
                id: "london".to_string(),
                name: "London".to_string(),
                areas: Vec::new(),
            }],
            default_city_id: None,
        };
        assert_eq!(catalog.default_id(), Some("london"));
        assert_eq!(CityCatalog::default().default_id(), None);
    }

    #[test]
    fn parses_prediction_with_missing_optional_blocks() {
        let body = serde_json::json!({
            "successScore": 78,
            "successLevel": "Very Good",
            "audienceMatch": null,
            "impressionsPerHour": 1200,
            "keyReasons": ["Transport hub"],
            "weather": null,
            "refreshedAt": "2025-03-01T12:30:00.123456Z"
        });
        let prediction: Prediction = serde_json::from_value(body).unwrap();
        assert!((prediction.success_score - 78.0).abs() < f64::EPSILON);
        assert_eq!(prediction.audience_match, None);
        assert_eq!(prediction.impressions_per_hour, Some(1200.0));
        assert!(prediction.personalized_tips.is_empty());
        assert!(prediction.weather.is_none());
        assert!(prediction.refreshed_at.is_some());
    }

    #[test]
    fn parses_live_weather_with_integer_day_flag() {
        let body = serde_json::json!({
            "successScore": 78,
            "weather": {
                "condition": "Sunny",
                "temperatureC": 17.5,
                "visibilityKm": 10,
                "windKph": 9.4,
                "humidity": 62,
                "uvIndex": 4,
                "isDay": 1,
                "apiStatus": "Live Data"
            }
        });
        let prediction: Prediction = serde_json::from_value(body).unwrap();
        let weather = prediction.weather.unwrap();
        assert_eq!(weather.condition, "Sunny");
        assert_eq!(weather.is_day, Some(1));
        assert_eq!(weather.daytime(), Some(true));
        assert_eq!(WeatherSnapshot::default().daytime(), None);
    }

    #[test]
    fn predict_request_omits_empty_campaign() {
        let request = PredictRequest {
            city_id: "manchester".to_string(),
            area_id: "piccadilly".to_string(),
            campaign_id: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"cityId": "manchester", "areaId": "piccadilly"})
        );
    }

    #[test]
    fn error_body_prefers_detail() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"detail": "Unknown city id 'x'", "message": "nope"}"#)
                .unwrap();
        assert_eq!(body.text(), Some("Unknown city id 'x'"));

        let body: ApiErrorBody = serde_json::from_str(r#"{"detail": "", "message": "nope"}"#)
            .unwrap();
        assert_eq!(body.text(), Some("nope"));

        assert_eq!(ApiErrorBody::default().text(), None);
    }

    #[test]
    fn top_location_picks_highest_score() {
        let summary = AnalyticsSummary {
            total_analyses: 2,
            location_performance: vec![
                LocationPerformance {
                    location: "Manchester - Piccadilly".to_string(),
                    success_score: 71.0,
                    ..LocationPerformance::default()
                },
                LocationPerformance {
                    location: "London - Oxford Circus".to_string(),
                    success_score: 88.5,
                    ..LocationPerformance::default()
                },
            ],
            ..AnalyticsSummary::default()
        };
        assert!(!summary.is_empty());
        assert_eq!(
            summary.top_location().unwrap().location,
            "London - Oxford Circus"
        );
    }
}
