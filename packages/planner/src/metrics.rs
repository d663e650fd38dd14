//! Display values derived from a prediction.
//!
//! Everything here is presentation arithmetic: when the backend leaves a
//! field empty or zero, the value shown comes from [`FallbackConfig`], and
//! the four-week trend is a fixed-shape projection of the current numbers.
//! None of it is a statistical model.

use britmetrics_api_models::{PlacesSnapshot, Prediction, WeatherSnapshot};
use strum_macros::{AsRefStr, Display};

use crate::fallbacks::FallbackConfig;
use crate::selection::Selection;

/// Backend match above which the boosted target-audience estimate applies.
pub const BOOST_MATCH_THRESHOLD: f64 = 8.0;

/// Impression multipliers for weeks 1 to 4: rising, then plateauing.
pub const WEEK_FACTORS: [f64; 4] = [0.82, 0.94, 1.03, 1.05];

/// Success score multipliers for weeks 1 to 4.
pub const SCORE_FACTORS: [f64; 4] = [0.92, 0.97, 1.0, 1.01];

/// Where a displayed value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum DataSource {
    Backend,
    Fallback,
}

/// A displayed value and its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub value: T,
    pub source: DataSource,
}

impl<T> Sourced<T> {
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self.source, DataSource::Fallback)
    }
}

/// One week of the projected trend.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    /// 1-based week number.
    pub week: u8,
    /// Projected impressions per hour.
    pub impressions: u64,
    /// Projected success score, capped at 100.
    pub success_score: f64,
}

impl TrendPoint {
    #[must_use]
    pub fn label(&self) -> String {
        format!("Week {}", self.week)
    }
}

/// All derived display values for one prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedMetrics {
    /// Audience match percentage shown in the headline card.
    pub audience_match: Sourced<u32>,
    /// Core-audience reach per hour; `None` without impressions.
    pub target_audience: Option<u64>,
    pub weather: Sourced<WeatherSnapshot>,
    pub places: Sourced<PlacesSnapshot>,
    /// Four-week projection; empty without impressions.
    pub trend: Vec<TrendPoint>,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_u64(value: f64) -> u64 {
    value.max(0.0).round() as u64
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_u32(value: f64) -> u32 {
    value.clamp(0.0, f64::from(u32::MAX)).round() as u32
}

#[allow(clippy::cast_precision_loss)]
fn as_f64(value: u64) -> f64 {
    value as f64
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Audience match to display: the backend value when positive, otherwise
/// the campaign's fallback percentage.
#[must_use]
pub fn audience_match(
    prediction: &Prediction,
    campaign_id: &str,
    fallbacks: &FallbackConfig,
) -> Sourced<u32> {
    positive(prediction.audience_match).map_or_else(
        || Sourced {
            value: u32::from(fallbacks.audience_match_for(campaign_id)),
            source: DataSource::Fallback,
        },
        |m| Sourced {
            value: round_u32(m),
            source: DataSource::Backend,
        },
    )
}

/// Core-audience reach per hour.
///
/// With a backend match above [`BOOST_MATCH_THRESHOLD`] this is the larger
/// of 35% of impressions and the backend's own estimate (or impressions
/// scaled by the match, capped at 95%, times 0.72). Otherwise impressions
/// are scaled by the campaign's fallback match times 0.68.
#[must_use]
pub fn target_audience(
    prediction: &Prediction,
    campaign_id: &str,
    fallbacks: &FallbackConfig,
) -> Option<u64> {
    let impressions = positive(prediction.impressions_per_hour)?;
    let backend_match = prediction
        .audience_match
        .filter(|m| m.is_finite())
        .unwrap_or(0.0);

    let estimate = if backend_match > BOOST_MATCH_THRESHOLD {
        let boosted = impressions * backend_match.min(95.0) / 100.0 * 0.72;
        let declared = prediction.target_audience_size.unwrap_or(0.0);
        (0.35 * impressions).max(declared.max(boosted))
    } else {
        let pct = f64::from(fallbacks.audience_match_for(campaign_id));
        impressions * pct / 100.0 * 0.68
    };

    Some(round_u64(estimate))
}

fn has_weather(weather: &WeatherSnapshot) -> bool {
    let condition = weather.condition.trim();
    (!condition.is_empty() && !condition.eq_ignore_ascii_case("unknown"))
        || weather.visibility_km != 0.0
        || weather.temperature_c != 0.0
}

fn has_places(places: &PlacesSnapshot) -> bool {
    !places.place_name.trim().is_empty() && places.popularity_score > 0.0
}

/// Weather to display: live data when it says anything, else the city's
/// fallback entry.
#[must_use]
pub fn weather_block(
    prediction: &Prediction,
    city_id: &str,
    fallbacks: &FallbackConfig,
) -> Sourced<WeatherSnapshot> {
    match prediction.weather.as_ref().filter(|w| has_weather(w)) {
        Some(weather) => Sourced {
            value: weather.clone(),
            source: DataSource::Backend,
        },
        None => Sourced {
            value: fallbacks.weather_for(city_id).into(),
            source: DataSource::Fallback,
        },
    }
}

/// Nearby place to display: live data when named and popular, else the
/// area's fallback entry.
#[must_use]
pub fn places_block(
    prediction: &Prediction,
    area_id: &str,
    fallbacks: &FallbackConfig,
) -> Sourced<PlacesSnapshot> {
    match prediction.places.as_ref().filter(|p| has_places(p)) {
        Some(places) => Sourced {
            value: places.clone(),
            source: DataSource::Backend,
        },
        None => Sourced {
            value: fallbacks.places_for(area_id).into(),
            source: DataSource::Fallback,
        },
    }
}

/// Projects impressions and score over four weeks.
#[must_use]
pub fn trend(
    impressions: Option<f64>,
    success_score: f64,
    footfall_daily: u64,
    visibility_km: f64,
    popularity: f64,
) -> Vec<TrendPoint> {
    let Some(impressions) = positive(impressions) else {
        return Vec::new();
    };

    let score_factor = 0.85 + success_score / 100.0 * 0.3;
    let visibility_factor = (visibility_km / 10.0).clamp(0.6, 1.0);
    let popularity_factor = 0.9 + popularity / 1000.0;
    let footfall_bonus = as_f64(footfall_daily) / 24.0 * 0.05;

    let base = impressions * score_factor * visibility_factor * popularity_factor + footfall_bonus;

    WEEK_FACTORS
        .iter()
        .zip(SCORE_FACTORS)
        .zip(1u8..)
        .map(|((week_factor, score_factor), week)| TrendPoint {
            week,
            impressions: round_u64(base * week_factor),
            success_score: (success_score * score_factor).min(100.0).round(),
        })
        .collect()
}

/// Derives every display value for `prediction` under `selection`.
#[must_use]
pub fn derive_metrics(
    prediction: &Prediction,
    selection: &Selection,
    fallbacks: &FallbackConfig,
) -> DerivedMetrics {
    let campaign_id = selection.campaign_id();

    let weather = weather_block(prediction, selection.city_id(), fallbacks);
    let places = places_block(prediction, selection.area_id(), fallbacks);

    let footfall = prediction
        .area
        .as_ref()
        .map(|a| a.footfall_daily)
        .filter(|f| *f > 0)
        .or_else(|| selection.selected_area().map(|a| a.footfall_daily))
        .unwrap_or(0);

    let trend = trend(
        prediction.impressions_per_hour,
        prediction.success_score,
        footfall,
        weather.value.visibility_km,
        places.value.popularity_score,
    );

    DerivedMetrics {
        audience_match: audience_match(prediction, campaign_id, fallbacks),
        target_audience: target_audience(prediction, campaign_id, fallbacks),
        weather,
        places,
        trend,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::fixtures::{campaigns, cities};

    fn prediction(matched: Option<f64>, impressions: Option<f64>) -> Prediction {
        Prediction {
            success_score: 80.0,
            audience_match: matched,
            impressions_per_hour: impressions,
            ..Prediction::default()
        }
    }

    #[test]
    fn positive_backend_match_is_rounded() {
        let fallbacks = FallbackConfig::embedded();
        let m = audience_match(&prediction(Some(76.6), None), "tech-startup", &fallbacks);
        assert_eq!(m.value, 77);
        assert_eq!(m.source, DataSource::Backend);
    }

    #[test]
    fn missing_match_uses_campaign_table_or_default() {
        let fallbacks = FallbackConfig::embedded();

        let m = audience_match(&prediction(Some(0.0), None), "tech-startup", &fallbacks);
        assert_eq!(m.value, 74);
        assert!(m.is_fallback());

        let m = audience_match(&prediction(None, None), "unmapped", &fallbacks);
        assert_eq!(m.value, 65);
    }

    #[test]
    fn target_audience_requires_impressions() {
        let fallbacks = FallbackConfig::embedded();
        assert_eq!(
            target_audience(&prediction(Some(90.0), None), "tech-startup", &fallbacks),
            None
        );
        assert_eq!(
            target_audience(&prediction(Some(90.0), Some(0.0)), "tech-startup", &fallbacks),
            None
        );
    }

    #[test]
    fn boosted_target_audience() {
        let fallbacks = FallbackConfig::embedded();

        // 1000 * 0.90 * 0.72 = 648 beats 35% and the absent backend size.
        let p = prediction(Some(90.0), Some(1000.0));
        assert_eq!(target_audience(&p, "", &fallbacks), Some(648));

        let p = Prediction {
            target_audience_size: Some(700.0),
            ..prediction(Some(90.0), Some(1000.0))
        };
        assert_eq!(target_audience(&p, "", &fallbacks), Some(700));

        // Match capped at 95: 1000 * 0.95 * 0.72 = 684.
        let p = prediction(Some(99.0), Some(1000.0));
        assert_eq!(target_audience(&p, "", &fallbacks), Some(684));

        // 1000 * 0.10 * 0.72 = 72, floored by 35% of impressions.
        let p = prediction(Some(10.0), Some(1000.0));
        assert_eq!(target_audience(&p, "", &fallbacks), Some(350));
    }

    #[test]
    fn low_match_uses_fallback_percentage() {
        let fallbacks = FallbackConfig::embedded();

        // 1000 * 0.74 * 0.68 = 503.2
        let p = prediction(Some(8.0), Some(1000.0));
        assert_eq!(target_audience(&p, "tech-startup", &fallbacks), Some(503));

        // 1000 * 0.65 * 0.68 = 442
        let p = prediction(None, Some(1000.0));
        assert_eq!(target_audience(&p, "", &fallbacks), Some(442));
    }

    #[test]
    fn empty_weather_falls_back_to_city_table() {
        let fallbacks = FallbackConfig::embedded();

        let p = Prediction {
            weather: Some(WeatherSnapshot {
                condition: "Unknown".to_string(),
                ..WeatherSnapshot::default()
            }),
            ..Prediction::default()
        };
        let block = weather_block(&p, "london", &fallbacks);
        assert!(block.is_fallback());
        assert_eq!(block.value.condition, "Overcast");

        let block = weather_block(&Prediction::default(), "leeds", &fallbacks);
        assert_eq!(block.value, WeatherSnapshot::from(&fallbacks.generic.weather));
    }

    #[test]
    fn live_weather_is_kept() {
        let fallbacks = FallbackConfig::embedded();
        let p = Prediction {
            weather: Some(WeatherSnapshot {
                condition: String::new(),
                visibility_km: 4.0,
                ..WeatherSnapshot::default()
            }),
            ..Prediction::default()
        };
        let block = weather_block(&p, "london", &fallbacks);
        assert_eq!(block.source, DataSource::Backend);
        assert!((block.value.visibility_km - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unpopular_place_falls_back_to_area_table() {
        let fallbacks = FallbackConfig::embedded();
        let p = Prediction {
            places: Some(PlacesSnapshot {
                place_name: "Closed shop".to_string(),
                popularity_score: 0.0,
                ..PlacesSnapshot::default()
            }),
            ..Prediction::default()
        };
        let block = places_block(&p, "piccadilly", &fallbacks);
        assert!(block.is_fallback());
        assert_eq!(block.value.place_name, "Piccadilly Gardens");
    }

    #[test]
    fn trend_rises_then_plateaus() {
        // base = 1000 * (0.85 + 0.24) * 1.0 * (0.9 + 0.1) + 24000 / 24 * 0.05 = 1140
        let points = trend(Some(1000.0), 80.0, 24_000, 10.0, 100.0);
        let impressions: Vec<u64> = points.iter().map(|p| p.impressions).collect();
        assert_eq!(impressions, vec![935, 1072, 1174, 1197]);

        let scores: Vec<f64> = points.iter().map(|p| p.success_score).collect();
        assert_eq!(scores, vec![74.0, 78.0, 80.0, 81.0]);
        assert_eq!(points[0].label(), "Week 1");
    }

    #[test]
    fn trend_clamps_visibility_and_score() {
        let points = trend(Some(1000.0), 100.0, 0, 1.0, 0.0);
        // base = 1000 * 1.15 * 0.6 * 0.9 = 621
        assert_eq!(points[3].impressions, 652);
        assert!((points[3].success_score - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn trend_is_empty_without_impressions() {
        assert!(trend(None, 80.0, 1000, 10.0, 50.0).is_empty());
        assert!(trend(Some(0.0), 80.0, 1000, 10.0, 50.0).is_empty());
    }

    #[test]
    fn derives_everything_for_selection() {
        let fallbacks = FallbackConfig::embedded();
        let mut selection = Selection::new(campaigns(), cities());
        selection.select_campaign("tech-startup").unwrap();

        let metrics = derive_metrics(&prediction(None, Some(1000.0)), &selection, &fallbacks);

        assert_eq!(metrics.audience_match.value, 74);
        assert_eq!(metrics.target_audience, Some(503));
        assert_eq!(metrics.weather.value.condition, "Light rain");
        assert_eq!(metrics.places.value.place_name, "Manchester Town Hall");
        assert_eq!(metrics.trend.len(), 4);
    }
}
