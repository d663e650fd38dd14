//! Full-page renderers for the planner and analytics views.
//!
//! Pages only arrange components around state they are handed; all data
//! loading happens in the command handlers.

use britmetrics_analytics::AnalyticsView;
use britmetrics_api_models::{AnalyticsSummary, Prediction};
use britmetrics_cli_utils::{
    Accent, Banner, DefinitionList, ListBlock, MetricCard, SectionCard, SelectField,
};
use britmetrics_planner::format::{format_count, format_number, format_percent};
use britmetrics_planner::{
    DataSource, DerivedMetrics, FallbackConfig, PlannerState, PredictionStatus, Selection,
};

const STALE_NOTICE: &str =
    "Selection changed, prediction may be stale. Run the analysis again to refresh it.";

const NO_PREDICTION: &str = "No prediction available. Run the analysis first.";

fn blocks(parts: Vec<String>) -> String {
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn campaign_field(selection: &Selection) -> SelectField {
    let options = selection
        .campaigns()
        .campaigns
        .iter()
        .map(|c| (c.id.clone(), c.name.clone()))
        .collect();
    SelectField::new("Campaign", options)
        .selected(selection.campaign_id())
        .placeholder("Generic analysis")
}

pub fn city_field(selection: &Selection) -> SelectField {
    let options = selection
        .cities()
        .cities
        .iter()
        .map(|c| (c.id.clone(), c.name.clone()))
        .collect();
    SelectField::new("City", options)
        .selected(selection.city_id())
        .placeholder("Select a city")
}

pub fn area_field(selection: &Selection) -> SelectField {
    let options = selection
        .areas()
        .iter()
        .map(|a| (a.id.clone(), a.name.clone()))
        .collect();
    SelectField::new("Area", options)
        .selected(selection.area_id())
        .placeholder("Select a city first")
        .disabled(selection.city_id().is_empty())
}

fn campaign_section(selection: &Selection) -> String {
    let mut body = vec![campaign_field(selection).render()];
    if let Some(campaign) = selection.selected_campaign() {
        if !campaign.summary.is_empty() {
            body.push(campaign.summary.clone());
        }
        body.push(ListBlock::new("Highlights", campaign.highlights.clone()).render());
    }

    SectionCard::new("Step 1 · Select Your Campaign")
        .description("Choose a campaign type to tailor the insights to your audience.")
        .body(blocks(body))
        .render()
}

fn location_section(selection: &Selection) -> String {
    let mut body = vec![city_field(selection).render(), area_field(selection).render()];
    if let Some(area) = selection.selected_area() {
        let mut snapshot = DefinitionList::new("Area snapshot")
            .row("Daily footfall", format_count(Some(area.footfall_daily)))
            .row("Population", format_count(Some(area.population)));
        if !area.meta.is_empty() {
            snapshot = snapshot.note(area.meta.clone());
        }
        if !area.description.is_empty() {
            body.push(area.description.clone());
        }
        body.push(snapshot.render());
    }

    SectionCard::new("Step 2 · Choose Location")
        .description("Pick the city and area where the campaign will run.")
        .body(blocks(body))
        .render()
}

fn forecast_cards(prediction: &Prediction, metrics: &DerivedMetrics, generic: bool) -> String {
    let score = MetricCard::new(
        "Success Score",
        format_number(Some(prediction.success_score.round())),
    )
    .suffix("/100")
    .helper(prediction.success_level.clone())
    .accent(Accent::Green);

    let match_helper = if generic {
        "Select a campaign to unlock audience match."
    } else if metrics.audience_match.source == DataSource::Fallback {
        "Typical match for this campaign type"
    } else {
        "How closely the area matches your campaign demographic"
    };
    let audience = MetricCard::new(
        "Audience Match",
        format_percent(Some(f64::from(metrics.audience_match.value))),
    )
    .helper(match_helper)
    .accent(Accent::Purple);

    let impressions = MetricCard::new(
        "Impressions / Hour",
        format_number(prediction.impressions_per_hour.map(f64::round)),
    )
    .helper("Estimated views per hour at this location");

    let target = MetricCard::new("Target Audience / Hour", format_count(metrics.target_audience))
        .helper("Core-audience reach per hour")
        .accent(Accent::Amber);

    blocks(vec![
        score.render(),
        audience.render(),
        impressions.render(),
        target.render(),
    ])
}

fn source_note(source: DataSource) -> Option<&'static str> {
    match source {
        DataSource::Backend => None,
        DataSource::Fallback => Some("Typical values shown; live data unavailable"),
    }
}

fn context_section(prediction: &Prediction, metrics: &DerivedMetrics) -> String {
    let weather = &metrics.weather.value;
    let mut weather_list = DefinitionList::new("Weather & Movement")
        .row("Condition", weather.condition.clone())
        .row("Temperature", format!("{}°C", format_number(Some(weather.temperature_c))))
        .row("Visibility", format!("{} km", format_number(Some(weather.visibility_km))))
        .row("Wind", format!("{} kph", format_number(Some(weather.wind_kph))));
    if let Some(daytime) = weather.daytime() {
        weather_list = weather_list.row("Light", if daytime { "Daytime" } else { "Night" });
    }
    if let Some(note) = source_note(metrics.weather.source) {
        weather_list = weather_list.note(note);
    }

    let places = &metrics.places.value;
    let mut places_list = DefinitionList::new("Places Popularity")
        .row("Top place", places.place_name.clone())
        .row(
            "Rating",
            format!(
                "{} ({} reviews)",
                format_number(Some(places.rating)),
                format_count(Some(places.user_ratings_total))
            ),
        )
        .row(
            "Popularity",
            format!("{}/100", format_number(Some(places.popularity_score.round()))),
        );
    if let Some(note) = source_note(metrics.places.source) {
        places_list = places_list.note(note);
    }

    let mut traffic_list =
        DefinitionList::new("Traffic").empty_text("No traffic data available");
    if let Some(traffic) = &prediction.traffic {
        traffic_list = traffic_list
            .row("Congestion", traffic.congestion_level.clone())
            .row(
                "Speed",
                format!(
                    "{} / {} free flow",
                    format_number(Some(traffic.current_speed.round())),
                    format_number(Some(traffic.free_flow_speed.round()))
                ),
            )
            .row(
                "Delay",
                format!("{} min", format_number(Some(traffic.delay_minutes))),
            );
    }

    let events = prediction
        .events
        .iter()
        .map(|e| match (&e.start, &e.venue) {
            (Some(start), Some(venue)) => format!("{} · {start} · {venue}", e.name),
            (Some(start), None) => format!("{} · {start}", e.name),
            (None, Some(venue)) => format!("{} · {venue}", e.name),
            (None, None) => e.name.clone(),
        })
        .collect();

    SectionCard::new("Live Context")
        .body(blocks(vec![
            weather_list.render(),
            places_list.render(),
            traffic_list.render(),
            ListBlock::new("Nearby Events", events)
                .empty_text("No events found nearby")
                .render(),
        ]))
        .render()
}

fn trend_section(metrics: &DerivedMetrics) -> String {
    let mut list = DefinitionList::new("Projected impressions / hour")
        .empty_text("Trend appears once impressions are available")
        .note("Projection from current conditions, not a forecast model");
    for point in &metrics.trend {
        list = list.row(
            point.label(),
            format!(
                "{}  (score {})",
                format_count(Some(point.impressions)),
                format_number(Some(point.success_score))
            ),
        );
    }

    SectionCard::new("4-Week Trend").body(list.render()).render()
}

/// Renders the whole planner page for `state`.
#[must_use]
pub fn planner(state: &PlannerState, fallbacks: &FallbackConfig) -> String {
    let mut parts = Vec::new();

    if let Some(error) = &state.error {
        parts.push(Banner::error(error.clone()).render());
    }
    if state.is_bootstrapping {
        parts.push(Banner::info("Loading campaign configuration...").render());
    }
    if state.prediction_status() == PredictionStatus::Stale {
        parts.push(Banner::warning(STALE_NOTICE).render());
    }

    parts.push(campaign_section(&state.selection));
    parts.push(location_section(&state.selection));

    match (&state.prediction, state.metrics(fallbacks)) {
        (Some(stored), Some(metrics)) => {
            let prediction = &stored.prediction;
            let generic = state.selection.campaign_id().is_empty();

            let mut forecast = SectionCard::new("Step 3 · Forecast").body(blocks(vec![
                forecast_cards(prediction, &metrics, generic),
                ListBlock::new("Key Reasons", prediction.key_reasons.clone()).render(),
                ListBlock::new("Personalised Tactics", prediction.personalized_tips.clone())
                    .empty_text("Select a campaign to unlock tailored tactics.")
                    .render(),
                ListBlock::new(
                    "Creative Recommendations",
                    prediction.creative_recommendations.clone(),
                )
                .render(),
            ]));
            let updated = prediction.refreshed_at.unwrap_or(stored.received_at);
            forecast = forecast.description(format!(
                "Updated {}",
                updated.format("%Y-%m-%d %H:%M UTC")
            ));

            parts.push(forecast.render());
            parts.push(context_section(prediction, &metrics));
            parts.push(trend_section(&metrics));
        }
        _ => {
            if !state.is_bootstrapping {
                parts.push(Banner::info("Run the analysis to see the forecast.").render());
            }
        }
    }

    blocks(parts)
}

fn summary_section(summary: &AnalyticsSummary) -> String {
    let cards = blocks(vec![
        MetricCard::new("Analyses", format_count(Some(summary.total_analyses)))
            .accent(Accent::Blue)
            .render(),
        MetricCard::new(
            "Average Success Score",
            format_number(Some(summary.average_success_score.round())),
        )
        .suffix("/100")
        .accent(Accent::Green)
        .render(),
        MetricCard::new("Total Impressions", format_count(Some(summary.total_impressions)))
            .accent(Accent::Purple)
            .render(),
        MetricCard::new(
            "Top Location",
            summary
                .top_location()
                .map_or_else(|| "--".to_string(), |l| l.location.clone()),
        )
        .accent(Accent::Amber)
        .render(),
    ]);

    let locations = summary
        .location_performance
        .iter()
        .map(|l| {
            format!(
                "{} · score {} · match {} · {} run(s)",
                l.location,
                format_number(Some(l.success_score.round())),
                format_percent(l.audience_match),
                l.count
            )
        })
        .collect();

    let campaigns = summary
        .campaign_performance
        .iter()
        .map(|c| {
            format!(
                "{} · score {} · match {} · {} run(s)",
                c.campaign,
                format_number(Some(c.success_score.round())),
                format_percent(c.audience_match),
                c.count
            )
        })
        .collect();

    let recent = summary
        .recent_analyses
        .iter()
        .rev()
        .map(|r| {
            let campaign = if r.campaign_name.is_empty() {
                "Generic"
            } else {
                r.campaign_name.as_str()
            };
            format!(
                "{} - {} · {campaign} · score {} · {} impressions/hr",
                r.city_name,
                r.area_name,
                format_number(Some(r.success_score.round())),
                format_number(Some(r.impressions_per_hour.round()))
            )
        })
        .collect();

    blocks(vec![
        cards,
        ListBlock::new("Location Performance", locations).render(),
        ListBlock::new("Campaign Performance", campaigns).render(),
        ListBlock::new("Recent Analyses", recent).render(),
    ])
}

/// Renders the analytics dashboard for `view`.
#[must_use]
pub fn analytics(view: &AnalyticsView) -> String {
    let mut parts = Vec::new();

    if let Some(error) = &view.error {
        parts.push(Banner::error(error.clone()).render());
    }

    let body = match &view.summary {
        None if view.is_loading || view.error.is_none() => {
            Banner::info("Loading analytics...").render()
        }
        None => String::new(),
        Some(summary) if summary.is_empty() => ListBlock::new(
            "To view analytics:",
            vec![
                "Open the Campaign planner".to_string(),
                "Select a campaign type, city, and area".to_string(),
                "Run the analysis to generate real data".to_string(),
                "Return here to see aggregated insights".to_string(),
            ],
        )
        .render(),
        Some(summary) => summary_section(summary),
    };

    let mut card = SectionCard::new("Analytics Dashboard")
        .description("Campaign performance and audience reach across your analyses.")
        .body(body);
    if let Some(at) = view.last_updated {
        card = card.description(format!(
            "Campaign performance across your analyses. Updated {}",
            at.format("%H:%M:%S UTC")
        ));
    }
    parts.push(card.render());

    blocks(parts)
}

/// The prediction for the current selection as pretty JSON.
///
/// # Errors
///
/// Returns the message to show instead when the planner holds an error, no
/// prediction, or a prediction requested for a different selection.
pub fn prediction_json(state: &PlannerState) -> Result<String, String> {
    if let Some(error) = &state.error {
        return Err(error.clone());
    }
    match (&state.prediction, state.prediction_status()) {
        (Some(stored), PredictionStatus::Current) => {
            serde_json::to_string_pretty(&stored.prediction).map_err(|e| e.to_string())
        }
        (Some(_), _) => Err(STALE_NOTICE.to_string()),
        (None, _) => Err(NO_PREDICTION.to_string()),
    }
}
