#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared terminal utilities for the `BritMetrics` CLI.
//!
//! [`init_logger`] sets up `indicatif-log-bridge` so that `log::info!` and
//! friends are suspended while spinners redraw, [`waiting_indicator`] is
//! the spinner shown while a request or session check is in flight, and
//! [`components`] holds the stateless renderers every page is built from.

pub mod components;

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub use components::{
    Accent, Banner, BannerKind, DefinitionList, ListBlock, MetricCard, SectionCard, SelectField,
};
pub use indicatif::{MultiProgress, ProgressDrawTarget};

/// Adds a spinner with `message` to `multi`.
///
/// Call [`ProgressBar::finish_and_clear`] once the awaited work settles.
#[must_use]
pub fn waiting_indicator(multi: &MultiProgress, message: &str) -> ProgressBar {
    let bar = multi.add(ProgressBar::new_spinner());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar
}

/// Initializes the global logger wrapped in `indicatif-log-bridge` so that
/// `log::info!` and friends are suspended while spinners redraw.
///
/// Returns the [`MultiProgress`] that all spinners must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok(); // already set, e.g. in tests

    log::set_max_level(level);

    multi
}
