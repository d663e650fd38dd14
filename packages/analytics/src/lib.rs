#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Analytics dashboard state.
//!
//! Mounting an [`AnalyticsPoller`] spawns a task that fetches the summary
//! immediately and then on a fixed interval, publishing each result through
//! a [`watch`] channel. The returned [`AnalyticsHandle`] stops the task when
//! unmounted or dropped.

use std::sync::Arc;
use std::time::Duration;

use britmetrics_api::{ApiError, BritMetricsApi};
use britmetrics_api_models::AnalyticsSummary;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Time between background fetches.
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// What the dashboard renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyticsView {
    /// Last successfully fetched summary. Kept across failed fetches.
    pub summary: Option<AnalyticsSummary>,
    /// Error from the most recent fetch, cleared on success.
    pub error: Option<String>,
    pub is_loading: bool,
    /// When `summary` was fetched.
    pub last_updated: Option<DateTime<Utc>>,
}

async fn fetch_into(api: &dyn BritMetricsApi, tx: &watch::Sender<AnalyticsView>) {
    tx.send_modify(|view| view.is_loading = true);

    let result = api.fetch_analytics().await;

    tx.send_modify(|view| {
        view.is_loading = false;
        match result {
            Ok(summary) => {
                log::debug!("Fetched analytics ({} analyses)", summary.total_analyses);
                view.summary = Some(summary);
                view.error = None;
                view.last_updated = Some(Utc::now());
            }
            Err(e) => {
                log::warn!("Analytics fetch failed: {e}");
                view.error = Some(e.to_string());
            }
        }
    });
}

/// Configures the background fetch loop.
pub struct AnalyticsPoller {
    api: Arc<dyn BritMetricsApi>,
    interval: Duration,
}

impl AnalyticsPoller {
    /// Poller with the default [`POLL_INTERVAL`].
    #[must_use]
    pub fn new(api: Arc<dyn BritMetricsApi>) -> Self {
        Self {
            api,
            interval: POLL_INTERVAL,
        }
    }

    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Starts polling. Must be called from within a tokio runtime.
    #[must_use]
    pub fn mount(self) -> AnalyticsHandle {
        let (tx, rx) = watch::channel(AnalyticsView::default());
        let tx = Arc::new(tx);

        let task = tokio::spawn({
            let api = self.api.clone();
            let tx = tx.clone();
            let period = self.interval;
            async move {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    fetch_into(api.as_ref(), &tx).await;
                }
            }
        });

        log::debug!("Analytics polling every {:?}", self.interval);

        AnalyticsHandle {
            api: self.api,
            tx,
            rx,
            task,
        }
    }
}

/// A mounted analytics view.
pub struct AnalyticsHandle {
    api: Arc<dyn BritMetricsApi>,
    tx: Arc<watch::Sender<AnalyticsView>>,
    rx: watch::Receiver<AnalyticsView>,
    task: JoinHandle<()>,
}

impl AnalyticsHandle {
    /// The latest published view.
    #[must_use]
    pub fn view(&self) -> AnalyticsView {
        self.rx.borrow().clone()
    }

    /// A receiver notified on every update.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AnalyticsView> {
        self.tx.subscribe()
    }

    /// Fetches immediately, outside the polling schedule.
    pub async fn refresh(&self) {
        fetch_into(self.api.as_ref(), &self.tx).await;
    }

    /// Deletes all recorded analyses, then refetches.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the delete fails; the view is left as is.
    pub async fn clear(&self) -> Result<(), ApiError> {
        self.api.clear_analytics().await?;
        log::info!("Cleared analytics");
        self.refresh().await;
        Ok(())
    }

    /// Whether the polling task is still running.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops polling.
    pub fn unmount(self) {
        drop(self);
    }
}

impl Drop for AnalyticsHandle {
    fn drop(&mut self) {
        self.task.abort();
        log::debug!("Analytics polling stopped");
    }
}
