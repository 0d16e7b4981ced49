//! Application state holder.
//!
//! [`WeatherStore`] is the single writer of [`AppState`]. Front ends read the
//! current value, subscribe to changes, and listen for transient notices that
//! must not replace what is on screen.

use std::sync::{
    Arc,
    atomic::{AtomicU64, AtomicUsize, Ordering},
};

use tokio::sync::{broadcast, watch};

use crate::{
    error::WeatherError,
    model::WeatherViewModel,
    normalize::normalize,
    provider::WeatherProvider,
};

/// Notice sent when a refresh fails but cached data stays visible.
pub const OFFLINE_NOTICE: &str = "No internet connection. Showing offline data.";
/// Error shown when a coordinate lookup fails.
pub const LOCATION_FAILED_MESSAGE: &str =
    "Couldn't load weather for your location. Check your internet connection.";

const NOTICE_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AppState {
    #[default]
    Loading,
    Success(WeatherViewModel),
    Error(String),
}

impl AppState {
    pub fn is_success(&self) -> bool {
        matches!(self, AppState::Success(_))
    }

    pub fn weather(&self) -> Option<&WeatherViewModel> {
        match self {
            AppState::Success(vm) => Some(vm),
            AppState::Loading | AppState::Error(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Place,
    Coordinates,
}

#[derive(Debug)]
pub struct WeatherStore {
    provider: Arc<dyn WeatherProvider>,
    state: watch::Sender<AppState>,
    refreshing: watch::Sender<bool>,
    /// Refreshes in flight; the flag is raised while this is non-zero.
    active_refreshes: AtomicUsize,
    notices: broadcast::Sender<String>,
    /// Incremented per request; only the latest request may publish.
    generation: AtomicU64,
}

impl WeatherStore {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        let (state, _) = watch::channel(AppState::Loading);
        let (refreshing, _) = watch::channel(false);
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);

        Self {
            provider,
            state,
            refreshing,
            active_refreshes: AtomicUsize::new(0),
            notices,
            generation: AtomicU64::new(0),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AppState {
        self.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<AppState> {
        self.state.subscribe()
    }

    pub fn is_refreshing(&self) -> bool {
        *self.refreshing.borrow()
    }

    pub fn subscribe_refreshing(&self) -> watch::Receiver<bool> {
        self.refreshing.subscribe()
    }

    /// Transient, one-shot messages. Only notices sent after subscribing are received.
    pub fn subscribe_notifications(&self) -> broadcast::Receiver<String> {
        self.notices.subscribe()
    }

    /// City currently on screen, if any.
    pub fn current_city(&self) -> Option<String> {
        self.state.borrow().weather().map(|vm| vm.city_name.clone())
    }

    /// Load weather for a place name.
    ///
    /// Keeps a previous success visible while loading; if the request then
    /// fails, the stale data stays and a notice is sent instead.
    pub async fn fetch(&self, city: &str) {
        let ticket = self.next_ticket();

        let showing_data = self.state.borrow().is_success();
        if !showing_data {
            self.state.send_replace(AppState::Loading);
        }

        let result = self
            .provider
            .fetch_by_place(city)
            .await
            .and_then(|raw| normalize(&raw));

        self.settle(ticket, Origin::Place, true, result);
    }

    /// Load weather for a coordinate pair. Always shows the loading state first.
    pub async fn fetch_by_coordinates(&self, lat: f64, lon: f64) {
        let ticket = self.next_ticket();
        self.state.send_replace(AppState::Loading);

        let result = self
            .provider
            .fetch_by_coordinates(lat, lon)
            .await
            .and_then(|raw| normalize(&raw));

        self.settle(ticket, Origin::Coordinates, false, result);
    }

    /// Re-fetch `city` with the refreshing flag raised until the fetch completes.
    pub async fn refresh(&self, city: &str) {
        let _guard = RefreshGuard::raise(self);
        self.fetch(city).await;
    }

    /// Re-fetch a coordinate pair without dropping what is on screen.
    ///
    /// With nothing shown yet this behaves like [`Self::fetch_by_coordinates`];
    /// otherwise a failure keeps the data and sends a notice.
    pub async fn refresh_by_coordinates(&self, lat: f64, lon: f64) {
        let _guard = RefreshGuard::raise(self);

        let showing_data = self.state.borrow().is_success();
        if !showing_data {
            self.fetch_by_coordinates(lat, lon).await;
            return;
        }

        let ticket = self.next_ticket();
        let result = self
            .provider
            .fetch_by_coordinates(lat, lon)
            .await
            .and_then(|raw| normalize(&raw));

        self.settle(ticket, Origin::Coordinates, true, result);
    }

    /// Re-reads the counter under the channel lock, so the last writer always
    /// publishes the current count.
    fn sync_refreshing(&self) {
        self.refreshing.send_if_modified(|flag| {
            let active = self.active_refreshes.load(Ordering::SeqCst) > 0;
            let changed = *flag != active;
            *flag = active;
            changed
        });
    }

    fn next_ticket(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn settle(
        &self,
        ticket: u64,
        origin: Origin,
        keep_stale: bool,
        result: Result<WeatherViewModel, WeatherError>,
    ) {
        let latest = self.generation.load(Ordering::SeqCst);
        if ticket != latest {
            tracing::debug!(ticket, latest, "discarding superseded weather response");
            return;
        }

        match result {
            Ok(vm) => {
                tracing::info!(city = %vm.city_name, temp = vm.current_temp, "weather updated");
                self.state.send_replace(AppState::Success(vm));
            }
            Err(err) => {
                tracing::warn!(error = %err, ?origin, "weather fetch failed");

                let showing_data = self.state.borrow().is_success();
                if keep_stale && showing_data {
                    if self.notices.send(OFFLINE_NOTICE.to_string()).is_err() {
                        tracing::debug!("no notification listeners");
                    }
                    return;
                }

                match origin {
                    Origin::Place => {
                        self.state.send_replace(AppState::Error(err.user_message()));
                    }
                    Origin::Coordinates => {
                        let message = match err {
                            WeatherError::Network(_)
                            | WeatherError::Status { .. }
                            | WeatherError::MalformedResponse(_) => {
                                LOCATION_FAILED_MESSAGE.to_string()
                            }
                            _ => err.user_message(),
                        };
                        self.state.send_replace(AppState::Error(message));
                    }
                }
            }
        }
    }
}

/// Counts one refresh in flight; dropping it (including on cancellation)
/// uncounts it. The flag is lowered only when the last refresh ends.
struct RefreshGuard<'a> {
    store: &'a WeatherStore,
}

impl<'a> RefreshGuard<'a> {
    fn raise(store: &'a WeatherStore) -> Self {
        store.active_refreshes.fetch_add(1, Ordering::SeqCst);
        store.sync_refreshing();
        Self { store }
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.store.active_refreshes.fetch_sub(1, Ordering::SeqCst);
        self.store.sync_refreshing();
    }
}
