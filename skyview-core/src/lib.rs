//! Core library for the `skyview` weather app.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Weather provider clients (Visual Crossing, OpenWeather)
//! - Normalization of provider responses into a display-ready view model
//! - The application state holder front ends render from
//!
//! It is used by `skyview-cli`, but can also back other front ends.

pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod solar;
pub mod state;
pub mod timeline;

pub use config::{Config, ProviderConfig, UnitGroup};
pub use error::WeatherError;
pub use model::{Advice, DailySummary, WeatherIcon, WeatherViewModel};
pub use normalize::normalize;
pub use provider::{ProviderId, WeatherProvider};
pub use state::{AppState, WeatherStore};
pub use timeline::TimelineResponse;
