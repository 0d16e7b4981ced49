use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::instrument;

use crate::{error::WeatherError, timeline::TimelineResponse};

use super::{ClientSettings, WeatherProvider, decode_json, validate_coordinates};

const TIMELINE_URL: &str =
    "https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline";

/// Visual Crossing timeline API: one request returns current conditions,
/// the day-by-day forecast and hourly detail.
#[derive(Debug, Clone)]
pub struct VisualCrossingProvider {
    settings: ClientSettings,
    base_url: Url,
    http: Client,
}

impl VisualCrossingProvider {
    pub fn new(settings: ClientSettings) -> Result<Self, WeatherError> {
        let raw = settings.base_url.as_deref().unwrap_or(TIMELINE_URL);
        let base_url = Url::parse(raw).map_err(|e| WeatherError::InvalidUrl(format!("{raw}: {e}")))?;

        if base_url.cannot_be_a_base() {
            return Err(WeatherError::InvalidUrl(raw.to_string()));
        }

        Ok(Self {
            http: settings.http_client()?,
            base_url,
            settings,
        })
    }

    fn timeline_url(&self, location: &str) -> Result<Url, WeatherError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| WeatherError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(location);
        Ok(url)
    }

    #[instrument(skip(self), level = "debug")]
    async fn fetch_timeline(&self, location: &str) -> Result<TimelineResponse, WeatherError> {
        let url = self.timeline_url(location)?;
        tracing::debug!(%url, "requesting Visual Crossing timeline");

        let res = self
            .http
            .get(url)
            .query(&[
                ("unitGroup", self.settings.units.visual_crossing()),
                ("key", self.settings.api_key.as_str()),
                ("contentType", "json"),
            ])
            .send()
            .await?;

        decode_json(res, "Visual Crossing timeline").await
    }
}

#[async_trait]
impl WeatherProvider for VisualCrossingProvider {
    async fn fetch_by_place(&self, name: &str) -> Result<TimelineResponse, WeatherError> {
        self.fetch_timeline(name.trim()).await
    }

    async fn fetch_by_coordinates(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<TimelineResponse, WeatherError> {
        validate_coordinates(lat, lon)?;
        self.fetch_timeline(&format!("{lat},{lon}")).await
    }
}
