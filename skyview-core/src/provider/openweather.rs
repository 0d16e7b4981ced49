use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Timelike, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::instrument;

use crate::{
    config::UnitGroup,
    error::WeatherError,
    solar::estimate_uv_index,
    timeline::{CurrentConditions, TimelineDay, TimelineHour, TimelineResponse},
};

use super::{ClientSettings, WeatherProvider, decode_json, validate_coordinates};

const API_URL: &str = "https://api.openweathermap.org/data/2.5";
const CLOCK_FORMAT: &str = "%H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// OpenWeather's free tier: current conditions and a 5-day/3-hour forecast
/// come from separate endpoints and are merged into one timeline.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    settings: ClientSettings,
    base_url: String,
    http: Client,
}

#[derive(Debug, Clone, Copy)]
enum Query<'a> {
    Place(&'a str),
    Coordinates(f64, f64),
}

impl OpenWeatherProvider {
    pub fn new(settings: ClientSettings) -> Result<Self, WeatherError> {
        let base_url = settings
            .base_url
            .as_deref()
            .unwrap_or(API_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            http: settings.http_client()?,
            base_url,
            settings,
        })
    }

    fn query_params(&self, query: Query<'_>) -> Vec<(&'static str, String)> {
        let mut params = match query {
            Query::Place(name) => vec![("q", name.trim().to_string())],
            Query::Coordinates(lat, lon) => vec![("lat", lat.to_string()), ("lon", lon.to_string())],
        };
        params.push(("units", self.settings.units.openweather().to_string()));
        params.push(("appid", self.settings.api_key.clone()));
        params
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        query: Query<'_>,
    ) -> Result<T, WeatherError> {
        let url = format!("{}/{endpoint}", self.base_url);
        tracing::debug!(%url, "requesting OpenWeather {endpoint}");

        let res = self
            .http
            .get(&url)
            .query(&self.query_params(query))
            .send()
            .await?;

        decode_json(res, &format!("OpenWeather {endpoint}")).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn fetch_timeline(&self, query: Query<'_>) -> Result<TimelineResponse, WeatherError> {
        let (current, forecast) = tokio::try_join!(
            self.get::<OwCurrentResponse>("weather", query),
            self.get::<OwForecastResponse>("forecast", query),
        )?;

        fold_into_timeline(current, forecast, self.settings.units)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_by_place(&self, name: &str) -> Result<TimelineResponse, WeatherError> {
        self.fetch_timeline(Query::Place(name)).await
    }

    async fn fetch_by_coordinates(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<TimelineResponse, WeatherError> {
        validate_coordinates(lat, lon)?;
        self.fetch_timeline(Query::Coordinates(lat, lon)).await
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize, Default)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwClouds {
    all: f64,
}

#[derive(Debug, Deserialize, Default)]
struct OwSys {
    country: Option<String>,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    coord: OwCoord,
    dt: i64,
    /// Seconds east of UTC.
    #[serde(default)]
    timezone: i32,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
    clouds: Option<OwClouds>,
    visibility: Option<f64>,
    #[serde(default)]
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

/// Merge current conditions and the 3-hourly forecast into per-day records in
/// the location's local time.
fn fold_into_timeline(
    current: OwCurrentResponse,
    forecast: OwForecastResponse,
    units: UnitGroup,
) -> Result<TimelineResponse, WeatherError> {
    let offset = FixedOffset::east_opt(current.timezone).ok_or_else(|| {
        WeatherError::MalformedResponse(format!("timezone offset {} out of range", current.timezone))
    })?;

    let observed_at = utc(current.dt)?;
    let now_local = observed_at.with_timezone(&offset);
    let today = now_local.date_naive();

    let cloud_cover = current.clouds.as_ref().map(|c| c.all);
    let uv = estimate_uv_index(
        current.coord.lat,
        current.coord.lon,
        cloud_cover.unwrap_or(0.0),
        observed_at,
    );

    let (conditions, icon) = describe(&current.weather);
    let sunrise = current.sys.sunrise.map(|ts| local_clock(ts, offset)).transpose()?;
    let sunset = current.sys.sunset.map(|ts| local_clock(ts, offset)).transpose()?;

    let current_conditions = CurrentConditions {
        datetime: now_local.format(CLOCK_FORMAT).to_string(),
        temp: current.main.temp,
        humidity: current.main.humidity,
        windspeed: Some(wind_speed(current.wind.speed, units)),
        uvindex: Some(uv),
        cloudcover: cloud_cover,
        visibility: current.visibility,
        sunrise: sunrise.clone(),
        sunset: sunset.clone(),
        conditions: conditions.clone(),
        icon: icon.clone(),
    };

    let mut by_date: BTreeMap<NaiveDate, Vec<(DateTime<FixedOffset>, &OwForecastEntry)>> =
        BTreeMap::new();
    for entry in &forecast.list {
        let local = utc(entry.dt)?.with_timezone(&offset);
        if local.date_naive() >= today {
            by_date.entry(local.date_naive()).or_default().push((local, entry));
        }
    }

    let mut days: Vec<TimelineDay> = by_date
        .iter()
        .map(|(date, entries)| summarize_entries(*date, entries, units))
        .collect();

    let today_str = today.format(DATE_FORMAT).to_string();
    match days.first_mut().filter(|first| first.datetime == today_str) {
        Some(first) => {
            first.uvindex = Some(uv);
            first.sunrise = sunrise;
            first.sunset = sunset;
        }
        None => {
            tracing::debug!(%today, "forecast has no entries for today, using current conditions");
            days.insert(
                0,
                TimelineDay {
                    datetime: today_str,
                    tempmax: current.main.temp_max.unwrap_or(current.main.temp),
                    tempmin: current.main.temp_min.unwrap_or(current.main.temp),
                    temp: current.main.temp,
                    humidity: current.main.humidity,
                    windspeed: Some(wind_speed(current.wind.speed, units)),
                    uvindex: Some(uv),
                    sunrise,
                    sunset,
                    conditions: Some(conditions.clone()),
                    icon: Some(icon.clone()),
                    hours: vec![TimelineHour {
                        datetime: current_conditions.datetime.clone(),
                        temp: current.main.temp,
                        conditions,
                        icon,
                    }],
                },
            );
        }
    }

    let country = current.sys.country.or(forecast.city.country);
    let resolved_address = match country {
        Some(country) if !country.is_empty() => format!("{}, {country}", current.name),
        _ => current.name,
    };

    Ok(TimelineResponse {
        resolved_address,
        timezone: format!("UTC{offset}"),
        days,
        current_conditions,
    })
}

fn summarize_entries(
    date: NaiveDate,
    entries: &[(DateTime<FixedOffset>, &OwForecastEntry)],
    units: UnitGroup,
) -> TimelineDay {
    let count = entries.len() as f64;
    let temps = entries.iter().map(|(_, e)| e.main.temp);

    let tempmax = entries
        .iter()
        .map(|(_, e)| e.main.temp_max.unwrap_or(e.main.temp))
        .fold(f64::NEG_INFINITY, f64::max);
    let tempmin = entries
        .iter()
        .map(|(_, e)| e.main.temp_min.unwrap_or(e.main.temp))
        .fold(f64::INFINITY, f64::min);

    let humidities: Vec<f64> = entries.iter().filter_map(|(_, e)| e.main.humidity).collect();
    let humidity = (!humidities.is_empty())
        .then(|| humidities.iter().sum::<f64>() / humidities.len() as f64);

    let windspeed = entries
        .iter()
        .map(|(_, e)| wind_speed(e.wind.speed, units))
        .reduce(f64::max);

    // The entry nearest local noon represents the day.
    let midday = entries
        .iter()
        .min_by_key(|(local, _)| (i64::from(local.hour() * 60 + local.minute()) - 720).abs())
        .map(|(_, e)| describe(&e.weather));

    let hours = entries
        .iter()
        .map(|(local, e)| {
            let (conditions, icon) = describe(&e.weather);
            TimelineHour {
                datetime: local.format(CLOCK_FORMAT).to_string(),
                temp: e.main.temp,
                conditions,
                icon,
            }
        })
        .collect();

    TimelineDay {
        datetime: date.format(DATE_FORMAT).to_string(),
        tempmax,
        tempmin,
        temp: temps.sum::<f64>() / count,
        humidity,
        windspeed,
        uvindex: None,
        sunrise: None,
        sunset: None,
        conditions: midday.as_ref().map(|(c, _)| c.clone()),
        icon: midday.map(|(_, i)| i),
        hours,
    }
}

/// OpenWeather reports metric wind in m/s; timelines use km/h.
fn wind_speed(speed: f64, units: UnitGroup) -> f64 {
    match units {
        UnitGroup::Metric => (speed * 36.0).round() / 10.0,
        UnitGroup::Us => speed,
    }
}

/// Condition text and timeline icon code for the first weather entry.
fn describe(weather: &[OwWeather]) -> (String, String) {
    match weather.first() {
        Some(w) => (capitalize(&w.description), icon_code(&w.icon).to_string()),
        None => ("Unknown".to_string(), String::new()),
    }
}

/// Map OpenWeather icon ids (`01d`, `10n`, ...) onto the timeline icon vocabulary.
fn icon_code(ow_icon: &str) -> &'static str {
    let night = ow_icon.ends_with('n');
    match ow_icon.get(..2) {
        Some("01") if night => "clear-night",
        Some("01") => "clear-day",
        Some("02") if night => "partly-cloudy-night",
        Some("02") => "partly-cloudy-day",
        Some("03" | "04") => "cloudy",
        Some("09" | "10" | "11") => "rain",
        Some("13") => "snow",
        Some("50") => "fog",
        _ => "",
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn utc(ts: i64) -> Result<DateTime<Utc>, WeatherError> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| WeatherError::MalformedResponse(format!("timestamp {ts} out of range")))
}

fn local_clock(ts: i64, offset: FixedOffset) -> Result<String, WeatherError> {
    Ok(utc(ts)?.with_timezone(&offset).format(CLOCK_FORMAT).to_string())
}
