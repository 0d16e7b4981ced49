//! Provider response → view model mapping.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::{
    error::WeatherError,
    model::{DailySummary, WeatherIcon, WeatherViewModel},
    timeline::{TimelineDay, TimelineResponse},
};

/// Longest daily series shown.
pub const MAX_FORECAST_DAYS: usize = 7;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Normalize a timeline, treating its first day record as "today".
///
/// Provider timelines start at the location's local date, so anchoring on the
/// first record keeps this independent of the machine's clock.
pub fn normalize(raw: &TimelineResponse) -> Result<WeatherViewModel, WeatherError> {
    let today = raw
        .days
        .first()
        .and_then(|day| parse_date(&day.datetime));

    build(raw, today)
}

/// Same as [`normalize`] with an explicit "today".
pub fn normalize_with_today(
    raw: &TimelineResponse,
    today: NaiveDate,
) -> Result<WeatherViewModel, WeatherError> {
    build(raw, Some(today))
}

fn build(
    raw: &TimelineResponse,
    today: Option<NaiveDate>,
) -> Result<WeatherViewModel, WeatherError> {
    let first_day = raw.days.first().ok_or_else(|| {
        WeatherError::MalformedResponse("timeline contained no day records".to_string())
    })?;
    let current = &raw.current_conditions;

    let sunset = current
        .sunset
        .as_deref()
        .or(first_day.sunset.as_deref())
        .unwrap_or_default();

    let weekly_forecast = raw
        .days
        .iter()
        .take(MAX_FORECAST_DAYS)
        .map(|day| summarize_day(day, today))
        .collect();

    Ok(WeatherViewModel {
        city_name: city_name(&raw.resolved_address),
        current_temp: round_temp(current.temp),
        condition_text: current.conditions.clone(),
        wind_speed: current.windspeed.unwrap_or(0.0),
        humidity_pct: humidity_pct(current.humidity.unwrap_or(0.0)),
        uv_index: current.uvindex.unwrap_or(0.0),
        sunset_time: format_clock_time(sunset),
        hourly_temps: first_day.hours.iter().map(|h| round_temp(h.temp)).collect(),
        hourly_times: first_day.hours.iter().map(|h| hour_label(&h.datetime)).collect(),
        weekly_forecast,
    })
}

fn summarize_day(day: &TimelineDay, today: Option<NaiveDate>) -> DailySummary {
    DailySummary {
        day_name: day_name(&day.datetime, today),
        max_temp: round_temp(day.tempmax),
        min_temp: round_temp(day.tempmin),
        icon: WeatherIcon::from_code(day.icon.as_deref().unwrap_or_default()),
    }
}

/// Text before the first comma of a resolved address.
pub fn city_name(resolved_address: &str) -> String {
    resolved_address
        .split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Reformat `yyyy-MM-ddTHH:mm:ss` or `HH:mm:ss` as `hh:mm AM`.
///
/// Unparseable input degrades to its first five characters.
pub fn format_clock_time(raw: &str) -> String {
    let time = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .map(|dt| dt.time())
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"));

    match time {
        Ok(t) => t.format("%I:%M %p").to_string(),
        Err(_) => raw.chars().take(5).collect(),
    }
}

/// `HH:mm:ss` shortened to `HH:MM`; anything else keeps its first five characters.
pub fn hour_label(raw: &str) -> String {
    match NaiveTime::parse_from_str(raw, "%H:%M:%S") {
        Ok(t) => t.format("%H:%M").to_string(),
        Err(_) => raw.chars().take(5).collect(),
    }
}

/// Full weekday name, or "Today" when the date matches `today`.
pub fn day_name(date: &str, today: Option<NaiveDate>) -> String {
    match parse_date(date) {
        Some(d) if Some(d) == today => "Today".to_string(),
        Some(d) => d.format("%A").to_string(),
        None => date.to_string(),
    }
}

fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, DATE_FORMAT).ok()
}

fn round_temp(value: f64) -> i32 {
    value.round() as i32
}

fn humidity_pct(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}
