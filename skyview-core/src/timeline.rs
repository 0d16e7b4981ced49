//! Raw provider wire shape.
//!
//! Field names follow the Visual Crossing timeline API; other providers are
//! folded into the same structure before normalization.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineResponse {
    pub resolved_address: String,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub days: Vec<TimelineDay>,
    pub current_conditions: CurrentConditions,
}

/// One calendar day of the forecast, in the location's local time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineDay {
    /// `yyyy-MM-dd`
    pub datetime: String,
    pub tempmax: f64,
    pub tempmin: f64,
    pub temp: f64,
    pub humidity: Option<f64>,
    pub windspeed: Option<f64>,
    pub uvindex: Option<f64>,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    pub conditions: Option<String>,
    pub icon: Option<String>,
    #[serde(default)]
    pub hours: Vec<TimelineHour>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineHour {
    /// `HH:mm:ss`
    pub datetime: String,
    pub temp: f64,
    #[serde(default)]
    pub conditions: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub datetime: String,
    pub temp: f64,
    pub humidity: Option<f64>,
    pub windspeed: Option<f64>,
    pub uvindex: Option<f64>,
    pub cloudcover: Option<f64>,
    pub visibility: Option<f64>,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    #[serde(default)]
    pub conditions: String,
    #[serde(default)]
    pub icon: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_visual_crossing_payload() {
        let body = serde_json::json!({
            "resolvedAddress": "Lahore, Punjab, Pakistan",
            "timezone": "Asia/Karachi",
            "days": [{
                "datetime": "2024-06-01",
                "tempmax": 41.2,
                "tempmin": 29.0,
                "temp": 35.1,
                "humidity": 22.4,
                "windspeed": 14.8,
                "uvindex": 10.0,
                "sunrise": "05:00:41",
                "sunset": "19:08:12",
                "conditions": "Clear",
                "icon": "clear-day",
                "hours": [
                    { "datetime": "00:00:00", "temp": 31.5, "conditions": "Clear", "icon": "clear-night" }
                ]
            }],
            "currentConditions": {
                "datetime": "14:00:00",
                "temp": 39.6,
                "humidity": 18.0,
                "windspeed": 11.2,
                "uvindex": 9.0,
                "cloudcover": 0.0,
                "sunset": "19:08:12",
                "conditions": "Clear",
                "icon": "clear-day",
                "stations": ["OPLA"]
            }
        });

        let parsed: TimelineResponse = serde_json::from_value(body).expect("valid payload");

        assert_eq!(parsed.resolved_address, "Lahore, Punjab, Pakistan");
        assert_eq!(parsed.days.len(), 1);
        assert_eq!(parsed.days[0].hours.len(), 1);
        assert_eq!(parsed.current_conditions.uvindex, Some(9.0));
        assert_eq!(parsed.current_conditions.visibility, None);
    }

    #[test]
    fn missing_optional_fields_are_none() {
        let body = serde_json::json!({
            "resolvedAddress": "Nowhere",
            "currentConditions": { "datetime": "12:00:00", "temp": 1.0 }
        });

        let parsed: TimelineResponse = serde_json::from_value(body).expect("valid payload");
        assert!(parsed.days.is_empty());
        assert_eq!(parsed.current_conditions.humidity, None);
        assert_eq!(parsed.current_conditions.conditions, "");
    }
}
