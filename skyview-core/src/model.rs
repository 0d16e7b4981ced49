use serde::{Deserialize, Serialize};

/// Display-ready weather, rebuilt from scratch on every successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherViewModel {
    pub city_name: String,
    pub current_temp: i32,
    pub condition_text: String,
    pub wind_speed: f64,
    pub humidity_pct: u8,
    pub uv_index: f64,
    pub sunset_time: String,
    pub hourly_temps: Vec<i32>,
    /// Local `HH:MM` of each entry in `hourly_temps`.
    pub hourly_times: Vec<String>,
    pub weekly_forecast: Vec<DailySummary>,
}

impl WeatherViewModel {
    pub fn advice(&self) -> Advice {
        Advice::for_conditions(self.current_temp, &self.condition_text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub day_name: String,
    pub max_temp: i32,
    pub min_temp: i32,
    pub icon: WeatherIcon,
}

/// Icons the front end knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WeatherIcon {
    Snow,
    Rain,
    Fog,
    Wind,
    Cloudy,
    PartlyCloudyDay,
    PartlyCloudyNight,
    ClearDay,
    ClearNight,
    #[default]
    Default,
}

impl WeatherIcon {
    /// Resolve a provider icon code. Unknown codes fall back to `Default`.
    pub fn from_code(code: &str) -> Self {
        match code {
            "snow" => Self::Snow,
            "rain" => Self::Rain,
            "fog" => Self::Fog,
            "wind" => Self::Wind,
            "cloudy" => Self::Cloudy,
            "partly-cloudy-day" => Self::PartlyCloudyDay,
            "partly-cloudy-night" => Self::PartlyCloudyNight,
            "clear-day" => Self::ClearDay,
            "clear-night" => Self::ClearNight,
            _ => Self::Default,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Snow => "snow",
            Self::Rain => "rain",
            Self::Fog => "fog",
            Self::Wind => "wind",
            Self::Cloudy => "cloudy",
            Self::PartlyCloudyDay => "partly-cloudy-day",
            Self::PartlyCloudyNight => "partly-cloudy-night",
            Self::ClearDay => "clear-day",
            Self::ClearNight => "clear-night",
            Self::Default => "default",
        }
    }

    /// Single-character glyph for terminal output.
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Snow => "❄",
            Self::Rain => "☂",
            Self::Fog => "≡",
            Self::Wind => "~",
            Self::Cloudy => "☁",
            Self::PartlyCloudyDay => "⛅",
            Self::PartlyCloudyNight => "☁",
            Self::ClearDay => "☀",
            Self::ClearNight => "☾",
            Self::Default => "·",
        }
    }
}

impl std::fmt::Display for WeatherIcon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clothing suggestion shown next to the current conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advice {
    Umbrella,
    Jacket,
    Pleasant,
}

impl Advice {
    const CHILLY_BELOW: i32 = 15;

    pub fn for_conditions(temp: i32, condition: &str) -> Self {
        if condition.to_lowercase().contains("rain") {
            Self::Umbrella
        } else if temp < Self::CHILLY_BELOW {
            Self::Jacket
        } else {
            Self::Pleasant
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Umbrella => "It's raining. Grab an umbrella and boots!",
            Self::Jacket => "It's a bit chilly. A light jacket is recommended.",
            Self::Pleasant => "The weather is pleasant. Enjoy your day!",
        }
    }
}
