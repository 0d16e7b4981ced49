//! Plain-text rendering of the weather view model.

use std::fmt;

use skyview_core::{UnitGroup, WeatherViewModel};

/// Hourly temperatures shown per row.
const HOURS_PER_ROW: usize = 8;

pub fn render(vm: &WeatherViewModel, units: UnitGroup) -> String {
    Report { vm, units }.to_string()
}

struct Report<'a> {
    vm: &'a WeatherViewModel,
    units: UnitGroup,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vm = self.vm;
        let deg = self.units.temperature_suffix();

        writeln!(f, "{}", vm.city_name)?;
        writeln!(f, "  {}{deg}  {}", vm.current_temp, vm.condition_text)?;
        writeln!(f, "  {}", vm.advice().message())?;
        writeln!(f)?;

        if !vm.hourly_temps.is_empty() {
            writeln!(f, "Hourly")?;
            let cells: Vec<String> = vm
                .hourly_times
                .iter()
                .zip(&vm.hourly_temps)
                .map(|(time, t)| format!("{time} {t:>3}°"))
                .collect();
            for row in cells.chunks(HOURS_PER_ROW) {
                writeln!(f, "  {}", row.join("  "))?;
            }
            writeln!(f)?;
        }

        if !vm.weekly_forecast.is_empty() {
            writeln!(f, "This week")?;
            for day in &vm.weekly_forecast {
                writeln!(
                    f,
                    "  {:<10} {}  {:>3}° / {:>3}°",
                    day.day_name,
                    day.icon.glyph(),
                    day.max_temp,
                    day.min_temp
                )?;
            }
            writeln!(f)?;
        }

        let wind_unit = match self.units {
            UnitGroup::Metric => "km/h",
            UnitGroup::Us => "mph",
        };
        writeln!(f, "  Wind      {} {wind_unit}", vm.wind_speed)?;
        writeln!(f, "  Humidity  {}%", vm.humidity_pct)?;
        writeln!(f, "  UV index  {}", vm.uv_index)?;
        write!(f, "  Sunset    {}", vm.sunset_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyview_core::{DailySummary, WeatherIcon};

    fn sample() -> WeatherViewModel {
        WeatherViewModel {
            city_name: "Lahore".into(),
            current_temp: 12,
            condition_text: "Clear".into(),
            wind_speed: 10.5,
            humidity_pct: 40,
            uv_index: 3.2,
            sunset_time: "07:08 PM".into(),
            hourly_temps: (0..10).collect(),
            hourly_times: (0..10).map(|h| format!("{h:02}:00")).collect(),
            weekly_forecast: vec![DailySummary {
                day_name: "Today".into(),
                max_temp: 18,
                min_temp: 9,
                icon: WeatherIcon::ClearDay,
            }],
        }
    }

    #[test]
    fn renders_all_sections() {
        let text = render(&sample(), UnitGroup::Metric);

        assert!(text.starts_with("Lahore\n"));
        assert!(text.contains("12°C  Clear"));
        assert!(text.contains("light jacket"));
        assert!(text.contains("09:00   9°"));
        assert!(text.contains("Today"));
        assert!(text.contains("10.5 km/h"));
        assert!(text.contains("Humidity  40%"));
        assert!(text.ends_with("Sunset    07:08 PM"));
    }

    #[test]
    fn hourly_rows_wrap() {
        let text = render(&sample(), UnitGroup::Us);
        let hourly_rows = text
            .lines()
            .skip_while(|l| *l != "Hourly")
            .skip(1)
            .take_while(|l| !l.is_empty())
            .count();
        assert_eq!(hourly_rows, 2);
        assert!(text.contains("°F"));
        assert!(text.contains("mph"));
    }

    #[test]
    fn three_hourly_series_uses_its_own_times() {
        let mut vm = sample();
        vm.hourly_temps = vec![37, 33, 31];
        vm.hourly_times = vec!["17:00".into(), "20:00".into(), "23:00".into()];

        let text = render(&vm, UnitGroup::Metric);
        assert!(text.contains("  17:00  37°  20:00  33°  23:00  31°\n"));
        assert!(!text.contains("00:00"));
    }

    #[test]
    fn empty_series_are_omitted() {
        let mut vm = sample();
        vm.hourly_temps.clear();
        vm.hourly_times.clear();
        vm.weekly_forecast.clear();

        let text = render(&vm, UnitGroup::Metric);
        assert!(!text.contains("Hourly"));
        assert!(!text.contains("This week"));
    }
}
