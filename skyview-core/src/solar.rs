//! UV index estimation for providers that do not report one.

use chrono::{DateTime, Datelike, Timelike, Utc};

const AXIAL_TILT_DEG: f64 = 23.44;
/// Clear-sky UV index with the sun at zenith.
const PEAK_UV: f64 = 12.5;

/// Approximate solar elevation in degrees.
pub fn solar_elevation_deg(lat: f64, lon: f64, at: DateTime<Utc>) -> f64 {
    let day_of_year = f64::from(at.ordinal());
    let declination =
        (AXIAL_TILT_DEG * (360.0 / 365.0 * (day_of_year - 81.0)).to_radians().sin()).to_radians();

    let utc_hours =
        f64::from(at.hour()) + f64::from(at.minute()) / 60.0 + f64::from(at.second()) / 3600.0;
    let solar_time = utc_hours + lon / 15.0;
    let hour_angle = (15.0 * (solar_time - 12.0)).to_radians();

    let lat = lat.to_radians();
    let sin_elevation =
        lat.sin() * declination.sin() + lat.cos() * declination.cos() * hour_angle.cos();

    sin_elevation.clamp(-1.0, 1.0).asin().to_degrees()
}

/// Estimate the UV index from position, cloud cover (0-100) and time.
pub fn estimate_uv_index(lat: f64, lon: f64, cloud_cover_pct: f64, at: DateTime<Utc>) -> f64 {
    let elevation = solar_elevation_deg(lat, lon, at);
    if elevation <= 0.0 {
        return 0.0;
    }

    let clear_sky = PEAK_UV * elevation.to_radians().sin().powf(2.42);
    let cloud = (cloud_cover_pct / 100.0).clamp(0.0, 1.0);
    let attenuation = 1.0 - 0.75 * cloud.powf(3.4);

    (clear_sky * attenuation * 10.0).round() / 10.0
}
