//! Turns the provider's parallel hourly arrays into one record per hour.
//!
//! Arrays of unequal length are clipped to the shortest one. Nothing here
//! fails: a bad zone name falls back to UTC and an unparseable timestamp
//! falls back to a zone-naive reading.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::models::{ForecastPoint, HourlySeries, Location, RawForecastPayload};

const TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Length of every contributing array, in a stable order.
#[must_use]
pub fn series_lengths(hourly: &HourlySeries) -> [(&'static str, usize); 13] {
    [
        ("time", hourly.time.len()),
        ("t2m", hourly.temperature_2m.len()),
        ("t500", hourly.temperature_500hpa.len()),
        ("t850", hourly.temperature_850hpa.len()),
        ("cl", hourly.cloud_cover_low.len()),
        ("cm", hourly.cloud_cover_mid.len()),
        ("ch", hourly.cloud_cover_high.len()),
        ("w10", hourly.wind_speed_10m.len()),
        ("gust", hourly.wind_gusts_10m.len()),
        ("w200", hourly.wind_speed_200hpa.len()),
        ("w850", hourly.wind_speed_850hpa.len()),
        ("gph850", hourly.geopotential_height_850hpa.len()),
        ("gph500", hourly.geopotential_height_500hpa.len()),
    ]
}

/// Number of hours every array can supply.
#[must_use]
pub fn common_length(hourly: &HourlySeries) -> usize {
    series_lengths(hourly)
        .iter()
        .map(|(_, len)| *len)
        .min()
        .unwrap_or(0)
}

/// Resolve the payload's IANA zone, falling back to UTC.
#[must_use]
pub fn resolve_timezone(name: &str) -> Tz {
    match name.parse::<Tz>() {
        Ok(tz) => tz,
        Err(e) => {
            warn!(timezone = name, "Unknown time zone, using UTC: {}", e);
            Tz::UTC
        }
    }
}

/// Parse a provider timestamp in `tz`.
///
/// A wall time that does not exist in `tz` (DST gap) is read as UTC instead.
#[must_use]
pub fn parse_timestamp(raw: &str, tz: Tz) -> DateTime<Tz> {
    let naive = TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok());

    if let Some(naive) = naive {
        if let Some(local) = tz.from_local_datetime(&naive).earliest() {
            return local;
        }
        warn!(timestamp = raw, zone = %tz, "Local time does not exist in zone, reading as UTC");
        return Tz::UTC.from_utc_datetime(&naive);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&tz);
    }

    warn!(timestamp = raw, "Unparseable timestamp, using the Unix epoch");
    DateTime::<Utc>::UNIX_EPOCH.with_timezone(&Tz::UTC)
}

fn value_at(series: &[Option<f64>], index: usize) -> f64 {
    series.get(index).copied().flatten().unwrap_or(f64::NAN)
}

/// Build the ordered per-hour records for a payload.
///
/// Output length is always [`common_length`]; order follows the input arrays.
#[must_use]
pub fn build_points(payload: &RawForecastPayload) -> Vec<ForecastPoint> {
    let hourly = &payload.hourly;
    let len = common_length(hourly);

    if len == 0 {
        warn!("Open-Meteo: no hourly data to build points");
        return Vec::new();
    }

    let lengths = series_lengths(hourly);
    if lengths.iter().any(|(_, n)| *n != len) {
        let detail = lengths
            .iter()
            .map(|(name, n)| format!("{name}={n}"))
            .collect::<Vec<_>>()
            .join(" ");
        warn!(
            "Open-Meteo hourly array length mismatch; truncating to {} ({})",
            len, detail
        );
    }

    let tz = resolve_timezone(&payload.timezone);
    let location = Location::new(payload.latitude, payload.longitude, payload.elevation);

    (0..len)
        .map(|i| ForecastPoint {
            time: parse_timestamp(&hourly.time[i], tz),
            location,
            temperature_2m: value_at(&hourly.temperature_2m, i),
            temperature_500hpa: value_at(&hourly.temperature_500hpa, i),
            temperature_850hpa: value_at(&hourly.temperature_850hpa, i),
            cloud_cover_low: value_at(&hourly.cloud_cover_low, i),
            cloud_cover_mid: value_at(&hourly.cloud_cover_mid, i),
            cloud_cover_high: value_at(&hourly.cloud_cover_high, i),
            wind_speed_10m: value_at(&hourly.wind_speed_10m, i),
            wind_gusts_10m: value_at(&hourly.wind_gusts_10m, i),
            wind_speed_200hpa: value_at(&hourly.wind_speed_200hpa, i),
            wind_speed_850hpa: value_at(&hourly.wind_speed_850hpa, i),
            geopotential_height_850hpa: value_at(&hourly.geopotential_height_850hpa, i),
            geopotential_height_500hpa: value_at(&hourly.geopotential_height_500hpa, i),
        })
        .collect()
}
