//! Sun and moon events for report headers and moon illumination for ratings.
//!
//! The [`Astronomy`] trait is the seam the rest of the crate depends on, so
//! tests can swap in fixed answers.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use sunrise::{Coordinates, SolarDay, SolarEvent};
use tracing::debug;

pub mod moon;

/// How far past local midnight to look for the next moon event.
const MOON_SEARCH_WINDOW_HOURS: i64 = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Body {
    Sun,
    Moon,
}

/// Rise and set instants for one body. `None` when the event does not
/// happen (polar day or night, or outside the search window).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RiseSet {
    pub rise: Option<DateTime<Utc>>,
    pub set: Option<DateTime<Utc>>,
}

pub trait Astronomy: Send + Sync {
    /// Percent of the lunar disc lit at `at`, in [0, 100].
    fn illumination(&self, at: DateTime<Utc>) -> f64;

    /// Events for the local calendar day `day` in zone `tz`.
    fn rise_set(&self, day: NaiveDate, tz: Tz, latitude: f64, longitude: f64, body: Body) -> RiseSet;
}

/// Default [`Astronomy`]: sun from the `sunrise` crate, moon from [`moon`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Almanac;

impl Almanac {
    fn sun(day: NaiveDate, latitude: f64, longitude: f64) -> RiseSet {
        let Some(coordinates) = Coordinates::new(latitude, longitude) else {
            debug!(latitude, longitude, "Invalid coordinates for solar events");
            return RiseSet::default();
        };

        let solar_day = SolarDay::new(coordinates, day);
        RiseSet {
            rise: solar_day.event_time(SolarEvent::Sunrise),
            set: solar_day.event_time(SolarEvent::Sunset),
        }
    }

    fn moon(day: NaiveDate, tz: Tz, latitude: f64, longitude: f64) -> RiseSet {
        let midnight = day.and_time(NaiveTime::MIN);
        let start = tz
            .from_local_datetime(&midnight)
            .earliest()
            .map_or_else(|| midnight.and_utc(), |local| local.with_timezone(&Utc));

        let (rise, set) = moon::rise_set(
            start,
            Duration::hours(MOON_SEARCH_WINDOW_HOURS),
            latitude,
            longitude,
        );
        RiseSet { rise, set }
    }
}

impl Astronomy for Almanac {
    fn illumination(&self, at: DateTime<Utc>) -> f64 {
        moon::illuminated_percent(at)
    }

    fn rise_set(&self, day: NaiveDate, tz: Tz, latitude: f64, longitude: f64, body: Body) -> RiseSet {
        match body {
            Body::Sun => Self::sun(day, latitude, longitude),
            Body::Moon => Self::moon(day, tz, latitude, longitude),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_berlin_midsummer_sunrise() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
        let events = Almanac.rise_set(day, chrono_tz::Europe::Berlin, 52.52, 13.405, Body::Sun);

        let rise = events.rise.expect("sun rises in Berlin in June");
        let set = events.set.expect("sun sets in Berlin in June");
        assert_eq!(rise.hour(), 2);
        assert_eq!(set.hour(), 19);
    }

    #[test]
    fn test_polar_night_has_no_sunrise() {
        let day = NaiveDate::from_ymd_opt(2024, 12, 21).unwrap();
        let events = Almanac.rise_set(day, Tz::UTC, 85.0, 0.0, Body::Sun);
        assert_eq!(events.rise, None);
        assert_eq!(events.set, None);
    }

    #[test]
    fn test_moon_events_start_at_local_midnight() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 11).unwrap();
        let tz = chrono_tz::America::Los_Angeles;
        let events = Almanac.rise_set(day, tz, 37.7749, -122.4194, Body::Moon);

        let midnight = tz
            .from_local_datetime(&day.and_time(NaiveTime::MIN))
            .unwrap()
            .with_timezone(&Utc);
        let rise = events.rise.expect("moonrise found");
        let set = events.set.expect("moonset found");
        assert!(rise >= midnight);
        assert!(set >= midnight);
    }

    #[test]
    fn test_illumination_delegates_to_ephemeris() {
        let at = Utc.with_ymd_and_hms(2024, 1, 25, 0, 0, 0).unwrap();
        assert!(Almanac.illumination(at) > 98.0);
    }
}
