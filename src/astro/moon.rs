//! Low-precision lunar ephemeris.
//!
//! Phase angle after Meeus, *Astronomical Algorithms* ch. 48; position from
//! the Astronomical Almanac short series (about 0.3 degrees). That is plenty
//! for rise/set times to the minute and illumination to the percent.

use chrono::{DateTime, Duration, Utc};

const J2000: f64 = 2_451_545.0;
const SCAN_STEP_MINUTES: i64 = 10;
const BISECTION_ROUNDS: u32 = 20;

pub(crate) fn julian_day(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 86_400_000.0 + 2_440_587.5
}

fn centuries(jd: f64) -> f64 {
    (jd - J2000) / 36_525.0
}

fn sin_deg(deg: f64) -> f64 {
    deg.to_radians().sin()
}

fn cos_deg(deg: f64) -> f64 {
    deg.to_radians().cos()
}

/// Percent of the lunar disc illuminated at `at`, in [0, 100].
#[must_use]
pub fn illuminated_percent(at: DateTime<Utc>) -> f64 {
    let t = centuries(julian_day(at));
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;

    // mean elongation, sun anomaly, moon anomaly
    let d = 297.850_192_1 + 445_267.111_403_4 * t - 0.001_881_9 * t2 + t3 / 545_868.0
        - t4 / 113_065_000.0;
    let m = 357.529_109_2 + 35_999.050_290_9 * t - 0.000_153_6 * t2 + t3 / 24_490_000.0;
    let mp = 134.963_396_4 + 477_198.867_505_5 * t + 0.008_741_4 * t2 + t3 / 69_699.0
        - t4 / 14_712_000.0;

    let phase_angle = 180.0 - d - 6.289 * sin_deg(mp) + 2.100 * sin_deg(m)
        - 1.274 * sin_deg(2.0 * d - mp)
        - 0.658 * sin_deg(2.0 * d)
        - 0.214 * sin_deg(2.0 * mp)
        - 0.110 * sin_deg(d);

    ((1.0 + cos_deg(phase_angle)) / 2.0 * 100.0).clamp(0.0, 100.0)
}

struct Equatorial {
    /// Right ascension, degrees
    ra: f64,
    /// Declination, degrees
    dec: f64,
    /// Horizontal parallax, degrees
    parallax: f64,
}

fn position(jd: f64) -> Equatorial {
    let t = centuries(jd);

    let lambda = 218.32 + 481_267.881 * t + 6.29 * sin_deg(135.0 + 477_198.87 * t)
        - 1.27 * sin_deg(259.3 - 413_335.36 * t)
        + 0.66 * sin_deg(235.7 + 890_534.22 * t)
        + 0.21 * sin_deg(269.9 + 954_397.74 * t)
        - 0.19 * sin_deg(357.5 + 35_999.05 * t)
        - 0.11 * sin_deg(186.5 + 966_404.03 * t);
    let beta = 5.13 * sin_deg(93.3 + 483_202.02 * t) + 0.28 * sin_deg(228.2 + 960_400.89 * t)
        - 0.28 * sin_deg(318.3 + 6_003.15 * t)
        - 0.17 * sin_deg(217.6 - 407_332.21 * t);
    let parallax = 0.9508
        + 0.0518 * cos_deg(135.0 + 477_198.87 * t)
        + 0.0095 * cos_deg(259.3 - 413_335.36 * t)
        + 0.0078 * cos_deg(235.7 + 890_534.22 * t)
        + 0.0028 * cos_deg(269.9 + 954_397.74 * t);

    let epsilon = (23.439_291 - 0.013_004_2 * t).to_radians();
    let (l, b) = (lambda.to_radians(), beta.to_radians());

    let ra = (l.sin() * epsilon.cos() - b.tan() * epsilon.sin()).atan2(l.cos());
    let dec = (b.sin() * epsilon.cos() + b.cos() * epsilon.sin() * l.sin()).asin();

    Equatorial {
        ra: ra.to_degrees(),
        dec: dec.to_degrees(),
        parallax,
    }
}

fn sidereal_degrees(jd: f64) -> f64 {
    let t = centuries(jd);
    280.460_618_37 + 360.985_647_366_29 * (jd - J2000) + 0.000_387_933 * t * t
        - t * t * t / 38_710_000.0
}

/// Geocentric altitude above the standard rise/set altitude, degrees.
/// Positive while the moon is up.
fn altitude_above_horizon(at: DateTime<Utc>, latitude: f64, longitude: f64) -> f64 {
    let jd = julian_day(at);
    let moon = position(jd);
    let hour_angle = sidereal_degrees(jd) + longitude - moon.ra;

    let sin_alt = sin_deg(latitude) * sin_deg(moon.dec)
        + cos_deg(latitude) * cos_deg(moon.dec) * cos_deg(hour_angle);
    let altitude = sin_alt.clamp(-1.0, 1.0).asin().to_degrees();

    // parallax, refraction and semidiameter combined (Meeus ch. 15)
    let standard_altitude = 0.7275 * moon.parallax - 0.5667;
    altitude - standard_altitude
}

fn refine(mut lo: DateTime<Utc>, mut hi: DateTime<Utc>, latitude: f64, longitude: f64) -> DateTime<Utc> {
    let rising = altitude_above_horizon(lo, latitude, longitude) < 0.0;
    for _ in 0..BISECTION_ROUNDS {
        let mid = lo + (hi - lo) / 2;
        let below = altitude_above_horizon(mid, latitude, longitude) < 0.0;
        if below == rising {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    hi
}

/// First moonrise and first moonset in `[start, start + window)`.
#[must_use]
pub fn rise_set(
    start: DateTime<Utc>,
    window: Duration,
    latitude: f64,
    longitude: f64,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let step = Duration::minutes(SCAN_STEP_MINUTES);
    let end = start + window;

    let mut rise = None;
    let mut set = None;
    let mut prev_time = start;
    let mut prev_up = altitude_above_horizon(start, latitude, longitude) >= 0.0;

    while prev_time < end && (rise.is_none() || set.is_none()) {
        let time = (prev_time + step).min(end);
        let up = altitude_above_horizon(time, latitude, longitude) >= 0.0;

        if up != prev_up {
            let event = refine(prev_time, time, latitude, longitude);
            if up && rise.is_none() {
                rise = Some(event);
            } else if !up && set.is_none() {
                set = Some(event);
            }
        }

        prev_time = time;
        prev_up = up;
    }

    (rise, set)
}
