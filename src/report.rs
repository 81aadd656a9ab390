//! Plain-text sky report
//!
//! Rated hours are grouped by local calendar date. Each group opens with the
//! date, the moon and sun rise/set times and a column header, followed by one
//! fixed-width row per hour.

use std::fmt;

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;

use crate::astro::{Astronomy, Body, RiseSet};
use crate::models::RatedPoint;

const KM_PER_MILE: f64 = 1.609_344;
const COLUMN_SEPARATOR: &str = " | ";
const MISSING: &str = "-";
const NO_EVENT: &str = "--:--";
const OTHER_DAY_MARKER: &str = "*";

const COLUMNS: [(&str, usize); 10] = [
    ("hour", 4),
    ("ok?", 3),
    ("temp", 5),
    ("moon", 4),
    ("low", 3),
    ("mid", 3),
    ("high", 4),
    ("wind", 5),
    ("gusts", 5),
    ("seeing", 6),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// `f` (any case, surrounding space ignored) selects Fahrenheit;
    /// anything else is Celsius.
    #[must_use]
    pub fn from_param(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("f") {
            Self::Fahrenheit
        } else {
            Self::Celsius
        }
    }

    fn convert(self, celsius: f64) -> f64 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WindSpeedUnit {
    #[default]
    KilometersPerHour,
    MilesPerHour,
}

impl WindSpeedUnit {
    /// `mph` selects miles per hour; anything else is km/h.
    #[must_use]
    pub fn from_param(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("mph") {
            Self::MilesPerHour
        } else {
            Self::KilometersPerHour
        }
    }

    fn convert(self, kmh: f64) -> f64 {
        match self {
            Self::KilometersPerHour => kmh,
            Self::MilesPerHour => kmh / KM_PER_MILE,
        }
    }
}

/// Display preferences. Conversions never touch the underlying data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    pub temperature_unit: TemperatureUnit,
    pub wind_speed_unit: WindSpeedUnit,
    pub use_12_hour: bool,
}

impl ReportOptions {
    #[must_use]
    pub fn from_params(temperature: Option<&str>, wind_speed: Option<&str>, use_12_hour: bool) -> Self {
        Self {
            temperature_unit: temperature.map(TemperatureUnit::from_param).unwrap_or_default(),
            wind_speed_unit: wind_speed.map(WindSpeedUnit::from_param).unwrap_or_default(),
            use_12_hour,
        }
    }

    fn event_format(&self) -> &'static str {
        if self.use_12_hour { "%-I:%M%P" } else { "%H:%M" }
    }

    fn hour_label(&self, hour: u32) -> String {
        if !self.use_12_hour {
            return format!("{hour:02}");
        }
        let suffix = if hour >= 12 { "pm" } else { "am" };
        let twelve = match hour % 12 {
            0 => 12,
            h => h,
        };
        format!("{twelve}{suffix}")
    }
}

/// Right-aligns each cell to its column width and joins with `" | "`.
fn table_row<S: fmt::Display>(cells: [S; 10]) -> String {
    cells
        .iter()
        .zip(COLUMNS)
        .map(|(cell, (_, width))| format!("{cell:>width$}"))
        .collect::<Vec<_>>()
        .join(COLUMN_SEPARATOR)
}

fn column_header() -> String {
    table_row(COLUMNS.map(|(name, _)| name))
}

fn column_rule() -> String {
    COLUMNS
        .map(|(_, width)| "-".repeat(width))
        .join("-|-")
}

fn decimal(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.1}")
    } else {
        MISSING.to_string()
    }
}

fn whole(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.0}")
    } else {
        MISSING.to_string()
    }
}

fn event_label(event: Option<DateTime<Utc>>, day: NaiveDate, tz: Tz, options: &ReportOptions) -> String {
    match event {
        Some(at) => {
            let local = at.with_timezone(&tz);
            let text = local.format(options.event_format()).to_string();
            if local.date_naive() == day {
                text
            } else {
                format!("{text}{OTHER_DAY_MARKER}")
            }
        }
        None => format!("{NO_EVENT}{OTHER_DAY_MARKER}"),
    }
}

fn group_header(first: &RatedPoint, astronomy: &dyn Astronomy, options: &ReportOptions) -> String {
    let time = first.point.time;
    let day = time.date_naive();
    let tz = time.timezone();
    let (lat, lon) = (first.point.location.latitude, first.point.location.longitude);

    let moon: RiseSet = astronomy.rise_set(day, tz, lat, lon, Body::Moon);
    let sun: RiseSet = astronomy.rise_set(day, tz, lat, lon, Body::Sun);
    let label = |event| event_label(event, day, tz, options);

    let header = column_header();
    [
        time.format("%B %-d - %A").to_string(),
        format!(
            "moon: {} - {} | sun: {} - {}",
            label(moon.rise),
            label(moon.set),
            label(sun.rise),
            label(sun.set)
        ),
        "-".repeat(header.len()),
        header,
        column_rule(),
    ]
    .join("\n")
}

fn hour_row(rated: &RatedPoint, options: &ReportOptions) -> String {
    let point = &rated.point;
    table_row([
        options.hour_label(point.time.hour()),
        if rated.suitable { "ok" } else { MISSING }.to_string(),
        decimal(options.temperature_unit.convert(point.temperature_2m)),
        format!("{}%", rated.moon_illumination),
        whole(point.cloud_cover_low),
        whole(point.cloud_cover_mid),
        whole(point.cloud_cover_high),
        decimal(options.wind_speed_unit.convert(point.wind_speed_10m)),
        decimal(options.wind_speed_unit.convert(point.wind_gusts_10m)),
        decimal(rated.seeing_index),
    ])
}

/// Render rated hours as a date-grouped table. Same input, same bytes.
#[must_use]
pub fn render(points: &[RatedPoint], astronomy: &dyn Astronomy, options: &ReportOptions) -> String {
    let mut out = String::new();
    let mut current_day: Option<NaiveDate> = None;

    for rated in points {
        let day = rated.point.time.date_naive();
        if current_day != Some(day) {
            if current_day.is_some() {
                out.push('\n');
            }
            out.push_str(&group_header(rated, astronomy, options));
            out.push('\n');
            current_day = Some(day);
        }
        out.push_str(&hour_row(rated, options));
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ForecastPoint, Location};
    use crate::weather::metrics::tests::FixedMoon;
    use chrono::TimeZone;
    use rstest::rstest;

    /// Fixed events: moonrise the previous evening, no moonset, sun on the day.
    struct FixedSky;

    impl Astronomy for FixedSky {
        fn illumination(&self, _at: DateTime<Utc>) -> f64 {
            50.0
        }

        fn rise_set(&self, day: NaiveDate, tz: Tz, _lat: f64, _lon: f64, body: Body) -> RiseSet {
            let at = |d: NaiveDate, h: u32, m: u32| {
                tz.from_local_datetime(&d.and_hms_opt(h, m, 0).unwrap())
                    .unwrap()
                    .with_timezone(&Utc)
            };
            match body {
                Body::Moon => RiseSet {
                    rise: Some(at(day.pred_opt().unwrap(), 22, 15)),
                    set: None,
                },
                Body::Sun => RiseSet {
                    rise: Some(at(day, 7, 5)),
                    set: Some(at(day, 16, 30)),
                },
            }
        }
    }

    fn rated_at(time: DateTime<Tz>, temperature: f64, suitable: bool) -> RatedPoint {
        RatedPoint {
            point: ForecastPoint {
                time,
                location: Location::new(40.0, -120.0, 100.0),
                temperature_2m: temperature,
                temperature_500hpa: -20.0,
                temperature_850hpa: 0.0,
                cloud_cover_low: 5.0,
                cloud_cover_mid: 5.0,
                cloud_cover_high: 5.0,
                wind_speed_10m: 18.0,
                wind_gusts_10m: 36.0,
                wind_speed_200hpa: 40.0,
                wind_speed_850hpa: 20.0,
                geopotential_height_850hpa: 1500.0,
                geopotential_height_500hpa: 5500.0,
            },
            suitable,
            seeing_index: 1.5,
            moon_illumination: 50,
        }
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Tz> {
        Tz::UTC.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
    }

    #[rstest]
    #[case(" F ", TemperatureUnit::Fahrenheit)]
    #[case("f", TemperatureUnit::Fahrenheit)]
    #[case("c", TemperatureUnit::Celsius)]
    #[case("kelvin", TemperatureUnit::Celsius)]
    #[case("", TemperatureUnit::Celsius)]
    fn test_temperature_unit_parsing(#[case] raw: &str, #[case] expected: TemperatureUnit) {
        assert_eq!(TemperatureUnit::from_param(raw), expected);
    }

    #[rstest]
    #[case("MPH", WindSpeedUnit::MilesPerHour)]
    #[case("kmh", WindSpeedUnit::KilometersPerHour)]
    #[case("knots", WindSpeedUnit::KilometersPerHour)]
    fn test_wind_unit_parsing(#[case] raw: &str, #[case] expected: WindSpeedUnit) {
        assert_eq!(WindSpeedUnit::from_param(raw), expected);
    }

    #[rstest]
    #[case(0, "12am")]
    #[case(1, "1am")]
    #[case(12, "12pm")]
    #[case(13, "1pm")]
    #[case(23, "11pm")]
    fn test_twelve_hour_labels(#[case] hour: u32, #[case] expected: &str) {
        let options = ReportOptions::from_params(None, None, true);
        assert_eq!(options.hour_label(hour), expected);
    }

    #[test]
    fn test_units_and_twelve_hour_clock() {
        let points = [rated_at(utc(2024, 1, 1, 13), 10.0, true)];
        let options = ReportOptions::from_params(Some("f"), Some("mph"), true);

        let out = render(&points, &FixedMoon(50.0), &options);

        assert!(out.contains("1pm"), "{out}");
        assert!(out.contains("50.0"), "{out}");
        assert!(!out.contains("46.0"), "{out}");
        assert!(out.contains("11.2"), "{out}");
        assert!(out.contains("22.4"), "{out}");
    }

    #[test]
    fn test_default_options_render_headers() {
        let points = [rated_at(utc(2024, 1, 1, 0), 10.0, false)];
        let options = ReportOptions::from_params(Some(""), Some(""), false);
        assert_eq!(options, ReportOptions::default());

        let out = render(&points, &FixedMoon(0.0), &options);
        assert!(out.contains("hour") && out.contains("wind"));
        assert!(out.contains("\n  00 |   - |  10.0 |"), "{out}");
    }

    #[test]
    fn test_single_day_layout() {
        let points = [
            rated_at(utc(2024, 1, 1, 20), 10.0, true),
            rated_at(utc(2024, 1, 1, 21), 9.5, false),
        ];
        let out = render(&points, &FixedSky, &ReportOptions::default());
        let lines: Vec<&str> = out.lines().collect();

        let header = "hour | ok? |  temp | moon | low | mid | high |  wind | gusts | seeing";
        assert_eq!(lines[0], "January 1 - Monday");
        assert_eq!(lines[1], "moon: 22:15* - --:--* | sun: 07:05 - 16:30");
        assert_eq!(lines[2], "-".repeat(header.len()));
        assert_eq!(lines[3], header);
        assert_eq!(
            lines[4],
            "-----|-----|-------|------|-----|-----|------|-------|-------|-------"
        );
        assert_eq!(
            lines[5],
            "  20 |  ok |  10.0 |  50% |   5 |   5 |    5 |  18.0 |  36.0 |    1.5"
        );
        assert_eq!(
            lines[6],
            "  21 |   - |   9.5 |  50% |   5 |   5 |    5 |  18.0 |  36.0 |    1.5"
        );
        assert_eq!(lines.len(), 7);
        assert_eq!(lines.iter().filter(|l| l.ends_with("Monday")).count(), 1);
    }

    #[test]
    fn test_days_are_separated_by_blank_line() {
        let points = [
            rated_at(utc(2024, 1, 1, 23), 10.0, true),
            rated_at(utc(2024, 1, 2, 0), 10.0, true),
        ];
        let out = render(&points, &FixedSky, &ReportOptions::default());

        assert!(out.contains("January 1 - Monday"));
        assert!(out.contains("\n\nJanuary 2 - Tuesday\n"));
        assert_eq!(out.matches("moon: ").count(), 2);
    }

    #[test]
    fn test_groups_follow_local_date() {
        let berlin = chrono_tz::Europe::Berlin;
        // 22:30 UTC is already the next day in Berlin
        let time = Utc.with_ymd_and_hms(2024, 6, 1, 22, 30, 0).unwrap().with_timezone(&berlin);
        let out = render(&[rated_at(time, 10.0, true)], &FixedSky, &ReportOptions::default());
        assert!(out.starts_with("June 2 - Sunday\n"), "{out}");
    }

    #[test]
    fn test_twelve_hour_event_times() {
        let points = [rated_at(utc(2024, 1, 1, 20), 10.0, true)];
        let options = ReportOptions::from_params(None, None, true);
        let out = render(&points, &FixedSky, &options);
        assert!(out.contains("moon: 10:15pm* - --:--* | sun: 7:05am - 4:30pm"), "{out}");
    }

    #[test]
    fn test_missing_values_render_as_dash() {
        let mut rated = rated_at(utc(2024, 1, 1, 3), f64::NAN, false);
        rated.point.cloud_cover_mid = f64::NAN;
        let out = render(&[rated], &FixedSky, &ReportOptions::default());
        let row = out.lines().last().unwrap();
        assert_eq!(
            row,
            "  03 |   - |     - |  50% |   5 |   - |    5 |  18.0 |  36.0 |    1.5"
        );
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let points = [
            rated_at(utc(2024, 1, 1, 22), 10.0, true),
            rated_at(utc(2024, 1, 2, 1), 8.0, false),
        ];
        let options = ReportOptions::from_params(Some("f"), None, true);
        assert_eq!(
            render(&points, &FixedSky, &options),
            render(&points, &FixedSky, &options)
        );
    }

    #[test]
    fn test_empty_input_renders_nothing() {
        assert!(render(&[], &FixedSky, &ReportOptions::default()).is_empty());
    }
}
