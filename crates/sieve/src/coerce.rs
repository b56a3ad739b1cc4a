//! Coercion of raw descriptor values to typed operands.
//!
//! Descriptor values arrive as JSON scalars. Before a comparison is built each
//! one is converted to the static kind of the field it is compared against,
//! so that `"2024-01-31"` compares as a date and `"42"` as a number.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value as Json;
use uuid::Uuid;

use crate::error::{Result, SieveError};
use crate::schema::Kind;
use crate::value::{Number, Scalar};

/// Coerces a raw value to the given kind.
///
/// `null` always coerces to [`Scalar::Null`]; deciding what a null operand
/// means is up to the caller. Records, lists and JSON documents are not
/// coercion targets.
pub fn coerce(raw: &Json, kind: &Kind) -> Result<Scalar> {
    if raw.is_null() {
        return Ok(Scalar::Null);
    }
    let fail = || SieveError::conversion(raw, kind.to_string());

    let scalar = match kind {
        Kind::String => Scalar::String(text(raw).ok_or_else(fail)?),
        Kind::Int => Scalar::Number(Number::I64(to_i64(raw).ok_or_else(fail)?)),
        Kind::UInt => Scalar::Number(Number::U64(to_u64(raw).ok_or_else(fail)?)),
        Kind::Float => Scalar::Number(Number::F64(to_f64(raw).ok_or_else(fail)?)),
        Kind::Bool => Scalar::Bool(to_bool(raw).ok_or_else(fail)?),
        Kind::Uuid => {
            let s = raw.as_str().ok_or_else(fail)?;
            Scalar::Uuid(Uuid::parse_str(s.trim()).map_err(|_| fail())?)
        }
        Kind::DateTime => Scalar::DateTime(to_datetime(raw).ok_or_else(fail)?),
        Kind::Date => {
            let s = raw.as_str().ok_or_else(fail)?;
            Scalar::Date(parse_date(s).ok_or_else(fail)?)
        }
        Kind::Time => {
            let s = raw.as_str().ok_or_else(fail)?;
            Scalar::Time(parse_time(s).ok_or_else(fail)?)
        }
        Kind::Duration => Scalar::Duration(to_duration(raw).ok_or_else(fail)?),
        Kind::Enum(variants) => Scalar::Enum(to_variant(raw, variants).ok_or_else(fail)?),
        Kind::Json | Kind::Record(_) | Kind::List(_) => return Err(fail()),
    };
    Ok(scalar)
}

/// Integer operand for cardinality comparisons.
pub fn coerce_length(raw: &Json) -> Result<u64> {
    to_u64(raw).ok_or_else(|| SieveError::conversion(raw, "length"))
}

/// Text form of a scalar: strings verbatim, numbers and booleans as JSON text.
pub fn text(raw: &Json) -> Option<String> {
    crate::json::extract_text(raw)
}

fn to_i64(raw: &Json) -> Option<i64> {
    match raw {
        Json::Number(n) => n.as_i64().or_else(|| whole(n.as_f64()?)),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_u64(raw: &Json) -> Option<u64> {
    match raw {
        Json::Number(n) => n
            .as_u64()
            .or_else(|| whole(n.as_f64()?).and_then(|i| u64::try_from(i).ok())),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn whole(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn to_f64(raw: &Json) -> Option<f64> {
    match raw {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_bool(raw: &Json) -> Option<bool> {
    match raw {
        Json::Bool(b) => Some(*b),
        Json::String(s) => {
            let s = s.trim();
            if s.eq_ignore_ascii_case("true") {
                Some(true)
            } else if s.eq_ignore_ascii_case("false") {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn to_variant(raw: &Json, variants: &[&str]) -> Option<u32> {
    match raw {
        Json::String(s) => {
            let s = s.trim();
            variants
                .iter()
                .position(|v| v.eq_ignore_ascii_case(s))
                .and_then(|i| u32::try_from(i).ok())
        }
        Json::Number(n) => n
            .as_u64()
            .filter(|i| (*i as usize) < variants.len())
            .and_then(|i| u32::try_from(i).ok()),
        _ => None,
    }
}

fn to_datetime(raw: &Json) -> Option<DateTime<FixedOffset>> {
    match raw {
        Json::String(s) => parse_datetime(s),
        Json::Number(n) => DateTime::<Utc>::from_timestamp_millis(n.as_i64()?).map(Into::into),
        _ => None,
    }
}

const NAIVE_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parses RFC 3339, a naive date-time (taken as UTC), or a bare date
/// (midnight UTC).
pub fn parse_datetime(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    let naive = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc).into())
}

/// Parses `YYYY-MM-DD`, or the date part of a full date-time.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(s).map(|dt| dt.date_naive()))
}

/// Parses `HH:MM[:SS[.fff]]`.
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

fn to_duration(raw: &Json) -> Option<Duration> {
    match raw {
        Json::String(s) => parse_duration(s),
        Json::Number(n) => Duration::try_milliseconds(n.as_i64()?),
        _ => None,
    }
}

/// Parses an ISO-8601 duration (`P1DT2H30M`, `PT0.5S`, `P2W`) or a clock
/// form (`02:30:00`, `1.02:30:00.250`, `-00:15`).
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let parsed = match body.strip_prefix(['P', 'p']) {
        Some(iso) => parse_iso_duration(iso)?,
        None => parse_clock_duration(body)?,
    };
    Some(if negative { -parsed } else { parsed })
}

fn parse_iso_duration(body: &str) -> Option<Duration> {
    if body.is_empty() {
        return None;
    }
    let mut total = Duration::zero();
    let mut in_time = false;
    let mut number = String::new();
    let mut saw_component = false;

    for c in body.chars() {
        match c {
            'T' | 't' if !in_time && number.is_empty() => in_time = true,
            '0'..='9' | '.' => number.push(c),
            unit => {
                if number.is_empty() {
                    return None;
                }
                let amount: f64 = number.parse().ok()?;
                let seconds = match (in_time, unit.to_ascii_uppercase()) {
                    (false, 'W') => 7.0 * 86_400.0,
                    (false, 'D') => 86_400.0,
                    (true, 'H') => 3_600.0,
                    (true, 'M') => 60.0,
                    (true, 'S') => 1.0,
                    _ => return None,
                };
                let part = Duration::try_milliseconds((amount * seconds * 1_000.0).round() as i64)?;
                total = total.checked_add(&part)?;
                number.clear();
                saw_component = true;
            }
        }
    }

    if !number.is_empty() || !saw_component {
        return None;
    }
    Some(total)
}

fn parse_clock_duration(body: &str) -> Option<Duration> {
    let parts: Vec<&str> = body.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }

    let (days, hours) = match parts[0].split_once('.') {
        Some((d, h)) => (d.parse::<i64>().ok()?, h.parse::<i64>().ok()?),
        None => (0, parts[0].parse::<i64>().ok()?),
    };
    let minutes: i64 = parts[1].parse().ok()?;
    let seconds: f64 = match parts.get(2) {
        Some(s) => s.parse().ok()?,
        None => 0.0,
    };
    if minutes >= 60 || !(0.0..60.0).contains(&seconds) {
        return None;
    }

    // out-of-range components are a conversion failure, not a panic
    Duration::try_days(days)?
        .checked_add(&Duration::try_hours(hours)?)?
        .checked_add(&Duration::try_minutes(minutes)?)?
        .checked_add(&Duration::try_milliseconds((seconds * 1_000.0).round() as i64)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_from_json_and_strings() {
        assert_eq!(
            coerce(&json!(42), &Kind::Int).unwrap(),
            Scalar::Number(Number::I64(42))
        );
        assert_eq!(
            coerce(&json!(" 42 "), &Kind::Int).unwrap(),
            Scalar::Number(Number::I64(42))
        );
        assert_eq!(
            coerce(&json!(3.0), &Kind::UInt).unwrap(),
            Scalar::Number(Number::U64(3))
        );
        assert_eq!(
            coerce(&json!("2.5"), &Kind::Float).unwrap(),
            Scalar::Number(Number::F64(2.5))
        );
    }

    #[test]
    fn number_conversion_failures() {
        assert_eq!(
            coerce(&json!("abc"), &Kind::Int),
            Err(SieveError::ValueConversionFailure {
                value: "\"abc\"".into(),
                target: "int".into()
            })
        );
        assert!(coerce(&json!(2.5), &Kind::Int).is_err());
        assert!(coerce(&json!(-1), &Kind::UInt).is_err());
        assert!(coerce(&json!(true), &Kind::Int).is_err());
    }

    #[test]
    fn strings_accept_any_scalar() {
        assert_eq!(
            coerce(&json!(7), &Kind::String).unwrap(),
            Scalar::String("7".into())
        );
        assert_eq!(
            coerce(&json!(false), &Kind::String).unwrap(),
            Scalar::String("false".into())
        );
        assert!(coerce(&json!([1]), &Kind::String).is_err());
    }

    #[test]
    fn null_passes_through() {
        assert_eq!(coerce(&Json::Null, &Kind::Int).unwrap(), Scalar::Null);
    }

    #[test]
    fn bools() {
        assert_eq!(coerce(&json!("TRUE"), &Kind::Bool).unwrap(), Scalar::Bool(true));
        assert_eq!(coerce(&json!(false), &Kind::Bool).unwrap(), Scalar::Bool(false));
        assert!(coerce(&json!("yes"), &Kind::Bool).is_err());
    }

    #[test]
    fn uuids() {
        let id = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        assert_eq!(
            coerce(&json!(id), &Kind::Uuid).unwrap(),
            Scalar::Uuid(Uuid::parse_str(id).unwrap())
        );
        assert!(coerce(&json!("not-a-uuid"), &Kind::Uuid).is_err());
    }

    #[test]
    fn enums_by_name_ignoring_case() {
        let kind = Kind::Enum(&["Active", "Suspended"]);
        assert_eq!(coerce(&json!("suspended"), &kind).unwrap(), Scalar::Enum(1));
        assert_eq!(coerce(&json!(0), &kind).unwrap(), Scalar::Enum(0));
        assert!(coerce(&json!("Deleted"), &kind).is_err());
        assert!(coerce(&json!(2), &kind).is_err());
    }

    #[test]
    fn datetimes() {
        let with_offset = parse_datetime("2024-01-31T10:00:00+02:00").unwrap();
        let utc = parse_datetime("2024-01-31T08:00:00").unwrap();
        assert_eq!(with_offset, utc);

        let midnight = parse_datetime("2024-01-31").unwrap();
        assert_eq!(midnight.to_rfc3339(), "2024-01-31T00:00:00+00:00");

        assert!(parse_datetime("31/01/2024").is_none());
        assert!(coerce(&json!(0), &Kind::DateTime).is_ok());
    }

    #[test]
    fn dates_and_times() {
        assert_eq!(
            parse_date("2024-02-29"),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(
            parse_date("2024-02-29T23:00:00Z"),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert!(parse_date("2023-02-29").is_none());
        assert_eq!(parse_time("07:30"), NaiveTime::from_hms_opt(7, 30, 0));
        assert_eq!(
            parse_time("07:30:15.5"),
            NaiveTime::from_hms_milli_opt(7, 30, 15, 500)
        );
    }

    #[test]
    fn durations() {
        assert_eq!(
            parse_duration("P1DT2H30M"),
            Some(Duration::days(1) + Duration::hours(2) + Duration::minutes(30))
        );
        assert_eq!(parse_duration("PT0.5S"), Some(Duration::milliseconds(500)));
        assert_eq!(parse_duration("P2W"), Some(Duration::days(14)));
        assert_eq!(parse_duration("02:30:00"), Some(Duration::minutes(150)));
        assert_eq!(
            parse_duration("1.02:00:00"),
            Some(Duration::days(1) + Duration::hours(2))
        );
        assert_eq!(parse_duration("-00:15"), Some(Duration::minutes(-15)));
        assert_eq!(
            coerce(&json!(1500), &Kind::Duration).unwrap(),
            Scalar::Duration(Duration::milliseconds(1500))
        );

        for bad in ["P", "PT", "P1H", "1:2:3:4", "00:61", "abc"] {
            assert!(parse_duration(bad).is_none(), "{bad:?} should fail");
        }
    }

    #[test]
    fn durations_out_of_range() {
        assert_eq!(parse_duration("200000000000.00:00"), None);
        assert_eq!(parse_duration("P9999999999999999DT1S"), None);
        assert!(matches!(
            coerce(&json!("200000000000.00:00"), &Kind::Duration),
            Err(SieveError::ValueConversionFailure { .. })
        ));
        assert!(coerce(&json!(i64::MIN), &Kind::Duration).is_err());
    }

    #[test]
    fn structured_kinds_are_not_targets() {
        assert!(coerce(&json!("x"), &Kind::Json).is_err());
        assert!(coerce(&json!("x"), &Kind::List(Box::new(Kind::String))).is_err());
    }

    #[test]
    fn length_operand() {
        assert_eq!(coerce_length(&json!(2)).unwrap(), 2);
        assert_eq!(coerce_length(&json!("3")).unwrap(), 3);
        assert!(coerce_length(&json!(-1)).is_err());
    }
}
