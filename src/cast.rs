//! Per-type cast rules for Table Schema fields.
//!
//! [`cast_value`] turns a raw cell into the canonical [`Value`] variant for a
//! field's logical type and then checks the field's constraints:
//!
//! | type | canonical value |
//! |---|---|
//! | string | `Text` |
//! | number | `Float` |
//! | integer, year | `Int` |
//! | boolean | `Bool` |
//! | array | `Sequence` |
//! | object, geojson | `Mapping` |
//! | date / time / datetime | `Date` / `Time` / `Timestamp` |
//! | yearmonth | `Sequence([Int year, Int month])` |
//! | duration | `Duration` |
//! | geopoint | `Sequence([Float lon, Float lat])` |
//! | any | unchanged |
//!
//! Every rule accepts its own canonical output, so casting a value that was
//! already cast is the identity.

use std::{
    cmp::Ordering,
    collections::HashMap,
    sync::{Mutex, OnceLock, PoisonError},
};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use uuid::Uuid;

use crate::{
    error::{Result, StorageError},
    schema::{Field, LogicalType},
    value::{
        Duration, Value, exact_integer, parse_naive_date, parse_naive_datetime, parse_naive_time,
    },
};

const DEFAULT_TRUE_VALUES: &[&str] = &["true", "True", "TRUE", "1"];
const DEFAULT_FALSE_VALUES: &[&str] = &["false", "False", "FALSE", "0"];
const GEOJSON_TYPES: &[&str] = &[
    "Point",
    "MultiPoint",
    "LineString",
    "MultiLineString",
    "Polygon",
    "MultiPolygon",
    "GeometryCollection",
    "Feature",
    "FeatureCollection",
];

/// Casts `value` for `field`, treating any text listed in `missing_values` as null.
pub fn cast_value(field: &Field, value: &Value, missing_values: &[String]) -> Result<Value> {
    let cast = match value {
        Value::Null => Value::Null,
        Value::Text(text) if missing_values.iter().any(|missing| missing == text) => Value::Null,
        other => cast_type(field, other)?,
    };
    check_constraints(field, &cast)?;
    Ok(cast)
}

/// Applies the type rule alone; null input stays null and no constraint is checked.
pub fn cast_type(field: &Field, value: &Value) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match field.field_type {
        LogicalType::String => cast_string(field, value),
        LogicalType::Number => cast_number(field, value),
        LogicalType::Integer => cast_integer(field, value),
        LogicalType::Boolean => cast_boolean(field, value),
        LogicalType::Array => match value {
            Value::Sequence(_) => Ok(value.clone()),
            other => Err(mismatch(field, other)),
        },
        LogicalType::Object => match value {
            Value::Mapping(_) => Ok(value.clone()),
            other => Err(mismatch(field, other)),
        },
        LogicalType::Date => cast_date(field, value),
        LogicalType::Time => cast_time(field, value),
        LogicalType::Datetime => cast_datetime(field, value),
        LogicalType::Year => cast_year(field, value),
        LogicalType::Yearmonth => cast_yearmonth(field, value),
        LogicalType::Duration => match value {
            Value::Duration(_) => Ok(value.clone()),
            Value::Text(text) => text
                .parse::<Duration>()
                .map(Value::Duration)
                .map_err(|err| StorageError::cast(&field.name, err.to_string())),
            other => Err(mismatch(field, other)),
        },
        LogicalType::Geopoint => cast_geopoint(field, value),
        LogicalType::Geojson => cast_geojson(field, value),
        LogicalType::Any => Ok(value.clone()),
    }
}

fn mismatch(field: &Field, value: &Value) -> StorageError {
    StorageError::cast(
        &field.name,
        format!(
            "expected {} but found {} value '{}'",
            field.field_type,
            value.type_name(),
            value
        ),
    )
}

fn pattern(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(source).expect("built-in pattern is a valid regex"))
}

fn cast_string(field: &Field, value: &Value) -> Result<Value> {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    static URI: OnceLock<Regex> = OnceLock::new();
    static BINARY: OnceLock<Regex> = OnceLock::new();

    let Value::Text(text) = value else {
        return Err(mismatch(field, value));
    };
    let valid = match field.format_name() {
        "email" => pattern(&EMAIL, r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_match(text),
        "uri" => pattern(&URI, r"^[A-Za-z][A-Za-z0-9+.\-]*:\S+$").is_match(text),
        "binary" => pattern(&BINARY, r"^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$")
            .is_match(text),
        "uuid" => Uuid::parse_str(text).is_ok(),
        _ => true,
    };
    if !valid {
        return Err(StorageError::cast(
            &field.name,
            format!("'{text}' is not a valid {}", field.format_name()),
        ));
    }
    Ok(value.clone())
}

/// Strips currency symbols and similar decorations when `bareNumber` is false.
fn strip_number_decorations(text: &str) -> &str {
    text.trim_matches(|c: char| !(c.is_ascii_digit() || c == '-' || c == '+' || c == '.' || c == ','))
}

fn numeric_text<'a>(field: &Field, text: &'a str) -> std::borrow::Cow<'a, str> {
    let mut token = std::borrow::Cow::Borrowed(text.trim());
    if field.bare_number == Some(false) {
        token = std::borrow::Cow::Owned(strip_number_decorations(&token).to_string());
    }
    if let Some(group) = field.group_char.as_deref() {
        token = std::borrow::Cow::Owned(token.replace(group, ""));
    }
    if let Some(decimal) = field.decimal_char.as_deref()
        && decimal != "."
    {
        token = std::borrow::Cow::Owned(token.replace(decimal, "."));
    }
    token
}

fn cast_number(field: &Field, value: &Value) -> Result<Value> {
    match value {
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Int(i) => Ok(Value::Float(*i as f64)),
        Value::Text(text) => {
            let token = numeric_text(field, text);
            let parsed = match token.as_ref() {
                "NaN" | "nan" => f64::NAN,
                "INF" | "inf" | "Infinity" => f64::INFINITY,
                "-INF" | "-inf" | "-Infinity" => f64::NEG_INFINITY,
                other => other.parse::<f64>().map_err(|_| {
                    StorageError::cast(&field.name, format!("'{text}' is not a number"))
                })?,
            };
            Ok(Value::Float(parsed))
        }
        other => Err(mismatch(field, other)),
    }
}

fn integer_from_float(field: &Field, value: f64) -> Result<i64> {
    exact_integer(value).ok_or_else(|| {
        let reason = if value.is_finite() && value.fract() == 0.0 {
            "is out of integer range"
        } else {
            "is not an integer"
        };
        StorageError::cast(&field.name, format!("'{value}' {reason}"))
    })
}

fn cast_integer(field: &Field, value: &Value) -> Result<Value> {
    match value {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Float(f) => integer_from_float(field, *f).map(Value::Int),
        Value::Text(text) => {
            let token = numeric_text(field, text);
            token
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| StorageError::cast(&field.name, format!("'{text}' is not an integer")))
        }
        other => Err(mismatch(field, other)),
    }
}

fn cast_boolean(field: &Field, value: &Value) -> Result<Value> {
    match value {
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::Text(text) => {
            let token = text.trim();
            let is_true = match &field.true_values {
                Some(values) => values.iter().any(|v| v == token),
                None => DEFAULT_TRUE_VALUES.contains(&token),
            };
            if is_true {
                return Ok(Value::Bool(true));
            }
            let is_false = match &field.false_values {
                Some(values) => values.iter().any(|v| v == token),
                None => DEFAULT_FALSE_VALUES.contains(&token),
            };
            if is_false {
                return Ok(Value::Bool(false));
            }
            Err(StorageError::cast(
                &field.name,
                format!("'{text}' is not a boolean"),
            ))
        }
        other => Err(mismatch(field, other)),
    }
}

fn parse_with_format<T>(
    field: &Field,
    text: &str,
    default: impl Fn(&str) -> Option<T>,
    any: impl Fn(&str) -> anyhow::Result<T>,
    custom: impl Fn(&str, &str) -> Option<T>,
) -> Result<T> {
    let token = text.trim();
    let parsed = match field.format_name() {
        "default" => default(token),
        "any" => any(token).ok(),
        pattern => custom(token, pattern),
    };
    parsed.ok_or_else(|| {
        StorageError::cast(
            &field.name,
            format!(
                "'{text}' does not match {} format \"{}\"",
                field.field_type,
                field.format_name()
            ),
        )
    })
}

fn cast_date(field: &Field, value: &Value) -> Result<Value> {
    match value {
        Value::Date(d) => Ok(Value::Date(*d)),
        Value::Timestamp(dt) if dt.time() == NaiveTime::MIN => Ok(Value::Date(dt.date())),
        Value::Text(text) => parse_with_format(
            field,
            text,
            |token| NaiveDate::parse_from_str(token, "%Y-%m-%d").ok(),
            parse_naive_date,
            |token, pattern| NaiveDate::parse_from_str(token, pattern).ok(),
        )
        .map(Value::Date),
        other => Err(mismatch(field, other)),
    }
}

fn cast_time(field: &Field, value: &Value) -> Result<Value> {
    match value {
        Value::Time(t) => Ok(Value::Time(*t)),
        Value::Text(text) => parse_with_format(
            field,
            text,
            |token| NaiveTime::parse_from_str(token, "%H:%M:%S").ok(),
            parse_naive_time,
            |token, pattern| NaiveTime::parse_from_str(token, pattern).ok(),
        )
        .map(Value::Time),
        other => Err(mismatch(field, other)),
    }
}

fn cast_datetime(field: &Field, value: &Value) -> Result<Value> {
    match value {
        Value::Timestamp(dt) => Ok(Value::Timestamp(*dt)),
        Value::Text(text) => parse_with_format(
            field,
            text,
            |token| {
                NaiveDateTime::parse_from_str(token, "%Y-%m-%dT%H:%M:%SZ")
                    .ok()
                    .or_else(|| DateTime::parse_from_rfc3339(token).ok().map(|dt| dt.naive_utc()))
            },
            parse_naive_datetime,
            |token, pattern| {
                DateTime::parse_from_str(token, pattern)
                    .map(|dt| dt.naive_utc())
                    .or_else(|_| NaiveDateTime::parse_from_str(token, pattern))
                    .ok()
            },
        )
        .map(Value::Timestamp),
        other => Err(mismatch(field, other)),
    }
}

fn cast_year(field: &Field, value: &Value) -> Result<Value> {
    let year = match value {
        Value::Int(i) => *i,
        Value::Float(f) => integer_from_float(field, *f)?,
        Value::Text(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| StorageError::cast(&field.name, format!("'{text}' is not a year")))?,
        other => return Err(mismatch(field, other)),
    };
    if !(0..=9999).contains(&year) {
        return Err(StorageError::cast(
            &field.name,
            format!("{year} is outside the year range 0..=9999"),
        ));
    }
    Ok(Value::Int(year))
}

fn cast_yearmonth(field: &Field, value: &Value) -> Result<Value> {
    let (year, month) = match value {
        Value::Sequence(items) if items.len() == 2 => match (&items[0], &items[1]) {
            (Value::Int(year), Value::Int(month)) => (*year, *month),
            _ => return Err(mismatch(field, value)),
        },
        Value::Text(text) => {
            let parsed = text
                .trim()
                .split_once('-')
                .and_then(|(year, month)| Some((year.parse::<i64>().ok()?, month.parse::<i64>().ok()?)));
            parsed.ok_or_else(|| {
                StorageError::cast(&field.name, format!("'{text}' is not a YYYY-MM year-month"))
            })?
        }
        other => return Err(mismatch(field, other)),
    };
    if !(1..=12).contains(&month) {
        return Err(StorageError::cast(
            &field.name,
            format!("month {month} is outside 1..=12"),
        ));
    }
    Ok(Value::Sequence(vec![Value::Int(year), Value::Int(month)]))
}

fn geopoint_from_pair(field: &Field, lon: &Value, lat: &Value) -> Result<Value> {
    let coordinate = |value: &Value| -> Result<f64> {
        match value {
            Value::Text(text) => text.trim().parse::<f64>().ok(),
            other => other.as_f64(),
        }
        .ok_or_else(|| StorageError::cast(&field.name, format!("'{value}' is not a coordinate")))
    };
    let (lon, lat) = (coordinate(lon)?, coordinate(lat)?);
    if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        return Err(StorageError::cast(
            &field.name,
            format!("point ({lon}, {lat}) is out of range"),
        ));
    }
    Ok(Value::Sequence(vec![Value::Float(lon), Value::Float(lat)]))
}

fn cast_geopoint(field: &Field, value: &Value) -> Result<Value> {
    match (field.format_name(), value) {
        (_, Value::Sequence(items)) if items.len() == 2 => {
            geopoint_from_pair(field, &items[0], &items[1])
        }
        ("object", Value::Mapping(map)) => match (map.get("lon"), map.get("lat")) {
            (Some(lon), Some(lat)) if map.len() == 2 => geopoint_from_pair(field, lon, lat),
            _ => Err(mismatch(field, value)),
        },
        ("default", Value::Text(text)) => match text.split_once(',') {
            Some((lon, lat)) => {
                geopoint_from_pair(field, &Value::from(lon.trim()), &Value::from(lat.trim()))
            }
            None => Err(mismatch(field, value)),
        },
        ("array" | "object", Value::Text(text)) => {
            let parsed: serde_json::Value = serde_json::from_str(text)
                .map_err(|err| StorageError::cast(&field.name, err.to_string()))?;
            match Value::from_json(&parsed) {
                Value::Text(_) => Err(mismatch(field, value)),
                structured => cast_geopoint(field, &structured),
            }
        }
        (_, other) => Err(mismatch(field, other)),
    }
}

fn cast_geojson(field: &Field, value: &Value) -> Result<Value> {
    let mapping = match value {
        Value::Mapping(_) => value.clone(),
        Value::Text(text) => {
            let parsed: serde_json::Value = serde_json::from_str(text)
                .map_err(|err| StorageError::cast(&field.name, err.to_string()))?;
            Value::from_json(&parsed)
        }
        other => return Err(mismatch(field, other)),
    };
    let Value::Mapping(map) = &mapping else {
        return Err(mismatch(field, value));
    };
    let kind = map.get("type").and_then(Value::as_str).unwrap_or_default();
    let valid = match field.format_name() {
        "topojson" => kind == "Topology",
        _ => GEOJSON_TYPES.contains(&kind),
    };
    if !valid {
        return Err(StorageError::cast(
            &field.name,
            format!("'{kind}' is not a valid {} type", field.format_name()),
        ));
    }
    Ok(mapping)
}

/// Orders two cast values of the same logical type.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        (Value::Time(a), Value::Time(b)) => Some(a.cmp(b)),
        (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (a, b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

fn value_length(value: &Value) -> Option<usize> {
    match value {
        Value::Text(text) => Some(text.chars().count()),
        Value::Sequence(items) => Some(items.len()),
        Value::Mapping(map) => Some(map.len()),
        _ => None,
    }
}

/// `pattern` constraints compiled so far, keyed by their source text.
static PATTERN_CACHE: OnceLock<Mutex<HashMap<String, Regex>>> = OnceLock::new();

fn anchored_pattern(pattern: &str) -> Result<Regex> {
    let mut cache = PATTERN_CACHE
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(regex) = cache.get(pattern) {
        return Ok(regex.clone());
    }
    let regex = Regex::new(&format!("^(?:{pattern})$"))
        .map_err(|err| StorageError::invalid(err.to_string()))?;
    cache.insert(pattern.to_string(), regex.clone());
    Ok(regex)
}

fn check_constraints(field: &Field, value: &Value) -> Result<()> {
    let constraints = &field.constraints;
    if value.is_null() {
        if field.is_required() {
            return Err(StorageError::cast(&field.name, "required field has no value"));
        }
        return Ok(());
    }
    if let Some(options) = &constraints.enum_values {
        let mut allowed = false;
        for option in options {
            if cast_type(field, &Value::from_json(option))? == *value {
                allowed = true;
                break;
            }
        }
        if !allowed {
            return Err(StorageError::cast(
                &field.name,
                format!("'{value}' is not one of the enumerated values"),
            ));
        }
    }
    for (bound, violated, label) in [
        (&constraints.minimum, Ordering::Less, "minimum"),
        (&constraints.maximum, Ordering::Greater, "maximum"),
    ] {
        if let Some(bound) = bound {
            let bound = cast_type(field, &Value::from_json(bound))?;
            if compare(value, &bound) == Some(violated) {
                return Err(StorageError::cast(
                    &field.name,
                    format!("'{value}' violates {label} '{bound}'"),
                ));
            }
        }
    }
    if let Some(length) = value_length(value) {
        if constraints.min_length.is_some_and(|min| length < min) {
            return Err(StorageError::cast(
                &field.name,
                format!("length {length} is below minLength"),
            ));
        }
        if constraints.max_length.is_some_and(|max| length > max) {
            return Err(StorageError::cast(
                &field.name,
                format!("length {length} exceeds maxLength"),
            ));
        }
    }
    if let (Some(pattern), Value::Text(text)) = (&constraints.pattern, value) {
        let anchored = anchored_pattern(pattern)?;
        if !anchored.is_match(text) {
            return Err(StorageError::cast(
                &field.name,
                format!("'{text}' does not match pattern '{pattern}'"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Constraints;
    use std::collections::BTreeMap;

    fn no_missing() -> Vec<String> {
        vec![String::new()]
    }

    fn cast(field: &Field, raw: impl Into<Value>) -> Result<Value> {
        cast_value(field, &raw.into(), &no_missing())
    }

    #[test]
    fn empty_text_is_missing() {
        let field = Field::new("count", LogicalType::Integer);
        assert_eq!(cast(&field, "").unwrap(), Value::Null);
        let required = field.required();
        assert!(cast(&required, "").unwrap_err().is_cast());
    }

    #[test]
    fn numbers_honour_separators_and_bare_number() {
        let mut field = Field::new("price", LogicalType::Number);
        field.group_char = Some(",".to_string());
        field.bare_number = Some(false);
        assert_eq!(cast(&field, "$1,234.50").unwrap(), Value::Float(1234.5));

        let mut european = Field::new("price", LogicalType::Number);
        european.decimal_char = Some(",".to_string());
        european.group_char = Some(".".to_string());
        assert_eq!(cast(&european, "1.234,5").unwrap(), Value::Float(1234.5));

        let plain = Field::new("price", LogicalType::Number);
        assert!(cast(&plain, "$12").is_err());
        assert!(matches!(cast(&plain, "NaN").unwrap(), Value::Float(f) if f.is_nan()));
    }

    #[test]
    fn integers_accept_integral_floats_only() {
        let field = Field::new("n", LogicalType::Integer);
        assert_eq!(cast(&field, 3.0).unwrap(), Value::Int(3));
        assert_eq!(cast(&field, " 42 ").unwrap(), Value::Int(42));
        assert!(cast(&field, 3.5).is_err());
        assert!(cast(&field, true).is_err());
    }

    #[test]
    fn integral_floats_beyond_i64_are_rejected() {
        let integer = Field::new("n", LogicalType::Integer);
        let err = cast(&integer, 1e20).unwrap_err();
        assert!(err.to_string().contains("out of integer range"));
        assert!(cast(&integer, -1e20).is_err());
        assert!(cast(&integer, 9_223_372_036_854_775_808.0).is_err());
        assert_eq!(cast(&integer, -9_223_372_036_854_775_808.0).unwrap(), Value::Int(i64::MIN));

        let year = Field::new("y", LogicalType::Year);
        assert!(cast(&year, 1e20).is_err());
    }

    #[test]
    fn pattern_constraints_are_compiled_once() {
        let mut constraints = Constraints::default();
        constraints.pattern = Some("[a-z]{2}-[0-9]+".to_string());
        let field = Field::new("code", LogicalType::String).with_constraints(constraints);
        assert!(cast(&field, "ab-12").is_ok());
        assert!(cast(&field, "ab-12x").is_err());

        let cache = PATTERN_CACHE.get().unwrap().lock().unwrap();
        let compiled = cache.get("[a-z]{2}-[0-9]+").unwrap();
        assert_eq!(compiled.as_str(), "^(?:[a-z]{2}-[0-9]+)$");
    }

    #[test]
    fn invalid_pattern_is_a_descriptor_error() {
        let mut constraints = Constraints::default();
        constraints.pattern = Some("(".to_string());
        let field = Field::new("code", LogicalType::String).with_constraints(constraints);
        assert!(matches!(cast(&field, "x"), Err(StorageError::InvalidDescriptor(_))));
    }

    #[test]
    fn booleans_use_custom_true_and_false_values() {
        let mut field = Field::new("flag", LogicalType::Boolean);
        assert_eq!(cast(&field, "TRUE").unwrap(), Value::Bool(true));
        assert!(cast(&field, "yes").is_err());
        field.true_values = Some(vec!["yes".to_string()]);
        field.false_values = Some(vec!["no".to_string()]);
        assert_eq!(cast(&field, "yes").unwrap(), Value::Bool(true));
        assert_eq!(cast(&field, "no").unwrap(), Value::Bool(false));
        assert!(cast(&field, "true").is_err());
    }

    #[test]
    fn dates_follow_declared_format() {
        let expected = Value::Date(NaiveDate::from_ymd_opt(2024, 5, 6).unwrap());
        let default = Field::new("d", LogicalType::Date);
        assert_eq!(cast(&default, "2024-05-06").unwrap(), expected);
        assert!(cast(&default, "06/05/2024").is_err());

        let any = default.clone().with_format("any");
        assert_eq!(cast(&any, "06/05/2024").unwrap(), expected);

        let pattern = default.clone().with_format("fmt:%d.%m.%Y");
        assert_eq!(cast(&pattern, "06.05.2024").unwrap(), expected);

        let midnight = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(cast(&default, midnight).unwrap(), expected);
    }

    #[test]
    fn datetimes_normalise_offsets_to_utc() {
        let field = Field::new("at", LogicalType::Datetime);
        let expected = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(cast(&field, "2024-01-02T08:30:00Z").unwrap(), Value::Timestamp(expected));
        assert_eq!(
            cast(&field, "2024-01-02T10:30:00+02:00").unwrap(),
            Value::Timestamp(expected)
        );
    }

    #[test]
    fn yearmonth_and_year_are_checked() {
        let field = Field::new("ym", LogicalType::Yearmonth);
        let expected = Value::Sequence(vec![Value::Int(2024), Value::Int(3)]);
        assert_eq!(cast(&field, "2024-03").unwrap(), expected);
        assert_eq!(cast(&field, expected.clone()).unwrap(), expected);
        assert!(cast(&field, "2024-13").is_err());

        let year = Field::new("y", LogicalType::Year);
        assert_eq!(cast(&year, "1999").unwrap(), Value::Int(1999));
        assert!(cast(&year, "-5").is_err());
    }

    #[test]
    fn geopoints_in_every_format() {
        let expected = Value::Sequence(vec![Value::Float(90.0), Value::Float(45.0)]);
        let default = Field::new("p", LogicalType::Geopoint);
        assert_eq!(cast(&default, "90, 45").unwrap(), expected);
        assert_eq!(cast(&default, expected.clone()).unwrap(), expected);
        assert!(cast(&default, "190, 45").is_err());

        let array = default.clone().with_format("array");
        assert_eq!(cast(&array, "[90, 45]").unwrap(), expected);

        let object = default.clone().with_format("object");
        assert_eq!(cast(&object, r#"{"lon": 90, "lat": 45}"#).unwrap(), expected);
    }

    #[test]
    fn geojson_checks_type_member() {
        let field = Field::new("g", LogicalType::Geojson);
        let point = cast(&field, r#"{"type": "Point", "coordinates": [1, 2]}"#).unwrap();
        assert!(matches!(point, Value::Mapping(_)));
        assert!(cast(&field, r#"{"type": "Circle"}"#).is_err());
        let topo = field.clone().with_format("topojson");
        assert!(cast(&topo, r#"{"type": "Topology", "objects": {}}"#).is_ok());
    }

    #[test]
    fn string_formats_are_validated() {
        let email = Field::new("e", LogicalType::String).with_format("email");
        assert!(cast(&email, "someone@example.com").is_ok());
        assert!(cast(&email, "nobody").is_err());

        let uuid = Field::new("u", LogicalType::String).with_format("uuid");
        assert!(cast(&uuid, "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(cast(&uuid, "not-a-guid").is_err());

        let plain = Field::new("s", LogicalType::String);
        assert!(cast(&plain, 5).is_err());
    }

    #[test]
    fn constraints_are_enforced_after_casting() {
        let field = Field::new("score", LogicalType::Integer).with_constraints(Constraints {
            minimum: Some(serde_json::json!(0)),
            maximum: Some(serde_json::json!(10)),
            enum_values: Some(vec![serde_json::json!(1), serde_json::json!("5"), serde_json::json!(11)]),
            ..Constraints::default()
        });
        assert_eq!(cast(&field, "5").unwrap(), Value::Int(5));
        assert!(cast(&field, "2").is_err());
        assert!(cast(&field, "11").is_err());

        let code = Field::new("code", LogicalType::String).with_constraints(Constraints {
            pattern: Some("[A-Z]{3}".to_string()),
            max_length: Some(3),
            ..Constraints::default()
        });
        assert!(cast(&code, "ABC").is_ok());
        assert!(cast(&code, "ABCD").is_err());
        assert!(cast(&code, "abc").is_err());
    }

    #[test]
    fn structured_types_require_structured_values() {
        let array = Field::new("tags", LogicalType::Array);
        assert!(cast(&array, "[1, 2]").is_err());
        let object = Field::new("meta", LogicalType::Object);
        assert!(cast(&object, Value::Mapping(BTreeMap::new())).is_ok());
    }

    #[test]
    fn custom_missing_values_become_null() {
        let field = Field::new("n", LogicalType::Number);
        let missing = vec!["NA".to_string(), "-".to_string()];
        assert_eq!(cast_value(&field, &Value::from("NA"), &missing).unwrap(), Value::Null);
        assert!(cast_value(&field, &Value::from(""), &missing).is_err());
    }
}
