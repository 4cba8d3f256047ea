//! Conversion of raw cell strings into typed values.
//!
//! Values are produced in their serde representation so that any
//! `Deserialize` record type can be built from them afterwards. Dates are
//! stored as ISO strings, which is what chrono's serde impls expect.

use crate::core::{BoxError, DataType, Field, FieldError};
use chrono::NaiveDateTime;
use chrono::format::{Parsed, StrftimeItems};
use serde_json::{Number, Value};

pub const TRUE_VALUES: [&str; 6] = ["true", "yes", "t", "y", "on", "1"];
pub const FALSE_VALUES: [&str; 6] = ["false", "no", "f", "n", "off", "0"];

pub const ISO_DATE: &str = "%Y-%m-%d";
pub const ISO_DATETIME: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Options resolved for the field being coerced.
#[derive(Debug, Clone, Copy)]
pub struct FieldContext<'a> {
    pub field: &'a Field,
    pub date_format: Option<&'a str>,
    pub accept_whitespaces: bool,
}

impl<'a> FieldContext<'a> {
    pub fn new(field: &'a Field) -> Self {
        Self {
            field,
            date_format: None,
            accept_whitespaces: false,
        }
    }

    pub fn with_date_format(mut self, date_format: Option<&'a str>) -> Self {
        self.date_format = date_format;
        self
    }

    pub fn with_accept_whitespaces(mut self, accept: bool) -> Self {
        self.accept_whitespaces = accept;
        self
    }

    fn name(&self) -> String {
        self.field.name.clone()
    }
}

/// Coerces `value` into `target`.
///
/// Strings are parsed; any other value (typically a propagated default) is
/// already typed and passes through unchanged.
pub fn coerce(target: &DataType, value: &Value, ctx: &FieldContext<'_>) -> Result<Value, FieldError> {
    let raw = match value {
        Value::String(raw) => raw.as_str(),
        other => return Ok(other.clone()),
    };

    match target {
        DataType::Optional(inner) => {
            if raw.is_empty() {
                Ok(ctx.field.default.as_ref().map_or(Value::Null, |d| d.value()))
            } else {
                coerce(inner, value, ctx)
            }
        }
        DataType::String => {
            if !raw.is_empty() && raw.trim().is_empty() && !ctx.accept_whitespaces {
                return Err(FieldError::Whitespace { field: ctx.name() });
            }
            Ok(value.clone())
        }
        DataType::Integer => raw
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|e| coercion_error(target, raw, ctx, e.into())),
        DataType::Float => {
            let parsed = raw
                .trim()
                .parse::<f64>()
                .map_err(|e| coercion_error(target, raw, ctx, e.into()))?;
            Number::from_f64(parsed)
                .map(Value::Number)
                .ok_or_else(|| coercion_error(target, raw, ctx, "not a finite number".into()))
        }
        DataType::Boolean => parse_bool(raw)
            .map(Value::Bool)
            .ok_or_else(|| FieldError::InvalidBoolean {
                field: ctx.name(),
                value: raw.to_string(),
            }),
        DataType::Date | DataType::DateTime => {
            let format = ctx.date_format.ok_or_else(|| FieldError::DateFormatNotSpecified {
                field: ctx.name(),
                declared: target.to_string(),
            })?;
            let parsed = parse_datetime(raw, format).map_err(|source| FieldError::Date {
                field: ctx.name(),
                value: raw.to_string(),
                format: format.to_string(),
                source,
            })?;
            if matches!(target, DataType::Date) {
                Ok(Value::String(parsed.date().format(ISO_DATE).to_string()))
            } else {
                Ok(Value::String(parsed.format(ISO_DATETIME).to_string()))
            }
        }
        DataType::Custom(constructor) => constructor
            .construct(raw)
            .map_err(|e| coercion_error(target, raw, ctx, e)),
    }
}

/// Looks `raw` up in the boolean lexicon, ignoring case and surrounding whitespace.
pub fn parse_bool(raw: &str) -> Option<bool> {
    let token = raw.trim().to_lowercase();
    if TRUE_VALUES.contains(&token.as_str()) {
        Some(true)
    } else if FALSE_VALUES.contains(&token.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// Parses with `format`. Parts the format leaves out default to
/// 1900-01-01 00:00:00, so `%m/%Y` or `%H:%M` are usable formats.
pub fn parse_datetime(raw: &str, format: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let mut parsed = Parsed::new();
    chrono::format::parse(&mut parsed, raw, StrftimeItems::new(format))?;
    fill_missing(&mut parsed)?;
    parsed.to_naive_datetime_with_offset(0)
}

fn fill_missing(parsed: &mut Parsed) -> chrono::format::ParseResult<()> {
    if parsed.timestamp().is_some() {
        return Ok(());
    }
    let has_year = parsed.year().is_some()
        || parsed.year_div_100().is_some()
        || parsed.year_mod_100().is_some()
        || parsed.isoyear().is_some()
        || parsed.isoyear_div_100().is_some()
        || parsed.isoyear_mod_100().is_some();
    if !has_year {
        parsed.set_year(1900)?;
    }

    let week_based = parsed.ordinal().is_some()
        || parsed.isoweek().is_some()
        || parsed.week_from_sun().is_some()
        || parsed.week_from_mon().is_some();
    if !week_based {
        if parsed.month().is_none() {
            parsed.set_month(1)?;
        }
        if parsed.day().is_none() {
            parsed.set_day(1)?;
        }
    }

    match (parsed.hour_div_12(), parsed.hour_mod_12()) {
        (None, None) => parsed.set_hour(0)?,
        // 12-hour clock without %p reads as AM.
        (None, Some(_)) => parsed.set_ampm(false)?,
        _ => {}
    }
    if parsed.minute().is_none() {
        parsed.set_minute(0)?;
    }
    Ok(())
}

fn coercion_error(target: &DataType, raw: &str, ctx: &FieldContext<'_>, source: BoxError) -> FieldError {
    FieldError::Coercion {
        field: ctx.name(),
        declared: target.to_string(),
        found: format!("string (\"{}\")", raw),
        source,
    }
}
