//! Coercion and constraint engine
//!
//! Converts a resolved value to its declared type, then checks numeric bounds,
//! string length, pattern and enum membership, in that fixed order. The first
//! violated check is reported.

use crate::error::{InvalidParameter, InvalidReason};
use crate::schema::{display_value, literal_eq, ParameterSchema, SchemaType};
use crate::source::ParamSource;
use regex::Regex;
use serde_json::{Number, Value};

const BOOLEAN_LITERALS: [&str; 8] = ["0", "1", "true", "false", "True", "False", "TRUE", "FALSE"];
const TRUTHY_LITERALS: [&str; 4] = ["1", "true", "True", "TRUE"];

/// Coerce and constrain `value` against `schema`.
///
/// `pattern` is the compiled form of `schema.pattern`, built once when the
/// guard is constructed.
pub fn apply(
    field: &str,
    source: &ParamSource,
    value: Value,
    schema: &ParameterSchema,
    pattern: Option<&Regex>,
) -> Result<Value, InvalidParameter> {
    let fail = |reason| InvalidParameter::new(field, source.clone(), reason);

    let value = match &schema.schema_type {
        Some(ty) => coerce(value, ty).map_err(fail)?,
        None => value,
    };

    check_constraints(&value, schema, pattern).map_err(fail)?;
    Ok(value)
}

/// Convert `value` to `ty`. Only strings are coerced to integer, number or
/// boolean; any value is coerced to string.
pub fn coerce(value: Value, ty: &SchemaType) -> Result<Value, InvalidReason> {
    let raw = match (ty, value) {
        (SchemaType::String, Value::String(s)) => return Ok(Value::String(s)),
        (SchemaType::String, other) => return Ok(Value::String(display_value(&other))),
        (SchemaType::Integer | SchemaType::Number | SchemaType::Boolean, Value::String(raw)) => raw,
        (_, other) => return Ok(other),
    };

    match ty {
        SchemaType::Integer => parse_integer(&raw)
            .map(Value::Number)
            .ok_or(InvalidReason::TypeMismatch("integer")),
        SchemaType::Number => parse_number(&raw)
            .map(Value::Number)
            .ok_or(InvalidReason::TypeMismatch("number")),
        _ => parse_boolean(&raw)
            .map(Value::Bool)
            .ok_or(InvalidReason::TypeMismatch("boolean")),
    }
}

/// Whole-string numeric conversion. Empty text is zero, `0x`/`0o`/`0b`
/// prefixes select a radix and fractional values are kept as floats.
fn parse_integer(raw: &str) -> Option<Number> {
    let raw = trim_numeric(raw);
    if raw.is_empty() {
        return Some(Number::from(0));
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Some(Number::from(n));
    }

    let f = match radix_literal(raw) {
        Some(parsed) => parsed?,
        None if decimal_prefix(raw) == raw.len() => raw.parse::<f64>().ok()?,
        None => return None,
    };
    to_number(f)
}

/// Leading-prefix float conversion: `"10px"` reads as `10`.
fn parse_number(raw: &str) -> Option<Number> {
    let raw = trim_numeric(raw);
    let len = decimal_prefix(raw);
    if len == 0 {
        return None;
    }
    raw[..len].parse::<f64>().ok().and_then(Number::from_f64)
}

fn trim_numeric(raw: &str) -> &str {
    raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// `None` when `raw` has no radix prefix, `Some(None)` when the digits after
/// the prefix are invalid.
fn radix_literal(raw: &str) -> Option<Option<f64>> {
    let prefix = raw.get(..2)?.to_ascii_lowercase();
    let radix = match prefix.as_str() {
        "0x" => 16,
        "0o" => 8,
        "0b" => 2,
        _ => return None,
    };

    let digits = &raw[2..];
    if digits.is_empty() {
        return Some(None);
    }
    Some(digits.chars().try_fold(0f64, |acc, c| {
        c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
    }))
}

/// Length of the longest decimal literal at the start of `raw`: an optional
/// sign, digits with an optional fraction, then an optional exponent.
fn decimal_prefix(raw: &str) -> usize {
    let bytes = raw.as_bytes();
    let digits_from = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    let mut i = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(i);
    let mut seen_digits = int_end > i;
    i = int_end;

    if bytes.get(i) == Some(&b'.') {
        let frac_end = digits_from(i + 1);
        if seen_digits || frac_end > i + 1 {
            seen_digits |= frac_end > i + 1;
            i = frac_end;
        }
    }
    if !seen_digits {
        return 0;
    }

    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_end = digits_from(j);
        if exp_end > j {
            i = exp_end;
        }
    }
    i
}

/// Integral values inside the `i64` range stay integers; `2^63` and beyond
/// are kept as floats rather than saturated. Infinities have no JSON form.
fn to_number(f: f64) -> Option<Number> {
    const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

    if f.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&f) {
        Some(Number::from(f as i64))
    } else {
        Number::from_f64(f)
    }
}

fn parse_boolean(raw: &str) -> Option<bool> {
    if BOOLEAN_LITERALS.contains(&raw) {
        Some(TRUTHY_LITERALS.contains(&raw))
    } else {
        None
    }
}

fn check_constraints(
    value: &Value,
    schema: &ParameterSchema,
    pattern: Option<&Regex>,
) -> Result<(), InvalidReason> {
    if let Some(n) = value.as_f64() {
        check_bound(n, &schema.minimum, |n, b| n >= b, InvalidReason::Minimum)?;
        check_bound(n, &schema.maximum, |n, b| n <= b, InvalidReason::Maximum)?;
        check_bound(n, &schema.exclusive_minimum, |n, b| n > b, InvalidReason::ExclusiveMinimum)?;
        check_bound(n, &schema.exclusive_maximum, |n, b| n < b, InvalidReason::ExclusiveMaximum)?;
    }

    if let Value::String(s) = value {
        let len = s.chars().count() as u64;
        if let Some(min) = schema.min_length.filter(|min| len < *min) {
            return Err(InvalidReason::MinLength(min));
        }
        if let Some(max) = schema.max_length.filter(|max| len > *max) {
            return Err(InvalidReason::MaxLength(max));
        }
        if let Some(re) = pattern.filter(|re| !re.is_match(s)) {
            return Err(InvalidReason::Pattern(re.as_str().to_string()));
        }
    }

    if let Some(allowed) = &schema.allowed {
        if !allowed.iter().any(|candidate| literal_eq(candidate, value)) {
            return Err(InvalidReason::NotInEnum(
                allowed.iter().map(display_value).collect(),
            ));
        }
    }

    Ok(())
}

fn check_bound(
    n: f64,
    bound: &Option<Number>,
    holds: impl Fn(f64, f64) -> bool,
    reason: impl Fn(Number) -> InvalidReason,
) -> Result<(), InvalidReason> {
    match bound {
        Some(b) => match b.as_f64() {
            Some(limit) if !holds(n, limit) => Err(reason(b.clone())),
            _ => Ok(()),
        },
        None => Ok(()),
    }
}
