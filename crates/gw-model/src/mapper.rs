//! Point mapper (spec §4.3): format decode -> transform -> type cast.
//!
//! Deterministic and side-effect-free, as required by the spec: no clock
//! reads, no I/O, no shared state. The acquisition scheduler calls this
//! once per returned raw value, per tick.

use gw_errors::Result;

use crate::descriptor::PointType;
use crate::expression;
use crate::format::{self, FormatTag};
use crate::value::Value;

/// A raw reading coming out of a protocol adapter, before mapping.
#[derive(Debug, Clone)]
pub struct RawReading {
    pub value: Value,
    pub format: Option<FormatTag>,
    pub transform: Option<String>,
    pub declared_type: PointType,
}

/// Applies §4.3 steps 1-4 to a single raw reading and returns the mapped
/// value ready to go into the outbound `data` map.
pub fn map_reading(reading: &RawReading) -> Value {
    let decoded = decode_step(reading);
    let transformed = transform_step(decoded, reading.transform.as_deref());
    cast_step(transformed, reading.declared_type)
}

/// §4.3 step 1-2: width coercion then format decode.
fn decode_step(reading: &RawReading) -> Value {
    let Some(tag) = reading.format else {
        return reading.value.clone();
    };

    let bytes: Vec<u8> = match &reading.value {
        Value::Words(words) => coerce_words(words, tag),
        Value::UInt32(u) if matches!(tag, FormatTag::Float(_)) => u.to_be_bytes().to_vec(),
        Value::Bytes(b) => b.clone(),
        other => return other.clone(),
    };

    match format::decode(tag, &bytes) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("format decode failed: {e}");
            reading.value.clone()
        }
    }
}

/// Pads/widens a register-word vector to the byte width `tag` expects,
/// per §4.3 step 1: a lone word against a `Float *` format is zero-padded
/// (low-order word zero), wider vectors are packed with the format's
/// own word order.
fn coerce_words(words: &[u16], tag: FormatTag) -> Vec<u8> {
    let want_words = tag.word_width();
    if words.len() >= want_words {
        return format::words_to_be_bytes(&words[..want_words]);
    }
    // Single word against a 2-word (Float) format: zero-pad the low word.
    let mut padded = words.to_vec();
    padded.resize(want_words, 0);
    format::words_to_be_bytes(&padded)
}

/// §4.3 step 3: invoke the expression evaluator with `value` bound to the
/// decoded result. On failure, keep the pre-transform value (logged).
fn transform_step(value: Value, transform: Option<&str>) -> Value {
    let Some(expr) = transform.filter(|e| !e.is_empty()) else {
        return value;
    };
    let Some(bound) = value.as_f64() else {
        tracing::warn!("transform `{expr}` skipped: non-numeric input");
        return value;
    };
    match expression::evaluate_float(expr, bound) {
        Ok(f) => Value::Float64(f),
        Err(e) => {
            tracing::warn!("transform `{expr}` failed: {e}; keeping pre-transform value");
            value
        }
    }
}

/// §4.3 step 4: type cast to the declared point type.
fn cast_step(value: Value, declared: PointType) -> Value {
    match declared {
        PointType::Float => match value.as_f64() {
            Some(f) => Value::Float64((f * 100.0).round() / 100.0),
            None => value,
        },
        PointType::Int => match value.as_f64() {
            Some(f) => Value::Int64(f.round() as i64),
            None => value,
        },
        PointType::Bool | PointType::String => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::WordOrder4;

    fn reading(value: Value, format: Option<FormatTag>, transform: Option<&str>, ty: PointType) -> RawReading {
        RawReading {
            value,
            format,
            transform: transform.map(String::from),
            declared_type: ty,
        }
    }

    #[test]
    fn identity_transform_no_format_preserves_value() {
        // spec §8 round-trip: transform = "value * 1", no format.
        let r = reading(Value::Float64(42.0), None, Some("value * 1"), PointType::Float);
        let out = map_reading(&r);
        assert_eq!(out, Value::Float64(42.0));
    }

    #[test]
    fn float_cast_rounds_to_two_decimals() {
        let r = reading(Value::Float64(1.23456), None, None, PointType::Float);
        assert_eq!(map_reading(&r), Value::Float64(1.23));
    }

    #[test]
    fn int_cast_rounds_and_truncates() {
        let r = reading(Value::Float64(4.6), None, None, PointType::Int);
        assert_eq!(map_reading(&r), Value::Int64(5));
    }

    #[test]
    fn single_word_against_float_format_is_zero_padded() {
        let r = reading(
            Value::Words(vec![0x0000]),
            Some(FormatTag::Float(WordOrder4::AbCd)),
            None,
            PointType::Float,
        );
        let out = map_reading(&r);
        assert_eq!(out, Value::Float64(0.0));
    }

    #[test]
    fn transform_failure_keeps_pre_transform_value() {
        let r = reading(Value::Float64(5.0), None, Some("value +"), PointType::Float);
        let out = map_reading(&r);
        assert_eq!(out, Value::Float64(5.0));
    }

    #[test]
    fn bool_and_string_pass_through() {
        let r = reading(Value::Bool(true), None, None, PointType::Bool);
        assert_eq!(map_reading(&r), Value::Bool(true));
        let r = reading(Value::Str("x".into()), None, None, PointType::String);
        assert_eq!(map_reading(&r), Value::Str("x".into()));
    }
}
