use crate::format::Event;
use crate::types::ScalarType;
use crate::value::Value;

/// Why a leaf value was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafError {
    /// A description of the problem.
    pub reason: String,
}

impl LeafError {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Decodes a scalar of type `scalar` from the scalar event `event` whose
/// text is `text`.
///
/// Numbers may also be supplied as strings, and floating point targets accept
/// the strings `NaN`, `Infinity` and `-Infinity`.
pub fn parse_scalar(scalar: ScalarType, event: Event, text: &str) -> Result<Value, LeafError> {
    match scalar {
        ScalarType::String => Ok(Value::String(match event {
            Event::True => String::from("true"),
            Event::False => String::from("false"),
            _ => text.to_string(),
        })),
        ScalarType::Char => {
            let mut chars = text.chars();
            match (event, chars.next(), chars.next()) {
                (Event::String, Some(ch), None) => Ok(Value::Char(ch)),
                (Event::String, _, _) => Err(LeafError::new("expected a single character")),
                _ => Err(LeafError::new("expected a string")),
            }
        }
        ScalarType::Bool => match event {
            Event::True => Ok(Value::Bool(true)),
            Event::False => Ok(Value::Bool(false)),
            Event::String => text
                .parse::<bool>()
                .map(Value::Bool)
                .map_err(|_| LeafError::new("expected `true` or `false`")),
            _ => Err(LeafError::new("expected a boolean")),
        },
        ScalarType::I8 => signed(event, text, i8::MIN.into(), i8::MAX.into()),
        ScalarType::I16 => signed(event, text, i16::MIN.into(), i16::MAX.into()),
        ScalarType::I32 => signed(event, text, i32::MIN.into(), i32::MAX.into()),
        ScalarType::I64 => signed(event, text, i64::MIN.into(), i64::MAX.into()),
        ScalarType::U8 => unsigned(event, text, u8::MAX.into()),
        ScalarType::U16 => unsigned(event, text, u16::MAX.into()),
        ScalarType::U32 => unsigned(event, text, u32::MAX.into()),
        ScalarType::U64 => unsigned(event, text, u64::MAX.into()),
        ScalarType::F32 => {
            let value = float(event, text)?;
            #[allow(clippy::cast_possible_truncation)]
            let narrowed = value as f32;
            if narrowed.is_infinite() && value.is_finite() {
                Err(LeafError::new("out of range for f32"))
            } else {
                Ok(Value::Float(narrowed.into()))
            }
        }
        ScalarType::F64 => float(event, text).map(Value::Float),
    }
}

fn numeric_text(event: Event, text: &str) -> Result<&str, LeafError> {
    match event {
        Event::Number => Ok(text),
        Event::String => Ok(text.trim()),
        _ => Err(LeafError::new("expected a number")),
    }
}

/// Parses an integer, accepting decimal and exponent forms whose value is
/// integral, such as `1.0` or `2e3`.
fn integer(event: Event, text: &str) -> Result<i128, LeafError> {
    let text = numeric_text(event, text)?;
    if let Ok(value) = text.parse::<i128>() {
        return Ok(value);
    }
    match text.parse::<f64>() {
        #[allow(clippy::cast_possible_truncation)]
        Ok(value) if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e38 => {
            Ok(value as i128)
        }
        Ok(_) => Err(LeafError::new("not an integer")),
        Err(_) => Err(LeafError::new("not a number")),
    }
}

fn signed(event: Event, text: &str, min: i128, max: i128) -> Result<Value, LeafError> {
    let value = integer(event, text)?;
    if (min..=max).contains(&value) {
        i64::try_from(value)
            .map(Value::Integer)
            .map_err(|_| LeafError::new("out of range"))
    } else {
        Err(LeafError::new(format!("out of range {min}..={max}")))
    }
}

fn unsigned(event: Event, text: &str, max: i128) -> Result<Value, LeafError> {
    let value = integer(event, text)?;
    if (0..=max).contains(&value) {
        u64::try_from(value)
            .map(Value::Unsigned)
            .map_err(|_| LeafError::new("out of range"))
    } else {
        Err(LeafError::new(format!("out of range 0..={max}")))
    }
}

fn float(event: Event, text: &str) -> Result<f64, LeafError> {
    let text = numeric_text(event, text)?;
    match (event, text) {
        (Event::String, "NaN") => Ok(f64::NAN),
        (Event::String, "Infinity") => Ok(f64::INFINITY),
        (Event::String, "-Infinity") => Ok(f64::NEG_INFINITY),
        _ => match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            Ok(_) => Err(LeafError::new("out of range")),
            Err(_) => Err(LeafError::new("not a number")),
        },
    }
}

/// Decodes an untyped JSON number, preferring the narrowest exact
/// representation.
#[must_use]
pub fn number_value(text: &str) -> Value {
    if let Ok(value) = text.parse::<i64>() {
        Value::Integer(value)
    } else if let Ok(value) = text.parse::<u64>() {
        Value::Unsigned(value)
    } else {
        Value::Float(text.parse::<f64>().unwrap_or(f64::NAN))
    }
}
