//! Conversions between [`Value`] and `serde_json::Value`.
//!
//! JSON has no byte strings or times: bytes are base64 encoded and times use
//! the canonical RFC 3339 form. Going back, both arrive as plain strings;
//! the marshaler turns them into typed fields using the destination shape.
//!
//! Numbers must survive the trip unchanged: NaN and infinities have no JSON
//! form, and JSON integers above `i64::MAX` have no `Value` form. Both are
//! errors rather than silent `null`s or rounded floats.

use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::time::format_timestamp;
use crate::{Error, Value};

const NOT_FINITE: &str = "has no JSON form";

/// Convert our Value to serde_json::Value.
pub fn value_to_json(value: Value) -> crate::Result<serde_json::Value> {
    Ok(match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(b),
        Value::Integer(i) => serde_json::Value::Number(i.into()),
        Value::Float(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .ok_or_else(|| Error::number(f, NOT_FINITE))?,
        Value::String(s) => serde_json::Value::String(s),
        Value::Bytes(b) => {
            serde_json::Value::String(base64::engine::general_purpose::STANDARD.encode(&b))
        }
        Value::Time(t) => serde_json::Value::String(format_timestamp(&t)),
        Value::Array(arr) => serde_json::Value::Array(
            arr.into_iter().map(value_to_json).collect::<crate::Result<_>>()?,
        ),
        Value::Map(map) => serde_json::Value::Object(
            map.into_iter()
                .map(|(k, v)| Ok((k, value_to_json(v)?)))
                .collect::<crate::Result<_>>()?,
        ),
    })
}

/// Convert serde_json::Value to our Value.
pub fn json_to_value(json: serde_json::Value) -> crate::Result<Value> {
    Ok(match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if n.is_u64() {
                return Err(Error::number(n, "is outside the 64-bit signed integer range"));
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => Value::Array(
            arr.into_iter().map(json_to_value).collect::<crate::Result<_>>()?,
        ),
        serde_json::Value::Object(map) => Value::Map(
            map.into_iter()
                .map(|(k, v)| Ok((k, json_to_value(v)?)))
                .collect::<crate::Result<_>>()?,
        ),
    })
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) if !f.is_finite() => {
                Err(serde::ser::Error::custom(Error::number(f, NOT_FINITE)))
            }
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Bytes(b) => {
                serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(b))
            }
            Value::Time(t) => serializer.serialize_str(&format_timestamp(t)),
            Value::Array(items) => serializer.collect_seq(items),
            Value::Map(map) => serializer.collect_map(map),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        json_to_value(json).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use collection_literals::btree;

    #[test]
    fn json_to_value_numbers() {
        let json = serde_json::json!({
            "integer": 42,
            "float": 2.5,
            "negative": -100
        });

        let value = json_to_value(json).unwrap();
        assert_eq!(value.get("integer"), Some(&Value::Integer(42)));
        assert_eq!(value.get("negative"), Some(&Value::Integer(-100)));
        assert_eq!(value.get("float"), Some(&Value::Float(2.5)));
    }

    #[test]
    fn bytes_and_times_become_strings() {
        let time = Utc.with_ymd_and_hms(2022, 6, 1, 8, 0, 0).unwrap();
        let value = Value::Map(btree! {
            "raw".to_string() => Value::Bytes(vec![0xff, 0x00]),
            "at".to_string() => Value::Time(time),
        });

        assert_eq!(
            value_to_json(value).unwrap(),
            serde_json::json!({"raw": "/wA=", "at": "2022-06-01T08:00:00Z"})
        );
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        let nested = Value::from(vec![Value::Float(1.5), Value::Float(f64::NAN)]);
        assert_eq!(
            value_to_json(nested.clone()).unwrap_err(),
            Error::UnrepresentableNumber {
                number: "NaN".to_string(),
                message: "has no JSON form",
            }
        );
        assert!(serde_json::to_string(&nested).is_err());
        assert!(value_to_json(Value::Float(f64::INFINITY)).is_err());
    }

    #[test]
    fn integers_beyond_i64_are_rejected() {
        let err = json_to_value(serde_json::json!({ "big": u64::MAX })).unwrap_err();
        assert_eq!(err.to_string(), "number 18446744073709551615 is outside the 64-bit signed integer range");
        assert!(serde_json::from_str::<Value>("[9223372036854775808]").is_err());
        assert_eq!(
            json_to_value(serde_json::json!(i64::MAX)).unwrap(),
            Value::Integer(i64::MAX)
        );
    }

    #[test]
    fn serde_impls_agree_with_json_bridge() {
        let value = Value::Map(btree! {
            "name".to_string() => Value::from("orders"),
            "tags".to_string() => Value::from(vec![1i64, 2]),
            "empty".to_string() => Value::Null,
        });

        let via_serde = serde_json::to_value(&value).unwrap();
        assert_eq!(via_serde, value_to_json(value.clone()).unwrap());

        let back: Value = serde_json::from_value(via_serde).unwrap();
        assert_eq!(back, value);
    }
}
