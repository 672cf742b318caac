//! The decode-hook pipeline.
//!
//! Before a value is handed to the structural decoder, each hook is asked in
//! order whether it applies to the (destination shape, source value) pair.
//! The first one that does produces the normalized value; nested values are
//! decoded through the same pipeline again.

use harvest_assets::TYPE_TAG;
use harvest_value::time::parse_timestamp;
use harvest_value::{Shape, Value};

use crate::{Error, KeyPath, Result, StructMap};

pub type HookPredicate = fn(&Shape, &Value) -> bool;
pub type HookFn = fn(&StructMap, Value, &Shape, &KeyPath) -> Result<Value>;

/// One `(predicate, transform)` pair.
#[derive(Debug, Clone, Copy)]
pub struct DecodeHook {
    pub name: &'static str,
    pub applies: HookPredicate,
    pub transform: HookFn,
}

/// The standard chain, in evaluation order.
pub fn default_hooks() -> Vec<DecodeHook> {
    vec![
        DecodeHook {
            name: "string_to_timestamp",
            applies: |shape, value| {
                matches!(shape, Shape::Timestamp) && matches!(value, Value::String(_))
            },
            transform: string_to_timestamp,
        },
        DecodeHook {
            name: "time_to_timestamp",
            applies: |shape, value| {
                matches!(shape, Shape::Timestamp) && matches!(value, Value::Time(_))
            },
            transform: |_, value, _, _| Ok(value),
        },
        DecodeHook {
            name: "map_to_attributes",
            applies: |shape, value| {
                matches!(shape, Shape::Attributes) && matches!(value, Value::Map(_))
            },
            transform: |_, value, _, _| Ok(value),
        },
        DecodeHook {
            name: "map_to_envelope",
            applies: |shape, value| {
                matches!(shape, Shape::Envelope)
                    && value.as_map().is_some_and(|m| m.contains_key(TYPE_TAG))
            },
            transform: map_to_envelope,
        },
    ]
}

fn string_to_timestamp(_: &StructMap, value: Value, _: &Shape, path: &KeyPath) -> Result<Value> {
    let Value::String(text) = value else {
        return Err(Error::invalid_type(path, "timestamp", &value));
    };
    parse_timestamp(&text)
        .map(Value::Time)
        .map_err(|source| Error::Parse {
            path: path.clone(),
            source,
        })
}

fn map_to_envelope(sm: &StructMap, value: Value, _: &Shape, path: &KeyPath) -> Result<Value> {
    let Value::Map(mut fields) = value else {
        return Err(Error::invalid_type(path, "typed payload", &value));
    };

    let type_url = match fields.remove(TYPE_TAG) {
        Some(Value::String(url)) => url,
        Some(other) => return Err(Error::invalid_type(&path.key(TYPE_TAG), "string", &other)),
        None => return Err(Error::MissingTypeTag { path: path.clone() }),
    };
    let entry = sm
        .registry()
        .resolve(&type_url)
        .ok_or_else(|| Error::UnknownType {
            path: path.clone(),
            type_url: type_url.clone(),
        })?;

    let mut decoded = match sm.decode(Value::Map(fields), &entry.kind().shape(), path)? {
        Value::Map(decoded) => decoded,
        _ => Default::default(),
    };
    decoded.insert(TYPE_TAG.to_string(), Value::from(entry.type_url()));
    Ok(Value::Map(decoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use collection_literals::btree;

    #[test]
    fn hooks_run_in_declared_order() {
        let names: Vec<_> = default_hooks().iter().map(|h| h.name).collect();
        assert_eq!(
            names,
            ["string_to_timestamp", "time_to_timestamp", "map_to_attributes", "map_to_envelope"]
        );
    }

    #[test]
    fn timestamp_hooks_accept_text_and_native_times() {
        let sm = StructMap::default();
        let expected = Utc.with_ymd_and_hms(2020, 5, 17, 9, 0, 0).unwrap();

        let from_text = sm
            .decode(Value::from("2020-05-17T11:00:00+02:00"), &Shape::Timestamp, &KeyPath::root())
            .unwrap();
        assert_eq!(from_text, Value::Time(expected));

        let native = sm
            .decode(Value::Time(expected), &Shape::Timestamp, &KeyPath::root())
            .unwrap();
        assert_eq!(native, Value::Time(expected));
    }

    #[test]
    fn bad_timestamp_text_names_the_key() {
        let sm = StructMap::default();
        let err = sm
            .decode(Value::from("yesterday"), &Shape::Timestamp, &KeyPath::root().key("create_time"))
            .unwrap_err();
        assert!(matches!(&err, Error::Parse { path, .. } if path.to_string() == "create_time"));
    }

    #[test]
    fn envelope_restores_canonical_tag() {
        let sm = StructMap::default();
        let value = Value::Map(btree! {
            "@type".to_string() => Value::from("type.googleapis.com/harvest.assets.v1.User"),
            "email".to_string() => Value::from("ada@example.com"),
        });

        let decoded = sm.decode(value.clone(), &Shape::Envelope, &KeyPath::root()).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn envelope_with_unknown_tag_fails() {
        let sm = StructMap::default();
        let value = Value::Map(btree! {
            "@type".to_string() => Value::from("type.googleapis.com/harvest.assets.v1.Nope"),
        });

        let err = sm
            .decode(value, &Shape::Envelope, &KeyPath::root().key("data"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "data: unknown type \"type.googleapis.com/harvest.assets.v1.Nope\""
        );
    }
}
