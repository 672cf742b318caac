//! Field-by-field decoding, used when no hook applies.
//!
//! Scalars convert weakly (`"42"` decodes into an integer field, `1` into a
//! bool), a lone value decodes into a one-element list, and an empty list or
//! map stands in for the other empty container. Null decodes to null, which
//! leaves the destination field at its default.

use std::collections::BTreeMap;

use chrono::DateTime;
use harvest_value::{duration, Shape, StructShape, Value};

use crate::{Error, KeyPath, Result, StructMap};

pub(crate) fn decode(sm: &StructMap, value: Value, shape: &Shape, path: &KeyPath) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    match shape {
        Shape::Any => Ok(value),
        Shape::Bool => to_bool(value, path),
        Shape::Integer => to_integer(value, path),
        Shape::Float => to_float(value, path),
        Shape::String => to_string(value, path),
        Shape::Duration => to_duration(value, path),
        Shape::Timestamp => match value {
            Value::Integer(secs) => DateTime::from_timestamp(secs, 0)
                .map(Value::Time)
                .ok_or_else(|| Error::convert(path, format!("timestamp {secs} out of range"))),
            other => Err(Error::invalid_type(path, "timestamp", &other)),
        },
        Shape::Attributes => Err(Error::invalid_type(path, "attributes map", &value)),
        Shape::Envelope => match value {
            Value::Map(_) => Err(Error::MissingTypeTag { path: path.clone() }),
            other => Err(Error::invalid_type(path, "typed payload", &other)),
        },
        Shape::List(item) => match value {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, v)| sm.decode(v, item, &path.index(i)))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            Value::Map(map) if map.is_empty() => Ok(Value::array()),
            single => Ok(Value::Array(vec![sm.decode(single, item, &path.index(0))?])),
        },
        Shape::Map(inner) => match value {
            Value::Map(map) => map
                .into_iter()
                .map(|(k, v)| {
                    let decoded = sm.decode(v, inner, &path.key(&k))?;
                    Ok((k, decoded))
                })
                .collect::<Result<BTreeMap<_, _>>>()
                .map(Value::Map),
            Value::Array(items) if items.is_empty() => Ok(Value::map()),
            other => Err(Error::invalid_type(path, "map", &other)),
        },
        Shape::Struct(schema) => match value {
            Value::Map(map) => decode_struct(sm, map, schema, path),
            Value::Array(items) if items.is_empty() => Ok(Value::map()),
            other => Err(Error::invalid_type(path, schema.name(), &other)),
        },
    }
}

fn decode_struct(
    sm: &StructMap,
    map: BTreeMap<String, Value>,
    schema: &StructShape,
    path: &KeyPath,
) -> Result<Value> {
    let unused: Vec<String> = map
        .keys()
        .filter(|key| schema.field(key).is_none())
        .cloned()
        .collect();
    if !unused.is_empty() {
        return Err(Error::UnusedKeys {
            path: path.clone(),
            keys: unused,
        });
    }

    let mut out = BTreeMap::new();
    for (key, value) in map {
        let Some(field) = schema.field(&key) else {
            continue;
        };
        let decoded = sm.decode(value, &field.shape(), &path.key(&key))?;
        if !decoded.is_null() {
            out.insert(key, decoded);
        }
    }
    Ok(Value::Map(out))
}

fn to_bool(value: Value, path: &KeyPath) -> Result<Value> {
    match value {
        Value::Bool(_) => Ok(value),
        Value::Integer(i) => Ok(Value::Bool(i != 0)),
        Value::Float(f) => Ok(Value::Bool(f != 0.0)),
        Value::String(s) => match s.as_str() {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(Value::Bool(true)),
            "" | "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(Value::Bool(false)),
            _ => Err(Error::convert(path, format!("cannot parse {s:?} as bool"))),
        },
        other => Err(Error::invalid_type(path, "bool", &other)),
    }
}

fn to_integer(value: Value, path: &KeyPath) -> Result<Value> {
    match value {
        Value::Integer(_) => Ok(value),
        Value::Float(f) => {
            if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                Ok(Value::Integer(f as i64))
            } else {
                Err(Error::convert(path, format!("cannot represent {f} as integer")))
            }
        }
        Value::Bool(b) => Ok(Value::Integer(b as i64)),
        Value::String(s) if s.is_empty() => Ok(Value::Integer(0)),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|e| Error::convert(path, format!("cannot parse {s:?} as integer: {e}"))),
        other => Err(Error::invalid_type(path, "integer", &other)),
    }
}

fn to_float(value: Value, path: &KeyPath) -> Result<Value> {
    match value {
        Value::Float(_) => Ok(value),
        Value::Integer(i) => Ok(Value::Float(i as f64)),
        Value::Bool(b) => Ok(Value::Float(if b { 1.0 } else { 0.0 })),
        Value::String(s) if s.is_empty() => Ok(Value::Float(0.0)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| Error::convert(path, format!("cannot parse {s:?} as float: {e}"))),
        other => Err(Error::invalid_type(path, "float", &other)),
    }
}

fn to_string(value: Value, path: &KeyPath) -> Result<Value> {
    match value {
        Value::String(_) => Ok(value),
        Value::Bool(b) => Ok(Value::from(if b { "1" } else { "0" })),
        Value::Integer(i) => Ok(Value::String(i.to_string())),
        Value::Float(f) => Ok(Value::String(f.to_string())),
        Value::Time(t) => Ok(Value::String(harvest_value::time::format_timestamp(&t))),
        Value::Bytes(bytes) => String::from_utf8(bytes)
            .map(Value::String)
            .map_err(|_| Error::convert(path, "bytes are not valid UTF-8")),
        other => Err(Error::invalid_type(path, "string", &other)),
    }
}

fn to_duration(value: Value, path: &KeyPath) -> Result<Value> {
    let parsed = match value {
        Value::String(s) => duration::parse(&s).map_err(|source| Error::Parse {
            path: path.clone(),
            source,
        })?,
        Value::Integer(nanos) => {
            let nanos = u64::try_from(nanos)
                .map_err(|_| Error::convert(path, "negative durations are not supported"))?;
            std::time::Duration::from_nanos(nanos)
        }
        other => return Err(Error::invalid_type(path, "duration", &other)),
    };
    Ok(Value::String(duration::format(parsed)))
}
