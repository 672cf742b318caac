//! Conversion between interpreter values and [`Value`].
//!
//! Tables whose keys are exactly `1..=n` become lists; every other table
//! becomes a map keyed by strings, with integer keys rendered in decimal.
//! An empty table converts to an empty map. Timestamps travel as
//! [`ScriptTime`] userdata.

use std::collections::BTreeMap;

use harvest_value::Value;
use mlua::{Lua, Table};

use crate::modules::times::ScriptTime;

/// Nesting beyond this depth is rejected rather than followed, which also
/// stops self-referencing tables.
pub(crate) const MAX_DEPTH: usize = 64;

pub(crate) fn value_to_lua(lua: &Lua, value: &Value) -> mlua::Result<mlua::Value> {
    Ok(match value {
        Value::Null => mlua::Value::Nil,
        Value::Bool(b) => mlua::Value::Boolean(*b),
        Value::Integer(i) => mlua::Value::Integer(*i),
        Value::Float(f) => mlua::Value::Number(*f),
        Value::String(s) => mlua::Value::String(lua.create_string(s)?),
        Value::Bytes(b) => mlua::Value::String(lua.create_string(b)?),
        Value::Time(t) => mlua::Value::UserData(lua.create_userdata(ScriptTime(*t))?),
        Value::Array(items) => {
            let table = lua.create_table_with_capacity(items.len(), 0)?;
            for (i, item) in items.iter().enumerate() {
                table.raw_set(i + 1, value_to_lua(lua, item)?)?;
            }
            mlua::Value::Table(table)
        }
        Value::Map(entries) => {
            let table = lua.create_table_with_capacity(0, entries.len())?;
            for (key, item) in entries {
                table.raw_set(key.as_str(), value_to_lua(lua, item)?)?;
            }
            mlua::Value::Table(table)
        }
    })
}

/// Convert an interpreter value. Errors are plain messages so callers can
/// attach the argument or global they came from.
pub(crate) fn lua_to_value(value: &mlua::Value) -> Result<Value, String> {
    to_value(value, 0)
}

fn to_value(value: &mlua::Value, depth: usize) -> Result<Value, String> {
    if depth > MAX_DEPTH {
        return Err(format!("value nested deeper than {MAX_DEPTH} levels"));
    }
    match value {
        mlua::Value::Nil => Ok(Value::Null),
        mlua::Value::Boolean(b) => Ok(Value::Bool(*b)),
        mlua::Value::Integer(i) => Ok(Value::Integer(*i)),
        mlua::Value::Number(f) => Ok(Value::Float(*f)),
        mlua::Value::String(s) => {
            let bytes = s.as_bytes().to_vec();
            Ok(match String::from_utf8(bytes) {
                Ok(text) => Value::String(text),
                Err(err) => Value::Bytes(err.into_bytes()),
            })
        }
        mlua::Value::Table(table) => table_to_value(table, depth),
        mlua::Value::UserData(data) => match data.borrow::<ScriptTime>() {
            Ok(time) => Ok(Value::Time(time.0)),
            Err(_) => Err("cannot convert userdata".to_string()),
        },
        other => Err(format!("cannot convert {}", other.type_name())),
    }
}

fn table_to_value(table: &Table, depth: usize) -> Result<Value, String> {
    let mut entries = Vec::new();
    for pair in table.clone().pairs::<mlua::Value, mlua::Value>() {
        entries.push(pair.map_err(|err| err.to_string())?);
    }

    let len = table.raw_len();
    let sequence = len > 0
        && entries.len() == len
        && entries
            .iter()
            .all(|(k, _)| matches!(k, mlua::Value::Integer(i) if *i >= 1 && *i as usize <= len));
    if sequence {
        let mut items = vec![Value::Null; len];
        for (key, item) in &entries {
            if let mlua::Value::Integer(i) = key {
                items[*i as usize - 1] = to_value(item, depth + 1)?;
            }
        }
        return Ok(Value::Array(items));
    }

    let mut map = BTreeMap::new();
    for (key, item) in &entries {
        let key = match key {
            mlua::Value::String(s) => s
                .to_str()
                .map_err(|_| "map keys must be valid UTF-8".to_string())?
                .to_string(),
            mlua::Value::Integer(i) => i.to_string(),
            other => return Err(format!("unsupported map key type {}", other.type_name())),
        };
        map.insert(key, to_value(item, depth + 1)?);
    }
    Ok(Value::Map(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use collection_literals::btree;

    fn round_trip(lua: &Lua, value: Value) -> Value {
        let converted = value_to_lua(lua, &value).unwrap();
        lua_to_value(&converted).unwrap()
    }

    #[test]
    fn nested_values_survive_the_interpreter() {
        let lua = Lua::new();
        let value = Value::Map(btree! {
            "name".to_string() => Value::from("orders"),
            "rows".to_string() => Value::Integer(12),
            "ratio".to_string() => Value::Float(0.5),
            "tags".to_string() => Value::from(vec!["a", "b"]),
            "seen".to_string() => Value::Time(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
            "blob".to_string() => Value::Bytes(vec![0xff, 0x00]),
        });
        assert_eq!(round_trip(&lua, value.clone()), value);
    }

    #[test]
    fn table_shapes() {
        let lua = Lua::new();
        let eval = |src: &str| lua_to_value(&lua.load(src).eval::<mlua::Value>().unwrap());

        assert_eq!(eval("return {}").unwrap(), Value::map());
        assert_eq!(eval("return {1, 2}").unwrap(), Value::from(vec![1i64, 2]));
        assert_eq!(
            eval("return {[1] = 'a', [3] = 'c'}").unwrap(),
            Value::Map(btree! {
                "1".to_string() => Value::from("a"),
                "3".to_string() => Value::from("c"),
            })
        );
        assert_eq!(
            eval("return {'a', k = true}").unwrap(),
            Value::Map(btree! {
                "1".to_string() => Value::from("a"),
                "k".to_string() => Value::Bool(true),
            })
        );
        assert_eq!(eval("return nil").unwrap(), Value::Null);
    }

    #[test]
    fn unsupported_values_are_rejected() {
        let lua = Lua::new();
        let eval = |src: &str| lua_to_value(&lua.load(src).eval::<mlua::Value>().unwrap());

        assert!(eval("return function() end").unwrap_err().contains("function"));
        assert!(eval("return {[true] = 1}").unwrap_err().contains("map key"));
        assert!(eval("local t = {}; t.self = t; return t")
            .unwrap_err()
            .contains("nested deeper"));
    }
}
