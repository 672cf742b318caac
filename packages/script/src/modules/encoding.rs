//! `json`, `base64` and `hex`.

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use harvest_value::json_to_value;
use mlua::{Lua, Table};

use crate::convert::{lua_to_value, value_to_lua};

fn runtime(message: String) -> mlua::Error {
    mlua::Error::RuntimeError(message)
}

pub(crate) fn json(lua: &Lua) -> mlua::Result<Table> {
    let m = lua.create_table()?;
    m.set(
        "encode",
        lua.create_function(|_, value: mlua::Value| {
            let value = lua_to_value(&value).map_err(|err| runtime(format!("json.encode: {err}")))?;
            serde_json::to_string(&value).map_err(|err| runtime(format!("json.encode: {err}")))
        })?,
    )?;
    m.set(
        "decode",
        lua.create_function(|lua, text: mlua::String| {
            let json: serde_json::Value = serde_json::from_slice(&text.as_bytes())
                .map_err(|err| runtime(format!("json.decode: {err}")))?;
            let value = json_to_value(json).map_err(|err| runtime(format!("json.decode: {err}")))?;
            value_to_lua(lua, &value)
        })?,
    )?;
    Ok(m)
}

pub(crate) fn base64(lua: &Lua) -> mlua::Result<Table> {
    let m = lua.create_table()?;
    m.set(
        "encode",
        lua.create_function(|_, data: mlua::String| Ok(STANDARD.encode(&*data.as_bytes())))?,
    )?;
    m.set(
        "decode",
        lua.create_function(|lua, text: String| {
            let bytes = STANDARD
                .decode(text)
                .map_err(|err| runtime(format!("base64.decode: {err}")))?;
            lua.create_string(bytes)
        })?,
    )?;
    m.set(
        "url_encode",
        lua.create_function(|_, data: mlua::String| Ok(URL_SAFE.encode(&*data.as_bytes())))?,
    )?;
    m.set(
        "url_decode",
        lua.create_function(|lua, text: String| {
            let bytes = URL_SAFE
                .decode(text)
                .map_err(|err| runtime(format!("base64.url_decode: {err}")))?;
            lua.create_string(bytes)
        })?,
    )?;
    Ok(m)
}

pub(crate) fn hex(lua: &Lua) -> mlua::Result<Table> {
    let m = lua.create_table()?;
    m.set(
        "encode",
        lua.create_function(|_, data: mlua::String| Ok(hex::encode(&*data.as_bytes())))?,
    )?;
    m.set(
        "decode",
        lua.create_function(|lua, text: String| {
            let bytes = hex::decode(text).map_err(|err| runtime(format!("hex.decode: {err}")))?;
            lua.create_string(bytes)
        })?,
    )?;
    Ok(m)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lua() -> Lua {
        let lua = Lua::new();
        for (name, module) in [
            ("json", json(&lua).unwrap()),
            ("base64", base64(&lua).unwrap()),
            ("hex", hex(&lua).unwrap()),
        ] {
            lua.globals().set(name, module).unwrap();
        }
        lua
    }

    #[test]
    fn json_encodes_tables() {
        let lua = lua();
        let out: String = lua
            .load(r#"return json.encode({name = "orders", cols = {"a", "b"}})"#)
            .eval()
            .unwrap();
        assert_eq!(out, r#"{"cols":["a","b"],"name":"orders"}"#);

        let name: String = lua
            .load(r#"return json.decode('{"name": "x", "n": [1, 2]}').name"#)
            .eval()
            .unwrap();
        assert_eq!(name, "x");
        assert!(lua.load(r#"json.decode("{")"#).exec().is_err());
    }

    #[test]
    fn binary_encodings() {
        let lua = lua();
        let (b64, url, hexed, back): (String, String, String, String) = lua
            .load(r#"
                return base64.encode("hi?>"), base64.url_encode("hi?>"), hex.encode("hi"),
                    base64.decode(base64.encode("round")) .. hex.decode("2121")
            "#)
            .eval()
            .unwrap();
        assert_eq!(b64, "aGk/Pg==");
        assert_eq!(url, "aGk_Pg==");
        assert_eq!(hexed, "6869");
        assert_eq!(back, "round!!");
        assert!(lua.load(r#"hex.decode("zz")"#).exec().is_err());
    }
}
