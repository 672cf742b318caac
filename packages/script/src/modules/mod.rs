//! Modules a script may `import`.
//!
//! Only names in [`ALLOWED`] resolve; anything touching the filesystem,
//! processes or the network is absent. Each import builds a fresh table,
//! so scripts cannot leak state into one another through a shared module.

use mlua::{Lua, Table, Variadic};

use crate::{ScriptLimits, DEFAULT_MAX_MEMORY};

pub(crate) mod encoding;
pub(crate) mod enumerate;
pub(crate) mod rand;
pub(crate) mod text;
pub(crate) mod times;

pub(crate) const ALLOWED: &[&str] = &[
    "math", "text", "times", "rand", "fmt", "json", "base64", "hex", "enum",
];

pub(crate) fn is_allowed(name: &str) -> bool {
    ALLOWED.contains(&name)
}

/// Build module `name` inside `lua`.
pub(crate) fn load(lua: &Lua, name: &str) -> mlua::Result<Table> {
    match name {
        "math" => lua.globals().get("math"),
        "text" => text::module(lua),
        "times" => times::module(lua),
        "rand" => rand::module(lua),
        "fmt" => fmt(lua),
        "json" => encoding::json(lua),
        "base64" => encoding::base64(lua),
        "hex" => encoding::hex(lua),
        "enum" => enumerate::module(lua),
        other => Err(mlua::Error::RuntimeError(format!("module '{other}' not found"))),
    }
}

fn fmt(lua: &Lua) -> mlua::Result<Table> {
    let string: Table = lua.globals().get("string")?;
    let module = lua.create_table()?;
    module.set("sprintf", string.get::<mlua::Function>("format")?)?;
    module.set("println", lua.create_function(log_line)?)?;
    Ok(module)
}

/// Fail before building a host-side string of `len` bytes that the
/// interpreter heap could not hold. `None` means the length overflowed.
pub(crate) fn reserve(lua: &Lua, len: Option<usize>) -> mlua::Result<()> {
    let limit = lua
        .app_data_ref::<ScriptLimits>()
        .map_or(DEFAULT_MAX_MEMORY, |limits| limits.max_memory);
    match len {
        Some(len) if len <= limit.saturating_sub(lua.used_memory()) => Ok(()),
        _ => Err(mlua::Error::MemoryError(format!(
            "string result exceeds the {limit} byte memory limit"
        ))),
    }
}

/// Script output goes to the log, never to stdout.
pub(crate) fn log_line(_: &Lua, args: Variadic<mlua::Value>) -> mlua::Result<()> {
    let mut line = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            line.push('\t');
        }
        line.push_str(&arg.to_string()?);
    }
    tracing::info!(target: "harvest_script", "{line}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_allowed_modules_load() {
        let lua = Lua::new();
        for name in ALLOWED {
            assert!(is_allowed(name));
            load(&lua, name).unwrap();
        }
        assert!(!is_allowed("os"));
        assert!(load(&lua, "os").is_err());
    }

    #[test]
    fn fmt_sprintf_formats() {
        let lua = Lua::new();
        lua.globals().set("fmt", load(&lua, "fmt").unwrap()).unwrap();
        let out: String = lua.load(r#"return fmt.sprintf("%s-%d", "a", 7)"#).eval().unwrap();
        assert_eq!(out, "a-7");
        lua.load(r#"fmt.println("logged", 1)"#).exec().unwrap();
    }
}
