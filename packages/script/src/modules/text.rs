//! `text`: string helpers and regular expressions.

use mlua::{Lua, Table};
use regex::Regex;

use super::reserve;

fn compile(pattern: &str) -> mlua::Result<Regex> {
    Regex::new(pattern).map_err(|err| mlua::Error::RuntimeError(format!("invalid pattern: {err}")))
}

pub(crate) fn module(lua: &Lua) -> mlua::Result<Table> {
    let m = lua.create_table()?;

    m.set(
        "contains",
        lua.create_function(|_, (s, sub): (String, String)| Ok(s.contains(&sub)))?,
    )?;
    m.set(
        "has_prefix",
        lua.create_function(|_, (s, prefix): (String, String)| Ok(s.starts_with(&prefix)))?,
    )?;
    m.set(
        "has_suffix",
        lua.create_function(|_, (s, suffix): (String, String)| Ok(s.ends_with(&suffix)))?,
    )?;
    // 1-based byte offset, matching string.find.
    m.set(
        "index",
        lua.create_function(|_, (s, sub): (String, String)| Ok(s.find(&sub).map(|i| i + 1)))?,
    )?;
    m.set(
        "split",
        lua.create_function(|_, (s, sep): (String, String)| {
            Ok(s.split(sep.as_str()).map(str::to_string).collect::<Vec<_>>())
        })?,
    )?;
    m.set(
        "join",
        lua.create_function(|_, (parts, sep): (Vec<String>, String)| Ok(parts.join(&sep)))?,
    )?;
    m.set(
        "trim",
        lua.create_function(|_, s: String| Ok(s.trim().to_string()))?,
    )?;
    m.set(
        "to_upper",
        lua.create_function(|_, s: String| Ok(s.to_uppercase()))?,
    )?;
    m.set(
        "to_lower",
        lua.create_function(|_, s: String| Ok(s.to_lowercase()))?,
    )?;
    m.set(
        "replace",
        lua.create_function(
            |lua, (s, old, new, n): (String, String, String, Option<i64>)| {
                let limit = match n {
                    Some(n) if n >= 0 => n as usize,
                    _ => usize::MAX,
                };
                let hits = if old.is_empty() {
                    s.chars().count() + 1
                } else {
                    s.matches(old.as_str()).count()
                }
                .min(limit);
                let len = hits
                    .checked_mul(new.len())
                    .and_then(|added| (s.len() - hits * old.len()).checked_add(added));
                reserve(lua, len)?;
                Ok(s.replacen(&old, &new, limit))
            },
        )?,
    )?;
    m.set(
        "repeat_str",
        lua.create_function(|lua, (s, n): (String, i64)| {
            let count = usize::try_from(n).unwrap_or(0);
            reserve(lua, s.len().checked_mul(count))?;
            Ok(s.repeat(count))
        })?,
    )?;

    m.set(
        "re_match",
        lua.create_function(|_, (pattern, s): (String, String)| Ok(compile(&pattern)?.is_match(&s)))?,
    )?;
    m.set(
        "re_find",
        lua.create_function(|_, (pattern, s, n): (String, String, Option<usize>)| {
            let re = compile(&pattern)?;
            let found = re.find_iter(&s).map(|m| m.as_str().to_string());
            Ok(match n {
                Some(n) => found.take(n).collect::<Vec<_>>(),
                None => found.collect(),
            })
        })?,
    )?;
    m.set(
        "re_replace",
        lua.create_function(|lua, (pattern, s, replacement): (String, String, String)| {
            let re = compile(&pattern)?;
            let refs = replacement.matches('$').count();
            let mut out = String::new();
            let mut last = 0;
            for caps in re.captures_iter(&s) {
                let Some(found) = caps.get(0) else { continue };
                let grow = refs
                    .checked_mul(s.len())
                    .and_then(|n| n.checked_add(replacement.len() + found.start() - last));
                reserve(lua, grow.and_then(|n| n.checked_add(out.len())))?;
                out.push_str(&s[last..found.start()]);
                caps.expand(&replacement, &mut out);
                last = found.end();
            }
            out.push_str(&s[last..]);
            Ok(out)
        })?,
    )?;

    Ok(m)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval<R: mlua::FromLua>(src: &str) -> mlua::Result<R> {
        let lua = Lua::new();
        lua.globals().set("text", module(&lua)?)?;
        lua.load(src).eval()
    }

    #[test]
    fn string_helpers() {
        assert!(eval::<bool>(r#"return text.contains("orders_raw", "raw")"#).unwrap());
        assert!(eval::<bool>(r#"return text.has_prefix("urn:bq:x", "urn:")"#).unwrap());
        assert_eq!(eval::<Option<i64>>(r#"return text.index("abc", "c")"#).unwrap(), Some(3));
        assert_eq!(eval::<Option<i64>>(r#"return text.index("abc", "z")"#).unwrap(), None);
        assert_eq!(
            eval::<String>(r#"return text.join(text.split("a,b,c", ","), "|")"#).unwrap(),
            "a|b|c"
        );
        assert_eq!(
            eval::<String>(r#"return text.replace("aaa", "a", "b", 2)"#).unwrap(),
            "bba"
        );
        assert_eq!(eval::<String>(r#"return text.to_upper(text.trim("  x "))"#).unwrap(), "X");
        assert_eq!(eval::<String>(r#"return text.repeat_str("ab", 3)"#).unwrap(), "ababab");
        assert_eq!(eval::<String>(r#"return text.repeat_str("ab", -1)"#).unwrap(), "");
    }

    #[test]
    fn oversized_results_fail_before_allocating() {
        for src in [
            "return text.repeat_str('ab', 0x4000000000000000)",
            "return text.repeat_str('x', 256 * 1024 * 1024)",
            "return text.replace(string.rep('a', 4096), '', string.rep('b', 16384))",
        ] {
            let err = eval::<String>(src).unwrap_err();
            assert!(err.to_string().contains("memory limit"), "{src}: {err}");
        }
    }

    #[test]
    fn regular_expressions() {
        assert!(eval::<bool>(r#"return text.re_match("^[a-z]+_\\d+$", "t_12")"#).unwrap());
        assert_eq!(
            eval::<Vec<String>>(r#"return text.re_find("\\d+", "a1b22c333", 2)"#).unwrap(),
            vec!["1", "22"]
        );
        assert_eq!(
            eval::<String>(r#"return text.re_replace("\\s+", "a  b   c", " ")"#).unwrap(),
            "a b c"
        );
        assert_eq!(
            eval::<String>(r#"return text.re_replace("(\\w+)@(\\w+)", "a@b c@d", "$2.$1")"#).unwrap(),
            "b.a d.c"
        );
        let err = eval::<bool>(r#"return text.re_match("(", "x")"#).unwrap_err();
        assert!(err.to_string().contains("invalid pattern"));
    }
}
