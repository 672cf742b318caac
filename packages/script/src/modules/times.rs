//! `times`: timestamps as first-class script values.

use std::fmt::Write;

use chrono::{DateTime, Months, NaiveDateTime, TimeDelta, TimeZone, Utc};
use harvest_value::{duration, time};
use mlua::{Lua, MetaMethod, Table, UserData, UserDataMethods, UserDataRef};

/// A UTC instant exposed to scripts. Converts to and from
/// [`Value::Time`](harvest_value::Value::Time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct ScriptTime(pub DateTime<Utc>);

impl UserData for ScriptTime {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(time::format_timestamp(&this.0))
        });
        methods.add_meta_method(MetaMethod::Eq, |_, this, other: UserDataRef<ScriptTime>| {
            Ok(*this == *other)
        });
        methods.add_meta_method(MetaMethod::Lt, |_, this, other: UserDataRef<ScriptTime>| {
            Ok(*this < *other)
        });
        methods.add_meta_method(MetaMethod::Le, |_, this, other: UserDataRef<ScriptTime>| {
            Ok(*this <= *other)
        });

        methods.add_method("unix", |_, this, ()| Ok(this.0.timestamp()));
        methods.add_method("rfc3339", |_, this, ()| Ok(time::format_timestamp(&this.0)));
        methods.add_method("format", |_, this, layout: String| format(this.0, &layout));
        methods.add_method("add", |_, this, delta: mlua::Value| add(this.0, &delta));
        methods.add_method("add_date", |_, this, (years, months, days): (i32, i32, i64)| {
            add_date(this.0, years, months, days)
        });
    }
}

fn runtime(message: impl Into<String>) -> mlua::Error {
    mlua::Error::RuntimeError(message.into())
}

fn format(at: DateTime<Utc>, layout: &str) -> mlua::Result<String> {
    let mut out = String::new();
    write!(out, "{}", at.format(layout)).map_err(|_| runtime(format!("invalid time format {layout:?}")))?;
    Ok(out)
}

/// Shift by a duration string such as `"1h30m"`, or by whole seconds.
fn add(at: DateTime<Utc>, delta: &mlua::Value) -> mlua::Result<ScriptTime> {
    let delta = match delta {
        mlua::Value::Integer(seconds) => TimeDelta::try_seconds(*seconds),
        mlua::Value::String(text) => {
            let text = text.to_str()?;
            let (negative, magnitude) = match text.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, &*text),
            };
            let parsed = duration::parse(magnitude).map_err(|err| runtime(err.to_string()))?;
            TimeDelta::from_std(parsed)
                .ok()
                .map(|d| if negative { -d } else { d })
        }
        other => {
            return Err(runtime(format!(
                "expected duration string or seconds, found {}",
                other.type_name()
            )))
        }
    };
    delta
        .and_then(|d| at.checked_add_signed(d))
        .map(ScriptTime)
        .ok_or_else(|| runtime("time out of range"))
}

fn add_date(at: DateTime<Utc>, years: i32, months: i32, days: i64) -> mlua::Result<ScriptTime> {
    let months = i64::from(years) * 12 + i64::from(months);
    let shifted = if months >= 0 {
        at.checked_add_months(Months::new(months.unsigned_abs().try_into().unwrap_or(u32::MAX)))
    } else {
        at.checked_sub_months(Months::new(months.unsigned_abs().try_into().unwrap_or(u32::MAX)))
    };
    shifted
        .and_then(|t| t.checked_add_signed(TimeDelta::try_days(days)?))
        .map(ScriptTime)
        .ok_or_else(|| runtime("time out of range"))
}

pub(crate) fn module(lua: &Lua) -> mlua::Result<Table> {
    let m = lua.create_table()?;

    m.set("now", lua.create_function(|_, ()| Ok(ScriptTime(Utc::now())))?)?;
    m.set(
        "parse",
        lua.create_function(|_, text: String| {
            time::parse_timestamp(&text)
                .map(ScriptTime)
                .map_err(|err| runtime(err.to_string()))
        })?,
    )?;
    m.set(
        "parse_format",
        lua.create_function(|_, (text, layout): (String, String)| {
            if let Ok(at) = DateTime::parse_from_str(&text, &layout) {
                return Ok(ScriptTime(at.with_timezone(&Utc)));
            }
            NaiveDateTime::parse_from_str(&text, &layout)
                .map(|naive| ScriptTime(Utc.from_utc_datetime(&naive)))
                .map_err(|err| runtime(format!("parse {text:?} with {layout:?}: {err}")))
        })?,
    )?;
    m.set(
        "from_unix",
        lua.create_function(|_, seconds: i64| {
            DateTime::from_timestamp(seconds, 0)
                .map(ScriptTime)
                .ok_or_else(|| runtime("time out of range"))
        })?,
    )?;
    m.set(
        "unix",
        lua.create_function(|_, at: UserDataRef<ScriptTime>| Ok(at.0.timestamp()))?,
    )?;
    m.set(
        "format",
        lua.create_function(|_, (at, layout): (UserDataRef<ScriptTime>, String)| format(at.0, &layout))?,
    )?;
    m.set(
        "add",
        lua.create_function(|_, (at, delta): (UserDataRef<ScriptTime>, mlua::Value)| add(at.0, &delta))?,
    )?;
    m.set(
        "add_date",
        lua.create_function(
            |_, (at, years, months, days): (UserDataRef<ScriptTime>, i32, i32, i64)| {
                add_date(at.0, years, months, days)
            },
        )?,
    )?;

    Ok(m)
}
