//! Native functions exposed to scripts.

use std::fmt;
use std::sync::Arc;

use harvest_value::Value;
use mlua::{Lua, MultiValue};

use crate::convert::{lua_to_value, value_to_lua};
use crate::{Error, Result};

/// Signature of a native host function: converted arguments in, one value out.
pub type NativeFn = dyn Fn(Vec<Value>) -> Result<Value> + Send + Sync;

#[derive(Clone)]
pub(crate) enum HostKind {
    Native(Arc<NativeFn>),
    Exit,
}

/// A function a script can call by name.
#[derive(Clone)]
pub struct HostFunction {
    name: String,
    pub(crate) kind: HostKind,
}

impl HostFunction {
    pub fn native<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    {
        HostFunction {
            name: name.into(),
            kind: HostKind::Native(Arc::new(f)),
        }
    }

    /// `exit()`: stop the script successfully. Anything already emitted
    /// stays emitted.
    pub fn exit() -> Self {
        HostFunction {
            name: "exit".to_string(),
            kind: HostKind::Exit,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_lua(self, lua: &Lua) -> mlua::Result<mlua::Function> {
        match self.kind {
            HostKind::Exit => lua.create_function(|_, _: MultiValue| -> mlua::Result<()> {
                Err(mlua::Error::external(ExitSignal))
            }),
            HostKind::Native(f) => {
                let name = self.name;
                lua.create_function(move |lua, args: MultiValue| {
                    let mut values = Vec::with_capacity(args.len());
                    for (i, arg) in args.iter().enumerate() {
                        let value = lua_to_value(arg).map_err(|message| {
                            mlua::Error::external(Error::runtime(
                                name.as_str(),
                                format!("argument #{}: {message}", i + 1),
                            ))
                        })?;
                        values.push(value);
                    }
                    let out = f(values).map_err(mlua::Error::external)?;
                    value_to_lua(lua, &out)
                })
            }
        }
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFunction").field("name", &self.name).finish()
    }
}

/// Raised by `exit()` and unwound through the interpreter.
#[derive(Debug)]
pub(crate) struct ExitSignal;

impl fmt::Display for ExitSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "script exited")
    }
}

impl std::error::Error for ExitSignal {}
