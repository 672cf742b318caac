//! Compiling scripts once and running isolated copies of them.
//!
//! A [`Sandbox`] describes a script: its source, limits and the globals the
//! host will provide. [`Sandbox::compile`] validates it into a
//! [`CompiledScript`], which is immutable and can be shared across threads.
//! Every run starts from [`CompiledScript::clone_runnable`], which builds a
//! fresh interpreter, so runs never observe one another's globals.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use harvest_value::Value;
use mlua::{ChunkMode, HookTriggers, Lua, LuaOptions, StdLib, VmState};
use serde::Serialize;
use tracing::{debug, trace};

use crate::convert::{lua_to_value, value_to_lua};
use crate::host::{ExitSignal, HostFunction};
use crate::lint::{self, Report};
use crate::modules;
use crate::{Error, Resource, Result, RunContext, ScriptLimits};

/// Base-library functions removed before any script code runs.
const REMOVED_GLOBALS: &[&str] = &[
    "collectgarbage",
    "dofile",
    "getmetatable",
    "load",
    "loadfile",
    "pcall",
    "require",
    "setmetatable",
    "warn",
    "xpcall",
];

/// The hook fires after this many VM instructions.
const INSTRUCTIONS_PER_HOOK: u32 = 100;

/// Instructions charged as one unit of the allocation budget.
const INSTRUCTIONS_PER_ALLOC: u64 = 10;

/// How a run that did not fail came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The script ran to its last statement.
    Completed,
    /// The script called `exit()`.
    UserExited,
}

/// A script under construction.
#[derive(Debug, Clone)]
pub struct Sandbox {
    name: String,
    source: String,
    limits: ScriptLimits,
    declared: BTreeSet<String>,
}

impl Sandbox {
    pub fn new(source: impl Into<String>) -> Self {
        Sandbox {
            name: "script".to_string(),
            source: source.into(),
            limits: ScriptLimits::default(),
            declared: BTreeSet::new(),
        }
    }

    /// Name used in interpreter error messages.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_limits(mut self, limits: ScriptLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Declare a global the host will set or bind before each run.
    pub fn declare(mut self, name: impl Into<String>) -> Self {
        self.declared.insert(name.into());
        self
    }

    /// Check syntax, resolve names and imports, and count constants.
    pub fn compile(self) -> Result<CompiledScript> {
        let lua = new_state(&self.limits)?;
        load_chunk(&lua, &self.name, &self.source).map_err(|err| match classify(&err, &self.limits) {
            Err(err) => err,
            Ok(_) => Error::Interpreter(err.to_string()),
        })?;
        drop(lua);

        let report = lint::check(&self.source, &self.declared, &self.limits)?;
        debug!(
            script = %self.name,
            constants = report.constants,
            imports = ?report.imports,
            "compiled script"
        );

        Ok(CompiledScript {
            inner: Arc::new(Compiled {
                name: self.name,
                source: self.source,
                limits: self.limits,
                declared: self.declared,
                report,
            }),
        })
    }
}

#[derive(Debug)]
struct Compiled {
    name: String,
    source: String,
    limits: ScriptLimits,
    declared: BTreeSet<String>,
    report: Report,
}

/// A validated script. Cheap to clone and safe to share between threads.
#[derive(Debug, Clone)]
pub struct CompiledScript {
    inner: Arc<Compiled>,
}

impl CompiledScript {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn limits(&self) -> &ScriptLimits {
        &self.inner.limits
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.inner.declared.contains(name)
    }

    /// Modules the script imports by literal name.
    pub fn imports(&self) -> &[String] {
        &self.inner.report.imports
    }

    /// A fresh, independent copy ready for one run.
    pub fn clone_runnable(&self) -> Result<RunnableScript> {
        let lua = new_state(&self.inner.limits)?;
        let chunk = load_chunk(&lua, &self.inner.name, &self.inner.source)
            .map_err(|err| Error::Interpreter(err.to_string()))?;
        Ok(RunnableScript {
            script: self.clone(),
            lua,
            chunk,
            ran: false,
        })
    }
}

/// One isolated copy of a [`CompiledScript`]. Set globals, run once, then
/// read globals back.
pub struct RunnableScript {
    script: CompiledScript,
    lua: Lua,
    chunk: mlua::Function,
    ran: bool,
}

impl fmt::Debug for RunnableScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnableScript")
            .field("script", &self.script.name())
            .field("ran", &self.ran)
            .finish()
    }
}

impl RunnableScript {
    fn ensure_declared(&self, name: &str) -> Result<()> {
        if self.script.is_declared(name) {
            Ok(())
        } else {
            Err(Error::Undeclared(name.to_string()))
        }
    }

    pub fn set(&mut self, name: &str, value: &Value) -> Result<()> {
        self.ensure_declared(name)?;
        let converted = value_to_lua(&self.lua, value).map_err(interpreter)?;
        self.lua.globals().set(name, converted).map_err(interpreter)
    }

    /// Set a global from any serializable value.
    pub fn set_serialized<T: Serialize + ?Sized>(&mut self, name: &str, data: &T) -> Result<()> {
        let value = harvest_structmap::as_value(data)?;
        self.set(name, &value)
    }

    /// Bind a host function under its own name.
    pub fn bind(&mut self, function: HostFunction) -> Result<()> {
        self.ensure_declared(function.name())?;
        let name = function.name().to_string();
        let f = function.into_lua(&self.lua).map_err(interpreter)?;
        self.lua.globals().set(name, f).map_err(interpreter)
    }

    /// Read a declared global.
    pub fn get(&self, name: &str) -> Result<Value> {
        self.ensure_declared(name)?;
        let value: mlua::Value = self.lua.globals().get(name).map_err(interpreter)?;
        lua_to_value(&value).map_err(|message| Error::Runtime {
            function: None,
            message: format!("global {name}: {message}"),
        })
    }

    /// Run the script to completion, `exit()`, failure or cancellation.
    ///
    /// A copy runs at most once. The context is polled between batches of
    /// instructions; blocking host functions are not interrupted.
    pub fn run(&mut self, ctx: &RunContext) -> Result<RunOutcome> {
        if self.ran {
            return Err(Error::AlreadyRun);
        }
        self.ran = true;
        if let Some(reason) = ctx.err() {
            return Err(Error::Cancelled { reason });
        }

        let limits = self.script.inner.limits;
        let hook_ctx = ctx.clone();
        let spent = AtomicU64::new(0);
        let charge = u64::from(INSTRUCTIONS_PER_HOOK) / INSTRUCTIONS_PER_ALLOC;
        self.lua.set_hook(
            HookTriggers::new().every_nth_instruction(INSTRUCTIONS_PER_HOOK),
            move |_, _| {
                if let Some(reason) = hook_ctx.err() {
                    return Err(mlua::Error::external(Error::Cancelled { reason }));
                }
                if spent.fetch_add(charge, Ordering::Relaxed) + charge > limits.max_allocs {
                    return Err(mlua::Error::external(Error::ResourceLimitExceeded {
                        resource: Resource::Allocations,
                        limit: limits.max_allocs,
                    }));
                }
                Ok(VmState::Continue)
            },
        );

        let result = self.chunk.call::<()>(());
        self.lua.remove_hook();

        let outcome = match result {
            Ok(()) => Ok(RunOutcome::Completed),
            Err(err) => classify(&err, &limits),
        };
        trace!(script = %self.script.name(), ?outcome, "script finished");
        outcome
    }
}

fn interpreter(err: mlua::Error) -> Error {
    Error::Interpreter(err.to_string())
}

fn new_state(limits: &ScriptLimits) -> Result<Lua> {
    let libs = StdLib::STRING | StdLib::TABLE | StdLib::MATH | StdLib::UTF8;
    let lua = Lua::new_with(libs, LuaOptions::new()).map_err(interpreter)?;
    lua.set_memory_limit(limits.max_memory).map_err(interpreter)?;
    lua.set_app_data(*limits);
    harden(&lua).map_err(interpreter)?;
    Ok(lua)
}

fn harden(lua: &Lua) -> mlua::Result<()> {
    let globals = lua.globals();
    for name in REMOVED_GLOBALS {
        globals.raw_set(*name, mlua::Value::Nil)?;
    }
    let string: mlua::Table = globals.get("string")?;
    string.raw_set("dump", mlua::Value::Nil)?;

    globals.set("print", lua.create_function(modules::log_line)?)?;
    globals.set(
        "import",
        lua.create_function(|lua, name: String| modules::load(lua, &name))?,
    )?;
    Ok(())
}

fn load_chunk(lua: &Lua, name: &str, source: &str) -> mlua::Result<mlua::Function> {
    lua.load(source)
        .set_name(format!("={name}"))
        .set_mode(ChunkMode::Text)
        .into_function()
}

/// Map an interpreter failure onto the public error type.
fn classify(err: &mlua::Error, limits: &ScriptLimits) -> Result<RunOutcome> {
    match err {
        mlua::Error::CallbackError { cause, .. }
        | mlua::Error::WithContext { cause, .. }
        | mlua::Error::BadArgument { cause, .. } => classify(cause, limits),
        mlua::Error::ExternalError(inner) => {
            if inner.downcast_ref::<ExitSignal>().is_some() {
                return Ok(RunOutcome::UserExited);
            }
            match inner.downcast_ref::<Error>() {
                Some(err) => Err(err.clone()),
                None => Err(Error::Runtime {
                    function: None,
                    message: inner.to_string(),
                }),
            }
        }
        mlua::Error::MemoryError(_) => Err(Error::ResourceLimitExceeded {
            resource: Resource::Memory,
            limit: limits.max_memory as u64,
        }),
        mlua::Error::SyntaxError { message, .. } => Err(Error::Compile {
            message: message.clone(),
        }),
        mlua::Error::RuntimeError(message) => Err(Error::Runtime {
            function: None,
            message: message.clone(),
        }),
        other => Err(Error::Runtime {
            function: None,
            message: other.to_string(),
        }),
    }
}
