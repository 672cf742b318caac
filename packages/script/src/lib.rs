//! Sandboxed Lua scripting over harvested metadata.
//!
//! Operators supply small Lua programs that turn raw source data into typed
//! asset records, or edit records already harvested. Scripts run without
//! filesystem, process or network access, under instruction and memory
//! budgets, and reach the host only through the functions a usage site binds.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use harvest_assets::Record;
//! use harvest_script::{ResponseScript, RunContext, ScriptConfig};
//! use harvest_structmap::StructMap;
//! use harvest_value::Value;
//!
//! let config = ScriptConfig::lua(r#"
//!     local a = new_asset("table")
//!     a.urn = "urn:api:" .. response.id
//!     emit(a)
//! "#);
//! let script = ResponseScript::new(&config, Arc::new(StructMap::default()), "recipe").unwrap();
//!
//! let mut response = Value::map();
//! response.insert("id", "42");
//! script
//!     .execute(&RunContext::background(), &response, Arc::new(|record: Record| println!("{record:?}")))
//!     .unwrap();
//! ```

mod bridge;
mod config;
mod context;
mod convert;
mod error;
mod host;
mod lexer;
mod lint;
mod modules;
mod processor;
mod response;
mod sandbox;

pub use bridge::{Emit, HostBridge};
pub use config::{
    ScriptConfig, ScriptLimits, DEFAULT_MAX_ALLOCS, DEFAULT_MAX_CONST_OBJECTS, DEFAULT_MAX_MEMORY,
    ENGINE_LUA,
};
pub use context::RunContext;
pub use error::{CancelReason, Error, Resource, Result};
pub use host::{HostFunction, NativeFn};
pub use processor::ScriptProcessor;
pub use response::ResponseScript;
pub use sandbox::{CompiledScript, RunOutcome, RunnableScript, Sandbox};
