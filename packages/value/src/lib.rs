//! Generic values for the harvest scripting engine.
//!
//! Everything that crosses the boundary between the script interpreter and
//! typed asset records travels as a [`Value`]: a JSON-like tree with a
//! native time leaf. The [`Shape`] of a destination type, exposed through
//! [`Described`], tells the marshaler what a value is supposed to become.
//!
//! # Modules
//!
//! - [`value`]: the `Value` tree
//! - [`json`]: conversion to and from `serde_json::Value`
//! - [`shape`]: destination shapes and the `Described` trait
//! - [`attributes`]: the open-ended attributes container
//! - [`duration`]: Go-style duration strings (`"1m30s"`)
//! - [`time`]: canonical timestamp text

pub mod attributes;
pub mod duration;
pub mod error;
pub mod json;
pub mod shape;
pub mod time;
pub mod value;

pub use attributes::Attributes;
pub use error::{Error, Result};
pub use json::{json_to_value, value_to_json};
pub use shape::{Described, Field, Shape, StructShape};
pub use value::Value;
