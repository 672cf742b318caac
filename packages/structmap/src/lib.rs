//! Marshaling between generic values and typed records.
//!
//! [`StructMap`] converts in both directions:
//!
//! - [`StructMap::as_value`] serializes any `Serialize` type into a
//!   [`Value`](harvest_value::Value), using the type's external field names.
//! - [`StructMap::as_struct`] normalizes a `Value` against the destination's
//!   [`Shape`](harvest_value::Shape) through an ordered chain of
//!   [`DecodeHook`]s, then deserializes the result.
//!
//! Decoding is strict: a key the destination does not declare is an
//! [`Error::UnusedKeys`], never dropped silently.
//!
//! [`AssetWrapper`] builds on both to expose an asset as a script-editable
//! map and to apply the edited map back without changing the payload type.

mod error;
mod hooks;
mod path;
mod structmap;
mod structural;
mod wrapper;

pub use error::{Error, Result};
pub use hooks::{default_hooks, DecodeHook, HookFn, HookPredicate};
pub use path::KeyPath;
pub use structmap::{as_value, StructMap};
pub use wrapper::AssetWrapper;
