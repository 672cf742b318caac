//! Typed metadata records.
//!
//! An [`Asset`] is a fixed envelope (urn, name, service, owners, lineage,
//! labels, ...) plus one polymorphic [`Payload`]. Payloads marshal as maps
//! whose reserved `@type` key holds the canonical type identifier, so a
//! script sees `{ "@type": "...", "columns": [...] }` and the host sees
//! `Payload::Table(..)`.
//!
//! The [`TypeRegistry`] maps operator-facing short names (`"table"`,
//! `"user"`) to those identifiers. It is an ordinary value: build one with
//! [`TypeRegistry::builtin`] and share it behind an `Arc`.

#[macro_use]
mod schema;

pub mod asset;
pub mod error;
pub mod payload;
pub mod record;
pub mod registry;

pub use asset::{Asset, Event, Lineage, Owner, Resource};
pub use error::RegistryError;
pub use payload::{Payload, PayloadKind, TYPE_TAG, TYPE_URL_PREFIX};
pub use record::Record;
pub use registry::{TypeEntry, TypeRegistry};
