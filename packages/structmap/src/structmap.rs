use std::sync::Arc;

use harvest_assets::{Asset, TypeRegistry};
use harvest_value::{json_to_value, value_to_json, Described, Shape, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::hooks::default_hooks;
use crate::{structural, AssetWrapper, DecodeHook, Error, KeyPath, Result};

/// Serialize any value into the generic form.
///
/// Field names come from the type's serde representation, so renamed
/// fields appear under their external names.
pub fn as_value<T: Serialize + ?Sized>(data: &T) -> Result<Value> {
    let marshal = |message: String| Error::Marshal {
        type_name: std::any::type_name::<T>(),
        message,
    };
    let json = serde_json::to_value(data).map_err(|e| marshal(e.to_string()))?;
    json_to_value(json).map_err(|e| marshal(e.to_string()))
}

/// The value marshaler: a type registry plus a fixed decode-hook chain.
///
/// Both are read-only after construction, so one `StructMap` can serve any
/// number of concurrent script runs.
#[derive(Debug, Clone)]
pub struct StructMap {
    registry: Arc<TypeRegistry>,
    hooks: Vec<DecodeHook>,
}

impl StructMap {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self::with_hooks(registry, default_hooks())
    }

    pub fn with_hooks(registry: Arc<TypeRegistry>, hooks: Vec<DecodeHook>) -> Self {
        StructMap { registry, hooks }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn hooks(&self) -> &[DecodeHook] {
        &self.hooks
    }

    pub fn as_value<T: Serialize + ?Sized>(&self, data: &T) -> Result<Value> {
        as_value(data)
    }

    /// Decode a generic value into `T`.
    pub fn as_struct<T: Described + DeserializeOwned>(&self, value: Value) -> Result<T> {
        self.decode_into(value, &T::shape(), &KeyPath::root())
    }

    /// Normalize `value` against `shape`.
    ///
    /// Hooks are tried in order; the first whose predicate matches wins.
    /// Otherwise the value is decoded structurally, recursing through this
    /// method for nested values.
    pub fn decode(&self, value: Value, shape: &Shape, path: &KeyPath) -> Result<Value> {
        for hook in &self.hooks {
            if (hook.applies)(shape, &value) {
                return (hook.transform)(self, value, shape, path);
            }
        }
        structural::decode(self, value, shape, path)
    }

    pub(crate) fn decode_into<T: DeserializeOwned>(
        &self,
        value: Value,
        shape: &Shape,
        path: &KeyPath,
    ) -> Result<T> {
        let normalized = self.decode(value, shape, path)?;
        let json = value_to_json(normalized).map_err(|source| Error::Parse {
            path: path.clone(),
            source,
        })?;
        serde_json::from_value(json).map_err(|e| Error::Decode {
            type_name: std::any::type_name::<T>(),
            message: e.to_string(),
        })
    }

    pub fn wrap(&self, asset: Asset) -> AssetWrapper<'_> {
        AssetWrapper::new(self, asset)
    }
}

impl Default for StructMap {
    fn default() -> Self {
        Self::new(Arc::new(TypeRegistry::builtin()))
    }
}
