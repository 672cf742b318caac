//! The host functions every asset-producing script shares: `new_asset`,
//! `emit` and `exit`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use harvest_assets::{Asset, Record, TYPE_TAG};
use harvest_structmap::{KeyPath, StructMap};
use harvest_value::Value;
use tracing::debug;

use crate::{Error, HostFunction, Result};

/// Callback receiving each emitted record, synchronously, on the run's thread.
pub type Emit = Arc<dyn Fn(Record) + Send + Sync>;

/// Builds host functions bound to one [`StructMap`].
#[derive(Clone)]
pub struct HostBridge {
    structmap: Arc<StructMap>,
}

impl fmt::Debug for HostBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostBridge").finish_non_exhaustive()
    }
}

impl HostBridge {
    pub fn new(structmap: Arc<StructMap>) -> Self {
        HostBridge { structmap }
    }

    pub fn structmap(&self) -> &Arc<StructMap> {
        &self.structmap
    }

    /// `new_asset(type)`: an envelope whose payload holds only its type tag.
    pub fn new_asset(&self) -> HostFunction {
        let bridge = self.clone();
        HostFunction::native("new_asset", move |args| {
            let name = match single_arg("new_asset", args)? {
                Value::String(name) => name,
                other => {
                    return Err(Error::runtime(
                        "new_asset",
                        format!("invalid argument type: expected string, found {}", other.type_name()),
                    ))
                }
            };
            bridge.skeleton(&name)
        })
    }

    /// `emit(asset)`: decode the map into a typed record and hand it to `callback`.
    pub fn emit(&self, callback: Emit) -> HostFunction {
        let bridge = self.clone();
        HostFunction::native("emit", move |args| {
            let value = single_arg("emit", args)?;
            if !value.is_map() {
                return Err(Error::runtime(
                    "emit",
                    format!("invalid argument type: expected map, found {}", value.type_name()),
                ));
            }
            let record = bridge.to_record(value)?;
            debug!(urn = %record.data().urn, "emitting record");
            callback(record);
            Ok(Value::Null)
        })
    }

    pub fn exit(&self) -> HostFunction {
        HostFunction::exit()
    }

    pub(crate) fn skeleton(&self, short_name: &str) -> Result<Value> {
        let entry = self.structmap.registry().lookup(short_name).ok_or_else(|| {
            Error::runtime("new_asset", format!("unknown type {short_name:?}"))
        })?;

        let mut data = BTreeMap::new();
        data.insert(TYPE_TAG.to_string(), Value::from(entry.type_url()));
        let mut skeleton = Value::map();
        skeleton.insert("type", short_name);
        skeleton.insert("data", Value::Map(data));
        Ok(skeleton)
    }

    /// Decode a script's asset map into a fresh typed record.
    pub fn to_record(&self, value: Value) -> Result<Record> {
        let data_path = KeyPath::root().key("data");
        let type_url = match value.get("data") {
            None => return Err(harvest_structmap::Error::MissingPayload.into()),
            Some(data) => match data.get(TYPE_TAG) {
                Some(Value::String(url)) => url.clone(),
                Some(other) => {
                    return Err(harvest_structmap::Error::InvalidType {
                        path: data_path.key(TYPE_TAG),
                        expected: "string",
                        found: other.type_name(),
                    }
                    .into())
                }
                None => return Err(harvest_structmap::Error::MissingTypeTag { path: data_path }.into()),
            },
        };
        let entry = self.structmap.registry().resolve(&type_url).ok_or_else(|| {
            harvest_structmap::Error::UnknownType {
                path: data_path.clone(),
                type_url: type_url.clone(),
            }
        })?;

        let mut wrapper = self.structmap.wrap(Asset {
            data: Some(entry.instantiate()),
            ..Asset::default()
        });
        wrapper.overwrite_with(value)?;
        Ok(Record::new(wrapper.into_asset()))
    }
}

fn single_arg(function: &str, args: Vec<Value>) -> Result<Value> {
    let got = args.len();
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (Some(value), None) => Ok(value),
        _ => Err(Error::runtime(
            function,
            format!("wrong number of arguments: expected 1, got {got}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_assets::payload::Payload;
    use harvest_assets::PayloadKind;

    fn bridge() -> HostBridge {
        HostBridge::new(Arc::new(StructMap::default()))
    }

    #[test]
    fn skeletons_carry_the_canonical_tag() {
        let bridge = bridge();
        for kind in PayloadKind::ALL {
            let skeleton = bridge.skeleton(kind.short_name()).unwrap();
            assert_eq!(skeleton.get("type"), Some(&Value::from(kind.short_name())));
            let data = skeleton.get("data").and_then(Value::as_map).unwrap();
            assert_eq!(data.len(), 1);
            assert_eq!(data.get(TYPE_TAG), Some(&Value::from(kind.type_url())));
        }

        let err = bridge.skeleton("tabel").unwrap_err();
        assert_eq!(err.to_string(), "runtime error: new_asset: unknown type \"tabel\"");
    }

    #[test]
    fn records_decode_from_skeletons() {
        let bridge = bridge();
        let mut value = bridge.skeleton("topic").unwrap();
        value.insert("urn", "urn:kafka:orders");
        let record = bridge.to_record(value).unwrap();
        assert_eq!(record.data().urn, "urn:kafka:orders");
        assert!(matches!(record.data().data, Some(Payload::Topic(_))));
    }

    #[test]
    fn record_decoding_needs_a_tagged_payload() {
        let bridge = bridge();
        let mut untagged = Value::map();
        untagged.insert("data", Value::map());
        assert!(matches!(
            bridge.to_record(untagged),
            Err(Error::Marshal(harvest_structmap::Error::MissingTypeTag { .. }))
        ));
        assert!(matches!(
            bridge.to_record(Value::map()),
            Err(Error::Marshal(harvest_structmap::Error::MissingPayload))
        ));
    }
}
