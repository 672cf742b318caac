//! Script-facing view of one asset.

use harvest_assets::{Asset, Payload, TYPE_TAG};
use harvest_value::{Described, Shape, Value};

use crate::{Error, KeyPath, Result, StructMap};

/// Wraps one asset for editing as a generic map.
///
/// [`as_map`](Self::as_map) exposes the asset with its payload tagged, and
/// [`overwrite_with`](Self::overwrite_with) applies an edited map back. The
/// payload's type is fixed by the wrapped asset; only its fields change.
#[derive(Debug)]
pub struct AssetWrapper<'a> {
    structmap: &'a StructMap,
    asset: Asset,
}

impl<'a> AssetWrapper<'a> {
    pub fn new(structmap: &'a StructMap, asset: Asset) -> Self {
        AssetWrapper { structmap, asset }
    }

    pub fn asset(&self) -> &Asset {
        &self.asset
    }

    pub fn into_asset(self) -> Asset {
        self.asset
    }

    /// The asset as a map; `data` always carries the `@type` tag.
    pub fn as_map(&self) -> Result<Value> {
        let value = self.structmap.as_value(&self.asset)?;
        if !value.is_map() {
            return Err(Error::invalid_type(&KeyPath::root(), "map", &value));
        }
        Ok(value)
    }

    /// Replace the asset with the decoded contents of `value`.
    ///
    /// `value` must hold a `data` map. The payload decodes into the current
    /// payload's type; a different `@type` in the map is an error. Keys
    /// missing from `value` reset their fields. On error the wrapped asset
    /// is unchanged.
    pub fn overwrite_with(&mut self, value: Value) -> Result<()> {
        let root = KeyPath::root();
        let Value::Map(mut fields) = value else {
            return Err(Error::invalid_type(&root, "map", &value));
        };

        let data_path = root.key("data");
        let mut data = match fields.remove("data") {
            Some(Value::Map(data)) => data,
            Some(other) => return Err(Error::invalid_type(&data_path, "map", &other)),
            None => return Err(Error::MissingPayload),
        };

        let current = self.asset.data.as_ref().ok_or(Error::MissingPayload)?;
        let entry = self
            .structmap
            .registry()
            .resolve(current.type_url())
            .ok_or_else(|| Error::UnknownType {
                path: data_path.clone(),
                type_url: current.type_url().to_string(),
            })?;

        match data.get(TYPE_TAG) {
            None => {}
            Some(Value::String(tag)) if tag == entry.type_url() => {}
            Some(Value::String(tag)) => {
                return Err(Error::TypeMismatch {
                    expected: entry.type_url().to_string(),
                    found: tag.clone(),
                })
            }
            Some(other) => {
                return Err(Error::invalid_type(&data_path.key(TYPE_TAG), "string", other))
            }
        }
        data.insert(TYPE_TAG.to_string(), Value::from(entry.type_url()));

        let payload: Payload =
            self.structmap
                .decode_into(Value::Map(data), &Shape::Envelope, &data_path)?;
        let mut asset: Asset =
            self.structmap
                .decode_into(Value::Map(fields), &Asset::shape(), &root)?;

        asset.data = Some(payload);
        self.asset = asset;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_assets::payload::{Column, Table, User};
    use harvest_assets::PayloadKind;

    fn table_asset() -> Asset {
        Asset {
            urn: "urn:bigquery:orders".to_string(),
            name: "orders".to_string(),
            kind: "table".to_string(),
            data: Some(Payload::Table(Table {
                columns: vec![Column {
                    name: "id".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            })),
            ..Default::default()
        }
    }

    fn data_mut(map: &mut Value) -> &mut Value {
        map.as_map_mut().unwrap().get_mut("data").unwrap()
    }

    #[test]
    fn as_map_tags_the_payload() {
        let sm = StructMap::default();
        let wrapper = sm.wrap(table_asset());

        let map = wrapper.as_map().unwrap();
        assert_eq!(
            map.get_path(&["data", "@type"]),
            Some(&Value::from(PayloadKind::Table.type_url()))
        );
        assert_eq!(map.get("urn"), Some(&Value::from("urn:bigquery:orders")));
    }

    #[test]
    fn overwrite_applies_edits() {
        let sm = StructMap::default();
        let mut wrapper = sm.wrap(table_asset());

        let mut map = wrapper.as_map().unwrap();
        map.insert("description", "all the orders");
        let data = data_mut(&mut map);
        data.insert(
            "columns",
            Value::Array(vec![
                Value::Map([("name".to_string(), Value::from("id"))].into()),
                Value::Map([("name".to_string(), Value::from("total"))].into()),
            ]),
        );
        data.as_map_mut().unwrap().remove("@type");

        wrapper.overwrite_with(map).unwrap();

        let asset = wrapper.into_asset();
        assert_eq!(asset.description, "all the orders");
        assert_eq!(asset.urn, "urn:bigquery:orders");
        let Some(Payload::Table(table)) = asset.data else {
            panic!("expected table payload");
        };
        let names: Vec<_> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "total"]);
    }

    #[test]
    fn overwrite_without_data_leaves_asset_unchanged() {
        let sm = StructMap::default();
        let mut wrapper = sm.wrap(table_asset());

        let mut map = wrapper.as_map().unwrap();
        map.as_map_mut().unwrap().remove("data");
        map.insert("name", "renamed");

        assert_eq!(wrapper.overwrite_with(map), Err(Error::MissingPayload));
        assert_eq!(wrapper.asset(), &table_asset());
    }

    #[test]
    fn overwrite_with_unknown_keys_leaves_asset_unchanged() {
        let sm = StructMap::default();
        let mut wrapper = sm.wrap(table_asset());

        let mut map = wrapper.as_map().unwrap();
        map.insert("name", "renamed");
        data_mut(&mut map).insert("does-not-exist", "value");

        let err = wrapper.overwrite_with(map).unwrap_err();
        assert_eq!(err.to_string(), "data: has invalid keys: does-not-exist");
        assert_eq!(wrapper.asset(), &table_asset());
    }

    #[test]
    fn overwrite_refuses_to_change_the_payload_type() {
        let sm = StructMap::default();
        let mut wrapper = sm.wrap(table_asset());

        let mut map = wrapper.as_map().unwrap();
        data_mut(&mut map).insert("@type", PayloadKind::User.type_url());

        let err = wrapper.overwrite_with(map).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
        assert_eq!(wrapper.asset(), &table_asset());
    }

    #[test]
    fn overwrite_requires_an_existing_payload() {
        let sm = StructMap::default();
        let mut wrapper = sm.wrap(Asset::default());

        let value = Value::Map(
            [(
                "data".to_string(),
                Value::Map([("@type".to_string(), Value::from(PayloadKind::User.type_url()))].into()),
            )]
            .into(),
        );

        assert_eq!(wrapper.overwrite_with(value), Err(Error::MissingPayload));
    }

    #[test]
    fn overwrite_reports_unresolvable_payload_types() {
        let registry = harvest_assets::TypeRegistry::empty();
        let sm = StructMap::new(std::sync::Arc::new(registry));
        let asset = Asset {
            data: Some(Payload::User(User::default())),
            ..Default::default()
        };
        let mut wrapper = sm.wrap(asset.clone());

        let map = wrapper.as_map().unwrap();
        let err = wrapper.overwrite_with(map).unwrap_err();
        assert!(matches!(err, Error::UnknownType { .. }));
        assert_eq!(wrapper.asset(), &asset);
    }
}
