//! Data-store payloads: tables, topics, buckets and feature tables.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use harvest_value::{Attributes, Value};

schema! {
    pub struct Table {
        profile: Option<TableProfile>,
        columns: Vec<Column>,
        preview_fields: Vec<String>,
        preview_rows: Vec<Value>,
        attributes: Attributes,
        create_time: Option<DateTime<Utc>>,
        update_time: Option<DateTime<Utc>>,
    }
}

schema! {
    /// A column; nested records carry their own columns.
    pub struct Column {
        name: String,
        description: String,
        data_type: String,
        is_nullable: bool,
        length: i64,
        profile: Option<ColumnProfile>,
        columns: Vec<Column>,
        attributes: Attributes,
    }
}

schema! {
    pub struct ColumnProfile {
        min: String,
        max: String,
        avg: f64,
        med: f64,
        unique: i64,
        count: i64,
        top: String,
    }
}

schema! {
    pub struct TableProfile {
        total_rows: i64,
        partition_key: String,
        partition_value: String,
        usage_count: i64,
        common_joins: Vec<TableCommonJoin>,
        filters: Vec<String>,
    }
}

schema! {
    pub struct TableCommonJoin {
        urn: String,
        count: i64,
        conditions: Vec<String>,
    }
}

schema! {
    pub struct Topic {
        profile: Option<TopicProfile>,
        schema: Option<TopicSchema>,
        attributes: Attributes,
        create_time: Option<DateTime<Utc>>,
        update_time: Option<DateTime<Utc>>,
    }
}

schema! {
    pub struct TopicProfile {
        throughput: String,
        number_of_partitions: i64,
    }
}

schema! {
    pub struct TopicSchema {
        format: String,
        url: String,
    }
}

schema! {
    pub struct Bucket {
        location: String,
        storage_type: String,
        blobs: Vec<Blob>,
        attributes: Attributes,
        create_time: Option<DateTime<Utc>>,
        update_time: Option<DateTime<Utc>>,
    }
}

schema! {
    pub struct Blob {
        name: String,
        size: i64,
        storage_class: String,
        deleted: bool,
        attributes: Attributes,
        create_time: Option<DateTime<Utc>>,
        update_time: Option<DateTime<Utc>>,
    }
}

schema! {
    pub struct FeatureTable {
        namespace: String,
        entities: Vec<Entity>,
        features: Vec<Feature>,
        attributes: Attributes,
        create_time: Option<DateTime<Utc>>,
        update_time: Option<DateTime<Utc>>,
    }
}

schema! {
    pub struct Entity {
        name: String,
        labels: BTreeMap<String, String>,
        kind as "type": String,
        join_keys: Vec<String>,
        description: String,
    }
}

schema! {
    pub struct Feature {
        name: String,
        data_type: String,
        description: String,
        entity_name: String,
    }
}
