//! The asset envelope.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::Payload;

schema! {
    /// A metadata record: fixed envelope fields plus one typed payload.
    pub struct Asset {
        urn: String,
        name: String,
        service: String,
        /// Short type name, e.g. `"table"`.
        kind as "type": String,
        url: String,
        description: String,
        data: Option<Payload>,
        owners: Vec<Owner>,
        lineage: Option<Lineage>,
        labels: BTreeMap<String, String>,
        event: Option<Event>,
        create_time: Option<DateTime<Utc>>,
        update_time: Option<DateTime<Utc>>,
    }
}

schema! {
    pub struct Owner {
        urn: String,
        name: String,
        role: String,
        email: String,
    }
}

schema! {
    /// Upstream and downstream resources of an asset.
    pub struct Lineage {
        upstreams: Vec<Resource>,
        downstreams: Vec<Resource>,
    }
}

schema! {
    /// A reference to another asset.
    pub struct Resource {
        urn: String,
        name: String,
        service: String,
        kind as "type": String,
    }
}

schema! {
    pub struct Event {
        timestamp: Option<DateTime<Utc>>,
        action: String,
        description: String,
    }
}

impl Asset {
    /// The payload's canonical type identifier, if the asset has one.
    pub fn type_url(&self) -> Option<&'static str> {
        self.data.as_ref().map(Payload::type_url)
    }
}
