//! Payloads for dashboards, metrics, experiments, models, jobs and
//! applications.

use chrono::{DateTime, Utc};
use harvest_value::Attributes;

schema! {
    pub struct Dashboard {
        charts: Vec<Chart>,
        attributes: Attributes,
        create_time: Option<DateTime<Utc>>,
        update_time: Option<DateTime<Utc>>,
    }
}

schema! {
    pub struct Chart {
        urn: String,
        name: String,
        kind as "type": String,
        source: String,
        description: String,
        url: String,
        raw_query: String,
        data_source: String,
        dashboard_urn: String,
        dashboard_source: String,
    }
}

schema! {
    pub struct Metric {
        filter: String,
        attributes: Attributes,
        create_time: Option<DateTime<Utc>>,
        update_time: Option<DateTime<Utc>>,
    }
}

schema! {
    pub struct Experiment {
        entity: String,
        traffic_percent: f64,
        variants: Vec<Variant>,
        attributes: Attributes,
        create_time: Option<DateTime<Utc>>,
        update_time: Option<DateTime<Utc>>,
    }
}

schema! {
    pub struct Variant {
        name: String,
        traffic_percent: f64,
        is_control: bool,
        is_promoted: bool,
        attributes: Attributes,
    }
}

schema! {
    pub struct Model {
        namespace: String,
        flavor: String,
        algorithm: String,
        status: String,
        versions: Vec<ModelVersion>,
        attributes: Attributes,
        create_time: Option<DateTime<Utc>>,
        update_time: Option<DateTime<Utc>>,
    }
}

schema! {
    pub struct ModelVersion {
        version: String,
        status: String,
        flavor: String,
        attributes: Attributes,
        create_time: Option<DateTime<Utc>>,
        update_time: Option<DateTime<Utc>>,
    }
}

schema! {
    pub struct Job {
        attributes: Attributes,
        create_time: Option<DateTime<Utc>>,
        update_time: Option<DateTime<Utc>>,
    }
}

schema! {
    pub struct Application {
        id: String,
        version: String,
        attributes: Attributes,
        create_time: Option<DateTime<Utc>>,
        update_time: Option<DateTime<Utc>>,
    }
}
