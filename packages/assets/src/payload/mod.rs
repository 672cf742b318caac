//! Payload schemas and the polymorphic [`Payload`] union.
//!
//! Each variant marshals as its schema's fields plus the reserved
//! [`TYPE_TAG`] key carrying the canonical identifier. The identifiers are
//! spelled out in the serde renames below and in [`PayloadKind::type_url`];
//! the registry tests check that the two agree.

mod analytics;
mod data;
mod people;

use harvest_value::{Described, Shape};
use serde::{Deserialize, Serialize};

pub use analytics::{Application, Chart, Dashboard, Experiment, Job, Metric, Model, ModelVersion, Variant};
pub use data::{
    Blob, Bucket, Column, ColumnProfile, Entity, Feature, FeatureTable, Table, TableCommonJoin,
    TableProfile, Topic, TopicProfile, TopicSchema,
};
pub use people::{Group, Member, Membership, Profile, User};

/// Reserved map key holding a payload's type identifier.
pub const TYPE_TAG: &str = "@type";

/// Prefix shared by every canonical type identifier.
pub const TYPE_URL_PREFIX: &str = "type.googleapis.com/harvest.assets.v1.";

/// The type-specific part of an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum Payload {
    #[serde(rename = "type.googleapis.com/harvest.assets.v1.Application")]
    Application(Application),
    #[serde(rename = "type.googleapis.com/harvest.assets.v1.Bucket")]
    Bucket(Bucket),
    #[serde(rename = "type.googleapis.com/harvest.assets.v1.Dashboard")]
    Dashboard(Dashboard),
    #[serde(rename = "type.googleapis.com/harvest.assets.v1.Experiment")]
    Experiment(Experiment),
    #[serde(rename = "type.googleapis.com/harvest.assets.v1.FeatureTable")]
    FeatureTable(FeatureTable),
    #[serde(rename = "type.googleapis.com/harvest.assets.v1.Group")]
    Group(Group),
    #[serde(rename = "type.googleapis.com/harvest.assets.v1.Job")]
    Job(Job),
    #[serde(rename = "type.googleapis.com/harvest.assets.v1.Metric")]
    Metric(Metric),
    #[serde(rename = "type.googleapis.com/harvest.assets.v1.Model")]
    Model(Model),
    #[serde(rename = "type.googleapis.com/harvest.assets.v1.Table")]
    Table(Table),
    #[serde(rename = "type.googleapis.com/harvest.assets.v1.Topic")]
    Topic(Topic),
    #[serde(rename = "type.googleapis.com/harvest.assets.v1.User")]
    User(User),
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Application(_) => PayloadKind::Application,
            Payload::Bucket(_) => PayloadKind::Bucket,
            Payload::Dashboard(_) => PayloadKind::Dashboard,
            Payload::Experiment(_) => PayloadKind::Experiment,
            Payload::FeatureTable(_) => PayloadKind::FeatureTable,
            Payload::Group(_) => PayloadKind::Group,
            Payload::Job(_) => PayloadKind::Job,
            Payload::Metric(_) => PayloadKind::Metric,
            Payload::Model(_) => PayloadKind::Model,
            Payload::Table(_) => PayloadKind::Table,
            Payload::Topic(_) => PayloadKind::Topic,
            Payload::User(_) => PayloadKind::User,
        }
    }

    pub fn type_url(&self) -> &'static str {
        self.kind().type_url()
    }
}

impl Described for Payload {
    fn shape() -> Shape {
        Shape::Envelope
    }
}

/// Discriminant of [`Payload`], usable without a payload instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PayloadKind {
    Application,
    Bucket,
    Dashboard,
    Experiment,
    FeatureTable,
    Group,
    Job,
    Metric,
    Model,
    Table,
    Topic,
    User,
}

impl PayloadKind {
    pub const ALL: [PayloadKind; 12] = [
        PayloadKind::Application,
        PayloadKind::Bucket,
        PayloadKind::Dashboard,
        PayloadKind::Experiment,
        PayloadKind::FeatureTable,
        PayloadKind::Group,
        PayloadKind::Job,
        PayloadKind::Metric,
        PayloadKind::Model,
        PayloadKind::Table,
        PayloadKind::Topic,
        PayloadKind::User,
    ];

    /// The operator-facing name used by `new_asset`.
    pub fn short_name(self) -> &'static str {
        match self {
            PayloadKind::Application => "application",
            PayloadKind::Bucket => "bucket",
            PayloadKind::Dashboard => "dashboard",
            PayloadKind::Experiment => "experiment",
            PayloadKind::FeatureTable => "feature_table",
            PayloadKind::Group => "group",
            PayloadKind::Job => "job",
            PayloadKind::Metric => "metric",
            PayloadKind::Model => "model",
            PayloadKind::Table => "table",
            PayloadKind::Topic => "topic",
            PayloadKind::User => "user",
        }
    }

    pub fn type_url(self) -> &'static str {
        match self {
            PayloadKind::Application => "type.googleapis.com/harvest.assets.v1.Application",
            PayloadKind::Bucket => "type.googleapis.com/harvest.assets.v1.Bucket",
            PayloadKind::Dashboard => "type.googleapis.com/harvest.assets.v1.Dashboard",
            PayloadKind::Experiment => "type.googleapis.com/harvest.assets.v1.Experiment",
            PayloadKind::FeatureTable => "type.googleapis.com/harvest.assets.v1.FeatureTable",
            PayloadKind::Group => "type.googleapis.com/harvest.assets.v1.Group",
            PayloadKind::Job => "type.googleapis.com/harvest.assets.v1.Job",
            PayloadKind::Metric => "type.googleapis.com/harvest.assets.v1.Metric",
            PayloadKind::Model => "type.googleapis.com/harvest.assets.v1.Model",
            PayloadKind::Table => "type.googleapis.com/harvest.assets.v1.Table",
            PayloadKind::Topic => "type.googleapis.com/harvest.assets.v1.Topic",
            PayloadKind::User => "type.googleapis.com/harvest.assets.v1.User",
        }
    }

    /// A payload of this kind with every field unset.
    pub fn zero(self) -> Payload {
        match self {
            PayloadKind::Application => Payload::Application(Default::default()),
            PayloadKind::Bucket => Payload::Bucket(Default::default()),
            PayloadKind::Dashboard => Payload::Dashboard(Default::default()),
            PayloadKind::Experiment => Payload::Experiment(Default::default()),
            PayloadKind::FeatureTable => Payload::FeatureTable(Default::default()),
            PayloadKind::Group => Payload::Group(Default::default()),
            PayloadKind::Job => Payload::Job(Default::default()),
            PayloadKind::Metric => Payload::Metric(Default::default()),
            PayloadKind::Model => Payload::Model(Default::default()),
            PayloadKind::Table => Payload::Table(Default::default()),
            PayloadKind::Topic => Payload::Topic(Default::default()),
            PayloadKind::User => Payload::User(Default::default()),
        }
    }

    /// Shape of this kind's schema, without the type tag.
    pub fn shape(self) -> Shape {
        match self {
            PayloadKind::Application => Application::shape(),
            PayloadKind::Bucket => Bucket::shape(),
            PayloadKind::Dashboard => Dashboard::shape(),
            PayloadKind::Experiment => Experiment::shape(),
            PayloadKind::FeatureTable => FeatureTable::shape(),
            PayloadKind::Group => Group::shape(),
            PayloadKind::Job => Job::shape(),
            PayloadKind::Metric => Metric::shape(),
            PayloadKind::Model => Model::shape(),
            PayloadKind::Table => Table::shape(),
            PayloadKind::Topic => Topic::shape(),
            PayloadKind::User => User::shape(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_tag_matches_kind_type_url() {
        for kind in PayloadKind::ALL {
            let json = serde_json::to_value(kind.zero()).unwrap();
            assert_eq!(
                json,
                serde_json::json!({ "@type": kind.type_url() }),
                "{kind:?}"
            );
            assert!(kind.type_url().starts_with(TYPE_URL_PREFIX));
            assert_eq!(kind.zero().kind(), kind);
        }
    }

    #[test]
    fn deserializes_by_tag() {
        let payload: Payload = serde_json::from_value(serde_json::json!({
            "@type": "type.googleapis.com/harvest.assets.v1.User",
            "email": "ada@example.com",
        }))
        .unwrap();

        let Payload::User(user) = payload else {
            panic!("expected user payload");
        };
        assert_eq!(user.email, "ada@example.com");
    }

    #[test]
    fn unknown_tag_fails() {
        let result: Result<Payload, _> = serde_json::from_value(serde_json::json!({
            "@type": "type.googleapis.com/harvest.assets.v1.Nope",
        }));
        assert!(result.is_err());
    }
}
