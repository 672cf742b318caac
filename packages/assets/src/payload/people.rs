//! Identity payloads.

use chrono::{DateTime, Utc};
use harvest_value::Attributes;

schema! {
    pub struct User {
        email: String,
        username: String,
        first_name: String,
        last_name: String,
        full_name: String,
        display_name: String,
        title: String,
        status: String,
        manager_email: String,
        profiles: Vec<Profile>,
        memberships: Vec<Membership>,
        attributes: Attributes,
        create_time: Option<DateTime<Utc>>,
        update_time: Option<DateTime<Utc>>,
    }
}

schema! {
    /// An account of a user on another platform.
    pub struct Profile {
        id: String,
        platform: String,
        url: String,
    }
}

schema! {
    pub struct Membership {
        group_urn: String,
        role: String,
    }
}

schema! {
    pub struct Group {
        email: String,
        members: Vec<Member>,
        attributes: Attributes,
        create_time: Option<DateTime<Utc>>,
        update_time: Option<DateTime<Utc>>,
    }
}

schema! {
    pub struct Member {
        urn: String,
        role: String,
    }
}
