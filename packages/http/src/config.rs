use std::collections::BTreeMap;
use std::time::Duration;

use harvest_script::ScriptConfig;
use harvest_value::{Described, Field, Shape};
use serde::{Deserialize, Serialize};

/// Configuration for [`HttpSink`](crate::HttpSink).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpSinkConfig {
    /// Destination URL; may reference `{{ .Urn }}`, `{{ .Type }}`,
    /// `{{ .Name }}`, `{{ .Service }}` and `{{ .Url }}`.
    pub url: String,

    #[serde(default = "default_method")]
    pub method: String,

    /// Extra headers. A comma in a value sends the header once per part.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    #[serde(default = "default_success_code")]
    pub success_code: u16,

    #[serde(default = "default_timeout", with = "harvest_value::duration")]
    pub timeout: Duration,

    /// Shapes the payload; the script calls `sink(map)` to send.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<ScriptConfig>,
}

fn default_method() -> String {
    "POST".to_string()
}

fn default_success_code() -> u16 {
    200
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

impl HttpSinkConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: default_method(),
            headers: BTreeMap::new(),
            success_code: default_success_code(),
            timeout: default_timeout(),
            script: None,
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_script(mut self, script: ScriptConfig) -> Self {
        self.script = Some(script);
        self
    }
}

impl Described for HttpSinkConfig {
    fn shape() -> Shape {
        Shape::record(
            "HttpSinkConfig",
            vec![
                Field::of::<String>("url"),
                Field::of::<String>("method"),
                Field::of::<BTreeMap<String, String>>("headers"),
                Field::of::<u16>("success_code"),
                Field::of::<Duration>("timeout"),
                Field::of::<Option<ScriptConfig>>("script"),
            ],
        )
    }
}
