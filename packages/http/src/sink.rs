use std::fmt;
use std::sync::Arc;

use harvest_assets::{Asset, Record};
use harvest_script::{CompiledScript, HostFunction, RunContext, RunOutcome, Sandbox};
use harvest_structmap::StructMap;
use harvest_value::Value;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::HeaderMap;
use tracing::{debug, info};
use url::Url;

use crate::config::HttpSinkConfig;
use crate::error::{Error, Result};
use crate::template::UrlTemplate;
use crate::transport::{BlockingTransport, Request, Transport};

/// Delivers records to an HTTP endpoint, one request per record or, with a
/// script, one request per `sink(map)` call.
///
/// # Example
///
/// ```ignore
/// use harvest_http::{HttpSink, HttpSinkConfig};
///
/// let config = HttpSinkConfig::new("https://catalog.example.com/{{ .Type }}/{{ .Urn }}")
///     .with_method("PUT")
///     .with_header("X-Other-Header", "value1, value2");
/// let sink = HttpSink::new(config, structmap)?;
/// sink.sink(&RunContext::background(), &records)?;
/// ```
pub struct HttpSink {
    config: HttpSinkConfig,
    template: UrlTemplate,
    structmap: Arc<StructMap>,
    delivery: Delivery,
    script: Option<CompiledScript>,
}

impl HttpSink {
    pub fn new(config: HttpSinkConfig, structmap: Arc<StructMap>) -> Result<Self> {
        let transport = BlockingTransport::new(config.timeout)?;
        Self::with_transport(config, structmap, Arc::new(transport))
    }

    /// Decode a raw config strictly, then build the sink.
    pub fn from_value(value: Value, structmap: Arc<StructMap>) -> Result<Self> {
        let config: HttpSinkConfig = structmap.as_struct(value)?;
        Self::new(config, structmap)
    }

    pub fn with_transport(
        config: HttpSinkConfig,
        structmap: Arc<StructMap>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let template = UrlTemplate::parse(&config.url)?;
        let method = http::Method::from_bytes(config.method.to_uppercase().as_bytes()).map_err(|_| {
            Error::InvalidMethod {
                method: config.method.clone(),
            }
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())?;
            if name == CONTENT_TYPE {
                headers.remove(CONTENT_TYPE);
            }
            for part in value.split(',') {
                headers.append(name.clone(), HeaderValue::from_str(part.trim())?);
            }
        }

        let script = match &config.script {
            Some(script) => {
                script.validate()?;
                Some(
                    Sandbox::new(script.source.as_str())
                        .named("http_sink")
                        .with_limits(script.limits())
                        .declare("asset")
                        .declare("sink")
                        .declare("exit")
                        .compile()?,
                )
            }
            None => None,
        };

        let delivery = Delivery {
            transport,
            method,
            headers,
            success_code: config.success_code,
        };
        Ok(Self {
            config,
            template,
            structmap,
            delivery,
            script,
        })
    }

    pub fn config(&self) -> &HttpSinkConfig {
        &self.config
    }

    /// Send every record in order, stopping at the first failure.
    pub fn sink(&self, ctx: &RunContext, records: &[Record]) -> Result<()> {
        for record in records {
            if let Some(reason) = ctx.err() {
                return Err(harvest_script::Error::Cancelled { reason }.into());
            }
            let asset = record.data();
            info!(urn = %asset.urn, "sinking record to http");
            self.send(ctx, asset)?;
            info!(urn = %asset.urn, "successfully sinked record to http");
        }
        Ok(())
    }

    fn send(&self, ctx: &RunContext, asset: &Asset) -> Result<()> {
        let url = self.template.render(asset);
        match &self.script {
            Some(script) => self.execute_script(ctx, script, url, asset),
            None => {
                let payload = self.structmap.as_value(asset)?;
                self.delivery.deliver(&url, serde_json::to_vec(&payload)?)
            }
        }
    }

    fn execute_script(&self, ctx: &RunContext, script: &CompiledScript, url: String, asset: &Asset) -> Result<()> {
        let mut run = script.clone_runnable()?;
        let asset_map = self.structmap.wrap(asset.clone()).as_map()?;
        run.set("asset", &asset_map)?;
        run.bind(self.delivery.sink_function(url))?;
        run.bind(HostFunction::exit())?;

        if run.run(ctx)? == RunOutcome::UserExited {
            debug!(urn = %asset.urn, "sink script exited early");
        }
        Ok(())
    }
}

impl fmt::Debug for HttpSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSink")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
struct Delivery {
    transport: Arc<dyn Transport>,
    method: http::Method,
    headers: HeaderMap,
    success_code: u16,
}

impl Delivery {
    fn deliver(&self, url: &str, body: Vec<u8>) -> Result<()> {
        let request = Request {
            method: self.method.clone(),
            url: Url::parse(url)?,
            headers: self.headers.clone(),
            body,
        };
        let response = self.transport.send(request)?;
        if response.status == self.success_code {
            return Ok(());
        }
        Err(Error::UnexpectedStatus {
            status: response.status,
            body: response.body,
        })
    }

    /// `sink(map)`: send the map as JSON to `url`.
    fn sink_function(&self, url: String) -> HostFunction {
        let delivery = self.clone();
        HostFunction::native("sink", move |args| {
            if args.len() != 1 {
                return Err(harvest_script::Error::runtime(
                    "sink",
                    format!("wrong number of arguments: expected 1, got {}", args.len()),
                ));
            }
            let payload = args.into_iter().next().unwrap_or_default();
            if !payload.is_map() {
                return Err(harvest_script::Error::runtime(
                    "sink",
                    format!("invalid argument type: expected map, found {}", payload.type_name()),
                ));
            }
            let body = serde_json::to_vec(&payload)
                .map_err(|e| harvest_script::Error::runtime("sink", format!("marshal payload: {e}")))?;
            delivery
                .deliver(&url, body)
                .map_err(|e| harvest_script::Error::runtime("sink", e.to_string()))?;
            Ok(Value::Null)
        })
    }
}
