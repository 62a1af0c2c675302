//! The submit handler: reads the form, queries the county data API and passes
//! the result on to the renderer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fnv::FnvHashMap;
use tokio::task::JoinHandle;
use url::Url;

use crate::error::{Result, SearchError};
use crate::render::{ChartSpec, ChartTarget, ResultRenderer};
use crate::structures::{SearchQuery, SearchResultPayload};

/// Endpoint and optional API key, fixed for the lifetime of a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    endpoint: Url,
    api_key: Option<String>,
}

impl SearchConfig {
    pub fn new(endpoint: &str, api_key: Option<String>) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|source| SearchError::InvalidEndpoint {
            url: endpoint.to_string(),
            source,
        })?;
        Ok(SearchConfig { endpoint, api_key })
    }

    /// Resolves a possibly relative `endpoint` against `base`, the way a page
    /// resolves a relative link against its own address.
    pub fn with_base(base: &Url, endpoint: &str, api_key: Option<String>) -> Result<Self> {
        let endpoint = base
            .join(endpoint)
            .map_err(|source| SearchError::InvalidEndpoint {
                url: endpoint.to_string(),
                source,
            })?;
        Ok(SearchConfig { endpoint, api_key })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Copies the endpoint and sets `county`, `state` and, only when a key is
    /// configured, `key`. Parameters already on the endpoint under those names
    /// are replaced; anything else is kept.
    pub fn query_url(&self, query: &SearchQuery) -> Url {
        let mut url = self.endpoint.clone();
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| !matches!(&**k, "county" | "state" | "key"))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            pairs.extend_pairs(kept);
            pairs.append_pair("county", &query.county);
            pairs.append_pair("state", &query.state);
            if let Some(key) = query.api_key.as_deref() {
                pairs.append_pair("key", key);
            }
        }
        url
    }
}

/// Stand-in for the browser's submit event.
#[derive(Debug, Default)]
pub struct SubmitEvent {
    default_prevented: bool,
}

impl SubmitEvent {
    pub fn new() -> Self {
        SubmitEvent::default()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Read access to the current value of a form input.
pub trait FormFields: Send + Sync {
    fn value(&self, selector: &str) -> Option<String>;
}

/// A form whose field values are fixed up front.
#[derive(Debug, Default, Clone)]
pub struct StaticForm {
    fields: FnvHashMap<String, String>,
}

impl StaticForm {
    pub fn new() -> Self {
        StaticForm::default()
    }

    pub fn with(mut self, selector: &str, value: &str) -> Self {
        self.fields.insert(selector.to_string(), value.to_string());
        self
    }
}

impl FormFields for StaticForm {
    fn value(&self, selector: &str) -> Option<String> {
        self.fields.get(selector).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectors {
    pub county: String,
    pub state: String,
    pub container: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Selectors {
            county: "#county".into(),
            state: "#state".into(),
            container: "#vis".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// One GET per call, no retries.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &Url) -> Result<FetchResponse>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpFetcher { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &Url) -> Result<FetchResponse> {
        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();
        Ok(FetchResponse { status, body })
    }
}

/// What a successful submission drew.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub url: Url,
    pub spec: ChartSpec,
}

pub struct SearchSubmitHandler {
    config: SearchConfig,
    selectors: Selectors,
    fetcher: Arc<dyn Fetcher>,
    target: Arc<dyn ChartTarget>,
    renderer: ResultRenderer,
}

impl SearchSubmitHandler {
    pub fn configure(
        config: SearchConfig,
        selectors: Selectors,
        fetcher: Arc<dyn Fetcher>,
        target: Arc<dyn ChartTarget>,
    ) -> Arc<Self> {
        Arc::new(SearchSubmitHandler {
            config,
            selectors,
            fetcher,
            target,
            renderer: ResultRenderer,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Suppresses the default action, then spawns the rest of the submission
    /// as its own task. Nothing is deduplicated or cancelled: overlapping
    /// submissions race, and the last render wins.
    pub fn dispatch(
        self: &Arc<Self>,
        event: &mut SubmitEvent,
        form: Arc<dyn FormFields>,
    ) -> JoinHandle<Result<RenderOutcome>> {
        event.prevent_default();
        let handler = Arc::clone(self);
        tokio::spawn(async move { handler.run(form.as_ref()).await })
    }

    /// Runs one submission to completion on the current task.
    pub async fn handle_submit(
        &self,
        event: &mut SubmitEvent,
        form: &dyn FormFields,
    ) -> Result<RenderOutcome> {
        event.prevent_default();
        self.run(form).await
    }

    /// On failure the error is drawn into the container as well as returned.
    async fn run(&self, form: &dyn FormFields) -> Result<RenderOutcome> {
        match self.submit(form).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                log::warn!("Search failed: {}", e);
                if let Err(shown) = self
                    .target
                    .show_error(&self.selectors.container, &e.to_string())
                    .await
                {
                    log::error!("Could not display error: {:?}", shown);
                }
                Err(e)
            }
        }
    }

    pub fn read_query(&self, form: &dyn FormFields) -> Result<SearchQuery> {
        let county = read_field(form, &self.selectors.county, "county")?;
        let state = read_field(form, &self.selectors.state, "state")?;
        log::info!("{}, {}", county, state);
        Ok(SearchQuery {
            county,
            state,
            api_key: self.config.api_key.clone(),
        })
    }

    async fn submit(&self, form: &dyn FormFields) -> Result<RenderOutcome> {
        let query = self.read_query(form)?;
        let url = self.config.query_url(&query);
        log::info!("Querying {}", redact_key(&url));

        let resp = self.fetcher.get(&url).await?;
        if !(200..300).contains(&resp.status) {
            return Err(SearchError::Status {
                status: resp.status,
                body: String::from_utf8_lossy(&resp.body).trim().to_string(),
            });
        }
        let payload: SearchResultPayload = serde_json::from_slice(&resp.body)?;
        log::info!(
            "Got {} observations for {}",
            payload.data.len(),
            payload.area
        );

        let spec = self.renderer.render(&payload);
        self.target
            .embed(&self.selectors.container, &spec)
            .await
            .map_err(|e| SearchError::Target {
                selector: self.selectors.container.clone(),
                message: e.to_string(),
            })?;
        Ok(RenderOutcome { url, spec })
    }
}

fn read_field(form: &dyn FormFields, selector: &str, name: &'static str) -> Result<String> {
    form.value(selector)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(SearchError::MissingField(name))
}

/// The URL with any `key` value masked, for logging.
pub fn redact_key(url: &Url) -> String {
    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "key" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    shown.query_pairs_mut().clear().extend_pairs(pairs);
    shown.to_string()
}
