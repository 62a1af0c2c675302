use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use county_search::error::Result;
use county_search::search::{FetchResponse, Fetcher, FormFields};
use county_search::{
    ChartSpec, ChartTarget, SearchConfig, SearchError, SearchSubmitHandler, Selectors,
    StaticForm, SubmitEvent,
};
use url::Url;

/// Answers every GET with a canned status and body, after an optional delay
/// chosen by the `county` parameter.
struct StubFetcher {
    status: u16,
    body: Option<String>,
    fail: bool,
    slow_county: Option<(String, Duration)>,
    seen: Mutex<Vec<Url>>,
}

impl StubFetcher {
    fn ok() -> Self {
        StubFetcher {
            status: 200,
            body: None,
            fail: false,
            slow_county: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    fn last_url(&self) -> Url {
        self.seen.lock().unwrap().last().cloned().unwrap()
    }
}

fn param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn get(&self, url: &Url) -> Result<FetchResponse> {
        self.seen.lock().unwrap().push(url.clone());
        let county = param(url, "county").unwrap_or_default();
        let state = param(url, "state").unwrap_or_default();
        if let Some((slow, delay)) = &self.slow_county {
            if *slow == county {
                tokio::time::sleep(*delay).await;
            }
        }
        if self.fail {
            return Err(SearchError::Network("connection refused".into()));
        }
        let body = self.body.clone().unwrap_or_else(|| {
            format!(
                r#"{{"area": "{}, {}", "data": [
                    {{"date": "2020-01", "unemployed_rate": 4.2}},
                    {{"date": "2020-02", "unemployed_rate": 5.1}}]}}"#,
                county, state
            )
        });
        Ok(FetchResponse {
            status: self.status,
            body: body.into_bytes(),
        })
    }
}

/// Keeps whatever is currently drawn in each container.
#[derive(Default)]
struct RecordingTarget {
    renders: AtomicUsize,
    errors: Mutex<Vec<String>>,
    drawn: Mutex<Option<(String, ChartSpec)>>,
}

#[async_trait]
impl ChartTarget for RecordingTarget {
    async fn embed(&self, selector: &str, spec: &ChartSpec) -> anyhow::Result<()> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        *self.drawn.lock().unwrap() = Some((selector.to_string(), spec.clone()));
        Ok(())
    }

    async fn show_error(&self, _selector: &str, message: &str) -> anyhow::Result<()> {
        self.errors.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

fn setup(
    fetcher: StubFetcher,
    key: Option<&str>,
) -> (Arc<SearchSubmitHandler>, Arc<StubFetcher>, Arc<RecordingTarget>) {
    let fetcher = Arc::new(fetcher);
    let target = Arc::new(RecordingTarget::default());
    let config = SearchConfig::new("https://bls.example.org/county", key.map(String::from)).unwrap();
    let handler = SearchSubmitHandler::configure(
        config,
        Selectors::default(),
        fetcher.clone(),
        target.clone(),
    );
    (handler, fetcher, target)
}

fn form(county: &str, state: &str) -> StaticForm {
    StaticForm::new()
        .with("#county", county)
        .with("#state", state)
}

#[tokio::test]
async fn submission_renders_the_payload() {
    let (handler, fetcher, target) = setup(StubFetcher::ok(), None);
    let mut event = SubmitEvent::new();

    let outcome = handler
        .handle_submit(&mut event, &form("Travis County", "TX"))
        .await
        .unwrap();

    assert!(event.default_prevented());
    assert_eq!(fetcher.calls(), 1);
    let url = fetcher.last_url();
    assert_eq!(param(&url, "county").as_deref(), Some("Travis County"));
    assert_eq!(param(&url, "state").as_deref(), Some("TX"));
    assert_eq!(param(&url, "key"), None);
    assert_eq!(url, outcome.url);

    assert_eq!(target.renders.load(Ordering::SeqCst), 1);
    let (selector, spec) = target.drawn.lock().unwrap().clone().unwrap();
    assert_eq!(selector, "#vis");
    assert_eq!(spec.encoding.y.field, "unemployed_rate");
    assert!(spec.description.contains("Travis County, TX"));
    assert!(target.errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn configured_key_is_sent() {
    let (handler, fetcher, _) = setup(StubFetcher::ok(), Some("k-123"));
    handler
        .handle_submit(&mut SubmitEvent::new(), &form("Cook County", "IL"))
        .await
        .unwrap();
    assert_eq!(param(&fetcher.last_url(), "key").as_deref(), Some("k-123"));
}

#[tokio::test]
async fn empty_fields_never_fetch() {
    let (handler, fetcher, target) = setup(StubFetcher::ok(), None);

    for (county, state, missing) in [("", "TX", "county"), ("Travis County", " ", "state")] {
        let mut event = SubmitEvent::new();
        let err = handler
            .handle_submit(&mut event, &form(county, state))
            .await
            .unwrap_err();
        assert!(event.default_prevented());
        assert!(matches!(err, SearchError::MissingField(f) if f == missing));
    }
    let err = handler
        .handle_submit(&mut SubmitEvent::new(), &StaticForm::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::MissingField("county")));

    assert_eq!(fetcher.calls(), 0);
    assert_eq!(target.renders.load(Ordering::SeqCst), 0);
    assert_eq!(target.errors.lock().unwrap().len(), 3);
    assert_eq!(target.errors.lock().unwrap()[0], "please enter a county");
}

#[tokio::test]
async fn error_status_is_surfaced() {
    let fetcher = StubFetcher {
        status: 404,
        body: Some("No unemployment data for Nowhere, ZZ".into()),
        ..StubFetcher::ok()
    };
    let (handler, _, target) = setup(fetcher, None);
    let err = handler
        .handle_submit(&mut SubmitEvent::new(), &form("Nowhere", "ZZ"))
        .await
        .unwrap_err();
    match err {
        SearchError::Status { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("Nowhere"));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(target.renders.load(Ordering::SeqCst), 0);
    assert!(target.errors.lock().unwrap()[0].contains("404"));
}

#[tokio::test]
async fn malformed_body_is_surfaced() {
    let fetcher = StubFetcher {
        body: Some("<html>oops</html>".into()),
        ..StubFetcher::ok()
    };
    let (handler, _, target) = setup(fetcher, None);
    let err = handler
        .handle_submit(&mut SubmitEvent::new(), &form("Travis County", "TX"))
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::MalformedBody(_)));
    assert_eq!(target.errors.lock().unwrap().len(), 1);
    assert_eq!(target.renders.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn network_failure_is_surfaced() {
    let fetcher = StubFetcher {
        fail: true,
        ..StubFetcher::ok()
    };
    let (handler, _, target) = setup(fetcher, None);
    let err = handler
        .handle_submit(&mut SubmitEvent::new(), &form("Travis County", "TX"))
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Network(_)));
    assert!(target.errors.lock().unwrap()[0].contains("connection refused"));
}

#[tokio::test]
async fn a_failure_does_not_spoil_the_next_submission() {
    let (handler, fetcher, target) = setup(StubFetcher::ok(), None);
    assert!(handler
        .handle_submit(&mut SubmitEvent::new(), &form("", "TX"))
        .await
        .is_err());
    handler
        .handle_submit(&mut SubmitEvent::new(), &form("Travis County", "TX"))
        .await
        .unwrap();
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(target.renders.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rapid_submissions_race_and_last_render_wins() {
    let fetcher = StubFetcher {
        slow_county: Some(("Kent County".into(), Duration::from_millis(50))),
        ..StubFetcher::ok()
    };
    let (handler, fetcher, target) = setup(fetcher, None);

    let mut first = SubmitEvent::new();
    let mut second = SubmitEvent::new();
    let slow: Arc<dyn FormFields> = Arc::new(form("Kent County", "DE"));
    let fast: Arc<dyn FormFields> = Arc::new(form("Sussex County", "DE"));
    let tasks = vec![
        handler.dispatch(&mut first, slow),
        handler.dispatch(&mut second, fast),
    ];
    assert!(first.default_prevented() && second.default_prevented());

    let outcomes = futures::future::join_all(tasks).await;
    for outcome in outcomes {
        outcome.unwrap().unwrap();
    }

    assert_eq!(fetcher.calls(), 2);
    assert_eq!(target.renders.load(Ordering::SeqCst), 2);
    let (_, spec) = target.drawn.lock().unwrap().clone().unwrap();
    assert!(
        spec.title == "Kent County, DE" || spec.title == "Sussex County, DE",
        "unexpected chart {}",
        spec.title
    );
}
