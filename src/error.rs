use thiserror::Error;

/// Everything that can go wrong with a single form submission. None of these
/// outlive the submission that produced them.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("please enter a {0}")]
    MissingField(&'static str),

    #[error("invalid endpoint url {url:?}: {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request failed: {0}")]
    Network(String),

    #[error("server answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response was not a valid search result: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("could not draw into {selector}: {message}")]
    Target { selector: String, message: String },
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        SearchError::Network(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
