pub mod api;
pub mod bls;
pub mod error;
pub mod render;
pub mod search;
pub mod settings;
pub mod store;
pub mod structures;

pub use error::SearchError;
pub use render::{ChartSpec, ChartTarget, HtmlPageTarget, ResultRenderer};
pub use search::{
    FormFields, HttpFetcher, SearchConfig, SearchSubmitHandler, Selectors, StaticForm,
    SubmitEvent,
};
pub use settings::Settings;
pub use structures::{CountyMonth, Observation, SearchQuery, SearchResultPayload};
