use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// County and state as read off the form for a single submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub county: String,
    pub state: String,
    pub api_key: Option<String>,
}

/// JSON body returned by the county data API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultPayload {
    pub area: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub data: Vec<Observation>,
}

/// One month of a county series. Only `date` and `unemployed_rate` are
/// required; the rest ride along into the chart data untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: String,
    pub unemployed_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month_abbrev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub civ_labor_force: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unemployed: Option<u64>,
}

/// A cleaned row of the BLS LAUS county table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyMonth {
    pub laus_area_code: String,
    pub fips_state: String,
    pub fips_county: String,
    pub area: String,
    pub county: String,
    pub state: String,
    pub month_name: String,
    pub month: u32,
    pub year: i32,
    pub date: NaiveDate,
    pub civ_labor_force: u64,
    pub employed: u64,
    pub unemployed: u64,
    pub unemployed_rate: f64,
}

impl From<&CountyMonth> for Observation {
    fn from(row: &CountyMonth) -> Self {
        Observation {
            date: row.date.format("%Y-%m-%d").to_string(),
            unemployed_rate: row.unemployed_rate,
            month_abbrev: Some(row.month_name.clone()),
            month: Some(row.month),
            year: Some(row.year),
            civ_labor_force: Some(row.civ_labor_force),
            employed: Some(row.employed),
            unemployed: Some(row.unemployed),
        }
    }
}

impl SearchResultPayload {
    /// Builds the API payload for one county's rows. Returns `None` when
    /// there is nothing to report.
    pub fn from_rows(rows: &[CountyMonth]) -> Option<Self> {
        let first = rows.first()?;
        Some(SearchResultPayload {
            area: first.area.clone(),
            county: Some(first.county.clone()),
            state: Some(first.state.clone()),
            data: rows.iter().map(Observation::from).collect(),
        })
    }
}
