//! Turns a search result into a Vega-Lite line chart and hands it to whatever
//! is drawing charts. Drawing itself belongs to vega-embed.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;

use crate::structures::{Observation, SearchResultPayload};

pub const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// Numeric field plotted on the y axis.
pub const MEASURE_FIELD: &str = "unemployed_rate";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    #[serde(rename = "$schema")]
    pub schema: &'static str,
    pub description: String,
    pub title: String,
    pub data: ChartData,
    pub mark: &'static str,
    pub encoding: Encoding,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub values: Vec<Observation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Encoding {
    pub x: FieldDef,
    pub y: FieldDef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDef {
    pub field: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "timeUnit", skip_serializing_if = "Option::is_none")]
    pub time_unit: Option<&'static str>,
}

/// Stateless: every call builds a fresh spec from the payload alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResultRenderer;

impl ResultRenderer {
    pub fn render(&self, payload: &SearchResultPayload) -> ChartSpec {
        ChartSpec {
            schema: VEGA_LITE_SCHEMA,
            description: format!("Unemployment rate: {}", payload.area),
            title: payload.area.clone(),
            data: ChartData {
                values: payload.data.clone(),
            },
            mark: "line",
            encoding: Encoding {
                x: FieldDef {
                    field: "date",
                    kind: "temporal",
                    time_unit: Some("yearmonth"),
                },
                y: FieldDef {
                    field: MEASURE_FIELD,
                    kind: "quantitative",
                    time_unit: None,
                },
            },
        }
    }
}

/// Something that can put a chart, or an error message in place of one, into
/// a container named by a selector.
#[async_trait]
pub trait ChartTarget: Send + Sync {
    async fn embed(&self, selector: &str, spec: &ChartSpec) -> anyhow::Result<()>;
    async fn show_error(&self, selector: &str, message: &str) -> anyhow::Result<()>;
}

/// Writes a self-contained HTML page that loads vega-embed from the CDN and
/// draws the spec into the container. Every call overwrites the page.
#[derive(Debug, Clone)]
pub struct HtmlPageTarget {
    path: PathBuf,
}

impl HtmlPageTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        HtmlPageTarget { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn write(&self, body: String) -> anyhow::Result<()> {
        tokio::fs::write(&self.path, body).await?;
        log::info!("Wrote {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl ChartTarget for HtmlPageTarget {
    async fn embed(&self, selector: &str, spec: &ChartSpec) -> anyhow::Result<()> {
        let spec_json = serde_json::to_string(spec)?;
        let script = format!(
            "vegaEmbed({}, {});",
            serde_json::to_string(selector)?,
            // keep a literal "</script>" in the data from closing the tag
            spec_json.replace("</", "<\\/")
        );
        self.write(page(selector, &script, "")).await
    }

    async fn show_error(&self, selector: &str, message: &str) -> anyhow::Result<()> {
        let notice = format!("<p class=\"error\">{}</p>", escape_html(message));
        self.write(page(selector, "", &notice)).await
    }
}

fn page(selector: &str, script: &str, inner: &str) -> String {
    let id = selector.trim_start_matches('#');
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>County unemployment</title>
  <script src="https://cdn.jsdelivr.net/npm/vega@5"></script>
  <script src="https://cdn.jsdelivr.net/npm/vega-lite@5"></script>
  <script src="https://cdn.jsdelivr.net/npm/vega-embed@6"></script>
</head>
<body>
  <div id="{id}">{inner}</div>
  <script>{script}</script>
</body>
</html>
"#,
        id = escape_html(id),
        inner = inner,
        script = script
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
