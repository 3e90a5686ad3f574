//! Typed records decoded from the analysis service's line stream

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GeoError, Result};

/// One decoded stream record, tagged by stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "kebab-case")]
pub enum StreamEvent {
    /// Phase started; carries the id the service assigned to the session
    Initializing { session_id: Option<String> },

    /// A named backend operation is running
    Progress { operation: String },

    /// Intermediate citation graph while rankings are being gathered
    PartialResults { graph: Vec<RawCitationRecord> },

    /// Terminal success for the active phase
    Completed { payload: CompletedPayload },

    /// Terminal failure reported by the service
    Error { message: String },
}

/// Payload of a `completed` record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletedPayload {
    /// Phase 1: proposed keywords
    Keywords(Vec<String>),
    /// Phase 2: raw citation graph
    Graph(Vec<RawCitationRecord>),
    /// Neither `keywords` nor `graph` present; read as an empty result of the active phase
    Empty,
}

/// Company citation as reported by the service, before any merging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCitationRecord {
    /// Free-text company name, not normalized
    pub name: String,
    pub times_cited: u64,
    /// May contain duplicates
    pub urls: Vec<String>,
}

impl RawCitationRecord {
    pub fn new(name: impl Into<String>, times_cited: u64, urls: Vec<String>) -> Self {
        Self {
            name: name.into(),
            times_cited,
            urls,
        }
    }
}

/// Line shape on the wire: `{ stage, session_id?, data? }`
#[derive(Debug, Deserialize)]
struct WireRecord {
    stage: String,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    data: Value,
}

/// Citation entries arrive either flat or wrapped in a pickled `__dict__`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireCitation {
    Wrapped {
        #[serde(rename = "__dict__")]
        fields: CitationFields,
    },
    Flat(CitationFields),
}

#[derive(Debug, Deserialize)]
struct CitationFields {
    #[serde(alias = "company")]
    name: String,
    times_cited: u64,
    #[serde(default, rename = "relevantUrls", alias = "relevant_urls")]
    relevant_urls: Option<Vec<String>>,
}

impl From<WireCitation> for RawCitationRecord {
    fn from(wire: WireCitation) -> Self {
        let fields = match wire {
            WireCitation::Wrapped { fields } | WireCitation::Flat(fields) => fields,
        };
        RawCitationRecord {
            name: fields.name,
            times_cited: fields.times_cited,
            urls: fields.relevant_urls.unwrap_or_default(),
        }
    }
}

impl StreamEvent {
    /// Parse one non-blank line into a record
    pub fn parse_line(line: &str) -> Result<Self> {
        let wire: WireRecord = serde_json::from_str(line)
            .map_err(|e| GeoError::framing_line(line, format!("invalid JSON record: {e}")))?;
        Self::from_wire(wire).map_err(|err| match err {
            GeoError::Framing { line: None, reason } => GeoError::framing_line(line, reason),
            other => other,
        })
    }

    fn from_wire(wire: WireRecord) -> Result<Self> {
        let data = wire.data;
        match wire.stage.as_str() {
            "initializing" => Ok(StreamEvent::Initializing {
                session_id: wire.session_id,
            }),
            "progress" | "analysys" => Ok(StreamEvent::Progress {
                operation: operation_name(&data)?,
            }),
            "partial-results" | "gathering_results" => {
                match data.get("gather_results").and_then(|g| g.get("graph")) {
                    Some(graph) => Ok(StreamEvent::PartialResults {
                        graph: parse_graph(graph)?,
                    }),
                    // Other nodes of the ranking graph only report progress
                    None => Ok(StreamEvent::Progress {
                        operation: operation_name(&data)?,
                    }),
                }
            }
            "completed" => {
                let payload = if let Some(graph) = data.get("graph") {
                    CompletedPayload::Graph(parse_graph(graph)?)
                } else if let Some(keywords) = data.get("keywords") {
                    CompletedPayload::Keywords(parse_keywords(keywords)?)
                } else {
                    CompletedPayload::Empty
                };
                Ok(StreamEvent::Completed { payload })
            }
            "error" => Ok(StreamEvent::Error {
                message: match data {
                    Value::String(message) => message,
                    Value::Null => "analysis service reported an error".to_string(),
                    other => other.to_string(),
                },
            }),
            other => Err(GeoError::framing(format!("unrecognized stage tag '{other}'"))),
        }
    }

    /// Wire-level stage name, for logging
    pub fn stage_name(&self) -> &'static str {
        match self {
            StreamEvent::Initializing { .. } => "initializing",
            StreamEvent::Progress { .. } => "progress",
            StreamEvent::PartialResults { .. } => "partial-results",
            StreamEvent::Completed { .. } => "completed",
            StreamEvent::Error { .. } => "error",
        }
    }
}

/// Node updates are keyed by the node name: `{ "web_research": {...} }`
fn operation_name(data: &Value) -> Result<String> {
    match data {
        Value::Object(map) => map
            .keys()
            .next()
            .cloned()
            .ok_or_else(|| GeoError::framing("progress record without an operation name")),
        Value::String(name) if !name.is_empty() => Ok(name.clone()),
        _ => Err(GeoError::framing("progress record without an operation name")),
    }
}

fn parse_graph(value: &Value) -> Result<Vec<RawCitationRecord>> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    let entries: Vec<WireCitation> = serde_json::from_value(value.clone())
        .map_err(|e| GeoError::framing(format!("invalid citation graph: {e}")))?;
    Ok(entries.into_iter().map(RawCitationRecord::from).collect())
}

fn parse_keywords(value: &Value) -> Result<Vec<String>> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value.clone())
        .map_err(|e| GeoError::framing(format!("invalid keyword list: {e}")))
}
