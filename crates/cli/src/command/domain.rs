use drilldown_protocol::{CommandAction, CommandStatus, ErrorCode, ErrorEnvelope, NavOp, PageRequest};
use drilldown_suggest::SuggestionOption;
use drilldown_tree::{Node, Path, RecordPage, SeriesPoint, TreeError, TreeSource};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub action: CommandAction,
    #[serde(default = "empty_payload")]
    pub payload: Value,
}

fn empty_payload() -> Value {
    Value::Object(Default::default())
}

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub status: CommandStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorEnvelope>,
    #[serde(default)]
    pub data: Value,
    pub meta: ResponseMeta,
}

impl CommandResponse {
    pub fn ok(data: Value, meta: ResponseMeta) -> Self {
        Self {
            status: CommandStatus::Ok,
            message: None,
            error: None,
            data,
            meta,
        }
    }

    pub fn error(envelope: ErrorEnvelope, meta: ResponseMeta) -> Self {
        Self {
            status: CommandStatus::Error,
            message: Some(envelope.message.clone()),
            error: Some(envelope),
            data: Value::Null,
            meta,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.status, CommandStatus::Error)
    }
}

#[derive(Debug, Serialize, Default, Clone)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<CommandAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct BuildPayload {
    pub source: TreeSource,
}

#[derive(Debug, Serialize)]
pub struct BuildOutput {
    pub title: String,
    pub nodes: usize,
    pub depth: usize,
    pub tree: Node,
}

#[derive(Debug, Deserialize)]
pub struct NavigatePayload {
    pub source: TreeSource,
    /// Replayed as descends from the root
    #[serde(default)]
    pub path: Path,
    #[serde(default)]
    pub ops: Vec<NavOp>,
    #[serde(default)]
    pub records: Option<PageRequest>,
}

#[derive(Debug, Serialize)]
pub struct NavigateOutput {
    pub path: Path,
    pub breadcrumbs: Vec<String>,
    pub series: Vec<SeriesPoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<RecordPage>,
}

#[derive(Debug, Deserialize)]
pub struct SuggestPayload {
    pub options: Vec<OptionEntry>,
    /// Free text, or anything else (a committed selection, null) to keep `previous`
    #[serde(default)]
    pub query: Value,
    #[serde(default)]
    pub previous: Vec<OptionEntry>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Options may be given as bare strings (value = text) or `{text, value}` objects
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OptionEntry {
    Text(String),
    Full(SuggestionOption<Value>),
}

impl From<OptionEntry> for SuggestionOption<Value> {
    fn from(entry: OptionEntry) -> Self {
        match entry {
            OptionEntry::Text(text) => SuggestionOption {
                value: Value::String(text.clone()),
                text,
            },
            OptionEntry::Full(option) => option,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SuggestOutput {
    pub suggestions: Vec<SuggestionOption<Value>>,
    pub total: usize,
    pub truncated: bool,
    /// False when the query was not free text and `previous` was echoed back
    pub ranked: bool,
}

pub fn classify_error(err: &anyhow::Error, profile: Option<&str>) -> ErrorEnvelope {
    if let Some(tree_err) = err.downcast_ref::<TreeError>() {
        let profile = profile.unwrap_or("default");
        return ErrorEnvelope {
            code: ErrorCode::NoData,
            message: format!("No data available: {tree_err}"),
            hint: Some(format!(
                "Check the payload shape against the field names of profile '{profile}'."
            )),
        };
    }
    if err.downcast_ref::<serde_json::Error>().is_some() {
        return ErrorEnvelope {
            code: ErrorCode::InvalidRequest,
            message: format!("{err:#}"),
            hint: Some("See `capabilities` for the supported actions.".to_string()),
        };
    }
    ErrorEnvelope {
        code: ErrorCode::Internal,
        message: format!("{err:#}"),
        hint: None,
    }
}
