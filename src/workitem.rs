//! Workitem model for the engine's participant protocol.
//!
//! The engine ships workitems as JSON. Only a handful of keys matter to the
//! participant core (`debug_trace`, `debug_dump`, `ev.id`, `project`, and the
//! invocation `params`); everything else is carried through untouched so a
//! reply round-trips the engine's data.
//!
//! Flags use the engine's loose truthiness: `null`, `false`, `0`, `""`, `[]`
//! and `{}` are false, everything else is true. A missing key is simply
//! false, never an error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field written by handlers to hand a result back to the engine.
pub const RESULT_FIELD: &str = "__result__";

/// Field written by handlers to report a failure to the engine.
pub const ERROR_FIELD: &str = "__error__";

/// Identifies the flow expression a workitem belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowExpressionId {
    /// Workflow instance id.
    #[serde(default)]
    pub wfid: String,
    /// Expression id within the process tree (e.g. `0_1_0`).
    #[serde(default)]
    pub expid: String,
    /// Sub-instance id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subid: Option<String>,
    /// Engine that issued the workitem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_id: Option<String>,
}

impl std::fmt::Display for FlowExpressionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}!{}", self.wfid, self.expid)
    }
}

/// A unit of work dispatched by the engine to a participant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Flow expression id, absent in hand-built workitems.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fei: Option<FlowExpressionId>,
    /// Name of the participant the engine addressed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_name: Option<String>,
    /// Workflow fields, including the invocation params.
    #[serde(default)]
    pub fields: Fields,
    /// Any other top-level keys, preserved for the reply.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkItem {
    /// Parse a workitem from its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when `raw` is not a valid workitem document.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Invocation parameters (`fields.params` on the wire).
    pub fn params(&self) -> &Params {
        &self.fields.params
    }

    /// Mutable access to the invocation parameters.
    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.fields.params
    }

    /// Whether a one-line summary should be logged on consume.
    pub fn debug_trace(&self) -> bool {
        self.fields.debug_trace()
    }

    /// Whether the full dump should be logged on consume.
    pub fn debug_dump(&self) -> bool {
        self.fields.debug_dump() || self.fields.params.debug_dump()
    }

    /// Full pretty-printed rendering of the workitem.
    pub fn dump(&self) -> String {
        serde_json::to_string_pretty(self)
            .unwrap_or_else(|e| format!("<unprintable workitem: {e}>"))
    }

    /// Record a result for the engine in `fields.__result__`.
    pub fn set_result(&mut self, value: impl Into<Value>) {
        self.fields.extra.insert(RESULT_FIELD.to_owned(), value.into());
    }

    /// Record a failure for the engine in `fields.__error__`.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.fields
            .extra
            .insert(ERROR_FIELD.to_owned(), Value::String(message.into()));
    }

    /// Result previously recorded with [`WorkItem::set_result`].
    pub fn result(&self) -> Option<&Value> {
        self.fields.extra.get(RESULT_FIELD)
    }

    /// Error previously recorded with [`WorkItem::set_error`].
    pub fn error(&self) -> Option<&str> {
        self.fields.extra.get(ERROR_FIELD).and_then(Value::as_str)
    }
}

/// Workflow fields carried by a workitem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fields {
    /// Log a summary line when the workitem is consumed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_trace: Option<Value>,
    /// Log the whole workitem when it is consumed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_dump: Option<Value>,
    /// Triggering event, if the workflow was started by one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev: Option<Event>,
    /// Project the workflow runs for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<Value>,
    /// Parameters of the participant expression.
    #[serde(default, skip_serializing_if = "Params::is_empty")]
    pub params: Params,
    /// Remaining workflow fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Fields {
    /// Truthiness of `debug_trace`.
    pub fn debug_trace(&self) -> bool {
        self.debug_trace.as_ref().is_some_and(truthy)
    }

    /// Truthiness of `debug_dump`.
    pub fn debug_dump(&self) -> bool {
        self.debug_dump.as_ref().is_some_and(truthy)
    }

    /// Event id when an event is present and its id is truthy.
    pub fn event_id(&self) -> Option<&Value> {
        self.ev
            .as_ref()
            .and_then(|ev| ev.id.as_ref())
            .filter(|id| truthy(id))
    }

    /// Project when it is truthy.
    pub fn project(&self) -> Option<&Value> {
        self.project.as_ref().filter(|p| truthy(p))
    }

    /// Look up any other field by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

/// Event that triggered the workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Remaining event attributes.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Insertion-ordered participant parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(Map<String, Value>);

impl Params {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Truthiness of the `debug_dump` parameter.
    pub fn debug_dump(&self) -> bool {
        self.0.get("debug_dump").is_some_and(truthy)
    }

    /// Look up a parameter.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a parameter, keeping the original position when it already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Engine truthiness of a JSON value.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
