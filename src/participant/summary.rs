//! One-line workitem summary for `debug_trace` logging.

use serde_json::Value;

use crate::workitem::WorkItem;

/// Params that only add noise to the trace line.
const SKIPPED_PARAMS: [&str; 2] = ["participant_options", "if"];

/// Summarise a workitem as e.g. `Taking workitem #42 for acme: worker1 timeout=30`.
///
/// Params keep their insertion order. `ref` is dropped when the participant
/// name is known, since it normally repeats it.
pub fn workitem_summary(workitem: &WorkItem) -> String {
    let mut head = vec!["Taking workitem".to_owned()];
    if let Some(id) = workitem.fields.event_id() {
        head.push(format!("#{}", plain(id)));
    }
    if let Some(project) = workitem.fields.project() {
        head.push(format!("for {}", plain(project)));
    }

    let name = workitem
        .participant_name
        .as_deref()
        .filter(|name| !name.is_empty());

    let mut parts = vec![format!("{}:", head.join(" "))];
    if let Some(name) = name {
        parts.push(name.to_owned());
    }

    for (key, value) in workitem.params().iter() {
        if SKIPPED_PARAMS.contains(&key.as_str()) {
            continue;
        }
        if key == "ref" && name.is_some() {
            continue;
        }
        parts.push(format!("{key}={value}"));
    }

    parts.join(" ")
}

/// Strings render bare, everything else as JSON.
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
