use log::debug;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::document::{Document, NodeTasks, SingleTaskDocument, SlicedTaskDocument};
use crate::error::{EtaError, Result};

/// Parses strict JSON text and resolves which task document it is. A root
/// object carrying `completed` is a single task, anything else must have
/// `nodes`.
pub fn decode(strict_json: &str) -> Result<Document> {
    let value: Value =
        serde_json::from_str(strict_json).map_err(|err| EtaError::Syntax(err.to_string()))?;

    let mut root = match value {
        Value::Object(root) => root,
        other => {
            return Err(EtaError::Shape(format!(
                "expected an object at the root, found {}",
                kind_of(&other)
            )));
        }
    };

    if root.contains_key("completed") {
        // A finished task is reported as such whatever its body looks like.
        if root.get("completed") == Some(&Value::Bool(true)) {
            debug!("Decoded completed single task document");
            return Err(EtaError::AlreadyCompleted);
        }
        debug!("Decoded single task document");
        let doc: SingleTaskDocument = from_value(Value::Object(root), "task document")?;
        return Ok(Document::Single(doc));
    }

    let nodes = match root.remove("nodes") {
        Some(Value::Object(nodes)) => nodes,
        Some(other) => {
            return Err(EtaError::Shape(format!(
                "`nodes` must be an object, found {}",
                kind_of(&other)
            )));
        }
        None => {
            return Err(EtaError::Shape(
                "expected either `completed` and `task`, or `nodes`".into(),
            ));
        }
    };

    let doc = decode_nodes(nodes)?;
    debug!(
        "Decoded sliced task document: {} node(s), {} task(s)",
        doc.nodes.len(),
        doc.tasks().count()
    );
    Ok(Document::Sliced(doc))
}

fn decode_nodes(nodes: Map<String, Value>) -> Result<SlicedTaskDocument> {
    let mut decoded = Vec::with_capacity(nodes.len());
    for (node_id, node) in nodes {
        let Value::Object(mut node) = node else {
            return Err(EtaError::Shape(format!("node `{node_id}` must be an object")));
        };
        let tasks = match node.remove("tasks") {
            Some(Value::Object(tasks)) => tasks,
            _ => {
                return Err(EtaError::Shape(format!(
                    "node `{node_id}` has no `tasks` object"
                )));
            }
        };
        let tasks = tasks
            .into_iter()
            .map(|(task_id, task)| {
                let task = from_value(task, &format!("task `{task_id}`"))?;
                Ok((task_id, task))
            })
            .collect::<Result<Vec<_>>>()?;
        decoded.push(NodeTasks { node_id, tasks });
    }
    Ok(SlicedTaskDocument { nodes: decoded })
}

fn from_value<T: DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    serde_json::from_value(value).map_err(|err| EtaError::Shape(format!("{what}: {err}")))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE: &str = r#"{
        "completed": false,
        "task": {
            "node": "n1", "id": 42, "action": "indices:data/write/reindex",
            "status": {"total": 100, "updated": 10},
            "description": "reindex",
            "start_time_in_millis": 1000,
            "running_time_in_nanos": 5000000
        }
    }"#;

    #[test]
    fn decodes_single_task() {
        let Document::Single(doc) = decode(SINGLE).unwrap() else {
            panic!("expected single task document");
        };
        assert!(!doc.completed);
        assert_eq!(doc.task.composite_id(), "n1:42");
        assert_eq!(doc.task.status.processed(), 10);
    }

    #[test]
    fn sliced_tasks_keep_source_order() {
        let text = r#"{"nodes": {
            "zeta": {"tasks": {
                "zeta:9": {"node": "zeta", "id": 9, "status": {"total": 1}, "start_time_in_millis": 1, "running_time_in_nanos": 1},
                "zeta:3": {"node": "zeta", "id": 3, "status": {"total": 1}, "start_time_in_millis": 1, "running_time_in_nanos": 1}
            }},
            "alpha": {"tasks": {
                "alpha:5": {"node": "alpha", "id": 5, "status": {"total": 1}, "start_time_in_millis": 1, "running_time_in_nanos": 1}
            }}
        }}"#;
        let Document::Sliced(doc) = decode(text).unwrap() else {
            panic!("expected sliced document");
        };
        let ids: Vec<String> = doc.tasks().map(|task| task.composite_id()).collect();
        assert_eq!(ids, ["zeta:9", "zeta:3", "alpha:5"]);
    }

    #[test]
    fn syntax_errors_carry_parser_message() {
        let err = decode("{\"a\": ").unwrap_err();
        assert!(matches!(err, EtaError::Syntax(_)));
        assert!(err.is_input_error());
        assert!(err.to_string().contains("EOF"));
    }

    #[test]
    fn rejects_non_object_root() {
        let err = decode("[1, 2]").unwrap_err();
        assert_eq!(
            err,
            EtaError::Shape("expected an object at the root, found an array".into())
        );
    }

    #[test]
    fn rejects_object_without_known_shape() {
        assert!(matches!(decode(r#"{"a": 1}"#), Err(EtaError::Shape(_))));
        assert!(matches!(
            decode(r#"{"completed": false}"#),
            Err(EtaError::Shape(_))
        ));
        assert!(matches!(
            decode(r#"{"nodes": {"n1": {}}}"#),
            Err(EtaError::Shape(_))
        ));
    }

    #[test]
    fn completed_task_skips_body_validation() {
        assert_eq!(decode(r#"{"completed": true}"#), Err(EtaError::AlreadyCompleted));
        assert_eq!(
            decode(r#"{"completed": true, "task": {"node": "n1", "id": 1}}"#),
            Err(EtaError::AlreadyCompleted)
        );
    }

    #[test]
    fn empty_nodes_is_a_valid_sliced_document() {
        assert_eq!(
            decode(r#"{"nodes": {}}"#).unwrap(),
            Document::Sliced(SlicedTaskDocument::default())
        );
    }
}
