use serde::Deserialize;

/// Counters of one task (or one slice of a task).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawTaskStatus {
    pub total: u64,
    #[serde(default)]
    pub updated: u64,
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub deleted: u64,
    #[serde(default)]
    pub version_conflicts: u64,
    #[serde(default)]
    pub slice_id: Option<u64>,
    /// One entry per parallel slice; `None` where the service returned `null`.
    #[serde(default)]
    pub slices: Vec<Option<RawTaskStatus>>,
}

impl RawTaskStatus {
    pub fn processed(&self) -> u64 {
        self.created
            .saturating_add(self.updated)
            .saturating_add(self.deleted)
            .saturating_add(self.version_conflicts)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawTask {
    pub node: String,
    pub id: u64,
    #[serde(default)]
    pub action: String,
    pub status: RawTaskStatus,
    #[serde(default)]
    pub description: String,
    pub start_time_in_millis: i64,
    pub running_time_in_nanos: u64,
    #[serde(default)]
    pub parent_task_id: Option<String>,
}

impl RawTask {
    pub fn composite_id(&self) -> String {
        format!("{}:{}", self.node, self.id)
    }
}

/// `GET _tasks/<id>` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SingleTaskDocument {
    pub completed: bool,
    pub task: RawTask,
}

/// `GET _tasks?detailed&parent_task_id=...` response, flattened in source order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SlicedTaskDocument {
    pub nodes: Vec<NodeTasks>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTasks {
    pub node_id: String,
    pub tasks: Vec<(String, RawTask)>,
}

impl SlicedTaskDocument {
    /// Every task in node order, then task order, as they appeared in the input.
    pub fn tasks(&self) -> impl Iterator<Item = &RawTask> {
        self.nodes
            .iter()
            .flat_map(|node| node.tasks.iter().map(|(_, task)| task))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document {
    Single(SingleTaskDocument),
    Sliced(SlicedTaskDocument),
}

/// Canonical record the estimator works from. Built once per pasted document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressInput {
    pub total: u64,
    pub processed: u64,
    /// Earliest start among constituent tasks; `None` when there were none.
    pub start_time_in_millis: Option<i64>,
    pub running_time_in_nanos: u64,
    pub task_id: String,
    pub description: String,
    pub slices: Vec<Option<RawTaskStatus>>,
}

impl ProgressInput {
    /// Description if the task has one, otherwise its id.
    pub fn label(&self) -> &str {
        if self.description.is_empty() {
            &self.task_id
        } else {
            &self.description
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_counters_default_to_zero() {
        let status: RawTaskStatus =
            serde_json::from_str(r#"{"total": 100, "updated": 10}"#).unwrap();
        assert_eq!(status.processed(), 10);
        assert!(status.slices.is_empty());
        assert_eq!(status.slice_id, None);
    }

    #[test]
    fn processed_saturates_instead_of_overflowing() {
        let status: RawTaskStatus = serde_json::from_str(
            r#"{"total": 1, "created": 18446744073709551615, "updated": 5}"#,
        )
        .unwrap();
        assert_eq!(status.processed(), u64::MAX);
    }

    #[test]
    fn status_requires_total() {
        let parsed = serde_json::from_str::<RawTaskStatus>(r#"{"updated": 10}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn null_slices_are_kept() {
        let status: RawTaskStatus = serde_json::from_str(
            r#"{"total": 4, "slices": [null, {"slice_id": 1, "total": 2, "created": 1}]}"#,
        )
        .unwrap();
        assert_eq!(status.slices.len(), 2);
        assert!(status.slices[0].is_none());
        assert_eq!(status.slices[1].as_ref().map(RawTaskStatus::processed), Some(1));
    }

    #[test]
    fn label_prefers_description() {
        let mut input = ProgressInput {
            total: 1,
            processed: 1,
            start_time_in_millis: Some(0),
            running_time_in_nanos: 1,
            task_id: "n:1".into(),
            description: String::new(),
            slices: Vec::new(),
        };
        assert_eq!(input.label(), "n:1");
        input.description = "reindex from [a] to [b]".into();
        assert_eq!(input.label(), "reindex from [a] to [b]");
    }
}
