use thiserror::Error;

/// Fields requested when a sliced task has to be re-fetched with slice detail.
pub const FILTER_PATH: &[&str] = &[
    "**.node",
    "**.id",
    "**.action",
    "**.total",
    "**.updated",
    "**.created",
    "**.deleted",
    "**.version_conflicts",
    "**.slice_id",
    "**.description",
    "**.start_time_in_millis",
    "**.running_time_in_nanos",
    "**.parent_task_id",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EtaError {
    #[error("Invalid JSON input. Please check your format. ({0})")]
    Syntax(String),
    #[error("Unrecognized task status document: {0}")]
    Shape(String),
    #[error("Task is already completed.")]
    AlreadyCompleted,
    #[error(
        "Task is sliced but no slice data is available.\nPlease paste the response of this request:\n\nGET /_tasks?detailed&{}",
        follow_up_query(.task_id)
    )]
    MissingSliceData { task_id: String },
    #[error("Insufficient data to calculate remaining time.")]
    InsufficientData,
}

impl EtaError {
    /// True for failures the user fixes by editing the pasted text, as opposed
    /// to a well-formed document describing an unusable task.
    pub fn is_input_error(&self) -> bool {
        matches!(self, EtaError::Syntax(_) | EtaError::Shape(_))
    }

    pub fn follow_up_query(&self) -> Option<String> {
        match self {
            EtaError::MissingSliceData { task_id } => Some(follow_up_query(task_id)),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EtaError>;

pub fn follow_up_query(task_id: &str) -> String {
    format!(
        "parent_task_id={task_id}&filter_path={}",
        FILTER_PATH.join(",")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follow_up_query_lists_every_field_in_order() {
        let query = follow_up_query("node-a:42");
        assert!(query.starts_with("parent_task_id=node-a:42&filter_path=**.node,**.id,"));
        assert!(query.ends_with("**.running_time_in_nanos,**.parent_task_id"));
        assert_eq!(query.matches("**.").count(), FILTER_PATH.len());
    }

    #[test]
    fn missing_slice_message_embeds_query() {
        let err = EtaError::MissingSliceData {
            task_id: "n1:7".into(),
        };
        let message = err.to_string();
        assert!(message.starts_with("Task is sliced but no slice data is available."));
        assert!(message.contains("GET /_tasks?detailed&parent_task_id=n1:7&filter_path="));
        assert_eq!(err.follow_up_query(), Some(follow_up_query("n1:7")));
    }

    #[test]
    fn input_errors_are_distinguished() {
        assert!(EtaError::Syntax("eof".into()).is_input_error());
        assert!(EtaError::Shape("no task".into()).is_input_error());
        assert!(!EtaError::AlreadyCompleted.is_input_error());
        assert!(!EtaError::InsufficientData.is_input_error());
    }
}
