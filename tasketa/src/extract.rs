use log::{debug, info};

use crate::document::{Document, ProgressInput, SingleTaskDocument, SlicedTaskDocument};
use crate::error::{EtaError, Result};

pub fn extract(doc: Document) -> Result<ProgressInput> {
    let input = match doc {
        Document::Single(single) => extract_single(single)?,
        Document::Sliced(sliced) => extract_sliced(sliced),
    };
    info!(
        "Extracted task {}: {} / {} processed, {} slice(s)",
        input.task_id,
        input.processed,
        input.total,
        input.slices.len()
    );
    Ok(input)
}

fn extract_single(doc: SingleTaskDocument) -> Result<ProgressInput> {
    if doc.completed {
        return Err(EtaError::AlreadyCompleted);
    }
    let task = doc.task;
    let task_id = task.composite_id();
    Ok(ProgressInput {
        total: task.status.total,
        processed: task.status.processed(),
        start_time_in_millis: Some(task.start_time_in_millis),
        running_time_in_nanos: task.running_time_in_nanos,
        task_id,
        description: task.description,
        slices: task.status.slices,
    })
}

fn extract_sliced(doc: SlicedTaskDocument) -> ProgressInput {
    let mut total: u64 = 0;
    let mut processed: u64 = 0;
    let mut start_time_in_millis: Option<i64> = None;
    let mut running_time_in_nanos: u64 = 0;
    let mut parent_task_id: Option<String> = None;
    let mut first_task_id: Option<String> = None;
    let mut description = String::new();
    let mut slices = Vec::new();

    for task in doc.tasks() {
        total = total.saturating_add(task.status.total);
        processed = processed.saturating_add(task.status.processed());
        start_time_in_millis = Some(
            start_time_in_millis.map_or(task.start_time_in_millis, |earliest| {
                earliest.min(task.start_time_in_millis)
            }),
        );
        running_time_in_nanos = running_time_in_nanos.max(task.running_time_in_nanos);

        if first_task_id.is_none() {
            first_task_id = Some(task.composite_id());
        }
        if parent_task_id.is_none() {
            parent_task_id = task.parent_task_id.clone().filter(|id| !id.is_empty());
        }
        if description.is_empty() {
            description = task.description.clone();
        }
        slices.extend(task.status.slices.iter().cloned());
    }

    debug!(
        "Reduced sliced document: total={}, processed={}, start={:?}, running={}ns",
        total, processed, start_time_in_millis, running_time_in_nanos
    );

    ProgressInput {
        total,
        processed,
        start_time_in_millis,
        running_time_in_nanos,
        task_id: parent_task_id.or(first_task_id).unwrap_or_default(),
        description,
        slices,
    }
}
