use log::trace;

use crate::document::ProgressInput;
use crate::error::{EtaError, Result};

const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// Linear-rate forecast for one current-time sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEstimate {
    pub estimated_processed: f64,
    /// Fraction of `total`; exceeds 1.0 once the forecast overshoots.
    pub progress: f64,
    /// Documents per millisecond.
    pub rate: f64,
    pub estimated_remaining_time_millis: f64,
    pub current_time: i64,
}

impl ProgressEstimate {
    pub fn is_complete(&self, total: u64) -> bool {
        self.estimated_processed >= total as f64
    }
}

/// Projects the average throughput since task start forward to `current_time`.
pub fn estimate(input: &ProgressInput, current_time: i64) -> Result<ProgressEstimate> {
    if !input.slices.is_empty() && input.slices.iter().all(Option::is_none) {
        return Err(EtaError::MissingSliceData {
            task_id: input.task_id.clone(),
        });
    }

    if input.total == 0 || input.processed == 0 || input.running_time_in_nanos == 0 {
        return Err(EtaError::InsufficientData);
    }
    let Some(start_time_in_millis) = input.start_time_in_millis else {
        return Err(EtaError::InsufficientData);
    };

    let total = input.total as f64;
    let running_time_millis = input.running_time_in_nanos as f64 / NANOS_PER_MILLI;
    let rate = input.processed as f64 / running_time_millis;

    let elapsed_since_start = current_time as f64 - start_time_in_millis as f64;
    let estimated_processed = rate * elapsed_since_start;
    let remaining_docs = total - estimated_processed;
    let estimated_remaining_time_millis = remaining_docs / rate;

    trace!(
        "Estimate at {}: rate={:.4}/ms, processed~{:.1}, remaining={:.0}ms",
        current_time, rate, estimated_processed, estimated_remaining_time_millis
    );

    Ok(ProgressEstimate {
        estimated_processed,
        progress: estimated_processed / total,
        rate,
        estimated_remaining_time_millis,
        current_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RawTaskStatus;

    fn input(total: u64, processed: u64) -> ProgressInput {
        ProgressInput {
            total,
            processed,
            start_time_in_millis: Some(0),
            running_time_in_nanos: 100_000_000,
            task_id: "n1:1".into(),
            description: String::new(),
            slices: Vec::new(),
        }
    }

    #[test]
    fn linear_rate_forecast() {
        let estimate = estimate(&input(1000, 100), 200).unwrap();
        assert_eq!(estimate.rate, 1.0);
        assert_eq!(estimate.estimated_processed, 200.0);
        assert_eq!(estimate.progress, 0.2);
        assert_eq!(estimate.estimated_remaining_time_millis, 800.0);
        assert_eq!(estimate.current_time, 200);
        assert!(!estimate.is_complete(1000));
    }

    #[test]
    fn progress_is_not_clamped() {
        let estimate = estimate(&input(1000, 100), 1500).unwrap();
        assert_eq!(estimate.progress, 1.5);
        assert_eq!(estimate.estimated_remaining_time_millis, -500.0);
        assert!(estimate.is_complete(1000));
    }

    #[test]
    fn zero_total_or_processed_is_insufficient() {
        assert_eq!(estimate(&input(0, 100), 200), Err(EtaError::InsufficientData));
        assert_eq!(estimate(&input(1000, 0), 200), Err(EtaError::InsufficientData));
    }

    #[test]
    fn missing_start_or_running_time_is_insufficient() {
        let mut no_start = input(1000, 100);
        no_start.start_time_in_millis = None;
        assert_eq!(estimate(&no_start, 200), Err(EtaError::InsufficientData));

        let mut no_runtime = input(1000, 100);
        no_runtime.running_time_in_nanos = 0;
        assert_eq!(estimate(&no_runtime, 200), Err(EtaError::InsufficientData));
    }

    #[test]
    fn all_null_slices_require_refetch() {
        let mut sliced = input(1000, 100);
        sliced.slices = vec![None, None];
        assert_eq!(
            estimate(&sliced, 200),
            Err(EtaError::MissingSliceData {
                task_id: "n1:1".into()
            })
        );
    }

    #[test]
    fn slice_check_runs_before_zero_guard() {
        let mut sliced = input(0, 0);
        sliced.slices = vec![None];
        assert!(matches!(
            estimate(&sliced, 200),
            Err(EtaError::MissingSliceData { .. })
        ));
    }

    #[test]
    fn extreme_timestamps_stay_finite() {
        let mut early = input(1000, 100);
        early.start_time_in_millis = Some(i64::MIN);
        let estimate = estimate(&early, i64::MAX).unwrap();
        assert!(estimate.estimated_processed.is_finite());
        assert!(estimate.is_complete(1000));

        let mut late = input(1000, 100);
        late.start_time_in_millis = Some(i64::MAX);
        let estimate = super::estimate(&late, i64::MIN).unwrap();
        assert!(estimate.progress < 0.0);
        assert!(estimate.estimated_remaining_time_millis.is_finite());
    }

    #[test]
    fn partially_null_slices_are_fine() {
        let mut sliced = input(1000, 100);
        sliced.slices = vec![
            None,
            Some(RawTaskStatus {
                total: 500,
                updated: 50,
                created: 0,
                deleted: 0,
                version_conflicts: 0,
                slice_id: Some(1),
                slices: Vec::new(),
            }),
        ];
        assert!(estimate(&sliced, 200).is_ok());
    }
}
