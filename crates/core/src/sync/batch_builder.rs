//! Turns the unsynced backlog into bounded, ordered batches

use punchsync_domain::constants::DEFAULT_BATCH_SIZE;
use punchsync_domain::{BatchEntry, TimesheetRecord};
use tracing::warn;

/// Batches ready to send, plus the counters observed while building them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuiltBatches {
    pub batches: Vec<Vec<BatchEntry>>,
    /// Every record inspected.
    pub processed: usize,
    /// Records dropped for lack of an employee code.
    pub skipped: usize,
}

impl BuiltBatches {
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Number of entries across all batches.
    pub fn entry_count(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BatchBuilder {
    batch_size: usize,
}

impl Default for BatchBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl BatchBuilder {
    /// A size of zero is treated as one.
    pub fn new(batch_size: usize) -> Self {
        Self { batch_size: batch_size.max(1) }
    }

    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Project valid records and slice them into batches, preserving input
    /// order.
    pub fn build(&self, records: &[TimesheetRecord]) -> BuiltBatches {
        let mut skipped = 0usize;
        let mut entries = Vec::with_capacity(records.len());

        for record in records {
            match BatchEntry::from_record(record) {
                Some(entry) => entries.push(entry),
                None => {
                    warn!(timesheet_id = record.id, "timesheet has no employee code, skipping");
                    skipped = skipped.saturating_add(1);
                }
            }
        }

        let batches = entries.chunks(self.batch_size).map(<[BatchEntry]>::to_vec).collect();

        BuiltBatches { batches, processed: records.len(), skipped }
    }
}

#[cfg(test)]
mod tests {
    use punchsync_domain::{LogType, SyncState};

    use super::*;

    fn record(id: i64, employee_code: Option<&str>) -> TimesheetRecord {
        TimesheetRecord {
            id,
            employee_code: employee_code.map(str::to_string),
            date: "2024-03-18".into(),
            time: "17:30".into(),
            log_type: if id % 2 == 0 { LogType::Out } else { LogType::In },
            sync_id: format!("term-a-{id}"),
            branch_id: None,
            sync_status: SyncState::Unsynced,
            sync_error: None,
            remote_id: None,
        }
    }

    #[test]
    fn splits_backlog_into_fixed_size_batches() {
        let records: Vec<_> = (1..=120).map(|id| record(id, Some("E-1"))).collect();
        let built = BatchBuilder::default().build(&records);

        let sizes: Vec<_> = built.batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![50, 50, 20]);
        assert_eq!(built.processed, 120);
        assert_eq!(built.skipped, 0);
    }

    #[test]
    fn preserves_record_order_across_batches() {
        let records: Vec<_> = (1..=7).map(|id| record(id, Some("E-9"))).collect();
        let built = BatchBuilder::new(3).build(&records);

        let ids: Vec<i64> = built.batches.iter().flatten().map(|entry| entry.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn skipped_records_still_count_as_processed() {
        let records = vec![record(1, Some("E-1")), record(2, None), record(3, Some(""))];
        let built = BatchBuilder::default().build(&records);

        assert_eq!(built.processed, 3);
        assert_eq!(built.skipped, 2);
        assert_eq!(built.entry_count(), 1);
    }

    #[test]
    fn no_valid_records_yields_no_batches() {
        let records = vec![record(1, None), record(2, None)];
        let built = BatchBuilder::default().build(&records);
        assert!(built.is_empty());
        assert_eq!(built.skipped, 2);
    }

    #[test]
    fn zero_batch_size_is_clamped() {
        let records: Vec<_> = (1..=2).map(|id| record(id, Some("E-1"))).collect();
        let built = BatchBuilder::new(0).build(&records);
        assert_eq!(built.batches.len(), 2);
    }
}
