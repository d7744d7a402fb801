//! Cleanup of raw supplier rows before feature construction

use crate::data::{EventRecord, RevenueFrame};
use crate::error::Result;
use crate::supply::RevenueRow;
use std::collections::HashSet;

/// Build the JP revenue series from raw report rows.
///
/// Drops the global-region figures and any month without a JP value; the
/// surviving rows keep their original order.
pub fn revenue_from_rows(rows: &[RevenueRow], target_column: &str) -> Result<RevenueFrame> {
    let mut dates = Vec::with_capacity(rows.len());
    let mut values = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(jp) = row.jp {
            dates.push(row.date);
            values.push(jp);
        }
    }
    RevenueFrame::from_parts(&dates, &values, target_column)
}

/// Strip the "(Rerun) " prefix the sheet puts on rerun event names, so a
/// rerun and its original share one name.
pub fn remove_rerun_prefix(events: &mut [EventRecord]) {
    for event in events.iter_mut() {
        if let Some(stripped) = event.name_en.strip_prefix("(Rerun) ") {
            event.name_en = stripped.to_string();
        }
    }
}

/// Fill missing notes by name recurrence: the first appearance of a name
/// is an Original, every later appearance a Rerun. Existing notes win.
pub fn mark_duplicates_as_rerun(events: &mut [EventRecord]) {
    let mut seen: HashSet<String> = HashSet::new();
    for event in events.iter_mut() {
        let duplicated = !seen.insert(event.name_en.clone());
        if event.note.is_none() {
            let note = if duplicated { "Rerun" } else { "Original" };
            event.note = Some(note.to_string());
        }
    }
}

/// Collapse every operation-flavored note onto the single "Operation"
/// label the counter recognizes.
pub fn group_operation_events(events: &mut [EventRecord]) {
    for event in events.iter_mut() {
        if let Some(note) = &event.note {
            if note.to_lowercase().contains("operation") {
                event.note = Some("Operation".to_string());
            }
        }
    }
}

/// Run the full event cleanup in order.
pub fn clean_events(mut events: Vec<EventRecord>) -> Vec<EventRecord> {
    remove_rerun_prefix(&mut events);
    mark_duplicates_as_rerun(&mut events);
    group_operation_events(&mut events);
    events
}
