use crate::slots::{self, Day, Priority, TimeSlot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One declared hour of a worker's weekly availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerAvailability {
    pub day: Day,
    pub hour: u8,
    pub priority: Priority,
}

/// One record per hour in `[start, end)`. Unset priority becomes `Strong`.
/// Overlapping input slots produce duplicate records.
pub fn expand(slots: &[TimeSlot]) -> Vec<WorkerAvailability> {
    slots
        .iter()
        .flat_map(|slot| {
            let priority = slot.priority.unwrap_or(Priority::Strong);
            slot.hours().map(move |hour| WorkerAvailability {
                day: slot.day,
                hour,
                priority,
            })
        })
        .collect()
}

/// One 1-hour slot per distinct (day, hour). Conflicting records keep the
/// stronger preference (the lower number).
pub fn compress(records: &[WorkerAvailability]) -> Vec<TimeSlot> {
    let mut by_hour: BTreeMap<(Day, u8), Priority> = BTreeMap::new();
    for record in records {
        by_hour
            .entry((record.day, record.hour))
            .and_modify(|p| *p = (*p).min(record.priority))
            .or_insert(record.priority);
    }

    by_hour
        .into_iter()
        .map(|((day, hour), priority)| TimeSlot::new(day, hour, hour + 1).with_priority(priority))
        .collect()
}

pub fn compress_merged(records: &[WorkerAvailability]) -> Vec<TimeSlot> {
    slots::merge_consecutive(&compress(records))
}

/// Expands slots to at most one record per (day, hour). Overlapping slots
/// resolve to the stronger preference, as in [`compress`].
pub fn expand_unique(slots: &[TimeSlot]) -> Vec<WorkerAvailability> {
    expand(&compress(&expand(slots)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(day: Day, hour: u8, priority: Priority) -> WorkerAvailability {
        WorkerAvailability { day, hour, priority }
    }

    #[test]
    fn expand_emits_one_record_per_hour() {
        let records = expand(&[TimeSlot::new(Day::MONDAY, 9, 12).with_priority(Priority::Strong)]);
        assert_eq!(
            records,
            vec![
                record(Day::MONDAY, 9, Priority::Strong),
                record(Day::MONDAY, 10, Priority::Strong),
                record(Day::MONDAY, 11, Priority::Strong),
            ]
        );
    }

    #[test]
    fn expand_defaults_priority_and_keeps_duplicates() {
        let records = expand(&[
            TimeSlot::new(Day::FRIDAY, 9, 11),
            TimeSlot::new(Day::FRIDAY, 10, 11).with_priority(Priority::Preferred),
        ]);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].priority, Priority::Strong);
        assert_eq!(records[2], record(Day::FRIDAY, 10, Priority::Preferred));
    }

    #[test]
    fn compress_without_merge_yields_hourly_slots() {
        let records = expand(&[TimeSlot::new(Day::MONDAY, 9, 12).with_priority(Priority::Strong)]);
        let slots = compress(&records);
        assert_eq!(
            slots,
            vec![
                TimeSlot::new(Day::MONDAY, 9, 10).with_priority(Priority::Strong),
                TimeSlot::new(Day::MONDAY, 10, 11).with_priority(Priority::Strong),
                TimeSlot::new(Day::MONDAY, 11, 12).with_priority(Priority::Strong),
            ]
        );
    }

    #[test]
    fn compress_merged_restores_the_original_slot() {
        let original = TimeSlot::new(Day::MONDAY, 9, 12).with_priority(Priority::Strong);
        assert_eq!(compress_merged(&expand(&[original])), vec![original]);
    }

    #[test]
    fn compress_keeps_the_stronger_preference() {
        let slots = compress(&[
            record(Day::TUESDAY, 8, Priority::Preferred),
            record(Day::TUESDAY, 8, Priority::Strong),
            record(Day::TUESDAY, 8, Priority::Preferred),
        ]);
        assert_eq!(
            slots,
            vec![TimeSlot::new(Day::TUESDAY, 8, 9).with_priority(Priority::Strong)]
        );
    }

    #[test]
    fn expand_unique_keeps_one_record_per_hour() {
        let records = expand_unique(&[
            TimeSlot::new(Day::MONDAY, 9, 11).with_priority(Priority::Preferred),
            TimeSlot::new(Day::MONDAY, 10, 12).with_priority(Priority::Strong),
        ]);
        assert_eq!(
            records,
            vec![
                record(Day::MONDAY, 9, Priority::Preferred),
                record(Day::MONDAY, 10, Priority::Strong),
                record(Day::MONDAY, 11, Priority::Strong),
            ]
        );
    }

    #[test]
    fn compress_empty_is_empty() {
        assert!(compress(&[]).is_empty());
    }
}
