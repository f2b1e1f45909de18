//! Scoring policies for how well a worker's availability covers a job's schedule.
//!
//! Two independent scales are offered and never reconciled:
//! * [`percentage_score`] counts requirement slots touched by any availability slot (0..=100).
//! * [`weighted_score`] walks every required hour and sums preference weights (unbounded).

use crate::availability::WorkerAvailability;
use crate::slots::{self, Day, Priority, TimeSlot};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingResult {
    pub score: u32,
    pub matched_slots: usize,
    pub total_slots: usize,
    pub requirement_slots: Vec<TimeSlot>,
    pub availability_slots: Vec<TimeSlot>,
}

pub fn percentage_score(requirements: &[TimeSlot], availability: &[TimeSlot]) -> MatchingResult {
    let mut result = MatchingResult {
        score: 0,
        matched_slots: 0,
        total_slots: requirements.len(),
        requirement_slots: requirements.to_vec(),
        availability_slots: availability.to_vec(),
    };
    if requirements.is_empty() || availability.is_empty() {
        return result;
    }

    let available_by_day = slots::group_by_day(availability);
    for (day, required) in slots::group_by_day(requirements) {
        let Some(available) = available_by_day.get(&day) else {
            continue;
        };
        result.matched_slots += required
            .iter()
            .filter(|req| available.iter().any(|avail| avail.overlaps(req)))
            .count();
    }

    let ratio = result.matched_slots as f64 / result.total_slots as f64;
    result.score = (ratio * 100.0).round() as u32;
    result
}

/// +2 per required hour declared strongly preferred, +1 per preferred hour.
/// The first record seen for an hour is the one that counts.
pub fn weighted_score(requirements: &[TimeSlot], availability: &[WorkerAvailability]) -> u32 {
    let mut lookup: HashMap<(Day, u8), Priority> = HashMap::with_capacity(availability.len());
    for record in availability {
        lookup.entry((record.day, record.hour)).or_insert(record.priority);
    }

    requirements
        .iter()
        .flat_map(|slot| slot.hours().map(move |hour| (slot.day, hour)))
        .filter_map(|key| lookup.get(&key))
        .map(|priority| priority.weight())
        .sum()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    pub percentage: MatchingResult,
    pub weighted_score: u32,
}

pub fn report(requirements: &[TimeSlot], availability: &[WorkerAvailability]) -> MatchReport {
    let availability_slots = crate::availability::compress_merged(availability);
    MatchReport {
        percentage: percentage_score(requirements, &availability_slots),
        weighted_score: weighted_score(requirements, availability),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedMatch<T> {
    pub candidate: T,
    pub report: MatchReport,
}

/// Scores every candidate schedule and orders by percentage, then weighted score.
pub fn rank_matches<T>(
    availability: &[WorkerAvailability],
    candidates: impl IntoIterator<Item = (T, Vec<TimeSlot>)>,
) -> Vec<RankedMatch<T>> {
    let mut ranked: Vec<RankedMatch<T>> = candidates
        .into_iter()
        .map(|(candidate, requirements)| RankedMatch {
            report: report(&requirements, availability),
            candidate,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.report
            .percentage
            .score
            .cmp(&a.report.percentage.score)
            .then(b.report.weighted_score.cmp(&a.report.weighted_score))
    });
    ranked
}
