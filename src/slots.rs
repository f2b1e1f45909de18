use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const DAYS_PER_WEEK: u8 = 7;
pub const HOURS_PER_DAY: u8 = 24;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SlotError {
    #[error("day index {0} is out of range (0 = Sunday .. 6 = Saturday)")]
    DayOutOfRange(i64),
    #[error("unknown weekday name '{0}'")]
    UnknownDayName(String),
    #[error("priority {0} is not valid (1 = strongly preferred, 2 = preferred)")]
    InvalidPriority(i64),
    #[error("hour {0} is out of range (0..24)")]
    HourOutOfRange(i64),
    #[error("slot start {start} must be before end {end}")]
    EmptyRange { start: u8, end: u8 },
    #[error("slot end {0} is past midnight")]
    EndPastMidnight(u8),
}

/// Weekday index used for grid columns and storage. Sunday is 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "DayInput", into = "u8")]
pub struct Day(u8);

const DAY_NAMES: [&str; 7] = [
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];

impl Day {
    pub const SUNDAY: Day = Day(0);
    pub const MONDAY: Day = Day(1);
    pub const TUESDAY: Day = Day(2);
    pub const WEDNESDAY: Day = Day(3);
    pub const THURSDAY: Day = Day(4);
    pub const FRIDAY: Day = Day(5);
    pub const SATURDAY: Day = Day(6);

    pub fn new(index: i64) -> Result<Self, SlotError> {
        if (0..DAYS_PER_WEEK as i64).contains(&index) {
            Ok(Day(index as u8))
        } else {
            Err(SlotError::DayOutOfRange(index))
        }
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = Day> {
        (0..DAYS_PER_WEEK).map(Day)
    }

    pub fn short_name(self) -> &'static str {
        let name: &'static str = DAY_NAMES[self.0 as usize];
        &name[..3]
    }
}

impl From<Weekday> for Day {
    fn from(weekday: Weekday) -> Self {
        Day(weekday.num_days_from_sunday() as u8)
    }
}

impl std::str::FromStr for Day {
    type Err = SlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(index) = trimmed.parse::<i64>() {
            return Day::new(index);
        }
        let lower = trimmed.to_ascii_lowercase();
        DAY_NAMES
            .iter()
            .position(|name| *name == lower || (lower.len() == 3 && name.starts_with(&lower)))
            .map(|i| Day(i as u8))
            .ok_or_else(|| SlotError::UnknownDayName(trimmed.to_string()))
    }
}

impl From<Day> for u8 {
    fn from(day: Day) -> Self {
        day.0
    }
}

/// Producers send the day either as an index or as a weekday name.
#[derive(Deserialize)]
#[serde(untagged)]
enum DayInput {
    Index(i64),
    Name(String),
}

impl TryFrom<DayInput> for Day {
    type Error = SlotError;

    fn try_from(input: DayInput) -> Result<Self, Self::Error> {
        match input {
            DayInput::Index(i) => Day::new(i),
            DayInput::Name(name) => name.parse(),
        }
    }
}

/// Lower number means stronger preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub enum Priority {
    Strong = 1,
    Preferred = 2,
}

impl Priority {
    pub fn weight(self) -> u32 {
        match self {
            Priority::Strong => 2,
            Priority::Preferred => 1,
        }
    }
}

impl TryFrom<i64> for Priority {
    type Error = SlotError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::Strong),
            2 => Ok(Priority::Preferred),
            other => Err(SlotError::InvalidPriority(other)),
        }
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority as u8
    }
}

pub fn check_hour(hour: i64) -> Result<u8, SlotError> {
    if (0..HOURS_PER_DAY as i64).contains(&hour) {
        Ok(hour as u8)
    } else {
        Err(SlotError::HourOutOfRange(hour))
    }
}

/// A recurring weekly interval `[start, end)` in whole hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub day: Day,
    #[serde(default)]
    pub start: u8,
    #[serde(default)]
    pub end: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl TimeSlot {
    pub fn new(day: Day, start: u8, end: u8) -> Self {
        Self {
            day,
            start,
            end,
            priority: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn validate(&self) -> Result<(), SlotError> {
        if self.end > HOURS_PER_DAY {
            return Err(SlotError::EndPastMidnight(self.end));
        }
        if self.start >= self.end {
            return Err(SlotError::EmptyRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// Half-open overlap on the same day. A single shared hour is enough.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.day == other.day && !(other.end <= self.start || other.start >= self.end)
    }

    pub fn hours(&self) -> impl Iterator<Item = u8> {
        self.start..self.end
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut name = self.day.short_name().to_string();
        name[..1].make_ascii_uppercase();
        write!(f, "{} {:02}:00-{:02}:00", name, self.start, self.end)?;
        if let Some(p) = self.priority {
            write!(f, " [p{}]", p as u8)?;
        }
        Ok(())
    }
}

pub fn validate_all(slots: &[TimeSlot]) -> Result<(), SlotError> {
    slots.iter().try_for_each(TimeSlot::validate)
}

pub fn group_by_day(slots: &[TimeSlot]) -> BTreeMap<Day, Vec<&TimeSlot>> {
    let mut by_day: BTreeMap<Day, Vec<&TimeSlot>> = BTreeMap::new();
    for slot in slots {
        by_day.entry(slot.day).or_default().push(slot);
    }
    by_day
}

/// Joins touching or overlapping slots of the same day and priority.
pub fn merge_consecutive(slots: &[TimeSlot]) -> Vec<TimeSlot> {
    let mut sorted = slots.to_vec();
    sorted.sort_by_key(|s| (s.day, s.start, s.end));

    let mut merged: Vec<TimeSlot> = Vec::with_capacity(sorted.len());
    for slot in sorted {
        match merged.last_mut() {
            Some(prev)
                if prev.day == slot.day
                    && prev.priority == slot.priority
                    && slot.start <= prev.end =>
            {
                prev.end = prev.end.max(slot.end);
            }
            _ => merged.push(slot),
        }
    }
    merged
}
