//! In-memory editing of a 7 x 24 availability grid.
//!
//! Every cell cycles `unset -> 1 -> 2 -> unset`. A drag selects the bounding
//! rectangle between the anchor and the pointer and resolves every cell in it
//! when the pointer is released, wherever that happens.

use crate::availability;
use crate::slots::{self, Day, Priority, SlotError, TimeSlot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub day: Day,
    pub hour: u8,
}

impl GridCell {
    pub fn new(day: Day, hour: i64) -> Result<Self, SlotError> {
        Ok(Self {
            day,
            hour: slots::check_hour(hour)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub min_day: Day,
    pub max_day: Day,
    pub min_hour: u8,
    pub max_hour: u8,
}

impl Selection {
    fn between(a: GridCell, b: GridCell) -> Self {
        Self {
            min_day: a.day.min(b.day),
            max_day: a.day.max(b.day),
            min_hour: a.hour.min(b.hour),
            max_hour: a.hour.max(b.hour),
        }
    }

    pub fn contains(&self, cell: GridCell) -> bool {
        (self.min_day..=self.max_day).contains(&cell.day)
            && (self.min_hour..=self.max_hour).contains(&cell.hour)
    }

    pub fn cells(&self) -> impl Iterator<Item = GridCell> {
        let (min_hour, max_hour) = (self.min_hour, self.max_hour);
        Day::all()
            .filter(move |d| (self.min_day..=self.max_day).contains(d))
            .flat_map(move |day| (min_hour..=max_hour).map(move |hour| GridCell { day, hour }))
    }
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    anchor: GridCell,
    current: GridCell,
    priority: Priority,
}

type ChangeHook = Box<dyn FnMut(&[TimeSlot]) + Send>;

#[derive(Default)]
pub struct ScheduleGrid {
    cells: BTreeMap<GridCell, Priority>,
    drag: Option<Drag>,
    on_change: Option<ChangeHook>,
}

impl ScheduleGrid {
    /// Multi-hour slots are split into hourly cells; overlapping input keeps
    /// the stronger preference.
    pub fn new(initial: &[TimeSlot]) -> Self {
        let cells = availability::compress(&availability::expand(initial))
            .into_iter()
            .filter_map(|slot| {
                let priority = slot.priority?;
                Some((GridCell { day: slot.day, hour: slot.start }, priority))
            })
            .collect();
        Self {
            cells,
            drag: None,
            on_change: None,
        }
    }

    pub fn on_change(mut self, hook: impl FnMut(&[TimeSlot]) + Send + 'static) -> Self {
        self.on_change = Some(Box::new(hook));
        self
    }

    pub fn priority_at(&self, cell: GridCell) -> Option<Priority> {
        self.cells.get(&cell).copied()
    }

    /// One 1-hour slot per set cell, ordered by day then hour.
    pub fn slots(&self) -> Vec<TimeSlot> {
        self.cells
            .iter()
            .map(|(cell, priority)| {
                TimeSlot::new(cell.day, cell.hour, cell.hour + 1).with_priority(*priority)
            })
            .collect()
    }

    pub fn merged_slots(&self) -> Vec<TimeSlot> {
        slots::merge_consecutive(&self.slots())
    }

    pub fn click(&mut self, cell: GridCell) {
        self.cycle(cell, Priority::Strong);
        self.notify();
    }

    pub fn pointer_down(&mut self, cell: GridCell) {
        let priority = match self.priority_at(cell) {
            Some(Priority::Strong) => Priority::Preferred,
            _ => Priority::Strong,
        };
        self.drag = Some(Drag {
            anchor: cell,
            current: cell,
            priority,
        });
    }

    pub fn pointer_move(&mut self, cell: GridCell) {
        if let Some(drag) = self.drag.as_mut() {
            drag.current = cell;
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn selection(&self) -> Option<Selection> {
        self.drag
            .map(|drag| Selection::between(drag.anchor, drag.current))
    }

    /// Finalizes an active drag. Returns false when no drag was in progress.
    pub fn pointer_up(&mut self) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        let selection = Selection::between(drag.anchor, drag.current);
        for cell in selection.cells() {
            self.cycle(cell, drag.priority);
        }
        tracing::debug!(?selection, priority = ?drag.priority, "drag finalized");
        self.notify();
        true
    }

    pub fn cancel_drag(&mut self) {
        self.drag = None;
    }

    fn cycle(&mut self, cell: GridCell, initial: Priority) {
        match self.cells.get(&cell).copied() {
            None => {
                self.cells.insert(cell, initial);
            }
            Some(Priority::Strong) => {
                self.cells.insert(cell, Priority::Preferred);
            }
            Some(Priority::Preferred) => {
                self.cells.remove(&cell);
            }
        }
    }

    fn notify(&mut self) {
        if self.on_change.is_none() {
            return;
        }
        let slots = self.slots();
        if let Some(hook) = self.on_change.as_mut() {
            hook(&slots);
        }
    }
}

impl std::fmt::Debug for ScheduleGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleGrid")
            .field("cells", &self.cells)
            .field("drag", &self.drag)
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}
