//! Line budgeting: decides which events make it onto the widget.
//!
//! The host feeds events in chronological order and stops as soon as
//! [`Allocator::is_full`] reports true. Every call is a complete state
//! transition, so the host may also stop between calls at any time.

use serde::Serialize;
use tracing::trace;

use crate::config::LayoutVariant;
use crate::event::Event;

pub const BIRTHDAYS_PER_LINE: usize = 2;

/// Birthdays collected two per line ahead of one line per agenda event.
#[derive(Debug, Clone)]
pub struct PairedAllocator {
    capacity_lines: usize,
    birthdays: Vec<Event>,
    agenda: Vec<Event>,
    full: bool,
}

impl PairedAllocator {
    pub fn new(capacity_lines: usize) -> Self {
        Self {
            capacity_lines,
            birthdays: Vec::with_capacity(capacity_lines * BIRTHDAYS_PER_LINE),
            agenda: Vec::with_capacity(capacity_lines),
            full: false,
        }
    }

    fn used_lines(&self) -> usize {
        self.birthdays.len().div_ceil(BIRTHDAYS_PER_LINE) + self.agenda.len()
    }

    /// Returns whether the event was kept. Birthdays are always kept (minus
    /// duplicates) so a half-filled birthday line can be completed; other
    /// events are dropped once the budget was exhausted before this call.
    pub fn add_event(&mut self, event: Event) -> bool {
        self.full = self.used_lines() >= self.capacity_lines;
        if event.is_birthday {
            if self.birthdays.contains(&event) {
                return false;
            }
            self.birthdays.push(event);
            true
        } else if !self.full {
            self.agenda.push(event);
            true
        } else {
            false
        }
    }

    /// Full only once the budget is spent and the last birthday line is
    /// complete.
    pub fn is_full(&self) -> bool {
        self.full && self.birthdays.len() % BIRTHDAYS_PER_LINE == 0
    }

    pub fn birthdays(&self) -> &[Event] {
        &self.birthdays
    }

    pub fn agenda(&self) -> &[Event] {
        &self.agenda
    }

    pub fn into_parts(self) -> (Vec<Event>, Vec<Event>) {
        (self.birthdays, self.agenda)
    }
}

/// Single list where timed events reserve two rows and all-day events one.
#[derive(Debug, Clone)]
pub struct WeightedAllocator {
    capacity_lines: usize,
    remaining: usize,
    events: Vec<Event>,
}

impl WeightedAllocator {
    pub fn new(capacity_lines: usize) -> Self {
        Self {
            capacity_lines,
            remaining: capacity_lines,
            events: Vec::with_capacity(capacity_lines),
        }
    }

    pub fn cost(event: &Event) -> usize {
        if event.all_day {
            1
        } else {
            2
        }
    }

    pub fn add_event(&mut self, event: Event) -> bool {
        if self.events.contains(&event) {
            return false;
        }
        let cost = Self::cost(&event);
        if cost > self.remaining {
            return false;
        }
        self.remaining -= cost;
        self.events.push(event);
        true
    }

    pub fn is_full(&self) -> bool {
        self.remaining == 0
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn consumed(&self) -> usize {
        self.capacity_lines - self.remaining
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }
}

/// The allocation policy for one render pass.
#[derive(Debug, Clone)]
pub enum Allocator {
    Paired(PairedAllocator),
    Weighted(WeightedAllocator),
}

impl Allocator {
    pub fn for_layout(layout: LayoutVariant, capacity_lines: usize) -> Self {
        match layout {
            LayoutVariant::Classic => Self::Paired(PairedAllocator::new(capacity_lines)),
            LayoutVariant::TwoLines => Self::Weighted(WeightedAllocator::new(capacity_lines)),
        }
    }

    pub fn add_event(&mut self, event: Event) -> bool {
        let title = event.title.clone();
        let accepted = match self {
            Self::Paired(inner) => inner.add_event(event),
            Self::Weighted(inner) => inner.add_event(event),
        };
        trace!(%title, accepted, "allocator step");
        accepted
    }

    pub fn is_full(&self) -> bool {
        match self {
            Self::Paired(inner) => inner.is_full(),
            Self::Weighted(inner) => inner.is_full(),
        }
    }

    pub fn finish(self) -> Allocation {
        match self {
            Self::Paired(inner) => {
                let (birthdays, agenda) = inner.into_parts();
                Allocation::Paired { birthdays, agenda }
            }
            Self::Weighted(inner) => Allocation::Weighted {
                events: inner.events,
            },
        }
    }
}

/// Accepted events in arrival order.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub enum Allocation {
    Paired {
        birthdays: Vec<Event>,
        agenda: Vec<Event>,
    },
    Weighted {
        events: Vec<Event>,
    },
}

impl Allocation {
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        let (first, second): (&[Event], &[Event]) = match self {
            Self::Paired { birthdays, agenda } => (birthdays.as_slice(), agenda.as_slice()),
            Self::Weighted { events } => (events.as_slice(), &[][..]),
        };
        first.iter().chain(second.iter())
    }
}
