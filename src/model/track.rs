use crate::error::{Error, Result};
use crate::model::event::TrackEvent;

/// Which slice of a track to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventRange {
    /// Everything at exactly these ticks, i.e. `[ticks, ticks + 1)`.
    AtTicks(i32),
    /// The half-open interval `[start, end)`.
    TickRange { start: i32, end: i32 },
    All,
}

/// Events of a single track, kept sorted by ticks.
///
/// Events sharing the same ticks stay in the order they were inserted, so a later insert at an
/// occupied position lands after everything already there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Track {
    events: Vec<TrackEvent>,
}

impl Track {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a track by inserting every event in iteration order.
    pub fn from_events<I: IntoIterator<Item = TrackEvent>>(events: I) -> Result<Self> {
        let mut track = Track::new();
        for track_event in events {
            track.insert(track_event)?;
        }
        Ok(track)
    }

    pub fn insert(&mut self, track_event: TrackEvent) -> Result<()> {
        let ticks = track_event.ticks;
        if ticks >= i32::MAX {
            return Err(Error::CloseToOverflow { ticks });
        }
        if ticks < 0 {
            return Err(Error::NegativeTicks(ticks));
        }

        match self.find_next_index(ticks + 1) {
            Some(index) => self.events.insert(index, track_event),
            None => self.events.push(track_event),
        }

        Ok(())
    }

    /// Removes the first event at the same ticks that equals `track_event`.
    /// Returns whether anything was removed.
    pub fn erase(&mut self, track_event: &TrackEvent) -> bool {
        let Some(start) = self.find_next_index(track_event.ticks) else {
            return false;
        };

        let found = self.events[start..]
            .iter()
            .take_while(|candidate| candidate.ticks == track_event.ticks)
            .position(|candidate| candidate.event == track_event.event);

        match found {
            Some(offset) => {
                self.events.remove(start + offset);
                true
            }
            None => false,
        }
    }

    pub fn events(&self, range: EventRange) -> &[TrackEvent] {
        match range {
            EventRange::All => &self.events,
            EventRange::AtTicks(ticks) => self.events_between(ticks, ticks.saturating_add(1)),
            EventRange::TickRange { start, end } => self.events_between(start, end),
        }
    }

    pub fn count(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrackEvent> {
        self.events.iter()
    }

    /// Lower bound: the smallest index whose ticks are `>= at_ticks`, or `None` when every event
    /// comes earlier.
    pub fn find_next_index(&self, at_ticks: i32) -> Option<usize> {
        let last = self.events.len().checked_sub(1)?;
        if self.events[last].ticks < at_ticks {
            return None;
        }
        if self.events[0].ticks >= at_ticks {
            return Some(0);
        }

        // events[low] is always too early, events[high] is always a candidate.
        let mut low = 0;
        let mut high = last;
        loop {
            let mid = low + (high - low) / 2;
            if mid == low {
                return Some(high);
            }

            if self.events[mid].ticks >= at_ticks {
                high = mid;
            } else {
                low = mid;
            }
        }
    }

    fn events_between(&self, start: i32, end: i32) -> &[TrackEvent] {
        if start >= end {
            return &[];
        }

        let Some(first) = self.find_next_index(start) else {
            return &[];
        };
        let last = self.find_next_index(end).unwrap_or(self.events.len());

        &self.events[first..last]
    }
}

impl<'a> IntoIterator for &'a Track {
    type Item = &'a TrackEvent;
    type IntoIter = std::slice::Iter<'a, TrackEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
