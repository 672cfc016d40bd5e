use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A 24-bit RGB calendar colour. Alpha bits from the provider are dropped.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "u32", into = "u32")]
pub struct Rgb(u32);

impl Rgb {
    pub const fn new(value: u32) -> Self {
        Self(value & 0x00ff_ffff)
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl From<u32> for Rgb {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<Rgb> for u32 {
    fn from(color: Rgb) -> Self {
        color.0
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

/// A normalized calendar instance ready for allocation.
///
/// Equality covers every field; allocators rely on it to drop duplicates
/// returned by the provider for the same instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    pub title: String,
    pub location: Option<String>,
    pub start_millis: i64,
    pub end_millis: i64,
    pub start_day: i32,
    pub end_day: i32,
    pub all_day: bool,
    pub is_birthday: bool,
    pub color: Rgb,
    pub has_reminder: bool,
    pub calendar_id: i64,
}

impl Event {
    pub fn timed(
        title: impl Into<String>,
        start_millis: i64,
        end_millis: i64,
        utc_offset_seconds: i32,
    ) -> Self {
        Self {
            title: title.into(),
            location: None,
            start_millis,
            end_millis,
            start_day: saturating_julian_day(start_millis, utc_offset_seconds),
            end_day: saturating_julian_day(end_millis, utc_offset_seconds),
            all_day: false,
            is_birthday: false,
            color: Rgb::default(),
            has_reminder: false,
            calendar_id: 0,
        }
    }

    /// All-day events are anchored at UTC midnight the way calendar providers
    /// store them; `end_day` is inclusive.
    pub fn all_day(title: impl Into<String>, start_day: i32, end_day: i32) -> Self {
        Self {
            title: title.into(),
            location: None,
            start_millis: crate::buckets::day_start_millis(start_day, 0),
            end_millis: crate::buckets::day_start_millis(end_day + 1, 0),
            start_day,
            end_day,
            all_day: true,
            is_birthday: false,
            color: Rgb::default(),
            has_reminder: false,
            calendar_id: 0,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn with_reminder(mut self, has_reminder: bool) -> Self {
        self.has_reminder = has_reminder;
        self
    }

    pub fn with_calendar(mut self, calendar_id: i64) -> Self {
        self.calendar_id = calendar_id;
        self
    }

    pub fn into_birthday(mut self) -> Self {
        self.is_birthday = true;
        self
    }

    pub fn duration_millis(&self) -> i64 {
        self.end_millis - self.start_millis
    }
}

/// One row as handed over by the calendar provider, before intake filtering.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RawEvent {
    pub title: Option<String>,
    pub location: Option<String>,
    pub all_day: bool,
    pub start_day: i32,
    pub end_day: i32,
    pub start_millis: i64,
    pub end_millis: i64,
    pub color: u32,
    pub has_alarm: bool,
    pub calendar_id: i64,
}

fn saturating_julian_day(millis: i64, utc_offset_seconds: i32) -> i32 {
    crate::buckets::julian_day(millis, utc_offset_seconds)
        .unwrap_or(if millis < 0 { i32::MIN } else { i32::MAX })
}

impl From<&Event> for RawEvent {
    fn from(event: &Event) -> Self {
        Self {
            title: Some(event.title.clone()),
            location: event.location.clone(),
            all_day: event.all_day,
            start_day: event.start_day,
            end_day: event.end_day,
            start_millis: event.start_millis,
            end_millis: event.end_millis,
            color: event.color.value(),
            has_alarm: event.has_reminder,
            calendar_id: event.calendar_id,
        }
    }
}

/// Provider query order: start ascending, end descending, title ascending.
pub fn provider_order(a: &RawEvent, b: &RawEvent) -> Ordering {
    a.start_millis
        .cmp(&b.start_millis)
        .then_with(|| b.end_millis.cmp(&a.end_millis))
        .then_with(|| a.title.cmp(&b.title))
}

pub fn sort_events(events: &mut [RawEvent]) {
    events.sort_by(provider_order);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: &str, start: i64, end: i64) -> RawEvent {
        RawEvent {
            title: Some(title.to_string()),
            start_millis: start,
            end_millis: end,
            ..RawEvent::default()
        }
    }

    #[test]
    fn rgb_drops_alpha_channel() {
        let color = Rgb::from(0xff33_6699);
        assert_eq!(color.value(), 0x33_6699);
        assert_eq!(color.to_string(), "#336699");
    }

    #[test]
    fn sorts_like_the_provider_query() {
        let mut events = vec![
            raw("b", 10, 20),
            raw("late", 30, 40),
            raw("a", 10, 20),
            raw("long", 10, 90),
        ];
        sort_events(&mut events);
        let titles: Vec<_> = events
            .iter()
            .map(|event| event.title.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(titles, vec!["long", "a", "b", "late"]);
    }

    #[test]
    fn equality_covers_every_field() {
        let base = Event::all_day("Anna", 2_455_729, 2_455_729).into_birthday();
        assert_eq!(base, base.clone());
        assert_ne!(base, base.clone().with_reminder(true));
        assert_ne!(base, base.clone().with_calendar(4));
    }

    #[test]
    fn raw_event_deserializes_with_defaults() {
        let raw: RawEvent =
            serde_json::from_str(r#"{"title":"Standup","start_millis":5,"end_millis":6}"#)
                .expect("parse raw event");
        assert_eq!(raw.title.as_deref(), Some("Standup"));
        assert!(!raw.all_day);
        assert_eq!(raw.location, None);
    }
}
