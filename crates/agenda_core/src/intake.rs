use std::collections::HashSet;

use tracing::trace;

use crate::birthday::BirthdayMatcher;
use crate::config::{BirthdayPolicy, WidgetConfig};
use crate::error::Result;
use crate::event::{Event, RawEvent, Rgb};

/// Normalizes provider rows and drops the ones the widget never shows:
/// disabled calendars, past events and hidden birthdays.
#[derive(Debug, Clone)]
pub struct EventFilter {
    now: i64,
    today: i32,
    policy: BirthdayPolicy,
    disabled_calendars: HashSet<i64>,
    matcher: BirthdayMatcher,
}

impl EventFilter {
    pub fn new(config: &WidgetConfig, now: i64, today: i32, matcher: BirthdayMatcher) -> Self {
        Self {
            now,
            today,
            policy: config.birthdays,
            disabled_calendars: config.disabled_calendars.iter().copied().collect(),
            matcher,
        }
    }

    pub fn from_config(config: &WidgetConfig, now: i64, today: i32) -> Result<Self> {
        let matcher = BirthdayMatcher::from_patterns(config.birthday_patterns.as_deref())?;
        Ok(Self::new(config, now, today, matcher))
    }

    pub fn admit(&self, raw: RawEvent) -> Option<Event> {
        if self.disabled_calendars.contains(&raw.calendar_id) {
            trace!(calendar = raw.calendar_id, "skipping event from disabled calendar");
            return None;
        }
        let past = if raw.all_day {
            raw.end_day < self.today
        } else {
            raw.end_millis <= self.now
        };
        if past {
            return None;
        }

        let mut title = raw.title.unwrap_or_default();
        let mut is_birthday = false;
        if raw.all_day && self.policy != BirthdayPolicy::Normal {
            if let Some(name) = self.matcher.match_title(&title) {
                title = name;
                is_birthday = true;
            }
        }
        if is_birthday && self.policy == BirthdayPolicy::Hidden {
            trace!(%title, "hiding birthday");
            return None;
        }

        let location = raw.location.filter(|location| !location.trim().is_empty());

        Some(Event {
            title,
            location,
            start_millis: raw.start_millis,
            end_millis: raw.end_millis,
            start_day: raw.start_day,
            end_day: raw.end_day,
            all_day: raw.all_day,
            is_birthday,
            color: Rgb::new(raw.color),
            has_reminder: raw.has_alarm,
            calendar_id: raw.calendar_id,
        })
    }
}
