//! Turns allocated events into widget lines.
//!
//! Day labels pick the most specific wording that applies: a relative word
//! ("Today"), a weekday name within the coming week, a short date within the
//! current year, and a long date otherwise.

use serde::Serialize;

use crate::allocator::{Allocation, BIRTHDAYS_PER_LINE};
use crate::buckets::{date_for_julian_day, Buckets, DAY_IN_MILLIS};
use crate::config::{DateFormat, LayoutVariant, WidgetConfig};
use crate::event::{Event, Rgb};
use crate::styled::{SpanStyle, StyledText};

pub const COLOR_DOT: &str = "■\t";
pub const SEPARATOR_COMMA: &str = ", ";

/// One entry of a birthday line.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BirthdayEntry {
    pub time: StyledText,
    pub title: String,
    pub text: StyledText,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BirthdayPair {
    pub first: BirthdayEntry,
    pub second: Option<BirthdayEntry>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LineRows {
    Single,
    /// Time and location above, title below.
    Double,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EventLine {
    pub time: StyledText,
    pub text: StyledText,
    pub has_reminder: bool,
    pub color: Rgb,
    pub rows: LineRows,
}

impl EventLine {
    pub fn to_plain(&self) -> String {
        let separator = match self.rows {
            LineRows::Single => " ",
            LineRows::Double => "\n",
        };
        format!("{}{}{}", self.time, separator, self.text)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderedLine {
    Birthdays(BirthdayPair),
    Event(EventLine),
}

impl RenderedLine {
    pub fn to_plain(&self) -> String {
        match self {
            Self::Birthdays(pair) => match &pair.second {
                Some(second) => format!("{}\t{}", pair.first.text, second.text),
                None => pair.first.text.to_plain(),
            },
            Self::Event(line) => line.to_plain(),
        }
    }
}

pub struct Formatter<'a> {
    buckets: Buckets,
    config: &'a WidgetConfig,
}

impl<'a> Formatter<'a> {
    pub fn new(buckets: Buckets, config: &'a WidgetConfig) -> Self {
        Self { buckets, config }
    }

    pub fn buckets(&self) -> &Buckets {
        &self.buckets
    }

    pub fn format_day(&self, time: i64, day: i32) -> StyledText {
        let b = &self.buckets;
        let labels = &self.config.labels;
        let (special_start, special_end) = if self.config.tomorrow_yesterday {
            (b.yesterday_start, b.day_after_tomorrow_start)
        } else {
            (b.today_start, b.tomorrow_start)
        };
        let week_end = if self.config.weekday {
            b.one_week_from_now
        } else {
            b.tomorrow_start
        };

        let mut out = StyledText::new();
        if (special_start..special_end).contains(&time) {
            let label = if time < b.today_start {
                &labels.yesterday
            } else if time < b.tomorrow_start {
                &labels.today
            } else {
                &labels.tomorrow
            };
            out.push(label.as_str(), SpanStyle::SECONDARY);
        } else if (b.today_start..week_end).contains(&time) {
            let index = (day + 1).rem_euclid(7) as usize;
            if let Some(name) = labels.weekdays.get(index) {
                out.push_str(name);
            }
        } else if let Some(date) = date_for_julian_day(day) {
            let pattern = if (b.year_start..b.year_end).contains(&time) {
                self.config.date_format.short_pattern()
            } else {
                self.config.date_format.long_pattern()
            };
            out.push_str(&DateFormat::render(pattern, date));
        }
        out
    }

    pub fn format_hour(&self, time: i64) -> StyledText {
        let mut out = StyledText::new();
        let Some(local) = self.buckets.local_time(time) else {
            tracing::warn!(time, "timestamp outside renderable range");
            return out;
        };
        if self.config.twenty_four_hours {
            out.push_str(&local.format("%H:%M").to_string());
        } else {
            out.push_str(&local.format("%-I:%M").to_string());
            out.push(local.format("%P").to_string(), SpanStyle::SECONDARY);
        }
        out
    }

    pub fn format_time(&self, event: &Event) -> StyledText {
        let b = &self.buckets;
        let mut out = StyledText::new();

        if event.all_day {
            out.append(self.format_day(b.day_start(event.start_day), event.start_day));
            if event.start_day != event.end_day {
                out.push_str("-");
                out.append(self.format_day(b.day_start(event.end_day), event.end_day));
            }
            return out;
        }

        let show_start_day =
            !(b.touches_today(event.start_millis) && b.touches_today(event.end_millis));
        if show_start_day {
            out.append(self.format_day(event.start_millis, event.start_day));
            out.push_str(" ");
        }
        out.append(self.format_hour(event.start_millis));

        if !self.config.end_time || event.start_millis == event.end_millis {
            return out;
        }

        out.push_str("-");
        if event.duration_millis().abs() > DAY_IN_MILLIS {
            out.append(self.format_day(event.end_millis, event.end_day));
            out.push_str(" ");
        }
        out.append(self.format_hour(event.end_millis));
        out
    }

    /// Title followed by a muted `, location` when one is set.
    pub fn format_title(&self, event: &Event) -> StyledText {
        let mut out = StyledText::plain(event.title.as_str());
        if let Some(location) = &event.location {
            out.push(format!("{SEPARATOR_COMMA}{location}"), SpanStyle::MUTED);
        }
        out
    }

    /// Colour marker, muted time and title as one run of text. An absent
    /// event renders as empty text.
    pub fn format_event_text(&self, event: Option<&Event>, show_color: bool) -> StyledText {
        let Some(event) = event else {
            return StyledText::new();
        };
        let mut out = StyledText::new();
        if show_color {
            out.append(Self::color_marker(event));
        }
        let mut time = self.format_time(event);
        time.push_str(" ");
        out.append(time.muted());
        out.append(self.format_title(event));
        out
    }

    fn color_marker(event: &Event) -> StyledText {
        let mut out = StyledText::new();
        if event.is_birthday {
            out.push(COLOR_DOT, SpanStyle::PLACEHOLDER);
        } else {
            out.push(COLOR_DOT, SpanStyle::colored(event.color));
        }
        out
    }

    fn birthday_entry(&self, event: &Event, show_color: bool) -> BirthdayEntry {
        BirthdayEntry {
            time: self.format_time(event),
            title: event.title.clone(),
            text: self.format_event_text(Some(event), show_color),
        }
    }

    pub fn event_line(&self, event: &Event) -> EventLine {
        let (time, text, rows) = match self.config.layout {
            LayoutVariant::Classic => {
                let mut time = StyledText::new();
                if self.config.calendar_color {
                    time.append(Self::color_marker(event));
                }
                time.append(self.format_time(event).muted());
                (time, self.format_title(event), LineRows::Single)
            }
            LayoutVariant::TwoLines if event.all_day => (
                self.format_time(event).muted(),
                self.format_title(event),
                LineRows::Single,
            ),
            LayoutVariant::TwoLines => {
                let mut time = self.format_time(event);
                if let Some(location) = &event.location {
                    time.push_str(&format!("{SEPARATOR_COMMA}{location}"));
                }
                (
                    time.muted(),
                    StyledText::plain(event.title.as_str()),
                    LineRows::Double,
                )
            }
        };
        EventLine {
            time,
            text,
            has_reminder: event.has_reminder,
            color: event.color,
            rows,
        }
    }

    /// Birthday pairs first, then one line per remaining event, in
    /// allocation order.
    pub fn lines(&self, allocation: &Allocation) -> Vec<RenderedLine> {
        match allocation {
            Allocation::Paired { birthdays, agenda } => {
                let mut lines = Vec::with_capacity(
                    birthdays.len().div_ceil(BIRTHDAYS_PER_LINE) + agenda.len(),
                );
                for pair in birthdays.chunks(BIRTHDAYS_PER_LINE) {
                    let first = self.birthday_entry(&pair[0], self.config.calendar_color);
                    let second = pair.get(1).map(|event| self.birthday_entry(event, false));
                    lines.push(RenderedLine::Birthdays(BirthdayPair { first, second }));
                }
                lines.extend(
                    agenda
                        .iter()
                        .map(|event| RenderedLine::Event(self.event_line(event))),
                );
                lines
            }
            Allocation::Weighted { events } => events
                .iter()
                .map(|event| RenderedLine::Event(self.event_line(event)))
                .collect(),
        }
    }
}
