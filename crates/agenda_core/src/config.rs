use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, WidgetError};

/// How birthday events are detected and shown.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BirthdayPolicy {
    /// Detected and shown two per line.
    #[default]
    Special,
    /// Not detected; birthdays are ordinary all-day events.
    Normal,
    /// Detected and dropped.
    Hidden,
}

impl FromStr for BirthdayPolicy {
    type Err = WidgetError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "special" => Ok(Self::Special),
            "normal" => Ok(Self::Normal),
            "hidden" | "hide" => Ok(Self::Hidden),
            other => Err(WidgetError::InvalidConfig(format!(
                "unknown birthday policy `{other}`"
            ))),
        }
    }
}

/// Visual arrangement of the widget. Also selects the allocation policy.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutVariant {
    #[default]
    Classic,
    TwoLines,
}

impl FromStr for LayoutVariant {
    type Err = WidgetError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(Self::Classic),
            "two_lines" | "two-lines" | "twolines" => Ok(Self::TwoLines),
            other => Err(WidgetError::InvalidConfig(format!("unknown layout `{other}`"))),
        }
    }
}

/// Short (current year) and long (other years) date patterns in strftime
/// syntax.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    #[default]
    DotDayMonth,
    SlashDayMonth,
    SlashMonthDay,
    SlashYearMonthDay,
    Custom {
        short: String,
        long: String,
    },
}

impl DateFormat {
    pub fn short_pattern(&self) -> &str {
        match self {
            Self::DotDayMonth => "%-d.%m",
            Self::SlashDayMonth => "%-d/%m",
            Self::SlashMonthDay | Self::SlashYearMonthDay => "%m/%d",
            Self::Custom { short, .. } => short,
        }
    }

    pub fn long_pattern(&self) -> &str {
        match self {
            Self::DotDayMonth => "%-d.%m.%y",
            Self::SlashDayMonth => "%-d/%m/%y",
            Self::SlashMonthDay => "%m/%d/%y",
            Self::SlashYearMonthDay => "%y/%m/%d",
            Self::Custom { long, .. } => long,
        }
    }

    /// Renders `date` with `pattern`; an unusable pattern renders nothing.
    pub fn render(pattern: &str, date: NaiveDate) -> String {
        let mut out = String::new();
        if write!(out, "{}", date.format(pattern)).is_err() {
            warn!(%pattern, "date pattern could not be rendered");
            out.clear();
        }
        out
    }

    fn validate(&self) -> Result<()> {
        for pattern in [self.short_pattern(), self.long_pattern()] {
            if pattern.is_empty()
                || StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
            {
                return Err(WidgetError::InvalidDatePattern(pattern.to_string()));
            }
        }
        Ok(())
    }
}

impl FromStr for DateFormat {
    type Err = WidgetError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dot_day_month" => Ok(Self::DotDayMonth),
            "slash_day_month" => Ok(Self::SlashDayMonth),
            "slash_month_day" => Ok(Self::SlashMonthDay),
            "slash_year_month_day" => Ok(Self::SlashYearMonthDay),
            other => Err(WidgetError::InvalidConfig(format!(
                "unknown date format `{other}`"
            ))),
        }
    }
}

/// Localised words used by the formatter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Labels {
    pub yesterday: String,
    pub today: String,
    pub tomorrow: String,
    /// Seven names starting with Sunday.
    pub weekdays: Vec<String>,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            yesterday: "Yesterday".into(),
            today: "Today".into(),
            tomorrow: "Tomorrow".into(),
            weekdays: ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]
                .iter()
                .map(|day| day.to_string())
                .collect(),
        }
    }
}

/// Read-only preference snapshot for one widget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WidgetConfig {
    pub lines: usize,
    pub birthdays: BirthdayPolicy,
    pub layout: LayoutVariant,
    pub twenty_four_hours: bool,
    pub end_time: bool,
    /// Widens the relative-label window from today to yesterday..tomorrow.
    pub tomorrow_yesterday: bool,
    pub weekday: bool,
    pub date_format: DateFormat,
    pub calendar_color: bool,
    pub disabled_calendars: Vec<i64>,
    pub birthday_patterns: Option<Vec<String>>,
    pub labels: Labels,
    /// Background opacity in percent.
    pub opacity: u8,
    pub font_size: f32,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            lines: 5,
            birthdays: BirthdayPolicy::Special,
            layout: LayoutVariant::Classic,
            twenty_four_hours: true,
            end_time: true,
            tomorrow_yesterday: true,
            weekday: true,
            date_format: DateFormat::DotDayMonth,
            calendar_color: true,
            disabled_calendars: Vec::new(),
            birthday_patterns: None,
            labels: Labels::default(),
            opacity: 60,
            font_size: 1.0,
        }
    }
}

const CELL_DP: u32 = 74;

/// Number of home-screen cells covered by a widget dimension given in dp.
pub fn cells_for_dp(dp: u32) -> u32 {
    (dp + 2) / CELL_DP
}

impl WidgetConfig {
    /// Size-dependent defaults: taller widgets get more lines, wide ones show
    /// end times and paired birthdays.
    pub fn for_cells(width_cells: u32, height_cells: u32) -> Self {
        let wide = width_cells > 2;
        let extra_rows = f64::from(height_cells.max(1) - 1);
        Self {
            lines: 5 + (extra_rows * 5.9) as usize,
            birthdays: if wide {
                BirthdayPolicy::Special
            } else {
                BirthdayPolicy::Normal
            },
            end_time: wide,
            ..Self::default()
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    #[tracing::instrument]
    pub fn load(path: &Path) -> Result<Self> {
        info!(file = %path.display(), "loading widget config");
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Applies `AGENDA_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(lines) = lookup("AGENDA_LINES") {
            match lines.trim().parse::<usize>() {
                Ok(value) if value > 0 => self.lines = value,
                _ => warn!(%lines, "ignoring invalid AGENDA_LINES"),
            }
        }
        if let Some(policy) = lookup("AGENDA_BIRTHDAYS") {
            self.birthdays = policy.parse()?;
        }
        if let Some(layout) = lookup("AGENDA_LAYOUT") {
            self.layout = layout.parse()?;
        }
        if let Some(format) = lookup("AGENDA_DATE_FORMAT") {
            self.date_format = format.parse()?;
        }
        let flags: [(&str, &mut bool); 5] = [
            ("AGENDA_24H", &mut self.twenty_four_hours),
            ("AGENDA_END_TIME", &mut self.end_time),
            ("AGENDA_TOMORROW_YESTERDAY", &mut self.tomorrow_yesterday),
            ("AGENDA_WEEKDAY", &mut self.weekday),
            ("AGENDA_CALENDAR_COLOR", &mut self.calendar_color),
        ];
        for (key, slot) in flags {
            if let Some(raw) = lookup(key) {
                match parse_bool(&raw) {
                    Some(value) => {
                        debug!(key, value, "applying override");
                        *slot = value;
                    }
                    None => warn!(key, %raw, "ignoring invalid boolean override"),
                }
            }
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.lines == 0 {
            return Err(WidgetError::InvalidConfig(
                "widget needs at least one line".into(),
            ));
        }
        if self.labels.weekdays.len() != 7 {
            return Err(WidgetError::InvalidConfig(format!(
                "expected 7 weekday labels, found {}",
                self.labels.weekdays.len()
            )));
        }
        if self.opacity > 100 {
            return Err(WidgetError::InvalidConfig(format!(
                "opacity {} exceeds 100%",
                self.opacity
            )));
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(WidgetError::InvalidConfig(format!(
                "font size {} must be positive",
                self.font_size
            )));
        }
        self.date_format.validate()
    }

    /// Background image level, one of six steps of 20%.
    pub fn background_level(&self) -> u8 {
        self.opacity.min(100) / 20
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "y" | "yes" | "on" | "true" => Some(true),
        "0" | "n" | "no" | "off" | "false" => Some(false),
        _ => None,
    }
}
