use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use agenda_core::config::cells_for_dp;
use agenda_core::event::sort_events;
use agenda_core::render::RefreshScheduler;
use agenda_core::{RawEvent, RenderOutput, RenderPass, WidgetConfig};
use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone, Utc};
use tracing::{debug, info, warn};

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub(crate) widget_config: Option<PathBuf>,
    pub(crate) events: Option<PathBuf>,
    pub(crate) now: Option<i64>,
    pub(crate) utc_offset_seconds: Option<i32>,
    pub(crate) size_dp: Option<(u32, u32)>,
    pub(crate) timeout: Option<Duration>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(path) = lookup("AGENDA_CONFIG") {
            config.widget_config = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("AGENDA_EVENTS") {
            config.events = Some(PathBuf::from(path));
        }
        if let Some(now) = lookup("AGENDA_NOW") {
            config.now = Some(parse_now(&now).with_context(|| format!("invalid AGENDA_NOW `{now}`"))?);
        }
        if let Some(offset) = lookup("AGENDA_UTC_OFFSET") {
            match offset.trim().parse::<i32>() {
                Ok(value) => config.utc_offset_seconds = Some(value),
                Err(err) => warn!(%offset, %err, "ignoring invalid AGENDA_UTC_OFFSET"),
            }
        }
        if let Some(size) = lookup("AGENDA_SIZE_DP") {
            match parse_size(&size) {
                Some(dims) => config.size_dp = Some(dims),
                None => warn!(%size, "ignoring invalid AGENDA_SIZE_DP, expected WIDTHxHEIGHT"),
            }
        }
        if let Some(timeout) = lookup("AGENDA_TIMEOUT_MS") {
            match timeout.trim().parse::<u64>() {
                Ok(value) => config.timeout = Some(Duration::from_millis(value)),
                Err(err) => warn!(%timeout, %err, "ignoring invalid AGENDA_TIMEOUT_MS"),
            }
        }
        Ok(config)
    }

    pub fn with_widget_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.widget_config = Some(path.into());
        self
    }

    pub fn with_events(mut self, path: impl Into<PathBuf>) -> Self {
        self.events = Some(path.into());
        self
    }

    pub fn at(mut self, now_millis: i64, utc_offset_seconds: i32) -> Self {
        self.now = Some(now_millis);
        self.utc_offset_seconds = Some(utc_offset_seconds);
        self
    }

    /// Size-based defaults first, then the config file, then `AGENDA_*`
    /// overrides.
    fn widget_config(&self) -> Result<WidgetConfig> {
        let mut widget = match &self.widget_config {
            Some(path) => WidgetConfig::load(path)
                .with_context(|| format!("failed to load widget config {}", path.display()))?,
            None => match self.size_dp {
                Some((width, height)) => {
                    WidgetConfig::for_cells(cells_for_dp(width), cells_for_dp(height))
                }
                None => WidgetConfig::default(),
            },
        };
        widget
            .apply_env()
            .context("invalid AGENDA_* widget override")?;
        Ok(widget)
    }
}

fn parse_now(raw: &str) -> Result<i64> {
    let trimmed = raw.trim();
    if let Ok(millis) = trimmed.parse::<i64>() {
        return Ok(millis);
    }
    let parsed = DateTime::parse_from_rfc3339(trimmed)?;
    Ok(parsed.timestamp_millis())
}

fn parse_size(raw: &str) -> Option<(u32, u32)> {
    let (width, height) = raw.trim().split_once(['x', 'X'])?;
    Some((width.trim().parse().ok()?, height.trim().parse().ok()?))
}

pub fn load_events(path: &Path) -> Result<Vec<RawEvent>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read events {}", path.display()))?;
    let mut events: Vec<RawEvent> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse events {}", path.display()))?;
    sort_events(&mut events);
    debug!(count = events.len(), "loaded events");
    Ok(events)
}

/// Logs the refresh time the platform alarm would be set to.
struct LogScheduler;

impl RefreshScheduler for LogScheduler {
    fn schedule_refresh(&self, at_millis: i64) {
        match Utc.timestamp_millis_opt(at_millis).single() {
            Some(when) => info!(at = %when.with_timezone(&Local), "next widget refresh"),
            None => warn!(at_millis, "refresh time out of range"),
        }
    }
}

pub fn render(config: &AppConfig) -> Result<RenderOutput> {
    let widget = config.widget_config()?;
    let events = match &config.events {
        Some(path) => load_events(path)?,
        None => {
            warn!("no AGENDA_EVENTS file given; rendering an empty widget");
            Vec::new()
        }
    };

    let mut builder = RenderPass::builder(widget).with_scheduler(Box::new(LogScheduler));
    if let Some(now) = config.now {
        builder = builder.now(now);
    }
    if let Some(offset) = config.utc_offset_seconds {
        builder = builder.utc_offset(offset);
    }
    if let Some(timeout) = config.timeout {
        builder = builder.deadline(Instant::now() + timeout);
    }
    let pass = builder.build().context("failed to prepare render pass")?;
    Ok(pass.run(events))
}

pub fn run(config: AppConfig) -> Result<()> {
    let output = render(&config)?;
    let mut out = std::io::stdout().lock();
    for line in &output.lines {
        writeln!(out, "{}", line.to_plain())?;
    }
    if output.aborted {
        warn!("render pass hit its deadline; output is partial");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn parses_now_and_size() {
        assert_eq!(parse_now("1000").unwrap(), 1000);
        assert_eq!(parse_now("1970-01-01T00:00:01Z").unwrap(), 1000);
        assert!(parse_now("yesterday").is_err());
        assert_eq!(parse_size("294x146"), Some((294, 146)));
        assert_eq!(parse_size("294"), None);
    }

    #[test]
    fn reads_settings_and_skips_invalid_ones() {
        let env = HashMap::from([
            ("AGENDA_EVENTS", "/tmp/events.json"),
            ("AGENDA_NOW", "1000"),
            ("AGENDA_UTC_OFFSET", "7200"),
            ("AGENDA_SIZE_DP", "wide"),
            ("AGENDA_TIMEOUT_MS", "soon"),
        ]);
        let config =
            AppConfig::from_lookup(|key| env.get(key).map(|value| value.to_string())).unwrap();
        assert_eq!(config.events, Some(PathBuf::from("/tmp/events.json")));
        assert_eq!(config.now, Some(1000));
        assert_eq!(config.utc_offset_seconds, Some(7200));
        assert_eq!(config.size_dp, None);
        assert_eq!(config.timeout, None);

        let config = AppConfig::from_lookup(|key| {
            (key == "AGENDA_TIMEOUT_MS").then(|| " 250 ".to_string())
        })
        .unwrap();
        assert_eq!(config.timeout, Some(Duration::from_millis(250)));

        assert!(AppConfig::from_lookup(|key| {
            (key == "AGENDA_NOW").then(|| "later".to_string())
        })
        .is_err());
    }

    #[test]
    fn renders_events_file() {
        let temp = tempdir().expect("tempdir");
        let events_path = temp.path().join("events.json");
        let config_path = temp.path().join("widget.json");
        // 2011-06-15T14:00Z and 15:00Z
        fs::write(
            &events_path,
            r#"[
                {"title": "Standup", "start_millis": 1308146400000, "end_millis": 1308150000000,
                 "start_day": 2455728, "end_day": 2455728, "location": " "},
                {"title": "Anna's birthday", "all_day": true, "start_day": 2455729, "end_day": 2455729,
                 "start_millis": 1308182400000, "end_millis": 1308268800000}
            ]"#,
        )
        .expect("write events");
        fs::write(&config_path, r#"{"lines": 4, "calendar_color": false}"#).expect("write config");

        let config = AppConfig::default()
            .with_widget_config(&config_path)
            .with_events(&events_path)
            // 2011-06-15T10:00Z
            .at(1_308_132_000_000, 0);
        let output = render(&config).expect("render");
        assert_eq!(output.to_plain(), "Tomorrow Anna\n14:00-15:00 Standup");
    }
}
