use std::fs;
use std::sync::{Arc, Mutex};

use agenda_core::birthday::BirthdayMatcher;
use agenda_core::config::{BirthdayPolicy, LayoutVariant};
use agenda_core::event::sort_events;
use agenda_core::format::{LineRows, RenderedLine};
use agenda_core::render::{RefreshScheduler, REFRESH_GRACE_MILLIS};
use agenda_core::{RawEvent, RenderPass, WidgetConfig};
use chrono::{NaiveDate, TimeZone, Utc};
use tempfile::tempdir;

const HOUR: i64 = 60 * 60 * 1000;

fn at(y: i32, m: u32, d: u32, h: u32) -> i64 {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0)
        .unwrap()
        .timestamp_millis()
}

fn julian(y: i32, m: u32, d: u32) -> i32 {
    agenda_core::buckets::julian_day_for_date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn timed(title: &str, start: i64, end: i64) -> RawEvent {
    RawEvent {
        title: Some(title.to_string()),
        start_millis: start,
        end_millis: end,
        start_day: agenda_core::buckets::julian_day(start, 0).unwrap(),
        end_day: agenda_core::buckets::julian_day(end, 0).unwrap(),
        calendar_id: 1,
        color: 0x3366ff,
        ..RawEvent::default()
    }
}

fn birthday(title: &str) -> RawEvent {
    let day = julian(2011, 6, 16);
    RawEvent {
        title: Some(title.to_string()),
        all_day: true,
        start_day: day,
        end_day: day,
        start_millis: at(2011, 6, 16, 0),
        end_millis: at(2011, 6, 17, 0),
        calendar_id: 2,
        ..RawEvent::default()
    }
}

fn fixture() -> Vec<RawEvent> {
    let mut events = vec![
        birthday("Cleo's birthday"),
        timed("Conference", at(2012, 3, 1, 10), at(2012, 3, 1, 11)),
        birthday("Anna's birthday"),
        timed("Old", at(2011, 6, 15, 8), at(2011, 6, 15, 9)),
        RawEvent {
            location: Some("Room 4".into()),
            has_alarm: true,
            ..timed("Standup", at(2011, 6, 15, 14), at(2011, 6, 15, 15))
        },
        RawEvent {
            calendar_id: 9,
            ..timed("Private", at(2011, 6, 15, 11), at(2011, 6, 15, 12))
        },
        timed("Trip", at(2011, 6, 15, 15), at(2011, 6, 15, 15) + 30 * HOUR),
        birthday("Ben's birthday"),
    ];
    sort_events(&mut events);
    events
}

#[derive(Clone, Default)]
struct RecordingScheduler {
    requests: Arc<Mutex<Vec<i64>>>,
}

impl RefreshScheduler for RecordingScheduler {
    fn schedule_refresh(&self, at_millis: i64) {
        self.requests.lock().expect("scheduler lock").push(at_millis);
    }
}

#[test]
fn classic_pass_from_config_file() {
    let temp = tempdir().expect("tempdir");
    let config_path = temp.path().join("widget.json");
    fs::write(&config_path, r#"{"lines": 3, "disabled_calendars": [9]}"#)
        .expect("write config");
    let config = WidgetConfig::load(&config_path).expect("load config");

    let scheduler = RecordingScheduler::default();
    let pass = RenderPass::builder(config)
        .now(at(2011, 6, 15, 10))
        .utc_offset(0)
        .with_scheduler(Box::new(scheduler.clone()))
        .build()
        .expect("build render pass");

    let output = pass.run(fixture());
    assert!(!output.aborted);
    assert_eq!(output.accepted, 4, "Cleo and Conference are never pulled");
    assert_eq!(
        output.to_plain(),
        [
            " \tTomorrow Anna\tTomorrow Ben",
            "■\t14:00-15:00 Standup, Room 4",
            "■\tToday 15:00-Tomorrow 21:00 Trip",
        ]
        .join("\n")
    );

    let RenderedLine::Event(standup) = &output.lines[1] else {
        panic!("expected event line");
    };
    assert!(standup.has_reminder);

    assert_eq!(output.next_update, at(2011, 6, 15, 15));
    assert_eq!(
        *scheduler.requests.lock().unwrap(),
        vec![at(2011, 6, 15, 15) + REFRESH_GRACE_MILLIS]
    );
    assert_eq!(output.background_level, 3);
}

#[test]
fn hidden_birthdays_leave_room_for_agenda() {
    let config = WidgetConfig {
        lines: 3,
        birthdays: BirthdayPolicy::Hidden,
        disabled_calendars: vec![9],
        ..WidgetConfig::default()
    };
    let pass = RenderPass::builder(config)
        .now(at(2011, 6, 15, 10))
        .utc_offset(0)
        .build()
        .unwrap();

    let output = pass.run(fixture());
    let plain = output.to_plain();
    assert!(!plain.contains("Anna"));
    assert!(plain.ends_with("■\t1.03.12 10:00-11:00 Conference"));
    assert_eq!(output.lines.len(), 3);
}

#[test]
fn two_line_layout_spends_two_rows_per_timed_event() {
    let config = WidgetConfig {
        lines: 5,
        layout: LayoutVariant::TwoLines,
        disabled_calendars: vec![9],
        ..WidgetConfig::default()
    };
    let pass = RenderPass::builder(config)
        .now(at(2011, 6, 15, 10))
        .utc_offset(0)
        .build()
        .unwrap();

    let output = pass.run(fixture());
    let rows: Vec<_> = output
        .lines
        .iter()
        .map(|line| match line {
            RenderedLine::Event(event) => event.rows,
            RenderedLine::Birthdays(_) => panic!("two-line layout never pairs birthdays"),
        })
        .collect();
    assert_eq!(rows, vec![LineRows::Double, LineRows::Double, LineRows::Single]);
    assert_eq!(output.lines[2].to_plain(), "Tomorrow Anna");
    assert_eq!(output.lines[0].to_plain(), "14:00-15:00, Room 4\nStandup");
}

#[test]
fn abort_hook_stops_between_events() {
    let config = WidgetConfig {
        lines: 3,
        disabled_calendars: vec![9],
        ..WidgetConfig::default()
    };
    let pass = RenderPass::builder(config)
        .now(at(2011, 6, 15, 10))
        .utc_offset(0)
        .build()
        .unwrap();

    let mut pulls = 0;
    let output = pass.run_until(fixture(), || {
        pulls += 1;
        pulls > 1
    });
    assert!(output.aborted);
    assert_eq!(output.accepted, 1);
    assert_eq!(output.lines.len(), 1);
}

#[test]
fn empty_source_refreshes_at_midnight() {
    let pass = RenderPass::builder(WidgetConfig::default())
        .now(at(2011, 6, 15, 10))
        .utc_offset(0)
        .build()
        .unwrap();
    let output = pass.run(Vec::new());
    assert!(output.lines.is_empty());
    assert_eq!(output.next_update, at(2011, 6, 16, 0));
}

#[test]
fn invalid_config_is_rejected_before_rendering() {
    let config = WidgetConfig {
        lines: 0,
        ..WidgetConfig::default()
    };
    assert!(RenderPass::builder(config).build().is_err());
}

#[test]
fn custom_birthday_matcher_replaces_builtin_patterns() {
    let config = WidgetConfig {
        lines: 2,
        disabled_calendars: vec![9],
        ..WidgetConfig::default()
    };
    let matcher = BirthdayMatcher::compile(&[r"^(.+?)'s birthday$"]).unwrap();
    let pass = RenderPass::builder(config)
        .now(at(2011, 6, 15, 10))
        .utc_offset(0)
        .with_birthday_matcher(matcher)
        .build()
        .unwrap();
    assert_eq!(pass.config().lines, 2);
    assert_eq!(pass.buckets().today, julian(2011, 6, 15));
    assert_eq!(pass.buckets().tomorrow_start, at(2011, 6, 16, 0));

    let events = vec![birthday("Geburtstag: Dora"), birthday("Anna's birthday")];
    let output = pass.run(events);
    assert_eq!(output.to_plain(), " \tTomorrow Anna\n■\tTomorrow Geburtstag: Dora");
}

#[test]
fn local_offset_shifts_day_labels() {
    const CEST: i32 = 2 * 3600;
    let config = WidgetConfig {
        lines: 3,
        birthdays: BirthdayPolicy::Hidden,
        ..WidgetConfig::default()
    };
    let local = |title: &str, start: i64, end: i64| RawEvent {
        start_day: agenda_core::buckets::julian_day(start, CEST).unwrap(),
        end_day: agenda_core::buckets::julian_day(end, CEST).unwrap(),
        ..timed(title, start, end)
    };
    // 2011-06-15 22:30 local
    let pass = RenderPass::builder(config)
        .now(at(2011, 6, 15, 20) + 30 * 60 * 1000)
        .utc_offset(CEST)
        .build()
        .unwrap();
    assert_eq!(pass.buckets().tomorrow_start, at(2011, 6, 15, 22));

    let events = vec![
        local("Late", at(2011, 6, 15, 21), at(2011, 6, 15, 22)),
        // still June 15 in UTC
        local("Night", at(2011, 6, 15, 23), at(2011, 6, 15, 23) + 30 * 60 * 1000),
    ];
    let output = pass.run(events);
    assert_eq!(
        output.to_plain(),
        "■\t23:00-00:00 Late\n■\tTomorrow 01:00-01:30 Night"
    );
    assert_eq!(output.next_update, at(2011, 6, 15, 22));
}
