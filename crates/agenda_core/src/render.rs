use std::time::Instant;

use chrono::{Local, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::allocator::Allocator;
use crate::birthday::BirthdayMatcher;
use crate::buckets::Buckets;
use crate::config::WidgetConfig;
use crate::error::Result;
use crate::event::RawEvent;
use crate::format::{Formatter, RenderedLine};
use crate::intake::EventFilter;

/// Added to the next relevant change so the refresh lands after it.
pub const REFRESH_GRACE_MILLIS: i64 = 1000;

/// Platform hook that re-runs the widget at a given time.
pub trait RefreshScheduler: Send + Sync {
    fn schedule_refresh(&self, at_millis: i64);
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RenderOutput {
    pub lines: Vec<RenderedLine>,
    /// Earliest end of an accepted timed event, or the next midnight.
    pub next_update: i64,
    pub background_level: u8,
    pub font_scale: f32,
    pub accepted: usize,
    /// True when the pass stopped early on the deadline or abort hook.
    pub aborted: bool,
}

impl RenderOutput {
    pub fn to_plain(&self) -> String {
        self.lines
            .iter()
            .map(RenderedLine::to_plain)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub struct RenderPassBuilder {
    config: WidgetConfig,
    now: Option<i64>,
    utc_offset_seconds: Option<i32>,
    matcher: Option<BirthdayMatcher>,
    scheduler: Option<Box<dyn RefreshScheduler>>,
    deadline: Option<Instant>,
}

impl RenderPassBuilder {
    pub fn new(config: WidgetConfig) -> Self {
        Self {
            config,
            now: None,
            utc_offset_seconds: None,
            matcher: None,
            scheduler: None,
            deadline: None,
        }
    }

    pub fn now(mut self, now_millis: i64) -> Self {
        self.now = Some(now_millis);
        self
    }

    /// Offset applied to every timestamp of the pass, hours included, so an
    /// event past a daylight saving change renders with it too. Defaults to
    /// the current local offset.
    pub fn utc_offset(mut self, seconds: i32) -> Self {
        self.utc_offset_seconds = Some(seconds);
        self
    }

    pub fn with_birthday_matcher(mut self, matcher: BirthdayMatcher) -> Self {
        self.matcher = Some(matcher);
        self
    }

    pub fn with_scheduler(mut self, scheduler: Box<dyn RefreshScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn build(self) -> Result<RenderPass> {
        self.config.validate()?;
        let now = self.now.unwrap_or_else(|| Utc::now().timestamp_millis());
        let offset = self
            .utc_offset_seconds
            .unwrap_or_else(|| Local::now().offset().local_minus_utc());
        let buckets = Buckets::compute(now, offset)?;
        let filter = match self.matcher {
            Some(matcher) => EventFilter::new(&self.config, now, buckets.today, matcher),
            None => EventFilter::from_config(&self.config, now, buckets.today)?,
        };
        debug!(now, offset, today = buckets.today, "render pass prepared");
        Ok(RenderPass {
            config: self.config,
            buckets,
            filter,
            scheduler: self.scheduler,
            deadline: self.deadline,
        })
    }
}

/// One widget refresh: pulls events until the widget is full, then formats
/// what was accepted.
pub struct RenderPass {
    config: WidgetConfig,
    buckets: Buckets,
    filter: EventFilter,
    scheduler: Option<Box<dyn RefreshScheduler>>,
    deadline: Option<Instant>,
}

impl RenderPass {
    pub fn builder(config: WidgetConfig) -> RenderPassBuilder {
        RenderPassBuilder::new(config)
    }

    pub fn buckets(&self) -> &Buckets {
        &self.buckets
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn run<I>(&self, events: I) -> RenderOutput
    where
        I: IntoIterator<Item = RawEvent>,
    {
        let deadline = self.deadline;
        self.run_until(events, || {
            deadline.is_some_and(|deadline| Instant::now() >= deadline)
        })
    }

    /// Like [`RenderPass::run`], checking `should_abort` before every pull.
    #[tracing::instrument(skip_all, fields(lines = self.config.lines, layout = ?self.config.layout))]
    pub fn run_until<I, F>(&self, events: I, mut should_abort: F) -> RenderOutput
    where
        I: IntoIterator<Item = RawEvent>,
        F: FnMut() -> bool,
    {
        let mut allocator = Allocator::for_layout(self.config.layout, self.config.lines);
        let mut next_update = self.buckets.tomorrow_start;
        let mut accepted = 0;
        let mut aborted = false;
        let mut source = events.into_iter();

        while !allocator.is_full() {
            if should_abort() {
                warn!(accepted, "render pass aborted");
                aborted = true;
                break;
            }
            let Some(event) = source.by_ref().find_map(|raw| self.filter.admit(raw)) else {
                break;
            };
            let (all_day, end) = (event.all_day, event.end_millis);
            if allocator.add_event(event) {
                accepted += 1;
                if !all_day {
                    next_update = next_update.min(end);
                }
            }
        }

        let allocation = allocator.finish();
        let lines = Formatter::new(self.buckets, &self.config).lines(&allocation);

        if let Some(scheduler) = &self.scheduler {
            scheduler.schedule_refresh(next_update + REFRESH_GRACE_MILLIS);
        }
        info!(accepted, lines = lines.len(), next_update, "render pass finished");

        RenderOutput {
            lines,
            next_update,
            background_level: self.config.background_level(),
            font_scale: self.config.font_size,
            accepted,
            aborted,
        }
    }
}
