pub mod allocator;
pub mod birthday;
pub mod buckets;
pub mod config;
pub mod error;
pub mod event;
pub mod format;
pub mod intake;
pub mod render;
pub mod styled;

pub use crate::buckets::{compute_buckets, Buckets};
pub use crate::config::WidgetConfig;
pub use crate::error::{Result, WidgetError};
pub use crate::event::{Event, RawEvent};
pub use crate::format::{Formatter, RenderedLine};
pub use crate::render::{RenderOutput, RenderPass, RenderPassBuilder};
