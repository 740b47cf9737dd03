//! Injectable tracing of editor events.
//!
//! The editor reports what it does through a [`Trace`]. The default is
//! [`NoopTrace`]; hosts that want diagnostics install [`LogTrace`] or their
//! own sink.

use crate::input::HitTarget;
use crate::interaction::DragSubject;
use crate::tools::DrawingMode;
use kurbo::{Point, Size, Vec2};
use std::fmt;
use uuid::Uuid;

/// One traced editor event.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    Click { position: Point, hit: HitTarget },
    ModeChanged(Option<DrawingMode>),
    DragStarted(DragSubject),
    DragEnded { subject: DragSubject, delta: Vec2 },
    ResizeStarted(String),
    ResizeEnded(String),
    Dropped { target: u64, position: Point },
    ViewportRecomputed { canvas: Size, scale: f64 },
    CommandQueued(&'static str),
    CommandFailed { operation: &'static str, entity: Option<String> },
    Reverted(&'static str),
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEvent::Click { position, hit } => write!(f, "click at ({:.1}, {:.1}) on {hit:?}", position.x, position.y),
            TraceEvent::ModeChanged(mode) => write!(f, "drawing mode {mode:?}"),
            TraceEvent::DragStarted(subject) => write!(f, "drag start {subject:?}"),
            TraceEvent::DragEnded { subject, delta } => {
                write!(f, "drag end {subject:?} by ({:.1}, {:.1})", delta.x, delta.y)
            }
            TraceEvent::ResizeStarted(id) => write!(f, "resize start {id}"),
            TraceEvent::ResizeEnded(id) => write!(f, "resize end {id}"),
            TraceEvent::Dropped { target, position } => {
                write!(f, "drop target {target} at ({:.1}, {:.1})", position.x, position.y)
            }
            TraceEvent::ViewportRecomputed { canvas, scale } => {
                write!(f, "viewport {:.0}x{:.0} scale {scale:.3}", canvas.width, canvas.height)
            }
            TraceEvent::CommandQueued(op) => write!(f, "queued {op}"),
            TraceEvent::CommandFailed { operation, entity } => {
                write!(f, "{operation} failed for {}", entity.as_deref().unwrap_or("layout"))
            }
            TraceEvent::Reverted(op) => write!(f, "reverted {op}"),
        }
    }
}

/// Sink for editor trace events.
pub trait Trace {
    fn record(&self, session: Uuid, event: &TraceEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTrace;

impl Trace for NoopTrace {
    fn record(&self, _session: Uuid, _event: &TraceEvent) {}
}

/// Forwards events to `log::trace!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTrace;

impl Trace for LogTrace {
    fn record(&self, session: Uuid, event: &TraceEvent) {
        log::trace!("[{session}] {event}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_display() {
        let event = TraceEvent::DragEnded {
            subject: DragSubject::Target(4),
            delta: Vec2::new(20.0, 5.0),
        };
        assert_eq!(event.to_string(), "drag end Target(4) by (20.0, 5.0)");
        let failed = TraceEvent::CommandFailed {
            operation: "save_layout",
            entity: None,
        };
        assert_eq!(failed.to_string(), "save_layout failed for layout");
    }

    #[test]
    fn test_sinks_accept_events() {
        let _ = env_logger::builder().is_test(true).try_init();
        let session = Uuid::new_v4();
        NoopTrace.record(session, &TraceEvent::ModeChanged(None));
        LogTrace.record(session, &TraceEvent::ResizeEnded("room-1".into()));
    }
}
