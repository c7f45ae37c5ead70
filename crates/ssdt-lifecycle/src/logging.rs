//! Level-prefixed log lines for hosts that show plain text output.
//!
//! Every event is rendered as one line, prefixed with its severity
//! (`ERROR: `, `WARNING: `, ...; info lines carry no prefix). Events with a
//! `critical = true` field are rendered with `CRITICAL: `.
//!
//! - [`PrefixedLineLayer`] forwards the lines to a channel
//! - [`PrefixedLineFormat`] writes them through a `tracing_subscriber::fmt`
//!   writer, synchronously

use std::fmt::{self, Write as FmtWrite};

use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

const CRITICAL_FIELD: &str = "critical";

/// A tracing layer that sends prefixed log lines to a channel.
pub struct PrefixedLineLayer {
    tx: mpsc::Sender<String>,
}

impl PrefixedLineLayer {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }
}

impl<S> Layer<S> for PrefixedLineLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        // a full or closed channel must never fail the run being logged
        let _ = self.tx.try_send(render_event(event));
    }
}

/// Event format for `tracing_subscriber::fmt()` producing the same lines as
/// [`PrefixedLineLayer`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PrefixedLineFormat;

impl<S, N> FormatEvent<S, N> for PrefixedLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        writeln!(writer, "{}", render_event(event))
    }
}

fn render_event(event: &Event<'_>) -> String {
    let mut visitor = MessageVisitor::default();
    event.record(&mut visitor);
    format_log_line(*event.metadata().level(), visitor.critical, &visitor.message)
}

/// Render `message` with the prefix for `level`.
pub fn format_log_line(level: Level, critical: bool, message: &str) -> String {
    let prefix = if critical {
        "CRITICAL: "
    } else {
        match level {
            Level::ERROR => "ERROR: ",
            Level::WARN => "WARNING: ",
            Level::INFO => "",
            Level::DEBUG => "DEBUG: ",
            Level::TRACE => "TRACE: ",
        }
    };
    format!("{}{}", prefix, message)
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    critical: bool,
}

impl MessageVisitor {
    fn push_field(&mut self, name: &str, value: impl fmt::Display) {
        if !self.message.is_empty() {
            self.message.push(' ');
        }
        let _ = write!(self.message, "{}={}", name, value);
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            self.push_field(field.name(), format_args!("{:?}", value));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.push_field(field.name(), value);
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == CRITICAL_FIELD {
            self.critical = value;
        } else {
            self.push_field(field.name(), value);
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push_field(field.name(), value);
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push_field(field.name(), value);
    }
}
