use std::fmt::{self, Write as _};

use colored::*;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::{self, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

use crate::terminal::colors;

pub const PRINT_TARGET: &str = "subtrack::print";

/// Collects the fields the formatter cares about; everything else is kept
/// as `key=value` pairs.
#[derive(Default)]
struct EventFields {
    status: Option<String>,
    raw_msg: Option<String>,
    message: String,
    extra: String,
}

impl Visit for EventFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "status" => self.status = Some(value.to_string()),
            "raw_msg" => self.raw_msg = Some(value.to_string()),
            "message" => self.message = value.to_string(),
            name => {
                let _ = write!(self.extra, " {name}={value}");
            }
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{value:?}"),
            "status" | "raw_msg" => self.record_str(field, &format!("{value:?}")),
            name => {
                let _ = write!(self.extra, " {name}={value:?}");
            }
        }
    }
}

pub struct SubtrackFormatter;

impl SubtrackFormatter {
    fn prefix(status: Option<&str>, level: &Level) -> ColoredString {
        match (status, *level) {
            (Some("success"), _) => "[+]".green().bold(),
            (Some("info"), _) => "[*]".blue().bold(),
            (Some("warn"), _) | (None, Level::WARN) => "[*]".yellow().bold(),
            (Some("error"), _) | (None, Level::ERROR) => "[-]".red().bold(),
            (_, Level::DEBUG) => "[?]".blue(),
            (_, Level::TRACE) => "[ ]".dimmed(),
            _ => "[+]".green().bold(),
        }
    }
}

impl<S, N> FormatEvent<S, N> for SubtrackFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> format::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let mut fields = EventFields::default();
        event.record(&mut fields);

        if let Some(raw) = fields.raw_msg {
            return writeln!(writer, "{raw}");
        }

        let prefix: ColoredString = Self::prefix(fields.status.as_deref(), meta.level());
        write!(writer, "{} {}", prefix, fields.message.color(colors::TEXT_DEFAULT))?;
        if !fields.extra.is_empty() {
            write!(writer, "{}", fields.extra.color(colors::SEPARATOR))?;
        }
        writeln!(writer)
    }
}

/// Installs the formatter behind an env filter (`RUST_LOG`, default `info`)
/// and routes output through indicatif so progress bars stay intact.
pub fn init_logging() {
    let filter: EnvFilter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let indicatif_layer = IndicatifLayer::new();
    let fmt_layer = tracing_subscriber::fmt::layer()
        .event_format(SubtrackFormatter)
        .with_writer(indicatif_layer.get_stdout_writer());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(indicatif_layer)
        .init();
}
