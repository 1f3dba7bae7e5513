use colored::*;
use subtrack_common::models::{Health, MetadataRecord, StatusClass};

use crate::terminal::colors;

pub type Detail = (String, ColoredString);

pub fn health_color(health: Health) -> Color {
    match health {
        Health::Up => colors::HEALTH_UP,
        Health::Warn => colors::HEALTH_WARN,
        Health::Down => colors::HEALTH_DOWN,
        Health::Unknown => colors::HEALTH_UNKNOWN,
    }
}

fn class_color(class: StatusClass) -> Color {
    match class {
        StatusClass::Redirect => colors::HEALTH_REDIRECT,
        other => health_color(other.health()),
    }
}

/// `[404 Client Error]`, or `[--- No Response]` for a silent host.
pub fn status_badge(record: &MetadataRecord) -> ColoredString {
    let class: StatusClass = record.status_class();
    let code: String = record
        .status_code
        .map_or_else(|| String::from("---"), |code| code.to_string());
    format!("[{} {}]", code, class.label()).color(class_color(class))
}

/// One line per probed host: badge, name, optional title, `NEW` marker.
pub fn record_line(record: &MetadataRecord, is_new: bool) -> String {
    let mut line: String = format!(
        "{} {}",
        status_badge(record),
        record.host.as_str().color(colors::HOSTNAME)
    );
    if let Some(title) = record.title.as_deref() {
        line.push_str(&format!(" {}", format!("\"{title}\"").color(colors::TITLE)));
    }
    if is_new {
        line.push_str(&format!(" {}", "NEW".color(colors::NEW_HOST).bold()));
    }
    line
}

/// Count of records per health bucket, in display order.
pub fn health_summary<'a>(records: impl IntoIterator<Item = &'a MetadataRecord>) -> Vec<(Health, usize)> {
    let order: [Health; 4] = [Health::Up, Health::Warn, Health::Down, Health::Unknown];
    let mut counts: [usize; 4] = [0; 4];
    for record in records {
        let health: Health = record.status_class().health();
        if let Some(slot) = order.iter().position(|h| *h == health) {
            counts[slot] += 1;
        }
    }
    order.into_iter().zip(counts).collect()
}

pub fn health_label(health: Health) -> &'static str {
    match health {
        Health::Up => "Up",
        Health::Warn => "Warn",
        Health::Down => "Down",
        Health::Unknown => "Unknown",
    }
}
