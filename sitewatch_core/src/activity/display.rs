//! Display attributes for activity records.

use serde::Serialize;

use super::record::{ActivityRecord, Icon, Severity};

/// Colour family of a severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Green,
    Yellow,
    Red,
    Blue,
}

/// Styling of one activity row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivityStyle {
    pub tone: Tone,
    pub dot_class: &'static str,
    pub icon_bg_class: &'static str,
    pub icon_class: &'static str,
    /// Fixed-width tag for terminal output.
    pub label: &'static str,
}

const SUCCESS: ActivityStyle = ActivityStyle {
    tone: Tone::Green,
    dot_class: "bg-green-500",
    icon_bg_class: "bg-green-100",
    icon_class: "text-green-600",
    label: "OK  ",
};

const WARNING: ActivityStyle = ActivityStyle {
    tone: Tone::Yellow,
    dot_class: "bg-yellow-500",
    icon_bg_class: "bg-yellow-100",
    icon_class: "text-yellow-600",
    label: "WARN",
};

const DANGER: ActivityStyle = ActivityStyle {
    tone: Tone::Red,
    dot_class: "bg-red-500",
    icon_bg_class: "bg-red-100",
    icon_class: "text-red-600",
    label: "DNGR",
};

const ERROR: ActivityStyle = ActivityStyle {
    tone: Tone::Red,
    dot_class: "bg-red-500",
    icon_bg_class: "bg-red-100",
    icon_class: "text-red-600",
    label: "ERR ",
};

/// Fallback entry.
pub const INFO: ActivityStyle = ActivityStyle {
    tone: Tone::Blue,
    dot_class: "bg-blue-500",
    icon_bg_class: "bg-blue-100",
    icon_class: "text-blue-600",
    label: "INFO",
};

impl Severity {
    pub fn style(&self) -> ActivityStyle {
        match self {
            Severity::Success => SUCCESS,
            Severity::Warning => WARNING,
            Severity::Danger => DANGER,
            Severity::Error => ERROR,
            Severity::Info => INFO,
        }
    }
}

/// Read-only projection of a record for a renderer.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityView<'a> {
    #[serde(flatten)]
    pub record: &'a ActivityRecord,
    pub display_time: String,
    pub style: ActivityStyle,
}

impl<'a> ActivityView<'a> {
    pub fn new(record: &'a ActivityRecord) -> Self {
        Self {
            record,
            display_time: record.occurred_at.display(),
            style: record.severity.style(),
        }
    }

    pub fn icon(&self) -> Icon {
        self.record.icon
    }

    /// Single line for terminal output.
    pub fn line(&self) -> String {
        format!(
            "{} {:<14} {:<16} {}",
            self.style.label,
            self.display_time,
            self.record.icon.name(),
            self.record.message
        )
    }
}

/// Renders a whole feed, newest first.
pub fn render_lines<'a>(records: impl IntoIterator<Item = &'a ActivityRecord>) -> Vec<String> {
    records
        .into_iter()
        .map(|record| ActivityView::new(record).line())
        .collect()
}
