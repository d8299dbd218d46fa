use serde::{Deserialize, Serialize};
use std::fmt;

use super::time::format_millis;

/// Category tag used when a payload carries no usable `type`.
pub const DEFAULT_KIND: &str = "general_info";

/// Placeholder text used when a payload carries no usable `message`.
pub const DEFAULT_MESSAGE: &str = "Unknown message";

/// Identifier of an activity record, as assigned by the source or derived locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActivityId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityId::Number(n) => write!(f, "{}", n),
            ActivityId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ActivityId {
    fn from(value: i64) -> Self {
        ActivityId::Number(value)
    }
}

impl From<&str> for ActivityId {
    fn from(value: &str) -> Self {
        ActivityId::Text(value.to_string())
    }
}

/// When an activity happened. Sources send either epoch milliseconds or an
/// already formatted display value such as "5 min ago".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActivityTime {
    Millis(i64),
    Display(String),
}

impl ActivityTime {
    /// Human readable form; millisecond timestamps are rendered in local time.
    pub fn display(&self) -> String {
        match self {
            ActivityTime::Millis(ms) => format_millis(*ms),
            ActivityTime::Display(s) => s.clone(),
        }
    }

    /// Converts a millisecond timestamp into its display form, leaving display values alone.
    pub fn normalized(self) -> Self {
        match self {
            ActivityTime::Millis(ms) => ActivityTime::Display(format_millis(ms)),
            other => other,
        }
    }
}

/// Closed display classification of an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Danger,
    Error,
    #[default]
    Info,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Success,
        Severity::Warning,
        Severity::Danger,
        Severity::Error,
        Severity::Info,
    ];

    /// Parses a wire label, matched exactly. Anything outside the closed set,
    /// including other casings, is `Info`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "success" => Severity::Success,
            "warning" => Severity::Warning,
            "danger" => Severity::Danger,
            "error" => Severity::Error,
            _ => Severity::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
            Severity::Error => "error",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Icons the dashboard knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Icon {
    Users,
    Shield,
    AlertTriangle,
    TrendingUp,
    Battery,
    MapPin,
    Clock,
    ThermometerSun,
    Wind,
    Wifi,
    WifiOff,
    BatteryLow,
    UserPlus,
    #[default]
    Info,
    Zap,
    ShieldAlert,
    ShieldCheck,
}

impl Icon {
    pub const ALL: [Icon; 17] = [
        Icon::Users,
        Icon::Shield,
        Icon::AlertTriangle,
        Icon::TrendingUp,
        Icon::Battery,
        Icon::MapPin,
        Icon::Clock,
        Icon::ThermometerSun,
        Icon::Wind,
        Icon::Wifi,
        Icon::WifiOff,
        Icon::BatteryLow,
        Icon::UserPlus,
        Icon::Info,
        Icon::Zap,
        Icon::ShieldAlert,
        Icon::ShieldCheck,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Icon::Users => "Users",
            Icon::Shield => "Shield",
            Icon::AlertTriangle => "AlertTriangle",
            Icon::TrendingUp => "TrendingUp",
            Icon::Battery => "Battery",
            Icon::MapPin => "MapPin",
            Icon::Clock => "Clock",
            Icon::ThermometerSun => "ThermometerSun",
            Icon::Wind => "Wind",
            Icon::Wifi => "Wifi",
            Icon::WifiOff => "WifiOff",
            Icon::BatteryLow => "BatteryLow",
            Icon::UserPlus => "UserPlus",
            Icon::Info => "Info",
            Icon::Zap => "Zap",
            Icon::ShieldAlert => "ShieldAlert",
            Icon::ShieldCheck => "ShieldCheck",
        }
    }

    /// Looks up an icon by its exact name, falling back to `Info`.
    pub fn from_name(name: &str) -> Self {
        Icon::ALL
            .iter()
            .copied()
            .find(|icon| icon.name() == name)
            .unwrap_or_default()
    }
}

/// One notable event surfaced to an operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: ActivityId,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(rename = "time")]
    pub occurred_at: ActivityTime,
    #[serde(rename = "status")]
    pub severity: Severity,
    pub icon: Icon,
}

impl ActivityRecord {
    /// Builds a record with default kind, severity and icon.
    pub fn new(id: impl Into<ActivityId>, message: impl Into<String>, occurred_at: ActivityTime) -> Self {
        Self {
            id: id.into(),
            kind: DEFAULT_KIND.to_string(),
            message: message.into(),
            occurred_at,
            severity: Severity::Info,
            icon: Icon::Info,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_icon(mut self, icon: Icon) -> Self {
        self.icon = icon;
        self
    }
}

impl fmt::Display for ActivityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}): {}",
            self.occurred_at.display(),
            self.severity,
            self.kind,
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_severity_labels() {
        assert_eq!(Severity::from_label("danger"), Severity::Danger);
        assert_eq!(Severity::from_label(" Warning "), Severity::Info);
        assert_eq!(Severity::from_label("Warning"), Severity::Info);
        assert_eq!(Severity::from_label("DANGER"), Severity::Info);
        assert_eq!(Severity::from_label("resolved"), Severity::Info);
        assert_eq!(Severity::from_label(""), Severity::Info);
        for severity in Severity::ALL {
            assert_eq!(Severity::from_label(severity.as_str()), severity);
        }
    }

    #[test]
    fn test_icon_lookup_falls_back_to_info() {
        assert_eq!(Icon::from_name("WifiOff"), Icon::WifiOff);
        assert_eq!(Icon::from_name("CloudCheck"), Icon::Info);
        assert_eq!(Icon::from_name("wifioff"), Icon::Info);
    }

    #[test]
    fn test_record_wire_shape() {
        let record = ActivityRecord::new(7, "Helmet online", ActivityTime::Display("now".into()))
            .with_kind("device_connect")
            .with_severity(Severity::Success)
            .with_icon(Icon::Wifi);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "type": "device_connect",
                "message": "Helmet online",
                "time": "now",
                "status": "success",
                "icon": "Wifi"
            })
        );
    }

    #[test]
    fn test_display_time_is_kept_verbatim() {
        let time = ActivityTime::Display("12 min ago".into());
        assert_eq!(time.display(), "12 min ago");
        assert_eq!(time.clone().normalized(), time);
    }
}
