use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum AlertKind {
    NoFace,
    MultipleFaces,
    HeadTurned,
    TabSwitch,
    LookingAway,
    MultipleVoices,
    PhoneDetected,
    MultipleMonitors,
    CopyAttempt,
    PasteAttempt,
    TaskSwitch,
    ScreenshotAttempt,
    DevToolsBlocked,
    DetectorDegraded,
}

impl AlertKind {
    pub const ALL: [AlertKind; 14] = [
        AlertKind::NoFace,
        AlertKind::MultipleFaces,
        AlertKind::HeadTurned,
        AlertKind::TabSwitch,
        AlertKind::LookingAway,
        AlertKind::MultipleVoices,
        AlertKind::PhoneDetected,
        AlertKind::MultipleMonitors,
        AlertKind::CopyAttempt,
        AlertKind::PasteAttempt,
        AlertKind::TaskSwitch,
        AlertKind::ScreenshotAttempt,
        AlertKind::DevToolsBlocked,
        AlertKind::DetectorDegraded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::NoFace => "noFace",
            AlertKind::MultipleFaces => "multipleFaces",
            AlertKind::HeadTurned => "headTurned",
            AlertKind::TabSwitch => "tabSwitch",
            AlertKind::LookingAway => "lookingAway",
            AlertKind::MultipleVoices => "multipleVoices",
            AlertKind::PhoneDetected => "phoneDetected",
            AlertKind::MultipleMonitors => "multipleMonitors",
            AlertKind::CopyAttempt => "copyAttempt",
            AlertKind::PasteAttempt => "pasteAttempt",
            AlertKind::TaskSwitch => "taskSwitch",
            AlertKind::ScreenshotAttempt => "screenshotAttempt",
            AlertKind::DevToolsBlocked => "devToolsBlocked",
            AlertKind::DetectorDegraded => "detectorDegraded",
        }
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            AlertKind::NoFace
            | AlertKind::HeadTurned
            | AlertKind::LookingAway
            | AlertKind::MultipleMonitors => Severity::Warning,
            AlertKind::MultipleFaces
            | AlertKind::TabSwitch
            | AlertKind::MultipleVoices
            | AlertKind::PhoneDetected
            | AlertKind::TaskSwitch
            | AlertKind::ScreenshotAttempt => Severity::Danger,
            AlertKind::CopyAttempt | AlertKind::PasteAttempt | AlertKind::DevToolsBlocked => {
                Severity::Error
            }
            AlertKind::DetectorDegraded => Severity::Info,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Danger,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
            Severity::Error => "error",
        }
    }
}

/// Named counter slots kept alongside `total_alerts`. Kinds without a slot
/// only contribute to the total.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatCounter {
    #[serde(rename = "noFaceCount")]
    NoFace,
    #[serde(rename = "multipleFacesCount")]
    MultipleFaces,
    #[serde(rename = "headTurnedCount")]
    HeadTurned,
    #[serde(rename = "tabSwitchCount")]
    TabSwitch,
    #[serde(rename = "lookingAwayCount")]
    LookingAway,
    #[serde(rename = "multipleVoicesCount")]
    MultipleVoices,
    #[serde(rename = "phoneDetectedCount")]
    PhoneDetected,
    #[serde(rename = "multipleMonitorsCount")]
    MultipleMonitors,
    #[serde(rename = "totalAlerts")]
    TotalAlerts,
}

impl StatCounter {
    pub const ALL: [StatCounter; 9] = [
        StatCounter::NoFace,
        StatCounter::MultipleFaces,
        StatCounter::HeadTurned,
        StatCounter::TabSwitch,
        StatCounter::LookingAway,
        StatCounter::MultipleVoices,
        StatCounter::PhoneDetected,
        StatCounter::MultipleMonitors,
        StatCounter::TotalAlerts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatCounter::NoFace => "noFaceCount",
            StatCounter::MultipleFaces => "multipleFacesCount",
            StatCounter::HeadTurned => "headTurnedCount",
            StatCounter::TabSwitch => "tabSwitchCount",
            StatCounter::LookingAway => "lookingAwayCount",
            StatCounter::MultipleVoices => "multipleVoicesCount",
            StatCounter::PhoneDetected => "phoneDetectedCount",
            StatCounter::MultipleMonitors => "multipleMonitorsCount",
            StatCounter::TotalAlerts => "totalAlerts",
        }
    }
}

/// A detector's claim that its condition holds on this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub kind: AlertKind,
    pub message: String,
    pub severity: Severity,
}

impl Candidate {
    pub fn new(kind: AlertKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            severity: kind.default_severity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    pub kind: AlertKind,
    pub timestamp: DateTime<Utc>,
}
