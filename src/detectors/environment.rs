//! Display geometry, document visibility and input interception.

use chrono::{DateTime, Utc};

use crate::detectors::config::DisplayConfig;
use crate::detectors::Detector;
use crate::models::{AlertKind, Candidate, InputKind, Observation, Size};

pub struct DisplayDetector {
    config: DisplayConfig,
}

impl DisplayDetector {
    pub fn new(config: DisplayConfig) -> Self {
        Self { config }
    }

    /// A screen much larger than its usable area points at an extended
    /// desktop spanning several monitors.
    pub fn spans_multiple_monitors(&self, screen: Size, available: Size) -> bool {
        let ratio = self.config.span_ratio;
        f64::from(screen.width) > f64::from(available.width) * ratio
            || f64::from(screen.height) > f64::from(available.height) * ratio
    }
}

impl Detector for DisplayDetector {
    fn name(&self) -> &'static str {
        "display"
    }

    fn evaluate(&mut self, observation: &Observation, _now: DateTime<Utc>) -> Vec<Candidate> {
        match observation {
            Observation::DisplayGeometry { screen, available }
                if self.spans_multiple_monitors(*screen, *available) =>
            {
                vec![Candidate::new(
                    AlertKind::MultipleMonitors,
                    format!(
                        "Multiple monitors detected ({}x{} screen, {}x{} available)",
                        screen.width, screen.height, available.width, available.height
                    ),
                )]
            }
            _ => Vec::new(),
        }
    }
}

/// Fires on each visible -> hidden transition.
#[derive(Default)]
pub struct VisibilityDetector {
    hidden: bool,
}

impl VisibilityDetector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Detector for VisibilityDetector {
    fn name(&self) -> &'static str {
        "visibility"
    }

    fn evaluate(&mut self, observation: &Observation, _now: DateTime<Utc>) -> Vec<Candidate> {
        let Observation::VisibilityEvent { hidden } = observation else {
            return Vec::new();
        };

        let became_hidden = *hidden && !self.hidden;
        self.hidden = *hidden;

        if became_hidden {
            vec![Candidate::new(
                AlertKind::TabSwitch,
                "Tab switch detected - exam window lost focus",
            )]
        } else {
            Vec::new()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputVerdict {
    /// Whether the host should cancel the browser's default action.
    pub block_default: bool,
    pub candidate: Option<Candidate>,
}

impl InputVerdict {
    fn allow() -> Self {
        Self {
            block_default: false,
            candidate: None,
        }
    }

    fn block(kind: AlertKind, message: &str) -> Self {
        Self {
            block_default: true,
            candidate: Some(Candidate::new(kind, message)),
        }
    }
}

/// Stateless clipboard/shortcut interception.
#[derive(Default)]
pub struct InputGuard;

impl InputGuard {
    pub fn new() -> Self {
        Self
    }

    pub fn intercept(&self, input: &InputKind) -> InputVerdict {
        match input {
            InputKind::Copy | InputKind::Cut => {
                InputVerdict::block(AlertKind::CopyAttempt, "Copying is not allowed during the exam")
            }
            InputKind::Paste => {
                InputVerdict::block(AlertKind::PasteAttempt, "Pasting is not allowed during the exam")
            }
            InputKind::ContextMenu => {
                InputVerdict::block(AlertKind::DevToolsBlocked, "Right-click menu is disabled")
            }
            InputKind::Key {
                key,
                ctrl,
                alt,
                meta,
            } => intercept_key(key, *ctrl, *alt, *meta),
        }
    }
}

fn intercept_key(key: &str, ctrl: bool, alt: bool, meta: bool) -> InputVerdict {
    let command = ctrl || meta;
    match key {
        "Tab" if alt || meta => {
            InputVerdict::block(AlertKind::TaskSwitch, "Switching applications is not allowed")
        }
        "PrintScreen" => InputVerdict {
            // The OS captures before the page sees the key.
            block_default: false,
            candidate: Some(Candidate::new(
                AlertKind::ScreenshotAttempt,
                "Screenshot attempt detected",
            )),
        },
        "F12" => InputVerdict::block(AlertKind::DevToolsBlocked, "Developer tools are disabled"),
        k if command && (k.eq_ignore_ascii_case("c") || k.eq_ignore_ascii_case("x")) => {
            InputVerdict::block(AlertKind::CopyAttempt, "Copy shortcut blocked")
        }
        k if command && k.eq_ignore_ascii_case("v") => {
            InputVerdict::block(AlertKind::PasteAttempt, "Paste shortcut blocked")
        }
        _ => InputVerdict::allow(),
    }
}

impl Detector for InputGuard {
    fn name(&self) -> &'static str {
        "input"
    }

    fn evaluate(&mut self, observation: &Observation, _now: DateTime<Utc>) -> Vec<Candidate> {
        match observation {
            Observation::InputEvent { kind } => self.intercept(kind).candidate.into_iter().collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: &str, ctrl: bool, alt: bool, meta: bool) -> InputKind {
        InputKind::Key {
            key: key.into(),
            ctrl,
            alt,
            meta,
        }
    }

    #[test]
    fn extended_desktop_is_multiple_monitors() {
        let detector = DisplayDetector::new(DisplayConfig::default());
        assert!(detector.spans_multiple_monitors(Size::new(3840, 1080), Size::new(1920, 1080)));
        assert!(!detector.spans_multiple_monitors(Size::new(1920, 1080), Size::new(1920, 1040)));
        assert!(detector.spans_multiple_monitors(Size::new(1920, 2160), Size::new(1920, 1040)));
    }

    #[test]
    fn only_visible_to_hidden_transitions_count() {
        let mut detector = VisibilityDetector::new();
        let now = Utc::now();
        let hidden = Observation::VisibilityEvent { hidden: true };
        let visible = Observation::VisibilityEvent { hidden: false };

        assert_eq!(detector.evaluate(&hidden, now).len(), 1);
        assert!(detector.evaluate(&hidden, now).is_empty());
        assert!(detector.evaluate(&visible, now).is_empty());
        assert_eq!(detector.evaluate(&hidden, now).len(), 1);
    }

    #[test]
    fn clipboard_events_are_blocked() {
        let guard = InputGuard::new();
        let verdict = guard.intercept(&InputKind::Paste);
        assert!(verdict.block_default);
        assert_eq!(verdict.candidate.map(|c| c.kind), Some(AlertKind::PasteAttempt));

        let verdict = guard.intercept(&InputKind::Cut);
        assert_eq!(verdict.candidate.map(|c| c.kind), Some(AlertKind::CopyAttempt));

        let verdict = guard.intercept(&InputKind::ContextMenu);
        assert_eq!(verdict.candidate.map(|c| c.kind), Some(AlertKind::DevToolsBlocked));
    }

    #[test]
    fn shortcut_table() {
        let guard = InputGuard::new();
        let kind_of = |input: InputKind| guard.intercept(&input).candidate.map(|c| c.kind);

        assert_eq!(kind_of(key("Tab", false, true, false)), Some(AlertKind::TaskSwitch));
        assert_eq!(kind_of(key("Tab", false, false, true)), Some(AlertKind::TaskSwitch));
        assert_eq!(kind_of(key("c", true, false, false)), Some(AlertKind::CopyAttempt));
        assert_eq!(kind_of(key("X", false, false, true)), Some(AlertKind::CopyAttempt));
        assert_eq!(kind_of(key("v", true, false, false)), Some(AlertKind::PasteAttempt));
        assert_eq!(kind_of(key("F12", false, false, false)), Some(AlertKind::DevToolsBlocked));
        assert_eq!(kind_of(key("PrintScreen", false, false, false)), Some(AlertKind::ScreenshotAttempt));
        assert_eq!(kind_of(key("Tab", false, false, false)), None);
        assert_eq!(kind_of(key("c", false, false, false)), None);
    }

    #[test]
    fn print_screen_cannot_be_blocked() {
        let verdict = InputGuard::new().intercept(&key("PrintScreen", false, false, false));
        assert!(!verdict.block_default);
        assert!(verdict.candidate.is_some());
    }
}
