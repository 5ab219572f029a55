//! Result renderers: endpoint JSON → terminal text or a printable document.
//!
//! Every renderer is a pure function of the decoded reply. Decoding is
//! lenient (see [`lenient`]), so an absent or odd field shows up as an empty
//! section rather than an error.

pub mod analysis;
pub mod counselling;
pub mod lenient;
pub mod printable;
pub mod solutions;

pub use analysis::{
    render_dashboard, Analysis, AnalysisReport, QuestionVerdict, SubjectStats, Validation,
    ValidationStatus,
};
pub use counselling::render_counselling;
pub use printable::render_printable;
pub use solutions::{render_solutions, Solution, SolutionsReport};

/// Colour tier of a score, bar or badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Strong,
    Steady,
    Caution,
    Critical,
    Muted,
}

impl Tone {
    fn ansi(self) -> &'static str {
        match self {
            Tone::Strong => "32",
            Tone::Steady => "34",
            Tone::Caution => "33",
            Tone::Critical => "31",
            Tone::Muted => "2",
        }
    }

    /// Hex colour used by the printable report.
    pub fn hex(self) -> &'static str {
        match self {
            Tone::Strong => "#10B981",
            Tone::Steady => "#2196F3",
            Tone::Caution => "#F59E0B",
            Tone::Critical => "#EF4444",
            Tone::Muted => "#9CA3AF",
        }
    }

    /// Wrap `text` in this tone's ANSI colour when `colour` is set.
    pub fn paint(self, text: &str, colour: bool) -> String {
        if colour {
            format!("\x1b[{}m{text}\x1b[0m", self.ansi())
        } else {
            text.to_string()
        }
    }
}

/// Overall score tier: ≥ 60 strong, ≥ 40 caution, otherwise critical.
pub fn score_tone(percent: f64) -> Tone {
    if percent >= 60.0 {
        Tone::Strong
    } else if percent >= 40.0 {
        Tone::Caution
    } else {
        Tone::Critical
    }
}

/// Per-subject tier: ≥ 70 / ≥ 50 / ≥ 30 / below.
pub fn subject_tone(percent: f64) -> Tone {
    if percent >= 70.0 {
        Tone::Strong
    } else if percent >= 50.0 {
        Tone::Steady
    } else if percent >= 30.0 {
        Tone::Caution
    } else {
        Tone::Critical
    }
}

/// A `width`-cell text bar filled to `percent`.
pub fn bar(percent: f64, width: usize) -> String {
    let clamped = if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else {
        0.0
    };
    let filled = ((clamped / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub(crate) fn bold(text: &str, colour: bool) -> String {
    if colour {
        format!("\x1b[1m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}
