//! Performance-analysis report: model and terminal dashboard.

use super::{bar, bold, lenient, score_tone, subject_tone, Tone};
use crate::exam::Exam;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Marks per question on the analysed papers.
pub const MAX_MARKS: f64 = 4.0;

/// Tri-state confidence flag returned alongside an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidationStatus {
    #[default]
    Pass,
    Warn,
    Fail,
}

impl<'de> Deserialize<'de> for ValidationStatus {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = lenient::string(d)?;
        Ok(match raw.trim().to_ascii_uppercase().as_str() {
            "PASS" | "" => ValidationStatus::Pass,
            "WARN" | "WARNING" => ValidationStatus::Warn,
            _ => ValidationStatus::Fail,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Validation {
    pub status: ValidationStatus,
    #[serde(deserialize_with = "lenient::strings")]
    pub warnings: Vec<String>,
}

impl Validation {
    pub fn is_verified(&self) -> bool {
        self.status == ValidationStatus::Pass && self.warnings.is_empty()
    }

    /// Badge headline.
    pub fn headline(&self) -> &'static str {
        if self.is_verified() {
            "✓ Analysis Verified"
        } else if self.status == ValidationStatus::Warn {
            "Analysis completed with warnings"
        } else {
            "Verification issues detected"
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubjectStats {
    #[serde(deserialize_with = "lenient::count")]
    pub correct: u32,
    #[serde(deserialize_with = "lenient::count")]
    pub total: u32,
    #[serde(deserialize_with = "lenient::string")]
    pub percentage: String,
}

impl SubjectStats {
    pub fn percent(&self) -> f64 {
        lenient::parse_number(&self.percentage).unwrap_or(0.0)
    }
}

/// One graded question, normalised from the endpoint's shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WireQuestion")]
pub struct QuestionVerdict {
    pub question_number: u32,
    pub topic: String,
    pub your_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub is_attempted: bool,
    pub marks_obtained: f64,
    pub max_marks: f64,
    pub difficulty: String,
    pub feedback: String,
}

impl QuestionVerdict {
    pub fn tone(&self) -> Tone {
        match (self.is_attempted, self.is_correct) {
            (false, _) => Tone::Muted,
            (true, true) => Tone::Strong,
            (true, false) => Tone::Critical,
        }
    }

    pub fn status_icon(&self) -> &'static str {
        if self.is_correct {
            "✅"
        } else if self.is_attempted {
            "❌"
        } else {
            "⬜"
        }
    }

    /// `"correct"`, `"incorrect"` or `"unattempted"`.
    pub fn status_class(&self) -> &'static str {
        if self.is_correct {
            "correct"
        } else if self.is_attempted {
            "incorrect"
        } else {
            "unattempted"
        }
    }

    /// `"+4 marks"`, `"-1 marks"`, `"0 marks"`.
    pub fn marks_label(&self) -> String {
        let sign = if self.marks_obtained > 0.0 { "+" } else { "" };
        format!("{sign}{} marks", self.marks_obtained)
    }

    pub fn difficulty_tone(&self) -> Tone {
        match self.difficulty.as_str() {
            "Easy" => Tone::Strong,
            "Medium" => Tone::Caution,
            "Hard" => Tone::Critical,
            _ => Tone::Muted,
        }
    }
}

/// Question as sent by the analysis endpoint.
///
/// The student's answer arrives as `studentAnswer` from the endpoint and as
/// `yourAnswer` from a saved report; either is accepted.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireQuestion {
    #[serde(deserialize_with = "lenient::count")]
    question_number: u32,
    #[serde(deserialize_with = "lenient::string")]
    topic: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    student_answer: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    your_answer: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    correct_answer: String,
    #[serde(deserialize_with = "lenient::boolean")]
    is_correct: bool,
    #[serde(deserialize_with = "lenient::number")]
    marks: f64,
    #[serde(deserialize_with = "lenient::number")]
    marks_obtained: f64,
    #[serde(deserialize_with = "lenient::opt_string")]
    difficulty: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    feedback: String,
}

impl From<WireQuestion> for QuestionVerdict {
    fn from(q: WireQuestion) -> Self {
        let answer = q.student_answer.or(q.your_answer);
        let marks = if q.marks != 0.0 { q.marks } else { q.marks_obtained };
        Self {
            question_number: q.question_number,
            topic: q.topic,
            is_attempted: answer.is_some(),
            your_answer: answer.unwrap_or_default(),
            correct_answer: q.correct_answer,
            is_correct: q.is_correct,
            marks_obtained: marks,
            max_marks: MAX_MARKS,
            difficulty: q.difficulty.unwrap_or_else(|| "Medium".to_string()),
            feedback: q.feedback,
        }
    }
}

/// The `analysis` object of the reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Analysis {
    #[serde(deserialize_with = "lenient::count")]
    pub total_questions: u32,
    #[serde(deserialize_with = "lenient::count")]
    pub attempted: u32,
    #[serde(deserialize_with = "lenient::count")]
    pub correct: u32,
    #[serde(deserialize_with = "lenient::count")]
    pub incorrect: u32,
    #[serde(deserialize_with = "lenient::count")]
    pub unattempted: u32,
    #[serde(deserialize_with = "lenient::string")]
    pub score: String,
    #[serde(deserialize_with = "lenient::string")]
    pub percentage: String,
    #[serde(deserialize_with = "lenient::list")]
    pub question_analysis: Vec<QuestionVerdict>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub subject_breakdown: BTreeMap<String, SubjectStats>,
    #[serde(deserialize_with = "lenient::strings")]
    pub weak_topics: Vec<String>,
    #[serde(deserialize_with = "lenient::strings")]
    pub strong_topics: Vec<String>,
    #[serde(deserialize_with = "lenient::strings")]
    pub suggestions: Vec<String>,
}

impl Analysis {
    pub fn percent(&self) -> f64 {
        lenient::parse_number(&self.percentage).unwrap_or(0.0)
    }
}

/// A normalised analysis ready for rendering or saving.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisReport {
    #[serde(deserialize_with = "lenient::or_default")]
    pub exam: Exam,
    #[serde(deserialize_with = "lenient::or_default")]
    pub analysis: Analysis,
    #[serde(deserialize_with = "lenient::or_default")]
    pub validation: Validation,
}

pub const NO_WEAK_TOPICS: &str = "No weak topics identified!";
pub const NO_STRONG_TOPICS: &str = "Keep practicing to identify strengths!";
pub const DISCLAIMER: &str =
    "This analysis is based on image comparison. Please verify important details independently.";

/// Terminal dashboard for an analysis report.
pub fn render_dashboard(report: &AnalysisReport, colour: bool) -> String {
    let a = &report.analysis;
    let mut out = String::new();

    let _ = writeln!(out, "✨ Powered by AI Vision - 95%+ Accurate Answer Comparison\n");

    let v = &report.validation;
    let badge_tone = if v.is_verified() { Tone::Strong } else { Tone::Caution };
    let _ = writeln!(out, "{}", badge_tone.paint(v.headline(), colour));
    for w in &v.warnings {
        let _ = writeln!(out, "  • {w}");
    }
    out.push('\n');

    let tone = score_tone(a.percent());
    let _ = writeln!(
        out,
        "{}  {}  {}",
        bold(&format!("{} Score", report.exam), colour),
        tone.paint(&a.score, colour),
        tone.paint(&format!("({})", a.percentage), colour),
    );
    let _ = writeln!(
        out,
        "Total Questions {} · Attempted {} · Correct {} · Incorrect {}\n",
        a.total_questions, a.attempted, a.correct, a.incorrect
    );

    if !a.subject_breakdown.is_empty() {
        let _ = writeln!(out, "{}", bold("📈 Subject Performance", colour));
        for (subject, stats) in &a.subject_breakdown {
            let pct = stats.percent();
            let _ = writeln!(
                out,
                "  {subject:<14} {} {} out of {} correct ({})",
                subject_tone(pct).paint(&bar(pct, 20), colour),
                stats.correct,
                stats.total,
                stats.percentage
            );
        }
        out.push('\n');
    }

    let _ = writeln!(out, "{}", Tone::Caution.paint("⚠️ Need Improvement", colour));
    if a.weak_topics.is_empty() {
        let _ = writeln!(out, "  {NO_WEAK_TOPICS}");
    } else {
        let _ = writeln!(out, "  {}", a.weak_topics.join(" · "));
    }
    let _ = writeln!(out, "{}", Tone::Strong.paint("✅ Strong Areas", colour));
    if a.strong_topics.is_empty() {
        let _ = writeln!(out, "  {NO_STRONG_TOPICS}");
    } else {
        let _ = writeln!(out, "  {}", a.strong_topics.join(" · "));
    }
    out.push('\n');

    if !a.question_analysis.is_empty() {
        let _ = writeln!(out, "{}", bold("📝 Detailed Question Analysis", colour));
        for q in &a.question_analysis {
            let _ = writeln!(
                out,
                "  {} Q{} · {} [{}]  {}",
                q.status_icon(),
                q.question_number,
                q.topic,
                q.difficulty_tone().paint(&q.difficulty, colour),
                q.tone().paint(&q.marks_label(), colour),
            );
            let yours = if q.is_attempted {
                q.your_answer.as_str()
            } else {
                "Not Attempted"
            };
            let _ = writeln!(
                out,
                "     Your answer: {yours} · Correct answer: {}",
                q.correct_answer
            );
            if !q.feedback.is_empty() {
                let _ = writeln!(out, "     💡 {}", q.feedback);
            }
        }
        out.push('\n');
    }

    if !a.suggestions.is_empty() {
        let _ = writeln!(out, "{}", bold("💡 Personalized Improvement Plan", colour));
        for (i, s) in a.suggestions.iter().enumerate() {
            let _ = writeln!(out, "  {}. {s}", i + 1);
        }
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "{}",
        Tone::Muted.paint(&format!("AI-Generated Analysis: {DISCLAIMER}"), colour)
    );
    out
}
