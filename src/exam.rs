//! The exam a student is preparing for.
//!
//! The active exam is shared across every flow: it seeds the chat welcome
//! message, travels in every webhook request body, and titles the reports.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported entrance exams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exam {
    #[default]
    Jee,
    Neet,
    Upsc,
}

impl Exam {
    pub const ALL: [Exam; 3] = [Exam::Jee, Exam::Neet, Exam::Upsc];

    /// Lower-case identifier sent to the chat endpoint and persisted.
    pub fn id(self) -> &'static str {
        match self {
            Exam::Jee => "jee",
            Exam::Neet => "neet",
            Exam::Upsc => "upsc",
        }
    }

    /// Display name, also sent to the mock-test endpoints.
    pub fn name(self) -> &'static str {
        match self {
            Exam::Jee => "JEE",
            Exam::Neet => "NEET",
            Exam::Upsc => "UPSC",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Exam::Jee => "📘",
            Exam::Neet => "🩺",
            Exam::Upsc => "🏛️",
        }
    }

    /// First assistant message of every chat session for this exam.
    pub fn welcome_message(self) -> String {
        format!(
            "👋 Hello! I'm your {} preparation assistant.\n\n\
I can help you with motivation, study strategies, and overcoming challenges during your preparation.\n\n\
How can I assist you today?",
            self.name()
        )
    }
}

impl fmt::Display for Exam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Exam {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jee" => Ok(Exam::Jee),
            "neet" => Ok(Exam::Neet),
            "upsc" => Ok(Exam::Upsc),
            other => Err(format!("unknown exam '{other}' (expected jee, neet or upsc)")),
        }
    }
}
