//! Step-by-step solutions for an uploaded question paper.

use super::{bold, lenient, Tone};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// One solved question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WireSolution")]
pub struct Solution {
    pub question_number: u32,
    /// The concept tested, or `"General"` when the endpoint names none.
    pub topic: String,
    pub question: String,
    pub correct_answer: String,
    pub solution: String,
    pub concept: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireSolution {
    #[serde(deserialize_with = "lenient::count")]
    question_number: u32,
    #[serde(deserialize_with = "lenient::string")]
    question: String,
    #[serde(deserialize_with = "lenient::string")]
    correct_answer: String,
    #[serde(deserialize_with = "lenient::string")]
    solution: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    concept: Option<String>,
}

impl From<WireSolution> for Solution {
    fn from(w: WireSolution) -> Self {
        Self {
            question_number: w.question_number,
            topic: w.concept.clone().unwrap_or_else(|| "General".to_string()),
            question: w.question,
            correct_answer: w.correct_answer,
            solution: w.solution,
            concept: w.concept.unwrap_or_default(),
        }
    }
}

/// Solutions for one paper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SolutionsReport {
    /// Exam name as echoed by the endpoint.
    #[serde(deserialize_with = "lenient::string")]
    pub exam: String,
    #[serde(deserialize_with = "lenient::count")]
    pub total_questions: u32,
    #[serde(deserialize_with = "lenient::list")]
    pub questions: Vec<Solution>,
}

/// Terminal rendering of a solutions report.
pub fn render_solutions(report: &SolutionsReport, colour: bool) -> String {
    let mut out = String::new();
    let exam = if report.exam.is_empty() {
        String::new()
    } else {
        format!("{} ", report.exam)
    };
    let total = report.total_questions.max(report.questions.len() as u32);
    let _ = writeln!(
        out,
        "{}\n",
        bold(&format!("📖 {exam}Solutions · {total} questions"), colour)
    );

    if report.questions.is_empty() {
        let _ = writeln!(out, "No questions were recognised in the uploaded paper.");
        return out;
    }

    for q in &report.questions {
        let _ = writeln!(
            out,
            "{} {}",
            bold(&format!("Q{}", q.question_number), colour),
            Tone::Steady.paint(&format!("[{}]", q.topic), colour)
        );
        if !q.question.is_empty() {
            let _ = writeln!(out, "{}", q.question);
        }
        let _ = writeln!(
            out,
            "{} {}",
            Tone::Strong.paint("Answer:", colour),
            q.correct_answer
        );
        if !q.solution.is_empty() {
            let _ = writeln!(out, "{}", q.solution);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_concept_becomes_general() {
        let r: SolutionsReport = serde_json::from_str(
            r#"{"exam":"JEE","totalQuestions":"2","questions":[
                {"questionNumber":1,"question":"2+2?","correctAnswer":"4","solution":"add","concept":"Arithmetic"},
                {"questionNumber":2,"question":"x?","correctAnswer":"y","solution":"z","concept":""}
            ]}"#,
        )
        .unwrap();
        assert_eq!(r.total_questions, 2);
        assert_eq!(r.questions[0].topic, "Arithmetic");
        assert_eq!(r.questions[1].topic, "General");
        assert_eq!(r.questions[1].concept, "");

        let text = render_solutions(&r, false);
        assert!(text.contains("📖 JEE Solutions · 2 questions"));
        assert!(text.contains("Q2 [General]"));
        assert!(text.contains("Answer: 4"));
    }

    #[test]
    fn empty_report_says_so() {
        let text = render_solutions(&SolutionsReport::default(), false);
        assert!(text.contains("No questions were recognised"));
    }
}
