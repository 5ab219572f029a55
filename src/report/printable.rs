//! Self-contained printable analysis report.
//!
//! The document carries its own styles so it can be opened in any browser and
//! printed to PDF. Every value from the endpoint passes through the template
//! engine's HTML auto-escaping; nothing is concatenated into markup by hand.

use super::analysis::AnalysisReport;
use super::subject_tone;
use crate::error::EduGuideError;
use chrono::Local;
use minijinja::{context, Environment};
use serde::Serialize;

const TEMPLATE_NAME: &str = "analysis_report.html";

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<title>{{ exam }} Performance Analysis Report</title>
<style>
  * { box-sizing: border-box; margin: 0; padding: 0; }
  body { font-family: 'Segoe UI', Arial, sans-serif; margin: 20px; color: #1F2937; line-height: 1.6; }
  h1 { color: #2196F3; border-bottom: 3px solid #2196F3; padding-bottom: 10px; margin-bottom: 20px; }
  h2 { color: #374151; margin: 25px 0 15px; padding-bottom: 8px; border-bottom: 2px solid #E5E7EB; }
  .header { text-align: center; margin-bottom: 30px; }
  .badge { padding: 8px 12px; border-radius: 8px; font-size: 14px; margin-bottom: 15px; }
  .badge.verified { background: #D1FAE5; color: #065F46; }
  .badge.warning { background: #FEF3C7; color: #92400E; }
  .score-box { background: linear-gradient(135deg, #EFF6FF, #DBEAFE); border-radius: 12px; padding: 30px; text-align: center; margin: 20px 0; }
  .score-value { font-size: 48px; font-weight: bold; }
  .percentage { font-size: 24px; color: #6B7280; margin-top: 5px; }
  .stats-grid { display: grid; grid-template-columns: repeat(4, 1fr); gap: 15px; margin: 20px 0; }
  .stat-card { padding: 15px; border-radius: 8px; text-align: center; }
  .stat-card.total { background: #F3F4F6; }
  .stat-card.attempted { background: #DBEAFE; }
  .stat-card.correct { background: #D1FAE5; }
  .stat-card.incorrect { background: #FEE2E2; }
  .stat-value { font-size: 24px; font-weight: bold; }
  .stat-label { font-size: 12px; color: #6B7280; }
  .subject-item { margin: 10px 0; padding: 12px; background: #F9FAFB; border-radius: 8px; }
  .subject-name { font-weight: 600; margin-bottom: 5px; }
  .progress-bar { height: 8px; background: #E5E7EB; border-radius: 4px; overflow: hidden; margin-top: 8px; }
  .progress-fill { height: 100%; border-radius: 4px; }
  .topic-section { display: flex; gap: 20px; margin: 20px 0; }
  .topic-col { flex: 1; padding: 15px; border-radius: 8px; }
  .topic-col.weak { background: #FEF3C7; border: 1px solid #F59E0B; }
  .topic-col.strong { background: #D1FAE5; border: 1px solid #10B981; }
  .topic-tag { display: inline-block; padding: 5px 12px; margin: 4px; border-radius: 20px; font-size: 13px; }
  .topic-tag.weak { background: #FBBF24; color: #78350F; }
  .topic-tag.strong { background: #34D399; color: #064E3B; }
  .suggestion-list { list-style: none; }
  .suggestion-item { padding: 10px 15px; margin: 8px 0; background: #EFF6FF; border-left: 4px solid #2196F3; border-radius: 0 8px 8px 0; }
  .question-card { border: 1px solid #E5E7EB; border-radius: 8px; margin: 10px 0; padding: 15px; page-break-inside: avoid; }
  .question-card.correct { border-left: 4px solid #10B981; }
  .question-card.incorrect { border-left: 4px solid #EF4444; }
  .question-card.unattempted { border-left: 4px solid #9CA3AF; }
  .question-header { display: flex; justify-content: space-between; margin-bottom: 10px; }
  .answer-grid { display: grid; grid-template-columns: 1fr 1fr; gap: 10px; margin: 10px 0; }
  .answer-box { padding: 10px; border-radius: 6px; font-size: 14px; }
  .answer-box.your { background: #F3F4F6; }
  .answer-box.correct { background: #D1FAE5; }
  .feedback { background: #EFF6FF; padding: 10px; border-radius: 6px; font-size: 13px; margin-top: 10px; }
  .disclaimer { margin-top: 30px; font-size: 12px; color: #6B7280; }
  @media print { body { margin: 15mm; } .question-card { page-break-inside: avoid; } }
</style>
</head>
<body>
<div class="header">
  <h1>📊 {{ exam }} Performance Analysis Report</h1>
  <p>Generated: {{ generated }}</p>
</div>

<div class="badge {{ 'verified' if verified else 'warning' }}">{{ badge }}
{%- if warnings %}
  <ul>{% for w in warnings %}<li>{{ w }}</li>{% endfor %}</ul>
{%- endif %}
</div>

<div class="score-box">
  <div class="score-value" style="color: {{ score_colour }}">{{ a.score }}</div>
  <div class="percentage">{{ a.percentage }}</div>
</div>

<div class="stats-grid">
  <div class="stat-card total"><div class="stat-value">{{ a.totalQuestions }}</div><div class="stat-label">Total Questions</div></div>
  <div class="stat-card attempted"><div class="stat-value">{{ a.attempted }}</div><div class="stat-label">Attempted</div></div>
  <div class="stat-card correct"><div class="stat-value">{{ a.correct }}</div><div class="stat-label">Correct</div></div>
  <div class="stat-card incorrect"><div class="stat-value">{{ a.incorrect }}</div><div class="stat-label">Incorrect</div></div>
</div>
{% if subjects %}
<h2>📈 Subject-wise Performance</h2>
{%- for s in subjects %}
<div class="subject-item">
  <div class="subject-name">{{ s.name }}</div>
  <div>{{ s.correct }} out of {{ s.total }} correct ({{ s.percentage }})</div>
  <div class="progress-bar"><div class="progress-fill" style="width: {{ s.width }}%; background: {{ s.colour }}"></div></div>
</div>
{%- endfor %}
{% endif %}
<h2>🎯 Topics Analysis</h2>
<div class="topic-section">
  <div class="topic-col weak">
    <strong>⚠️ Need Improvement</strong><br/><br/>
    {%- for t in a.weakTopics %}<span class="topic-tag weak">{{ t }}</span>{% else %}<span>{{ no_weak }}</span>{% endfor %}
  </div>
  <div class="topic-col strong">
    <strong>✅ Strong Areas</strong><br/><br/>
    {%- for t in a.strongTopics %}<span class="topic-tag strong">{{ t }}</span>{% else %}<span>{{ no_strong }}</span>{% endfor %}
  </div>
</div>
{% if a.suggestions %}
<h2>💡 Personalized Improvement Plan</h2>
<ol class="suggestion-list">
{%- for s in a.suggestions %}
  <li class="suggestion-item">{{ loop.index }}. {{ s }}</li>
{%- endfor %}
</ol>
{% endif %}
{%- if questions %}
<h2>📝 Question-by-Question Analysis</h2>
{%- for q in questions %}
<div class="question-card {{ q.class }}">
  <div class="question-header">
    <strong>Q{{ q.number }} - {{ q.topic }}</strong>
    <span>{{ q.icon }} {{ q.marks }}</span>
  </div>
  <div class="answer-grid">
    <div class="answer-box your"><small>Your Answer</small><br/><strong>{{ q.yours }}</strong></div>
    <div class="answer-box correct"><small>Correct Answer</small><br/><strong>{{ q.correct }}</strong></div>
  </div>
  {%- if q.feedback %}
  <div class="feedback">💡 {{ q.feedback }}</div>
  {%- endif %}
</div>
{%- endfor %}
{%- endif %}
<p class="disclaimer">AI-Generated Analysis: {{ disclaimer }}</p>
</body>
</html>
"#;

#[derive(Serialize)]
struct SubjectView<'a> {
    name: &'a str,
    correct: u32,
    total: u32,
    percentage: &'a str,
    width: u32,
    colour: &'static str,
}

#[derive(Serialize)]
struct QuestionView<'a> {
    number: u32,
    topic: &'a str,
    class: &'static str,
    icon: &'static str,
    marks: String,
    yours: &'a str,
    correct: &'a str,
    feedback: &'a str,
}

/// Render `report` as a standalone HTML document.
pub fn render_printable(report: &AnalysisReport) -> Result<String, EduGuideError> {
    let a = &report.analysis;

    let subjects: Vec<SubjectView<'_>> = a
        .subject_breakdown
        .iter()
        .map(|(name, s)| {
            let pct = s.percent();
            SubjectView {
                name,
                correct: s.correct,
                total: s.total,
                percentage: &s.percentage,
                width: pct.clamp(0.0, 100.0).round() as u32,
                colour: subject_tone(pct).hex(),
            }
        })
        .collect();

    let questions: Vec<QuestionView<'_>> = a
        .question_analysis
        .iter()
        .map(|q| QuestionView {
            number: q.question_number,
            topic: &q.topic,
            class: q.status_class(),
            icon: q.status_icon(),
            marks: q.marks_label(),
            yours: if q.is_attempted {
                q.your_answer.as_str()
            } else {
                "Not Attempted"
            },
            correct: &q.correct_answer,
            feedback: &q.feedback,
        })
        .collect();

    let mut env = Environment::new();
    env.add_template(TEMPLATE_NAME, TEMPLATE)
        .map_err(|e| EduGuideError::Internal(format!("report template: {e}")))?;
    let template = env
        .get_template(TEMPLATE_NAME)
        .map_err(|e| EduGuideError::Internal(format!("report template: {e}")))?;

    template
        .render(context! {
            exam => report.exam.name(),
            generated => Local::now().format("%d %b %Y, %H:%M").to_string(),
            verified => report.validation.is_verified(),
            badge => report.validation.headline(),
            warnings => &report.validation.warnings,
            score_colour => super::score_tone(a.percent()).hex(),
            a => a,
            subjects => subjects,
            questions => questions,
            no_weak => super::analysis::NO_WEAK_TOPICS,
            no_strong => super::analysis::NO_STRONG_TOPICS,
            disclaimer => super::analysis::DISCLAIMER,
        })
        .map_err(|e| EduGuideError::Internal(format!("report rendering: {e}")))
}
