//! Mock-test uploads: solutions for a question paper, or a full performance
//! analysis of a paper plus the student's answer sheet.
//!
//! ```text
//! Idle ──select──▶ FileSelected ──generate──▶ [Converting] ──▶ Submitting
//!                        ▲                                        │
//!                        └──────────── Failed ◀───────────────────┤
//!                                                                 ▼
//!                                                             Succeeded
//! ```
//!
//! `Converting` only happens for a PDF question paper in the solutions flow.
//! A failed submission keeps both files so the user can press generate again.

use crate::client::{Flow, WebhookClient};
use crate::config::CompanionConfig;
use crate::error::EduGuideError;
use crate::exam::Exam;
use crate::pipeline::encode::{file_to_base64, strip_data_uri};
use crate::pipeline::input::{select_file, AllowList, SelectedFile, UploadKind};
use crate::pipeline::render::{rasterize_all, RasterSettings};
use crate::progress::ProcessingStatus;
use crate::report::analysis::{Analysis, AnalysisReport, Validation};
use crate::report::lenient;
use crate::report::solutions::{Solution, SolutionsReport};
use crate::storage::DraftStore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    /// Nothing selected yet.
    Idle,
    FileSelected,
    /// Rasterising a PDF question paper.
    Converting,
    /// Waiting on the vision endpoint.
    Submitting,
    Succeeded,
    /// Back on the upload screen with files intact and an error attached.
    Failed,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SolutionsRequest<'a> {
    exam: &'static str,
    test_image: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisRequest<'a> {
    exam: &'static str,
    test_image: &'a str,
    answer_image: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SolutionsReply {
    #[serde(deserialize_with = "lenient::boolean")]
    success: bool,
    #[serde(deserialize_with = "lenient::opt_string")]
    error: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    exam: String,
    #[serde(deserialize_with = "lenient::count")]
    total_questions: u32,
    #[serde(deserialize_with = "lenient::list")]
    questions: Vec<Solution>,
}

impl SolutionsReply {
    fn into_report(self) -> Result<SolutionsReport, EduGuideError> {
        if !self.success {
            return Err(EduGuideError::Unsuccessful {
                flow: Flow::Solutions,
                message: self.error,
            });
        }
        Ok(SolutionsReport {
            exam: self.exam,
            total_questions: self.total_questions,
            questions: self.questions,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AnalysisReply {
    #[serde(deserialize_with = "lenient::boolean")]
    success: bool,
    #[serde(deserialize_with = "lenient::opt_string")]
    error: Option<String>,
    #[serde(deserialize_with = "lenient::or_default")]
    analysis: Analysis,
    /// Absent means the endpoint raised no concerns.
    #[serde(deserialize_with = "lenient::or_default")]
    validation: Validation,
}

impl AnalysisReply {
    fn into_report(self, exam: Exam) -> Result<AnalysisReport, EduGuideError> {
        if !self.success {
            return Err(EduGuideError::Unsuccessful {
                flow: Flow::Analysis,
                message: self.error,
            });
        }
        Ok(AnalysisReport {
            exam,
            analysis: self.analysis,
            validation: self.validation,
        })
    }
}

/// One mock-test upload screen.
#[derive(Debug)]
pub struct MockTestSession {
    client: WebhookClient,
    solutions_url: String,
    analysis_url: String,
    timeout: Duration,
    max_upload_bytes: u64,
    raster: RasterSettings,
    drafts: DraftStore,
    exam: Exam,
    question_paper: Option<SelectedFile>,
    answer_sheet: Option<SelectedFile>,
    state: UploadState,
    status: Option<ProcessingStatus>,
    error: Option<String>,
    solutions: Option<SolutionsReport>,
    analysis: Option<AnalysisReport>,
}

impl MockTestSession {
    /// Build a session, restoring the last selected exam.
    pub fn new(
        config: &CompanionConfig,
        client: WebhookClient,
        drafts: DraftStore,
    ) -> Result<Self, EduGuideError> {
        let exam = drafts.load_exam()?;
        Ok(Self {
            client,
            solutions_url: config.url_for(Flow::Solutions).to_string(),
            analysis_url: config.url_for(Flow::Analysis).to_string(),
            timeout: config.timeout_for(Flow::Solutions),
            max_upload_bytes: config.max_upload_bytes(),
            raster: RasterSettings::from_config(config),
            drafts,
            exam,
            question_paper: None,
            answer_sheet: None,
            state: UploadState::Idle,
            status: None,
            error: None,
            solutions: None,
            analysis: None,
        })
    }

    pub fn exam(&self) -> Exam {
        self.exam
    }

    /// Change the exam and persist the choice.
    pub fn set_exam(&mut self, exam: Exam) -> Result<(), EduGuideError> {
        self.exam = exam;
        self.drafts.save_exam(exam)
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    /// Processing stage of the current or last submission.
    pub fn status(&self) -> Option<ProcessingStatus> {
        self.status
    }

    /// Banner text of the last failure.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn question_paper(&self) -> Option<&SelectedFile> {
        self.question_paper.as_ref()
    }

    pub fn answer_sheet(&self) -> Option<&SelectedFile> {
        self.answer_sheet.as_ref()
    }

    pub fn solutions(&self) -> Option<&SolutionsReport> {
        self.solutions.as_ref()
    }

    pub fn analysis(&self) -> Option<&AnalysisReport> {
        self.analysis.as_ref()
    }

    /// Fill the question-paper slot. JPG, PNG or PDF.
    pub async fn select_question_paper(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<&SelectedFile, EduGuideError> {
        let file = self.pick(path.as_ref(), AllowList::ImagesAndPdf).await?;
        info!("{}: {} ({})", UploadKind::QuestionPaper.label(), file.name, file.human_size());
        Ok(self.question_paper.insert(file))
    }

    /// Fill the answer-sheet slot. JPG or PNG.
    pub async fn select_answer_sheet(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<&SelectedFile, EduGuideError> {
        let file = self.pick(path.as_ref(), AllowList::ImagesOnly).await?;
        info!("{}: {} ({})", UploadKind::AnswerSheet.label(), file.name, file.human_size());
        Ok(self.answer_sheet.insert(file))
    }

    pub fn clear_slot(&mut self, kind: UploadKind) {
        match kind {
            UploadKind::QuestionPaper => self.question_paper = None,
            UploadKind::AnswerSheet => self.answer_sheet = None,
        }
        if self.question_paper.is_none() && self.answer_sheet.is_none() {
            self.state = UploadState::Idle;
        }
    }

    async fn pick(&mut self, path: &Path, allow: AllowList) -> Result<SelectedFile, EduGuideError> {
        match select_file(path, allow, self.max_upload_bytes).await {
            Ok(file) => {
                self.error = None;
                self.state = UploadState::FileSelected;
                Ok(file)
            }
            Err(e) => {
                self.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Solve the selected question paper.
    ///
    /// A PDF is rasterised and its first page sent; an image is sent as is.
    pub async fn generate_solutions(&mut self) -> Result<SolutionsReport, EduGuideError> {
        let paper = self
            .question_paper
            .clone()
            .ok_or(EduGuideError::MissingUpload("question paper"))?;

        self.begin();
        let outcome = self.solve(&paper).await;
        match outcome {
            Ok(report) => {
                info!("Solutions received: {} questions", report.questions.len());
                self.solutions = Some(report.clone());
                self.finish_ok();
                Ok(report)
            }
            Err(e) => Err(self.finish_err(e)),
        }
    }

    async fn solve(&mut self, paper: &SelectedFile) -> Result<SolutionsReport, EduGuideError> {
        let test_image = if paper.is_pdf() {
            self.state = UploadState::Converting;
            let pages = rasterize_all(paper.bytes.clone(), self.raster.clone()).await?;
            let first = pages.into_iter().next().ok_or(EduGuideError::EmptyDocument)?;
            strip_data_uri(&first.image.base64)
        } else {
            strip_data_uri(&file_to_base64(&paper.bytes))
        };

        self.set_status(ProcessingStatus::Analyzing);
        self.state = UploadState::Submitting;

        let body = SolutionsRequest {
            exam: self.exam.name(),
            test_image: &test_image,
        };
        self.client
            .post_json::<_, SolutionsReply>(Flow::Solutions, &self.solutions_url, &body, self.timeout)
            .await?
            .into_report()
    }

    /// Analyse the student's answer sheet against the question paper.
    ///
    /// Both slots must hold images.
    pub async fn generate_analysis(&mut self) -> Result<AnalysisReport, EduGuideError> {
        let paper = self
            .question_paper
            .clone()
            .ok_or(EduGuideError::MissingUpload("question paper"))?;
        let sheet = self
            .answer_sheet
            .clone()
            .ok_or(EduGuideError::MissingUpload("answer sheet"))?;
        if paper.is_pdf() {
            let e = EduGuideError::UnsupportedFileType {
                path: paper.path.clone(),
                detail: "the analysis needs the question paper as an image".into(),
            };
            self.error = Some(e.user_message());
            return Err(e);
        }

        self.begin();
        let outcome = self.analyse(&paper, &sheet).await;
        match outcome {
            Ok(report) => {
                info!(
                    "Analysis received: {} questions, validation {:?}",
                    report.analysis.question_analysis.len(),
                    report.validation.status
                );
                self.analysis = Some(report.clone());
                self.finish_ok();
                Ok(report)
            }
            Err(e) => Err(self.finish_err(e)),
        }
    }

    async fn analyse(
        &mut self,
        paper: &SelectedFile,
        sheet: &SelectedFile,
    ) -> Result<AnalysisReport, EduGuideError> {
        let test_image = strip_data_uri(&file_to_base64(&paper.bytes));
        let answer_image = strip_data_uri(&file_to_base64(&sheet.bytes));

        self.set_status(ProcessingStatus::Analyzing);
        self.state = UploadState::Submitting;

        let body = AnalysisRequest {
            exam: self.exam.name(),
            test_image: &test_image,
            answer_image: &answer_image,
        };
        self.client
            .post_json::<_, AnalysisReply>(Flow::Analysis, &self.analysis_url, &body, self.timeout)
            .await?
            .into_report(self.exam)
    }

    /// Clear both slots, all results and any error.
    pub fn reset(&mut self) {
        self.question_paper = None;
        self.answer_sheet = None;
        self.solutions = None;
        self.analysis = None;
        self.error = None;
        self.status = None;
        self.state = UploadState::Idle;
    }

    fn begin(&mut self) {
        self.error = None;
        self.state = UploadState::Submitting;
        self.set_status(ProcessingStatus::Extracting);
    }

    fn set_status(&mut self, status: ProcessingStatus) {
        self.status = Some(status);
        self.raster.progress.on_status(status);
    }

    fn finish_ok(&mut self) {
        self.set_status(ProcessingStatus::Complete);
        self.state = UploadState::Succeeded;
    }

    fn finish_err(&mut self, e: EduGuideError) -> EduGuideError {
        warn!("Mock-test submission failed: {e}");
        self.error = Some(e.user_message());
        self.status = None;
        self.state = UploadState::Failed;
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

    fn session(drafts: DraftStore) -> MockTestSession {
        MockTestSession::new(&CompanionConfig::default(), WebhookClient::new(), drafts).unwrap()
    }

    fn write(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::File::create(&path)
            .unwrap()
            .write_all(bytes)
            .unwrap();
        path
    }

    #[test]
    fn exam_choice_is_persisted() {
        let drafts = DraftStore::in_memory();
        let mut s = session(drafts.clone());
        assert_eq!(s.exam(), Exam::Jee);
        s.set_exam(Exam::Neet).unwrap();
        assert_eq!(session(drafts).exam(), Exam::Neet);
    }

    #[tokio::test]
    async fn generating_without_files_is_refused() {
        let mut s = session(DraftStore::in_memory());
        let err = s.generate_solutions().await.unwrap_err();
        assert!(matches!(err, EduGuideError::MissingUpload("question paper")));
        assert_eq!(s.state(), UploadState::Idle);
    }

    #[tokio::test]
    async fn analysis_needs_an_image_paper() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(DraftStore::in_memory());
        s.select_question_paper(write(&dir, "paper.pdf", b"%PDF-1.4\n"))
            .await
            .unwrap();
        s.select_answer_sheet(write(&dir, "sheet.png", PNG))
            .await
            .unwrap();
        assert_eq!(s.state(), UploadState::FileSelected);

        let err = s.generate_analysis().await.unwrap_err();
        assert!(matches!(err, EduGuideError::UnsupportedFileType { .. }));
        assert_eq!(s.error(), Some("Please upload JPG, PNG, or PDF only"));
        assert!(s.question_paper().is_some());
    }

    #[tokio::test]
    async fn reset_clears_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(DraftStore::in_memory());
        s.select_question_paper(write(&dir, "paper.png", PNG))
            .await
            .unwrap();
        s.reset();
        assert_eq!(s.state(), UploadState::Idle);
        assert!(s.question_paper().is_none());
        assert!(s.error().is_none());
    }

    #[test]
    fn unsuccessful_reply_keeps_server_text() {
        let reply: AnalysisReply =
            serde_json::from_str(r#"{"success": false, "error": "Blurry scan"}"#).unwrap();
        let err = reply.into_report(Exam::Jee).unwrap_err();
        assert_eq!(err.user_message(), "Blurry scan");

        let reply: SolutionsReply = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert_eq!(
            reply.into_report().unwrap_err().user_message(),
            "Failed to process the image. Please try again."
        );
    }

    #[test]
    fn missing_validation_defaults_to_pass() {
        let reply: AnalysisReply = serde_json::from_str(
            r#"{"success": true, "analysis": {"totalQuestions": 2, "questionAnalysis": [
                {"questionNumber": 1, "studentAnswer": "", "correctAnswer": "B"}
            ]}}"#,
        )
        .unwrap();
        let report = reply.into_report(Exam::Neet).unwrap();
        assert!(report.validation.is_verified());
        assert_eq!(report.exam, Exam::Neet);
        let q = &report.analysis.question_analysis[0];
        assert!(!q.is_attempted);
        assert_eq!(q.difficulty, "Medium");
        assert_eq!(q.max_marks, 4.0);
    }

    #[test]
    fn requests_send_exam_name() {
        let body = AnalysisRequest {
            exam: Exam::Upsc.name(),
            test_image: "QQ==",
            answer_image: "Qg==",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"exam": "UPSC", "testImage": "QQ==", "answerImage": "Qg=="})
        );
    }
}
