//! Mock-test uploads against mock solutions and analysis endpoints.
//!
//! Only image uploads are exercised here; PDF rasterisation needs the pdfium
//! shared library and is covered through a synthetic page source in the
//! render module's unit tests.

use eduguide::pipeline::encode::file_to_base64;
use eduguide::{
    CompanionConfig, DraftStore, EduGuideError, Exam, MockTestSession, ProcessingStatus,
    ProgressCallback, UploadState, WebhookClient,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3];
const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 4, 5, 6];

#[derive(Default)]
struct StatusLog(Mutex<Vec<ProcessingStatus>>);

impl ProgressCallback for StatusLog {
    fn on_status(&self, status: ProcessingStatus) {
        self.0.lock().unwrap().push(status);
    }
}

fn config(server: &MockServer, log: Arc<StatusLog>) -> CompanionConfig {
    CompanionConfig::builder()
        .solutions_url(format!("{}/solutions", server.uri()))
        .analysis_url(format!("{}/analysis", server.uri()))
        .mock_test_timeout_secs(1)
        .progress_callback(log)
        .build()
        .unwrap()
}

fn write(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

#[tokio::test]
async fn solutions_for_an_image_paper() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/solutions"))
        .and(body_json(serde_json::json!({
            "exam": "NEET",
            "testImage": file_to_base64(PNG),
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "exam": "NEET",
            "totalQuestions": 2,
            "questions": [
                {"questionNumber": 1, "question": "Unit of force?", "correctAnswer": "Newton",
                 "solution": "F = ma", "concept": "Mechanics"},
                {"questionNumber": 2, "question": "pH of water?", "correctAnswer": "7",
                 "solution": "Neutral"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(StatusLog::default());
    let drafts = DraftStore::in_memory();
    drafts.save_exam(Exam::Neet).unwrap();
    let mut session = MockTestSession::new(&config(&server, log.clone()), WebhookClient::new(), drafts).unwrap();
    session
        .select_question_paper(write(&dir, "paper.png", PNG))
        .await
        .unwrap();

    let report = session.generate_solutions().await.unwrap();
    assert_eq!(report.total_questions, 2);
    assert_eq!(report.questions[0].topic, "Mechanics");
    assert_eq!(report.questions[1].topic, "General");
    assert_eq!(session.state(), UploadState::Succeeded);
    assert_eq!(session.status(), Some(ProcessingStatus::Complete));
    assert_eq!(
        *log.0.lock().unwrap(),
        vec![
            ProcessingStatus::Extracting,
            ProcessingStatus::Analyzing,
            ProcessingStatus::Complete
        ]
    );
}

#[tokio::test]
async fn http_error_message_is_shown_and_files_are_kept() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/solutions"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(serde_json::json!({"message": "Image too blurry to read"})),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(StatusLog::default());
    let mut session =
        MockTestSession::new(&config(&server, log), WebhookClient::new(), DraftStore::in_memory())
            .unwrap();
    session
        .select_question_paper(write(&dir, "paper.jpg", JPEG))
        .await
        .unwrap();

    let err = session.generate_solutions().await.unwrap_err();
    assert!(matches!(err, EduGuideError::HttpStatus { status: 422, .. }));
    assert_eq!(session.error(), Some("Image too blurry to read"));
    assert_eq!(session.state(), UploadState::Failed);
    assert!(session.question_paper().is_some());
    assert!(session.solutions().is_none());
}

#[tokio::test]
async fn analysis_is_normalised() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analysis"))
        .and(body_partial_json(serde_json::json!({
            "exam": "JEE",
            "testImage": file_to_base64(PNG),
            "answerImage": file_to_base64(JPEG),
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "analysis": {
                "totalQuestions": 3, "attempted": 2, "correct": 1, "incorrect": 1,
                "score": "3/12", "percentage": "25%",
                "questionAnalysis": [
                    {"questionNumber": 1, "topic": "Kinematics", "studentAnswer": "B",
                     "correctAnswer": "B", "isCorrect": true, "marks": 4, "difficulty": "Easy"},
                    {"questionNumber": 2, "topic": "Optics", "studentAnswer": "A",
                     "correctAnswer": "C", "isCorrect": false, "marks": -1},
                    {"questionNumber": 3, "topic": "Waves", "studentAnswer": "",
                     "correctAnswer": "D", "isCorrect": false}
                ],
                "subjectBreakdown": {"Physics": {"correct": 1, "total": 3, "percentage": "33%"}},
                "weakTopics": ["Optics"],
                "strongTopics": [],
                "suggestions": ["Revise ray optics"]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(StatusLog::default());
    let mut session =
        MockTestSession::new(&config(&server, log), WebhookClient::new(), DraftStore::in_memory())
            .unwrap();
    session
        .select_question_paper(write(&dir, "paper.png", PNG))
        .await
        .unwrap();
    session
        .select_answer_sheet(write(&dir, "answers.jpg", JPEG))
        .await
        .unwrap();

    let report = session.generate_analysis().await.unwrap();
    assert_eq!(report.exam, Exam::Jee);
    assert!(report.validation.is_verified());

    let q = &report.analysis.question_analysis;
    assert_eq!(q.len(), 3);
    assert!(q[0].is_attempted);
    assert_eq!(q[0].marks_obtained, 4.0);
    assert_eq!(q[1].difficulty, "Medium");
    assert_eq!(q[1].marks_obtained, -1.0);
    assert!(!q[2].is_attempted);
    assert_eq!(q[2].marks_obtained, 0.0);
    assert!(q.iter().all(|v| v.max_marks == 4.0 && v.feedback.is_empty()));
    assert_eq!(report.analysis.weak_topics, vec!["Optics".to_string()]);
    assert_eq!(session.analysis(), Some(&report));
}

#[tokio::test]
async fn analysis_needs_both_files() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(StatusLog::default());
    let mut session =
        MockTestSession::new(&config(&server, log), WebhookClient::new(), DraftStore::in_memory())
            .unwrap();
    session
        .select_question_paper(write(&dir, "paper.png", PNG))
        .await
        .unwrap();

    let err = session.generate_analysis().await.unwrap_err();
    assert!(matches!(err, EduGuideError::MissingUpload("answer sheet")));
}

#[tokio::test]
async fn answer_sheet_rejects_pdf() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(StatusLog::default());
    let mut session =
        MockTestSession::new(&config(&server, log), WebhookClient::new(), DraftStore::in_memory())
            .unwrap();
    let err = session
        .select_answer_sheet(write(&dir, "answers.pdf", b"%PDF-1.7\n"))
        .await
        .unwrap_err();
    assert!(matches!(err, EduGuideError::UnsupportedFileType { .. }));
    assert_eq!(session.error(), Some("Please upload JPG, PNG, or PDF only"));
    assert_eq!(session.state(), UploadState::Idle);
}

#[tokio::test]
async fn slow_analysis_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analysis"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"success": true}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(StatusLog::default());
    let mut session =
        MockTestSession::new(&config(&server, log), WebhookClient::new(), DraftStore::in_memory())
            .unwrap();
    session
        .select_question_paper(write(&dir, "paper.png", PNG))
        .await
        .unwrap();
    session
        .select_answer_sheet(write(&dir, "answers.png", PNG))
        .await
        .unwrap();

    let err = session.generate_analysis().await.unwrap_err();
    assert!(matches!(err, EduGuideError::Timeout { .. }));
    assert_eq!(session.error(), Some("Taking longer than expected. Please try again."));
    assert_eq!(session.state(), UploadState::Failed);
    assert!(session.answer_sheet().is_some());
}

#[tokio::test]
async fn failed_upload_can_be_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/solutions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": false,
            "error": "Could not read the page"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/solutions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "totalQuestions": 1,
            "questions": [{"questionNumber": 1, "question": "2 + 2?", "correctAnswer": "4"}]
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(StatusLog::default());
    let mut session =
        MockTestSession::new(&config(&server, log), WebhookClient::new(), DraftStore::in_memory())
            .unwrap();
    session
        .select_question_paper(write(&dir, "paper.png", PNG))
        .await
        .unwrap();

    let err = session.generate_solutions().await.unwrap_err();
    assert!(matches!(err, EduGuideError::Unsuccessful { .. }));
    assert_eq!(session.state(), UploadState::Failed);
    assert_eq!(session.error(), Some("Could not read the page"));
    assert_eq!(session.status(), None);
    assert!(session.question_paper().is_some());

    let report = session.generate_solutions().await.unwrap();
    assert_eq!(report.total_questions, 1);
    assert_eq!(session.state(), UploadState::Succeeded);
    assert_eq!(session.error(), None);
}
