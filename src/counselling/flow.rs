//! Counselling submit orchestration: form → processing → results.

use super::form::{CounsellingRequest, FormRecord};
use super::wizard::FormWizard;
use crate::client::{Flow, WebhookClient};
use crate::config::CompanionConfig;
use crate::error::EduGuideError;
use crate::report::lenient;
use crate::storage::DraftStore;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Which screen the counselling flow is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Form,
    Processing,
    Results,
}

/// Free-text reports produced by the counselling workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CounsellingReports {
    #[serde(deserialize_with = "lenient::string")]
    pub full_response: String,
}

/// Reply of the counselling endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CounsellingResponse {
    #[serde(deserialize_with = "lenient::boolean")]
    pub success: bool,
    /// Echo of the submitted profile; the shape is up to the workflow.
    pub student_info: serde_json::Value,
    #[serde(deserialize_with = "lenient::or_default")]
    pub reports: CounsellingReports,
    #[serde(deserialize_with = "lenient::string")]
    pub timestamp: String,
    #[serde(deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Drives one counselling session over a wizard, a draft store and the
/// counselling endpoint.
#[derive(Debug)]
pub struct CounsellingFlow {
    client: WebhookClient,
    url: String,
    timeout: Duration,
    drafts: DraftStore,
    wizard: FormWizard,
    view: ViewState,
    submitted: Option<FormRecord>,
    response: Option<CounsellingResponse>,
    error: Option<String>,
}

impl CounsellingFlow {
    /// Build the flow and hydrate the wizard from any saved draft.
    pub fn new(
        config: &CompanionConfig,
        client: WebhookClient,
        drafts: DraftStore,
    ) -> Result<Self, EduGuideError> {
        let record = match drafts.load_draft()? {
            Some(draft) => {
                info!("Resuming saved counselling draft");
                draft
            }
            None => FormRecord::default(),
        };
        Ok(Self {
            client,
            url: config.url_for(Flow::Counselling).to_string(),
            timeout: config.timeout_for(Flow::Counselling),
            drafts,
            wizard: FormWizard::new(record),
            view: ViewState::Form,
            submitted: None,
            response: None,
            error: None,
        })
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn wizard(&self) -> &FormWizard {
        &self.wizard
    }

    pub fn wizard_mut(&mut self) -> &mut FormWizard {
        &mut self.wizard
    }

    /// Banner text of the last failed submission.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn response(&self) -> Option<&CounsellingResponse> {
        self.response.as_ref()
    }

    /// The record behind the current results.
    pub fn submitted(&self) -> Option<&FormRecord> {
        self.submitted.as_ref()
    }

    /// Persist the wizard's current record as the draft.
    pub fn save_draft(&self) -> Result<(), EduGuideError> {
        self.drafts.save_draft(self.wizard.record())?;
        info!("Draft saved");
        Ok(())
    }

    /// Validate the last step and send the record.
    ///
    /// On success the persisted draft is removed and the flow shows results.
    /// On failure the flow returns to the form with its data intact, the
    /// draft untouched and [`CounsellingFlow::error`] set.
    pub async fn submit(&mut self) -> Result<CounsellingResponse, EduGuideError> {
        let record = self.wizard.submit().map_err(EduGuideError::Validation)?;
        self.send(record).await
    }

    /// Send the same record again after a failure.
    pub async fn retry(&mut self) -> Result<CounsellingResponse, EduGuideError> {
        let record = self.wizard.record().clone();
        self.send(record).await
    }

    /// Leave the results screen for a fresh form view.
    pub fn reset(&mut self) {
        self.view = ViewState::Form;
        self.response = None;
        self.error = None;
    }

    async fn send(&mut self, record: FormRecord) -> Result<CounsellingResponse, EduGuideError> {
        self.view = ViewState::Processing;
        self.error = None;

        let body = CounsellingRequest::from(&record);
        let outcome = self
            .client
            .post_json::<_, CounsellingResponse>(Flow::Counselling, &self.url, &body, self.timeout)
            .await
            .and_then(|reply| {
                if reply.success {
                    Ok(reply)
                } else {
                    Err(EduGuideError::Unsuccessful {
                        flow: Flow::Counselling,
                        message: reply.error.clone(),
                    })
                }
            });

        match outcome {
            Ok(reply) => {
                info!(
                    "Counselling report received ({} chars)",
                    reply.reports.full_response.len()
                );
                if let Err(e) = self.drafts.clear_draft() {
                    warn!("Could not clear draft after submission: {e}");
                }
                self.response = Some(reply.clone());
                self.submitted = Some(record);
                self.view = ViewState::Results;
                Ok(reply)
            }
            Err(e) => {
                warn!("Counselling submission failed: {e}");
                self.error = Some(e.user_message());
                self.view = ViewState::Form;
                Err(e)
            }
        }
    }
}

/// One staged message shown while the counselling report is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingStage {
    pub text: &'static str,
    pub nominal: Duration,
}

pub const PROCESSING_STAGES: [ProcessingStage; 5] = [
    ProcessingStage {
        text: "Analyzing your profile...",
        nominal: Duration::from_secs(8),
    },
    ProcessingStage {
        text: "Searching latest cutoff data from official sources...",
        nominal: Duration::from_secs(12),
    },
    ProcessingStage {
        text: "Comparing 1000+ college-branch combinations...",
        nominal: Duration::from_secs(15),
    },
    ProcessingStage {
        text: "Generating personalized strategy...",
        nominal: Duration::from_secs(12),
    },
    ProcessingStage {
        text: "Creating detailed reports...",
        nominal: Duration::from_secs(8),
    },
];

/// Progress cap while the reply is still outstanding.
pub const PROGRESS_CAP: f32 = 95.0;

/// Simulated progress for the processing screen.
///
/// The stages are cosmetic: they advance with wall-clock time, not with
/// anything the workflow reports.
#[derive(Debug, Clone, Copy)]
pub struct ProcessingTimeline {
    started: Instant,
}

/// A point on the timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelinePoint {
    /// Index into [`PROCESSING_STAGES`] of the active stage.
    pub stage: usize,
    pub percent: f32,
}

impl ProcessingTimeline {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn total() -> Duration {
        PROCESSING_STAGES.iter().map(|s| s.nominal).sum()
    }

    pub fn now(&self) -> TimelinePoint {
        Self::at(self.started.elapsed())
    }

    /// Stage and percentage after `elapsed`.
    pub fn at(elapsed: Duration) -> TimelinePoint {
        let mut boundary = Duration::ZERO;
        let mut stage = PROCESSING_STAGES.len() - 1;
        for (i, s) in PROCESSING_STAGES.iter().enumerate() {
            boundary += s.nominal;
            if elapsed <= boundary {
                stage = i;
                break;
            }
        }
        let percent =
            (elapsed.as_secs_f32() / Self::total().as_secs_f32() * 100.0).min(PROGRESS_CAP);
        TimelinePoint { stage, percent }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeline_stages_follow_nominal_durations() {
        assert_eq!(ProcessingTimeline::total(), Duration::from_secs(55));
        assert_eq!(ProcessingTimeline::at(Duration::ZERO).stage, 0);
        assert_eq!(ProcessingTimeline::at(Duration::from_secs(8)).stage, 0);
        assert_eq!(ProcessingTimeline::at(Duration::from_secs(9)).stage, 1);
        assert_eq!(ProcessingTimeline::at(Duration::from_secs(36)).stage, 3);
        assert_eq!(ProcessingTimeline::at(Duration::from_secs(500)).stage, 4);
    }

    #[test]
    fn timeline_progress_is_capped() {
        let p = ProcessingTimeline::at(Duration::from_secs(11));
        assert!((p.percent - 20.0).abs() < 0.01);
        assert_eq!(ProcessingTimeline::at(Duration::from_secs(55)).percent, PROGRESS_CAP);
        assert_eq!(ProcessingTimeline::at(Duration::from_secs(600)).percent, PROGRESS_CAP);
    }

    #[test]
    fn response_tolerates_missing_and_odd_fields() {
        let r: CounsellingResponse =
            serde_json::from_str(r#"{"success":true,"reports":null,"timestamp":123}"#).unwrap();
        assert!(r.success);
        assert_eq!(r.reports.full_response, "");
        assert_eq!(r.timestamp, "123");
    }
}
