//! JoSAA choice-filling counselling: intake record, wizard and submission.

pub mod flow;
pub mod form;
pub mod wizard;

pub use flow::{
    CounsellingFlow, CounsellingReports, CounsellingResponse, ProcessingStage,
    ProcessingTimeline, TimelinePoint, ViewState, PROCESSING_STAGES,
};
pub use form::{
    canonical_state, parse_rank, Branch, Category, CollegeType, CounsellingRequest, Direction,
    FormRecord, Gender, LocationPreference, Priorities, Priority, Region, Strategy,
    INDIAN_STATES,
};
pub use wizard::{step_title, validate_step, FormWizard, FIRST_STEP, LAST_STEP};
