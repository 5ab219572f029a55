//! Five-step form wizard over a [`FormRecord`].
//!
//! Forward moves are gated by the current step's validator; backward moves
//! never are. Every field mutation clears the whole error map, so errors only
//! reappear on the next `next()` or `submit()`.

use super::form::{
    canonical_state, parse_rank, Branch, Category, CollegeType, Direction, FormRecord, Gender,
    LocationPreference, Region, Strategy,
};
use crate::error::ValidationErrors;
use tracing::debug;

pub const FIRST_STEP: u8 = 1;
pub const LAST_STEP: u8 = 5;

/// Heading and subheading of each step.
pub fn step_title(step: u8) -> (&'static str, &'static str) {
    match step {
        1 => ("Your Ranks", "Enter your ranks from the official result"),
        2 => ("Personal Details", "Help us personalize your recommendations"),
        3 => (
            "Branch Preferences",
            "Select your preferred branches (select multiple)",
        ),
        4 => (
            "College & Location Preferences",
            "Choose college types and location preferences",
        ),
        _ => ("Strategy & Priorities", "Choose your counselling strategy"),
    }
}

/// Validate the fields owned by `step`.
pub fn validate_step(record: &FormRecord, step: u8) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    match step {
        1 => {
            if parse_rank(&record.main_rank).is_none() {
                errors.insert("mainRank", "Please enter a valid JEE Main AIR");
            }
        }
        2 => {
            if record.category.is_none() {
                errors.insert("category", "Please select a category");
            }
            if record.gender.is_none() {
                errors.insert("gender", "Please select your gender");
            }
            if canonical_state(&record.home_state).is_none() {
                errors.insert("homeState", "Please select your home state");
            }
        }
        3 => {
            if record.branches.is_empty() {
                errors.insert("branches", "Please select at least one branch");
            }
        }
        4 => {
            if record.college_types.is_empty() {
                errors.insert("collegeTypes", "Please select at least one college type");
            }
            if record.location_preference == LocationPreference::Region
                && record.preferred_region.is_none()
            {
                errors.insert("preferredRegion", "Please select a region");
            }
        }
        5 => {
            if record.strategy.is_none() {
                errors.insert("strategy", "Please select a strategy");
            }
        }
        _ => {}
    }
    errors
}

/// Step counter, record and error map of one wizard run.
#[derive(Debug, Clone, PartialEq)]
pub struct FormWizard {
    step: u8,
    record: FormRecord,
    errors: ValidationErrors,
}

impl Default for FormWizard {
    fn default() -> Self {
        Self::new(FormRecord::default())
    }
}

impl FormWizard {
    /// Start at step 1 with `record` (an empty record or a loaded draft).
    pub fn new(record: FormRecord) -> Self {
        Self {
            step: FIRST_STEP,
            record,
            errors: ValidationErrors::new(),
        }
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn is_last_step(&self) -> bool {
        self.step == LAST_STEP
    }

    pub fn record(&self) -> &FormRecord {
        &self.record
    }

    pub fn into_record(self) -> FormRecord {
        self.record
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Replace the record wholesale (draft hydration). The step is kept.
    pub fn load(&mut self, record: FormRecord) {
        self.record = record;
        self.errors.clear();
    }

    /// Advance one step if the current one validates.
    ///
    /// Returns `false`, with the error map filled, when it does not. On the
    /// last step a valid `next()` stays put; use [`FormWizard::submit`].
    pub fn next(&mut self) -> bool {
        self.errors = validate_step(&self.record, self.step);
        if !self.errors.is_empty() {
            debug!("Step {} blocked: {}", self.step, self.errors);
            return false;
        }
        self.step = (self.step + 1).min(LAST_STEP);
        true
    }

    /// Go back one step without validating. Stops at step 1.
    pub fn back(&mut self) {
        self.step = self.step.saturating_sub(1).max(FIRST_STEP);
    }

    /// Re-validate every step and hand out the record on success.
    ///
    /// On failure the wizard moves to the first incomplete step and holds
    /// its errors.
    pub fn submit(&mut self) -> Result<FormRecord, ValidationErrors> {
        for step in FIRST_STEP..=LAST_STEP {
            let errors = validate_step(&self.record, step);
            if !errors.is_empty() {
                self.step = step;
                self.errors = errors.clone();
                return Err(errors);
            }
        }
        self.errors.clear();
        Ok(self.record.clone())
    }

    fn edit(&mut self, f: impl FnOnce(&mut FormRecord)) {
        f(&mut self.record);
        self.errors.clear();
    }

    pub fn set_main_rank(&mut self, rank: impl Into<String>) {
        let rank = rank.into();
        self.edit(|r| r.main_rank = rank);
    }

    pub fn set_advanced_rank(&mut self, rank: impl Into<String>) {
        let rank = rank.into();
        self.edit(|r| r.advanced_rank = rank);
    }

    pub fn set_category(&mut self, category: Category) {
        self.edit(|r| r.category = Some(category));
    }

    pub fn set_gender(&mut self, gender: Gender) {
        self.edit(|r| r.gender = Some(gender));
    }

    pub fn set_home_state(&mut self, state: impl Into<String>) {
        let state = state.into();
        self.edit(|r| r.home_state = state);
    }

    /// Deselect `branch` if selected, otherwise append it.
    pub fn toggle_branch(&mut self, branch: Branch) {
        self.edit(|r| {
            if let Some(pos) = r.branches.iter().position(|b| *b == branch) {
                r.branches.remove(pos);
            } else {
                r.branches.push(branch);
            }
        });
    }

    pub fn toggle_college_type(&mut self, college_type: CollegeType) {
        self.edit(|r| {
            if let Some(pos) = r.college_types.iter().position(|c| *c == college_type) {
                r.college_types.remove(pos);
            } else {
                r.college_types.push(college_type);
            }
        });
    }

    /// Changing the mode drops any previously chosen region.
    pub fn set_location_preference(&mut self, mode: LocationPreference) {
        self.edit(|r| {
            r.location_preference = mode;
            r.preferred_region = None;
        });
    }

    pub fn set_preferred_region(&mut self, region: Region) {
        self.edit(|r| r.preferred_region = Some(region));
    }

    pub fn set_strategy(&mut self, strategy: Strategy) {
        self.edit(|r| r.strategy = Some(strategy));
    }

    /// Swap priority `index` with its neighbour. Boundary moves change
    /// nothing and leave the error map alone.
    pub fn move_priority(&mut self, index: usize, direction: Direction) -> bool {
        let mut priorities = self.record.priorities;
        if !priorities.move_item(index, direction) {
            return false;
        }
        self.edit(|r| r.priorities = priorities);
        true
    }
}
