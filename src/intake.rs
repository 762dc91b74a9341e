//! Four-step checkup intake: personal → medical → selfies → problem.
//!
//! Each step has a gate; the wizard refuses to move past a step whose
//! fields are incomplete. Submission drives a draft through every gate.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::error::AppError;

pub const MIN_SELFIES: usize = 4;
pub const MAX_SELFIES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum IntakeStep {
    Personal,
    Medical,
    Selfies,
    Problem,
}

impl IntakeStep {
    pub fn next(self) -> Option<IntakeStep> {
        match self {
            IntakeStep::Personal => Some(IntakeStep::Medical),
            IntakeStep::Medical => Some(IntakeStep::Selfies),
            IntakeStep::Selfies => Some(IntakeStep::Problem),
            IntakeStep::Problem => None,
        }
    }

    pub fn previous(self) -> Option<IntakeStep> {
        match self {
            IntakeStep::Personal => None,
            IntakeStep::Medical => Some(IntakeStep::Personal),
            IntakeStep::Selfies => Some(IntakeStep::Medical),
            IntakeStep::Problem => Some(IntakeStep::Selfies),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Concern {
    Skin,
    Hair,
}

impl Concern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Concern::Skin => "skin",
            Concern::Hair => "hair",
        }
    }

    pub fn parse(value: &str) -> Option<Concern> {
        match value.trim().to_ascii_lowercase().as_str() {
            "skin" => Some(Concern::Skin),
            "hair" => Some(Concern::Hair),
            _ => None,
        }
    }
}

/// Everything the patient has entered so far. Files are represented by count.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct IntakeDraft {
    pub full_name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub concern: Option<String>,
    pub medical_history: Option<String>,
    pub current_medications: Option<String>,
    pub allergies: Option<String>,
    #[serde(default)]
    pub has_report: bool,
    #[serde(default)]
    pub selfie_count: usize,
    pub problem_description: Option<String>,
    pub problem_duration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("age must be between 1 and 120")]
    InvalidAge,
    #[error("concern must be either skin or hair")]
    InvalidConcern,
    #[error("at least {} selfies are required, got {}", MIN_SELFIES, .0)]
    NotEnoughSelfies(usize),
    #[error("at most {} selfies are allowed, got {}", MAX_SELFIES, .0)]
    TooManySelfies(usize),
    #[error("the problem description step is the last step")]
    AlreadyFinished,
}

impl From<IntakeError> for AppError {
    fn from(err: IntakeError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).is_none_or(str::is_empty)
}

/// Gate for a single step.
pub fn validate_step(step: IntakeStep, draft: &IntakeDraft) -> Result<(), IntakeError> {
    match step {
        IntakeStep::Personal => {
            let mut missing = Vec::new();
            if blank(&draft.full_name) {
                missing.push("full_name");
            }
            if draft.age.is_none() {
                missing.push("age");
            }
            if blank(&draft.gender) {
                missing.push("gender");
            }
            if blank(&draft.phone) {
                missing.push("phone");
            }
            if !missing.is_empty() {
                return Err(IntakeError::MissingFields(missing));
            }
            match draft.age {
                Some(age) if (1..=120).contains(&age) => Ok(()),
                _ => Err(IntakeError::InvalidAge),
            }
        }
        IntakeStep::Medical => {
            if blank(&draft.concern) {
                return Err(IntakeError::MissingFields(vec!["concern"]));
            }
            draft
                .concern
                .as_deref()
                .and_then(Concern::parse)
                .map(|_| ())
                .ok_or(IntakeError::InvalidConcern)
        }
        IntakeStep::Selfies => {
            if draft.selfie_count < MIN_SELFIES {
                Err(IntakeError::NotEnoughSelfies(draft.selfie_count))
            } else if draft.selfie_count > MAX_SELFIES {
                Err(IntakeError::TooManySelfies(draft.selfie_count))
            } else {
                Ok(())
            }
        }
        IntakeStep::Problem => {
            if blank(&draft.problem_description) {
                Err(IntakeError::MissingFields(vec!["problem_description"]))
            } else {
                Ok(())
            }
        }
    }
}

/// A draft that has passed every gate.
#[derive(Debug, Clone)]
pub struct CompletedIntake {
    pub full_name: String,
    pub age: i32,
    pub gender: String,
    pub phone: String,
    pub email: Option<String>,
    pub concern: Concern,
    pub medical_history: Option<String>,
    pub current_medications: Option<String>,
    pub allergies: Option<String>,
    pub problem_description: String,
    pub problem_duration: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IntakeWizard {
    step: IntakeStep,
    draft: IntakeDraft,
}

impl IntakeWizard {
    pub fn new(draft: IntakeDraft) -> Self {
        Self {
            step: IntakeStep::Personal,
            draft,
        }
    }

    pub fn step(&self) -> IntakeStep {
        self.step
    }

    pub fn draft(&self) -> &IntakeDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut IntakeDraft {
        &mut self.draft
    }

    /// Move to the next step if the current one validates.
    pub fn advance(&mut self) -> Result<IntakeStep, IntakeError> {
        validate_step(self.step, &self.draft)?;
        let next = self.step.next().ok_or(IntakeError::AlreadyFinished)?;
        self.step = next;
        Ok(next)
    }

    /// Going back never validates.
    pub fn back(&mut self) -> IntakeStep {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    /// Run every remaining gate and produce the validated intake.
    pub fn complete(mut self) -> Result<CompletedIntake, IntakeError> {
        while self.step != IntakeStep::Problem {
            self.advance()?;
        }
        validate_step(IntakeStep::Problem, &self.draft)?;

        let d = self.draft;
        let trimmed = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        let concern = d
            .concern
            .as_deref()
            .and_then(Concern::parse)
            .ok_or(IntakeError::InvalidConcern)?;
        Ok(CompletedIntake {
            full_name: trimmed(d.full_name).unwrap_or_default(),
            age: d.age.unwrap_or_default(),
            gender: trimmed(d.gender).unwrap_or_default(),
            phone: trimmed(d.phone).unwrap_or_default(),
            email: trimmed(d.email),
            concern,
            medical_history: trimmed(d.medical_history),
            current_medications: trimmed(d.current_medications),
            allergies: trimmed(d.allergies),
            problem_description: trimmed(d.problem_description).unwrap_or_default(),
            problem_duration: trimmed(d.problem_duration),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn personal() -> IntakeDraft {
        IntakeDraft {
            full_name: Some("Asha Rao".into()),
            age: Some(29),
            gender: Some("female".into()),
            phone: Some("9876543210".into()),
            ..Default::default()
        }
    }

    fn full() -> IntakeDraft {
        IntakeDraft {
            concern: Some("Hair".into()),
            selfie_count: 4,
            problem_description: Some("Hair fall for six months".into()),
            ..personal()
        }
    }

    #[test]
    fn personal_step_requires_every_field() {
        let mut wizard = IntakeWizard::new(IntakeDraft {
            full_name: Some("   ".into()),
            age: Some(30),
            ..Default::default()
        });
        let err = wizard.advance().unwrap_err();
        assert_eq!(
            err,
            IntakeError::MissingFields(vec!["full_name", "gender", "phone"])
        );
        assert_eq!(wizard.step(), IntakeStep::Personal);

        *wizard.draft_mut() = personal();
        assert_eq!(wizard.advance().unwrap(), IntakeStep::Medical);
    }

    #[test]
    fn age_out_of_range_blocks_personal_step() {
        let mut draft = personal();
        draft.age = Some(0);
        assert_eq!(
            validate_step(IntakeStep::Personal, &draft),
            Err(IntakeError::InvalidAge)
        );
    }

    #[test]
    fn selfie_step_needs_four_photos() {
        let mut draft = full();
        draft.selfie_count = 3;
        let mut wizard = IntakeWizard::new(draft);
        assert_eq!(wizard.advance().unwrap(), IntakeStep::Medical);
        assert_eq!(wizard.advance().unwrap(), IntakeStep::Selfies);
        assert_eq!(
            wizard.advance().unwrap_err(),
            IntakeError::NotEnoughSelfies(3)
        );
        assert_eq!(wizard.step(), IntakeStep::Selfies);

        wizard.draft_mut().selfie_count = 4;
        assert_eq!(wizard.advance().unwrap(), IntakeStep::Problem);
        assert_eq!(wizard.advance().unwrap_err(), IntakeError::AlreadyFinished);
    }

    #[test]
    fn unknown_concern_is_rejected() {
        let mut draft = full();
        draft.concern = Some("nails".into());
        assert_eq!(
            validate_step(IntakeStep::Medical, &draft),
            Err(IntakeError::InvalidConcern)
        );
    }

    #[test]
    fn back_does_not_validate() {
        let mut wizard = IntakeWizard::new(full());
        wizard.advance().unwrap();
        wizard.draft_mut().full_name = None;
        assert_eq!(wizard.back(), IntakeStep::Personal);
        assert_eq!(wizard.back(), IntakeStep::Personal);
    }

    #[test]
    fn complete_runs_all_gates() {
        let done = IntakeWizard::new(full()).complete().unwrap();
        assert_eq!(done.concern, Concern::Hair);
        assert_eq!(done.full_name, "Asha Rao");
        assert!(done.medical_history.is_none());

        let mut missing_problem = full();
        missing_problem.problem_description = Some(" ".into());
        assert_eq!(
            IntakeWizard::new(missing_problem).complete().unwrap_err(),
            IntakeError::MissingFields(vec!["problem_description"])
        );
    }
}
