//! Step-based workflow state shared by the document portal and the concept generator.
//!
//! A [`Wizard`] owns the current step, a payload, the error/warning lists shown to the user and
//! a single in-flight flag. Which moves between steps are legal is decided by the step type
//! through [`WizardStep::allows`].

use std::fmt::Debug;
use thiserror::Error;

pub trait WizardStep: Copy + Eq + Debug {
    /// Step a fresh wizard starts on.
    fn initial() -> Self;

    /// Whether moving from `from` to `to` is a valid transition.
    fn allows(from: Self, to: Self) -> bool;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("another operation is still running")]
    Busy,
    #[error("cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("{0}")]
    MissingData(&'static str),
}

#[derive(Debug, Clone)]
pub struct Wizard<S, P> {
    step: S,
    payload: P,
    errors: Vec<String>,
    warnings: Vec<String>,
    in_flight: bool,
}

impl<S: WizardStep, P: Default> Default for Wizard<S, P> {
    fn default() -> Self {
        Self::new(P::default())
    }
}

impl<S: WizardStep, P> Wizard<S, P> {
    pub fn new(payload: P) -> Self {
        Self {
            step: S::initial(),
            payload,
            errors: Vec::new(),
            warnings: Vec::new(),
            in_flight: false,
        }
    }

    pub fn step(&self) -> S {
        self.step
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut P {
        &mut self.payload
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn transition(&mut self, to: S) -> Result<(), WizardError> {
        if !S::allows(self.step, to) {
            return Err(WizardError::InvalidTransition {
                from: format!("{:?}", self.step),
                to: format!("{:?}", to),
            });
        }
        tracing::debug!(from = ?self.step, to = ?to, "wizard transition");
        self.step = to;
        Ok(())
    }

    /// Fails when the wizard is not on `expected`.
    pub fn require_step(&self, expected: S) -> Result<(), WizardError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(WizardError::InvalidTransition {
                from: format!("{:?}", self.step),
                to: format!("{:?}", expected),
            })
        }
    }

    /// Marks an operation as running. Re-entrant calls are rejected, never queued.
    pub fn begin_operation(&mut self) -> Result<(), WizardError> {
        if self.in_flight {
            return Err(WizardError::Busy);
        }
        self.in_flight = true;
        Ok(())
    }

    pub fn finish_operation(&mut self) {
        self.in_flight = false;
    }

    /// Replaces both lists wholesale.
    pub fn set_messages(&mut self, errors: Vec<String>, warnings: Vec<String>) {
        self.errors = errors;
        self.warnings = warnings;
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.set_messages(vec![error.into()], Vec::new());
    }

    pub fn clear_messages(&mut self) {
        self.errors.clear();
        self.warnings.clear();
    }

    /// Discards everything and starts over on `step` with `payload`.
    ///
    /// Refused while an operation runs, so its outcome can never land on the fresh state.
    pub fn reset_to(&mut self, step: S, payload: P) -> Result<(), WizardError> {
        if self.in_flight {
            return Err(WizardError::Busy);
        }
        self.step = step;
        self.payload = payload;
        self.errors.clear();
        self.warnings.clear();
        Ok(())
    }
}
