use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::keys::file_name_of;

/// Phase of an orchestration session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Idle,
    Preflighting,
    Submitting,
    Polling,
    Resolving,
    Done,
    Failed,
}

impl SessionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Done | SessionPhase::Failed)
    }

    /// Whether the workflow may move from `self` to `next`.
    ///
    /// Moving to `Idle` is always allowed; it is only ever requested by an
    /// explicit reset.
    pub fn can_transition_to(&self, next: SessionPhase) -> bool {
        use SessionPhase::*;

        match (self, next) {
            (_, Idle) => true,
            (Idle, Preflighting) => true,
            (Preflighting, Submitting) => true,
            (Submitting, Polling) => true,
            (Polling, Resolving) => true,
            (Resolving, Done) => true,
            (Resolving, Polling) => true,
            (Preflighting | Submitting | Polling | Resolving, Failed) => true,
            _ => false,
        }
    }
}

impl Display for SessionPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SessionPhase::Idle => write!(f, "idle"),
            SessionPhase::Preflighting => write!(f, "preflighting"),
            SessionPhase::Submitting => write!(f, "submitting"),
            SessionPhase::Polling => write!(f, "polling"),
            SessionPhase::Resolving => write!(f, "resolving"),
            SessionPhase::Done => write!(f, "done"),
            SessionPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Workflow stage a failure belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Configuration,
    Preflight,
    Submission,
    Processing,
    Resolution,
}

impl Display for FailureStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FailureStage::Configuration => write!(f, "configuration"),
            FailureStage::Preflight => write!(f, "preflight"),
            FailureStage::Submission => write!(f, "submission"),
            FailureStage::Processing => write!(f, "processing"),
            FailureStage::Resolution => write!(f, "resolution"),
        }
    }
}

/// Last error of a failed session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionError {
    pub stage: FailureStage,
    pub message: String,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} failed: {}", self.stage, self.message)
    }
}

/// Location of a translated document, confirmed to exist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultDescriptor {
    pub output_key: String,
    pub display_name: String,
}

impl ResultDescriptor {
    pub fn new(output_key: impl Into<String>) -> Self {
        let output_key = output_key.into();
        let display_name = file_name_of(&output_key).to_string();
        Self {
            output_key,
            display_name,
        }
    }
}

/// Observable state of a session at one point in time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    /// Incremented on every start, cancel and reset.
    pub generation: u64,
    pub phase: SessionPhase,
    pub progress_hint: Option<String>,
    pub job_id: Option<String>,
    pub result: Option<ResultDescriptor>,
    pub error: Option<SessionError>,
}

impl SessionSnapshot {
    pub fn idle(generation: u64) -> Self {
        Self {
            generation,
            ..Default::default()
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }
}
