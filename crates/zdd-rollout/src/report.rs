//! Per-step record of a deployment.
//!
//! Strategies keep going when an intermediate step fails. Each step's outcome
//! is recorded here so the operator, or an automated caller reading the JSON
//! rendering, can tell a clean run from a partial one.

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StepOutcome {
    Ok,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub action: String,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployReport {
    pub command: String,
    pub steps: Vec<StepRecord>,
}

impl DeployReport {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            steps: Vec::new(),
        }
    }

    /// Record a step's result. Returns `true` when the step succeeded.
    pub fn record<T, E: fmt::Display>(&mut self, action: impl Into<String>, result: Result<T, E>) -> bool {
        let action = action.into();
        let outcome = match result {
            Ok(_) => {
                info!(command = %self.command, %action, "step succeeded");
                StepOutcome::Ok
            }
            Err(e) => {
                warn!(command = %self.command, %action, error = %e, "step failed, continuing");
                StepOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };
        let ok = outcome == StepOutcome::Ok;
        self.steps.push(StepRecord { action, outcome });
        ok
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::Failed { .. }))
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

impl fmt::Display for DeployReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {} step(s)", self.command, self.steps.len())?;
        for step in &self.steps {
            match &step.outcome {
                StepOutcome::Ok => writeln!(f, "  ✓ {}", step.action)?,
                StepOutcome::Failed { error } => writeln!(f, "  ✗ {}: {error}", step.action)?,
            }
        }
        if self.is_success() {
            write!(f, "completed")
        } else {
            write!(f, "completed with {} failed step(s)", self.failures().count())
        }
    }
}
