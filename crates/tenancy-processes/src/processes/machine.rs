//! Generic state-machine driver shared by every workflow.
//!
//! [`apply_trigger`] never touches the process it is given: it computes the successor on a
//! working copy and hands back both the prior and the updated aggregate, so a failure at any
//! step leaves the caller's value (and therefore anything persisted from it) untouched.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::definition::{EdgeTarget, EntryAction, WorkflowDefinition};
use super::domain::{
    EntityKind, FormData, Process, ProcessData, ProcessName, ProcessState, RelatedEntity,
};
use super::form;
use super::gateway::GatewayError;
use super::rules::EligibilityReport;

/// Upper bound on transitions chained through `EntryAction::Fire` within a single call.
pub const MAX_CHAINED_TRANSITIONS: usize = 8;

/// Trigger name plus the payload captured into the new state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRequest {
    pub trigger: String,
    #[serde(default)]
    pub form_data: FormData,
    #[serde(default)]
    pub documents: Vec<Uuid>,
}

impl TriggerRequest {
    pub fn new(trigger: &str) -> Self {
        Self {
            trigger: trigger.to_string(),
            ..Self::default()
        }
    }

    pub fn with_form_data(mut self, form_data: FormData) -> Self {
        self.form_data = form_data;
        self
    }

    pub fn with_documents(mut self, documents: Vec<Uuid>) -> Self {
        self.documents = documents;
        self
    }
}

/// Inputs available to a business-rule gate.
#[derive(Debug)]
pub struct GateContext<'a> {
    pub process: &'a Process,
    pub form_data: &'a FormData,
    pub today: NaiveDate,
}

/// Resolves rule-gated transitions.
pub trait GateEvaluator {
    fn evaluate(
        &self,
        gate: &str,
        context: &GateContext<'_>,
    ) -> Result<EligibilityReport, ProcessError>;
}

/// Outcome of one gate consulted during a transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateVerdict {
    pub gate: String,
    pub passed: bool,
    pub report: EligibilityReport,
}

/// Both snapshots of a successful transition, ready for persistence and event emission.
#[derive(Debug, Clone)]
pub struct AppliedTransition {
    pub before: Process,
    pub after: Process,
    pub verdicts: Vec<GateVerdict>,
}

impl AppliedTransition {
    pub fn entered_state(&self) -> Option<&str> {
        self.after.current_state_name()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("trigger '{trigger}' is not permitted from state '{state}'")]
    InvalidTrigger { trigger: String, state: String },
    #[error("no workflow is registered for process '{0}'")]
    UnknownProcess(ProcessName),
    #[error("{kind} {id} was not found")]
    EntityNotFound { kind: EntityKind, id: String },
    #[error("form data is missing required keys: {}", .missing.join(", "))]
    FormDataNotFound { missing: Vec<String> },
    #[error("form data key '{key}' must be {expected}")]
    FormDataFormat { key: String, expected: String },
    #[error("no business rule gate named '{0}'")]
    UnknownGate(String),
    #[error("trigger '{trigger}' chained more than {limit} transitions through entry actions")]
    TransitionLoop { trigger: String, limit: usize },
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl ProcessError {
    pub fn not_found(kind: EntityKind, id: impl ToString) -> Self {
        Self::EntityNotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// Applies `request` to `process` under `definition`.
///
/// The trigger must have an edge from the current state (the definition's initial pseudo-state
/// when the process has not started). Required form data is validated first, gated and
/// decision targets are resolved next, and entry actions of the entered state run last.
pub fn apply_trigger(
    definition: &WorkflowDefinition,
    process: &Process,
    request: &TriggerRequest,
    gates: &dyn GateEvaluator,
    now: DateTime<Utc>,
) -> Result<AppliedTransition, ProcessError> {
    let mut working = process.clone();
    let mut verdicts = Vec::new();
    let mut driver = Driver {
        definition,
        request,
        gates,
        now,
        verdicts: &mut verdicts,
        chained: 0,
    };
    driver.fire(&mut working, &request.trigger)?;

    Ok(AppliedTransition {
        before: process.clone(),
        after: working,
        verdicts,
    })
}

struct Driver<'a> {
    definition: &'a WorkflowDefinition,
    request: &'a TriggerRequest,
    gates: &'a dyn GateEvaluator,
    now: DateTime<Utc>,
    verdicts: &'a mut Vec<GateVerdict>,
    chained: usize,
}

impl Driver<'_> {
    fn fire(&mut self, working: &mut Process, trigger: &str) -> Result<(), ProcessError> {
        let definition = self.definition;
        let current = working
            .current_state_name()
            .unwrap_or(definition.initial_state())
            .to_string();
        let edge = definition
            .edge(&current, trigger)
            .ok_or_else(|| ProcessError::InvalidTrigger {
                trigger: trigger.to_string(),
                state: current.clone(),
            })?;

        form::check_requirements(&self.request.form_data, &edge.requires)?;

        let target = match &edge.target {
            EdgeTarget::Fixed(state) => *state,
            EdgeTarget::Gated {
                gate,
                passed,
                failed,
            } => {
                let context = GateContext {
                    process: &*working,
                    form_data: &self.request.form_data,
                    today: self.now.date_naive(),
                };
                let report = self.gates.evaluate(gate, &context)?;
                let eligible = report.is_eligible();
                debug!(
                    process_id = %working.id(),
                    gate,
                    eligible,
                    failed_rules = ?report.failed_rules(),
                    "business rule gate evaluated"
                );
                self.verdicts.push(GateVerdict {
                    gate: gate.to_string(),
                    passed: eligible,
                    report,
                });
                if eligible {
                    *passed
                } else {
                    *failed
                }
            }
            EdgeTarget::Decision { key, choices } => {
                form::choice(&self.request.form_data, key, choices)?
            }
        };

        let snapshot = ProcessState::new(
            target,
            definition.permitted_triggers(target),
            definition.assignment_for(target),
            ProcessData {
                form_data: self.request.form_data.clone(),
                documents: self.request.documents.clone(),
            },
            self.now,
        );
        working.enter(snapshot);
        debug!(process_id = %working.id(), from = %current, trigger, to = target, "state entered");

        for action in definition.entry_actions(target) {
            match action {
                EntryAction::AddRelatedEntity {
                    key,
                    target_type,
                    sub_type,
                } => {
                    let id = form::uuid(&self.request.form_data, key)?;
                    working.add_related_entity(RelatedEntity {
                        id,
                        target_type: *target_type,
                        sub_type: Some(sub_type.to_string()),
                        description: None,
                    });
                }
                EntryAction::Fire(next) => {
                    self.chained += 1;
                    if self.chained > MAX_CHAINED_TRANSITIONS {
                        return Err(ProcessError::TransitionLoop {
                            trigger: self.request.trigger.clone(),
                            limit: MAX_CHAINED_TRANSITIONS,
                        });
                    }
                    self.fire(working, next)?;
                }
            }
        }
        Ok(())
    }
}
