use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::definition::WorkflowDefinition;
use super::domain::{
    EntityKind, FormData, Process, ProcessId, ProcessName, ProcessState, RelatedEntity,
    TargetType,
};
use super::eligibility::EligibilityGates;
use super::events::{Actor, ProcessEvent, ProcessEventPublisher, ProcessEventType};
use super::gateway::{GatewayError, PersonGateway, TenureGateway};
use super::machine::{apply_trigger, AppliedTransition, ProcessError, TriggerRequest};
use super::registry::WorkflowRegistry;
use super::store::{Page, PageRequest, ProcessRepository, RepositoryError};
use crate::config::PaginationConfig;

/// Payload for starting a new process against a target entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProcessRequest {
    pub target_id: Uuid,
    #[serde(default)]
    pub related_entities: Vec<RelatedEntity>,
    #[serde(default)]
    pub form_data: FormData,
    #[serde(default)]
    pub documents: Vec<Uuid>,
}

/// Payload accompanying a trigger on an existing process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProcessRequest {
    #[serde(default)]
    pub form_data: FormData,
    #[serde(default)]
    pub documents: Vec<Uuid>,
}

/// Use-case layer: loads, transitions, persists, and announces processes.
///
/// Conflicts reported by the store are surfaced to the caller unchanged; nothing here retries.
pub struct ProcessService<R, T, P, E> {
    registry: Arc<WorkflowRegistry>,
    repository: Arc<R>,
    gates: EligibilityGates<T, P>,
    events: Arc<E>,
    pagination: PaginationConfig,
    clock: fn() -> DateTime<Utc>,
}

impl<R, T, P, E> ProcessService<R, T, P, E>
where
    R: ProcessRepository + 'static,
    T: TenureGateway + 'static,
    P: PersonGateway + 'static,
    E: ProcessEventPublisher + 'static,
{
    pub fn new(
        registry: Arc<WorkflowRegistry>,
        repository: Arc<R>,
        tenures: Arc<T>,
        persons: Arc<P>,
        events: Arc<E>,
    ) -> Self {
        Self {
            registry,
            repository,
            gates: EligibilityGates::new(tenures, persons),
            events,
            pagination: PaginationConfig::default(),
            clock: Utc::now,
        }
    }

    pub fn with_pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn registry(&self) -> &WorkflowRegistry {
        &self.registry
    }

    /// Start a process of type `name`, applying the workflow's start trigger.
    pub fn create(
        &self,
        name: ProcessName,
        request: CreateProcessRequest,
        actor: &Actor,
    ) -> Result<Process, ProcessServiceError> {
        let definition = self.registry.get(name)?;
        self.ensure_target_exists(definition.target_type(), &request.target_id)?;

        let process = Process::unstarted(
            ProcessId::generate(),
            name,
            request.target_id,
            definition.target_type(),
            request.related_entities,
        );
        let trigger = TriggerRequest {
            trigger: definition.start_trigger().to_string(),
            form_data: request.form_data,
            documents: request.documents,
        };
        let applied = self.apply(definition, &process, &trigger)?;
        let stored = self.repository.save(applied.after, None)?;

        info!(
            process_id = %stored.id(),
            process_name = %name,
            target_id = %stored.target_id(),
            state = stored.current_state_name().unwrap_or_default(),
            "process started"
        );
        self.emit(ProcessEventType::ProcessStarted, None, &stored, actor);
        Ok(stored)
    }

    /// Apply `trigger` to a stored process.
    ///
    /// When `if_match` is given it must equal the stored version, otherwise the call fails
    /// with a version conflict before any transition is computed.
    pub fn trigger(
        &self,
        name: ProcessName,
        id: ProcessId,
        trigger: &str,
        request: UpdateProcessRequest,
        if_match: Option<u32>,
        actor: &Actor,
    ) -> Result<Process, ProcessServiceError> {
        let definition = self.registry.get(name)?;
        let process = self.load(name, id)?;
        let expected = process.version_number();

        if let Some(requested) = if_match {
            if expected != Some(requested) {
                warn!(process_id = %id, requested, current = ?expected, "stale if-match version");
                return Err(RepositoryError::VersionConflict {
                    id,
                    expected: Some(requested),
                    current: expected,
                }
                .into());
            }
        }

        self.ensure_target_exists(process.target_type(), &process.target_id())?;

        let request = TriggerRequest {
            trigger: trigger.to_string(),
            form_data: request.form_data,
            documents: request.documents,
        };
        let applied = self.apply(definition, &process, &request)?;
        let old_state = applied.before.current_state().cloned();
        let stored = match self.repository.save(applied.after, expected) {
            Ok(stored) => stored,
            Err(err @ RepositoryError::VersionConflict { .. }) => {
                warn!(process_id = %id, trigger, error = %err, "concurrent update rejected");
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        };

        let entered = stored.current_state_name().unwrap_or_default();
        info!(
            process_id = %id,
            process_name = %name,
            trigger,
            from = old_state.as_ref().map(|state| state.name.as_str()).unwrap_or_default(),
            to = entered,
            version = ?stored.version_number(),
            "process trigger applied"
        );

        let event_type = if definition.is_terminal(entered) {
            ProcessEventType::ProcessClosed
        } else {
            ProcessEventType::ProcessUpdated
        };
        self.emit(event_type, old_state, &stored, actor);
        Ok(stored)
    }

    pub fn get(&self, name: ProcessName, id: ProcessId) -> Result<Process, ProcessServiceError> {
        self.registry.get(name)?;
        self.load(name, id)
    }

    /// Processes concerning `target_id`, in order of creation.
    pub fn by_target(
        &self,
        target_id: Uuid,
        page_size: Option<usize>,
        token: Option<String>,
    ) -> Result<Page<Process>, ProcessServiceError> {
        let page = PageRequest {
            page_size: self.pagination.clamp(page_size),
            token,
        };
        Ok(self.repository.find_by_target(&target_id, &page)?)
    }

    fn load(&self, name: ProcessName, id: ProcessId) -> Result<Process, ProcessServiceError> {
        let process = self
            .repository
            .load(&id)?
            .filter(|process| process.process_name() == name)
            .ok_or_else(|| ProcessError::not_found(EntityKind::Process, id))?;
        Ok(process)
    }

    fn apply(
        &self,
        definition: &WorkflowDefinition,
        process: &Process,
        request: &TriggerRequest,
    ) -> Result<AppliedTransition, ProcessError> {
        let applied = apply_trigger(definition, process, request, &self.gates, (self.clock)())?;
        for verdict in &applied.verdicts {
            info!(
                process_id = %process.id(),
                gate = %verdict.gate,
                passed = verdict.passed,
                summary = %verdict.report.summary(),
                "business rule gate decided transition"
            );
        }
        Ok(applied)
    }

    fn ensure_target_exists(&self, target_type: TargetType, id: &Uuid) -> Result<(), ProcessError> {
        let found = match target_type {
            TargetType::Tenure => self.gates.tenures().tenure_by_id(id)?.is_some(),
            TargetType::Person => self.gates.persons().person_by_id(id)?.is_some(),
            TargetType::Asset => {
                debug!(target_id = %id, "no asset collaborator configured; skipping lookup");
                true
            }
        };
        if found {
            Ok(())
        } else {
            Err(ProcessError::not_found(EntityKind::from(target_type), id))
        }
    }

    fn emit(
        &self,
        event_type: ProcessEventType,
        old_state: Option<ProcessState>,
        process: &Process,
        actor: &Actor,
    ) {
        let Some(new_state) = process.current_state().cloned() else {
            return;
        };
        let event = ProcessEvent {
            event_type,
            process_id: process.id(),
            process_name: process.process_name(),
            version_number: process.version_number(),
            old_state,
            new_state,
            actor: actor.clone(),
            occurred_at: (self.clock)(),
        };
        if let Err(err) = self.events.publish(event) {
            warn!(
                process_id = %process.id(),
                event = event_type.label(),
                error = %err,
                "process event not published; transition already committed"
            );
        }
    }
}

/// Error raised by the process service.
#[derive(Debug, thiserror::Error)]
pub enum ProcessServiceError {
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ProcessServiceError {
    /// Stable identifier for the failure, exposed to API callers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Process(ProcessError::InvalidTrigger { .. }) => "InvalidTrigger",
            Self::Process(ProcessError::UnknownProcess(_)) => "UnknownProcess",
            Self::Process(ProcessError::EntityNotFound { .. })
            | Self::Repository(RepositoryError::NotFound(_)) => "EntityNotFound",
            Self::Process(ProcessError::FormDataNotFound { .. }) => "FormDataNotFound",
            Self::Process(ProcessError::FormDataFormat { .. }) => "FormDataFormat",
            Self::Process(ProcessError::UnknownGate(_)) => "UnknownGate",
            Self::Process(ProcessError::TransitionLoop { .. }) => "TransitionLoop",
            Self::Process(ProcessError::Gateway(GatewayError::Unavailable { .. })) => {
                "GatewayUnavailable"
            }
            Self::Repository(RepositoryError::VersionConflict { .. }) => "VersionConflict",
            Self::Repository(RepositoryError::InvalidPaginationToken(_)) => {
                "InvalidPaginationToken"
            }
            Self::Repository(RepositoryError::Unavailable(_)) => "StoreUnavailable",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Process(
                ProcessError::InvalidTrigger { .. }
                | ProcessError::FormDataNotFound { .. }
                | ProcessError::FormDataFormat { .. },
            )
            | Self::Repository(RepositoryError::InvalidPaginationToken(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Process(
                ProcessError::EntityNotFound { .. } | ProcessError::UnknownProcess(_),
            )
            | Self::Repository(RepositoryError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Repository(RepositoryError::VersionConflict { .. }) => StatusCode::CONFLICT,
            Self::Process(ProcessError::Gateway(_)) => StatusCode::BAD_GATEWAY,
            Self::Process(ProcessError::UnknownGate(_) | ProcessError::TransitionLoop { .. })
            | Self::Repository(RepositoryError::Unavailable(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stored version reported by a conflict, so callers can refetch and retry.
    pub fn current_version(&self) -> Option<u32> {
        match self {
            Self::Repository(RepositoryError::VersionConflict { current, .. }) => *current,
            _ => None,
        }
    }
}
