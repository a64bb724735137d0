//! Process workflow engine: definitions, driver, business rules, store, and the use-case
//! service that ties them together.

pub mod definition;
pub mod domain;
pub mod eligibility;
pub mod events;
pub(crate) mod form;
pub mod gateway;
pub mod machine;
pub mod registry;
pub mod router;
pub mod rules;
pub mod service;
pub mod store;
pub mod workflows;

#[cfg(test)]
mod tests;

pub use definition::{
    DefinitionError, Edge, EdgeTarget, EntryAction, FormRequirement, FormValueKind,
    WorkflowBuilder, WorkflowDefinition,
};
pub use domain::{
    Assignment, AssignmentKind, EntityKind, FormData, Process, ProcessData, ProcessId,
    ProcessName, ProcessState, RelatedEntity, TargetType,
};
pub use eligibility::EligibilityGates;
pub use events::{Actor, EventError, ProcessEvent, ProcessEventPublisher, ProcessEventType};
pub use gateway::{
    GatewayError, HouseholdMember, PersonGateway, PersonRecord, PersonTenure, TenureGateway,
    TenureInformation, TenureType,
};
pub use machine::{
    apply_trigger, AppliedTransition, GateContext, GateEvaluator, GateVerdict, ProcessError,
    TriggerRequest,
};
pub use registry::WorkflowRegistry;
pub use router::process_router;
pub use rules::{BusinessRule, EligibilityReport, RuleOutcome, RuleSet};
pub use service::{
    CreateProcessRequest, ProcessService, ProcessServiceError, UpdateProcessRequest,
};
pub use store::{InMemoryProcessStore, Page, PageRequest, ProcessRepository, RepositoryError};
