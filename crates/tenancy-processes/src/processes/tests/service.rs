use super::common::*;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::PaginationConfig;
use crate::processes::events::{Actor, ProcessEventType};
use crate::processes::machine::ProcessError;
use crate::processes::store::{InMemoryProcessStore, ProcessRepository, RepositoryError};
use crate::processes::workflows::shared;
use crate::processes::workflows::sole_to_joint::keys;
use crate::processes::{
    CreateProcessRequest, EntityKind, Page, PageRequest, Process, ProcessId, ProcessName,
    ProcessService, ProcessServiceError, TargetType, UpdateProcessRequest, WorkflowRegistry,
};

fn officer() -> Actor {
    Actor::new("Priya Shah", "priya.shah@example.org")
}

fn start(fixture: &Fixture) -> Process {
    fixture
        .service
        .create(
            ProcessName::SoleToJoint,
            CreateProcessRequest {
                target_id: fixture.household.tenure_id,
                ..CreateProcessRequest::default()
            },
            &officer(),
        )
        .expect("process starts")
}

fn check_eligibility(
    fixture: &Fixture,
    id: ProcessId,
) -> Result<Process, ProcessServiceError> {
    fixture.service.trigger(
        ProcessName::SoleToJoint,
        id,
        "CheckEligibility",
        UpdateProcessRequest {
            form_data: fixture.household.eligibility_form(),
            documents: Vec::new(),
        },
        None,
        &officer(),
    )
}

#[test]
fn create_starts_in_select_tenants_with_a_fresh_version() {
    let fixture = fixture();
    let process = start(&fixture);

    assert_eq!(process.current_state_name(), Some("SelectTenants"));
    assert!(process.previous_states().is_empty());
    assert_eq!(process.version_number(), Some(0));
    assert_eq!(process.target_type(), TargetType::Tenure);

    let stored = fixture
        .store
        .load(&process.id())
        .expect("load")
        .expect("persisted");
    assert_eq!(stored, process);

    let events = fixture.events.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, ProcessEventType::ProcessStarted);
    assert!(events[0].old_state.is_none());
    assert_eq!(events[0].new_state.name, "SelectTenants");
    assert_eq!(events[0].actor, officer());
}

#[test]
fn create_against_a_missing_tenure_writes_nothing() {
    let fixture = fixture();
    let missing = Uuid::new_v4();

    let result = fixture.service.create(
        ProcessName::SoleToJoint,
        CreateProcessRequest {
            target_id: missing,
            ..CreateProcessRequest::default()
        },
        &officer(),
    );

    match result {
        Err(ProcessServiceError::Process(ProcessError::EntityNotFound { kind, id })) => {
            assert_eq!(kind, EntityKind::Tenure);
            assert_eq!(id, missing.to_string());
        }
        other => panic!("expected missing tenure, got {other:?}"),
    }
    assert!(fixture.store.is_empty().expect("store readable"));
    assert!(fixture.events.events().is_empty());
}

#[test]
fn eligible_household_passes_automated_checks() {
    let fixture = fixture();
    let process = start(&fixture);

    let updated = check_eligibility(&fixture, process.id()).expect("checks run");

    assert_eq!(updated.current_state_name(), Some("AutomatedChecksPassed"));
    assert_eq!(updated.version_number(), Some(1));
    assert_eq!(updated.previous_states().len(), 1);

    let events = fixture.events.events();
    assert_eq!(events[1].event_type, ProcessEventType::ProcessUpdated);
    assert_eq!(
        events[1].old_state.as_ref().map(|state| state.name.as_str()),
        Some("SelectTenants")
    );
}

#[test]
fn single_failing_rule_routes_to_automated_checks_failed() {
    let fixture = fixture();
    let process = start(&fixture);
    fixture.tenures.update(&fixture.household.tenure_id, |tenure| {
        tenure.end_of_tenure_date = Some(date(2025, 1, 31));
    });

    let updated = check_eligibility(&fixture, process.id()).expect("checks run");

    assert_eq!(updated.current_state_name(), Some("AutomatedChecksFailed"));
    assert!(updated
        .related_entities()
        .iter()
        .any(|entity| entity.id == fixture.household.incoming_id));
}

#[test]
fn missing_incoming_person_is_not_found_and_not_persisted() {
    let fixture = fixture();
    let process = start(&fixture);
    let stranger = Uuid::new_v4();

    let result = fixture.service.trigger(
        ProcessName::SoleToJoint,
        process.id(),
        "CheckEligibility",
        UpdateProcessRequest {
            form_data: form(json!({
                keys::TENANT_ID: fixture.household.tenant_id.to_string(),
                keys::INCOMING_TENANT_ID: stranger.to_string(),
            })),
            documents: Vec::new(),
        },
        None,
        &officer(),
    );

    assert!(matches!(
        result,
        Err(ProcessServiceError::Process(ProcessError::EntityNotFound {
            kind: EntityKind::Person,
            ..
        }))
    ));
    assert_eq!(
        fixture.store.load(&process.id()).expect("load"),
        Some(process)
    );
}

#[test]
fn unknown_current_tenant_is_not_found_and_not_persisted() {
    let fixture = fixture();
    let process = start(&fixture);
    let published = fixture.events.events().len();
    let stranger = Uuid::new_v4();

    let result = fixture.service.trigger(
        ProcessName::SoleToJoint,
        process.id(),
        "CheckEligibility",
        UpdateProcessRequest {
            form_data: form(json!({
                keys::TENANT_ID: stranger.to_string(),
                keys::INCOMING_TENANT_ID: fixture.household.incoming_id.to_string(),
            })),
            documents: Vec::new(),
        },
        None,
        &officer(),
    );

    match result {
        Err(ProcessServiceError::Process(ProcessError::EntityNotFound { kind, id })) => {
            assert_eq!(kind, EntityKind::Person);
            assert_eq!(id, stranger.to_string());
        }
        other => panic!("expected a missing person, got {other:?}"),
    }
    assert_eq!(
        fixture.store.load(&process.id()).expect("load"),
        Some(process)
    );
    assert_eq!(fixture.events.events().len(), published);
}

#[test]
fn trigger_on_a_vanished_tenure_fails_before_writing() {
    let fixture = fixture();
    let process = start(&fixture);
    let registry = Arc::new(WorkflowRegistry::standard());
    let (_, persons) = fixture.household.gateways();
    let service = ProcessService::new(
        registry,
        fixture.store.clone(),
        Arc::new(MemoryTenures::default()),
        persons,
        fixture.events.clone(),
    );

    let result = service.trigger(
        ProcessName::SoleToJoint,
        process.id(),
        "CheckEligibility",
        UpdateProcessRequest {
            form_data: fixture.household.eligibility_form(),
            documents: Vec::new(),
        },
        None,
        &officer(),
    );

    assert!(matches!(
        result,
        Err(ProcessServiceError::Process(ProcessError::EntityNotFound {
            kind: EntityKind::Tenure,
            ..
        }))
    ));
    assert_eq!(
        fixture.store.load(&process.id()).expect("load"),
        Some(process)
    );
}

#[test]
fn gateway_outages_propagate_unchanged() {
    let household = Household::new();
    let (_, persons) = household.gateways();
    let service = ProcessService::new(
        Arc::new(WorkflowRegistry::standard()),
        Arc::new(InMemoryProcessStore::new()),
        Arc::new(OfflineTenures),
        persons,
        Arc::new(MemoryEvents::default()),
    );

    let error = service
        .create(
            ProcessName::SoleToJoint,
            CreateProcessRequest {
                target_id: household.tenure_id,
                ..CreateProcessRequest::default()
            },
            &officer(),
        )
        .expect_err("tenure system offline");

    assert_eq!(error.kind(), "GatewayUnavailable");
    assert_eq!(error.status_code(), axum::http::StatusCode::BAD_GATEWAY);
}

#[test]
fn illegal_trigger_leaves_the_stored_process_alone() {
    let fixture = fixture();
    let process = start(&fixture);

    for _ in 0..2 {
        let result = fixture.service.trigger(
            ProcessName::SoleToJoint,
            process.id(),
            "UpdateTenure",
            UpdateProcessRequest::default(),
            None,
            &officer(),
        );
        assert!(matches!(
            result,
            Err(ProcessServiceError::Process(ProcessError::InvalidTrigger { .. }))
        ));
    }

    assert_eq!(
        fixture.store.load(&process.id()).expect("load"),
        Some(process)
    );
    assert_eq!(fixture.events.events().len(), 1);
}

#[test]
fn stale_if_match_is_a_conflict_before_any_work() {
    let fixture = fixture();
    let process = start(&fixture);
    check_eligibility(&fixture, process.id()).expect("advances to version 1");

    let result = fixture.service.trigger(
        ProcessName::SoleToJoint,
        process.id(),
        "CancelProcess",
        UpdateProcessRequest {
            form_data: form(json!({ shared::keys::COMMENT: "duplicate request" })),
            documents: Vec::new(),
        },
        Some(0),
        &officer(),
    );

    let error = result.expect_err("version 0 is stale");
    assert_eq!(error.kind(), "VersionConflict");
    assert_eq!(error.current_version(), Some(1));
    let stored = fixture
        .store
        .load(&process.id())
        .expect("load")
        .expect("present");
    assert_eq!(stored.current_state_name(), Some("AutomatedChecksPassed"));
}

#[test]
fn matching_if_match_is_accepted() {
    let fixture = fixture();
    let process = start(&fixture);

    let updated = fixture
        .service
        .trigger(
            ProcessName::SoleToJoint,
            process.id(),
            "CancelProcess",
            UpdateProcessRequest {
                form_data: form(json!({ shared::keys::COMMENT: "tenant moved out" })),
                documents: Vec::new(),
            },
            Some(0),
            &officer(),
        )
        .expect("version matches");

    assert_eq!(updated.current_state_name(), Some("ProcessCancelled"));
    assert_eq!(updated.version_number(), Some(1));
}

#[test]
fn closing_emits_a_closed_event() {
    let fixture = fixture();
    let process = start(&fixture);
    let cancel = UpdateProcessRequest {
        form_data: form(json!({ shared::keys::COMMENT: "withdrawn" })),
        documents: Vec::new(),
    };
    let close = UpdateProcessRequest {
        form_data: form(json!({ shared::keys::HAS_NOTIFIED_RESIDENT: true })),
        documents: Vec::new(),
    };

    let actor = officer();
    fixture
        .service
        .trigger(ProcessName::SoleToJoint, process.id(), "CancelProcess", cancel, None, &actor)
        .expect("cancelled");
    let closed = fixture
        .service
        .trigger(ProcessName::SoleToJoint, process.id(), "CloseProcess", close, None, &actor)
        .expect("closed");

    assert_eq!(closed.current_state_name(), Some("ProcessClosed"));
    assert!(closed
        .current_state()
        .is_some_and(|state| state.permitted_triggers.is_empty()));
    let kinds: Vec<ProcessEventType> = fixture
        .events
        .events()
        .iter()
        .map(|event| event.event_type)
        .collect();
    assert_eq!(
        kinds,
        vec![
            ProcessEventType::ProcessStarted,
            ProcessEventType::ProcessUpdated,
            ProcessEventType::ProcessClosed,
        ]
    );
}

#[test]
fn event_failures_do_not_undo_a_committed_transition() {
    let fixture = fixture_with_events(MemoryEvents::offline());

    let process = start(&fixture);

    assert_eq!(process.version_number(), Some(0));
    assert_eq!(fixture.store.len().expect("store readable"), 1);
}

#[test]
fn process_name_must_match_the_stored_process() {
    let fixture = fixture();
    let process = start(&fixture);

    let result = fixture.service.get(ProcessName::ChangeOfName, process.id());

    assert!(matches!(
        result,
        Err(ProcessServiceError::Process(ProcessError::EntityNotFound {
            kind: EntityKind::Process,
            ..
        }))
    ));
    assert_eq!(
        fixture
            .service
            .get(ProcessName::SoleToJoint, process.id())
            .expect("found under its own name"),
        process
    );
}

#[test]
fn unregistered_workflows_are_unknown() {
    let household = Household::new();
    let (tenures, persons) = household.gateways();
    let service = ProcessService::new(
        Arc::new(WorkflowRegistry::empty()),
        Arc::new(InMemoryProcessStore::new()),
        tenures,
        persons,
        Arc::new(MemoryEvents::default()),
    );

    let error = service
        .create(
            ProcessName::SoleToJoint,
            CreateProcessRequest {
                target_id: household.tenure_id,
                ..CreateProcessRequest::default()
            },
            &officer(),
        )
        .expect_err("nothing registered");

    assert_eq!(error.kind(), "UnknownProcess");
}

#[test]
fn by_target_clamps_page_sizes() {
    let fixture = fixture();
    for _ in 0..4 {
        start(&fixture);
    }
    let service = fixture.service.with_pagination(PaginationConfig {
        default_page_size: 2,
        max_page_size: 3,
    });

    let defaulted = service
        .by_target(fixture.household.tenure_id, None, None)
        .expect("page");
    let capped = service
        .by_target(fixture.household.tenure_id, Some(50), None)
        .expect("page");

    assert_eq!(defaulted.results.len(), 2);
    assert_eq!(capped.results.len(), 3);
    assert!(capped.pagination_token.is_some());
}

#[test]
fn version_conflicts_from_the_store_surface_as_conflicts() {
    struct RacingStore {
        inner: InMemoryProcessStore,
    }

    impl ProcessRepository for RacingStore {
        fn load(&self, id: &ProcessId) -> Result<Option<Process>, RepositoryError> {
            self.inner.load(id)
        }

        fn save(
            &self,
            process: Process,
            expected: Option<u32>,
        ) -> Result<Process, RepositoryError> {
            if expected.is_some() {
                // Another writer lands first.
                let current = self.inner.load(&process.id())?.expect("seeded");
                self.inner.save(current, expected)?;
            }
            self.inner.save(process, expected)
        }

        fn find_by_target(
            &self,
            target_id: &Uuid,
            page: &PageRequest,
        ) -> Result<Page<Process>, RepositoryError> {
            self.inner.find_by_target(target_id, page)
        }
    }

    let household = Household::new();
    let (tenures, persons) = household.gateways();
    let store = Arc::new(RacingStore {
        inner: InMemoryProcessStore::new(),
    });
    let service = ProcessService::new(
        Arc::new(WorkflowRegistry::standard()),
        store.clone(),
        tenures,
        persons,
        Arc::new(MemoryEvents::default()),
    );
    let process = service
        .create(
            ProcessName::SoleToJoint,
            CreateProcessRequest {
                target_id: household.tenure_id,
                ..CreateProcessRequest::default()
            },
            &officer(),
        )
        .expect("created");

    let error = service
        .trigger(
            ProcessName::SoleToJoint,
            process.id(),
            "CheckEligibility",
            UpdateProcessRequest {
                form_data: household.eligibility_form(),
                documents: Vec::new(),
            },
            None,
            &officer(),
        )
        .expect_err("lost the race");

    assert!(matches!(
        error,
        ProcessServiceError::Repository(RepositoryError::VersionConflict {
            expected: Some(0),
            current: Some(1),
            ..
        })
    ));
    let stored = store.inner.load(&process.id()).expect("load").expect("present");
    assert_eq!(stored.current_state_name(), Some("SelectTenants"));
}
