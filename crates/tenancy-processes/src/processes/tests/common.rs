use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::processes::definition::{EdgeTarget, EntryAction, WorkflowDefinition};
use crate::processes::domain::{FormData, Process, ProcessId, ProcessName, TargetType};
use crate::processes::events::{EventError, ProcessEvent, ProcessEventPublisher};
use crate::processes::gateway::{
    GatewayError, HouseholdMember, PersonGateway, PersonRecord, PersonTenure, TenureGateway,
    TenureInformation, TenureType,
};
use crate::processes::machine::{GateContext, GateEvaluator, ProcessError};
use crate::processes::rules::{BusinessRule, EligibilityReport, RuleSet};
use crate::processes::store::InMemoryProcessStore;
use crate::processes::workflows::sole_to_joint::keys;
use crate::processes::{process_router, ProcessService, WorkflowRegistry};

pub(super) type TestService =
    ProcessService<InMemoryProcessStore, MemoryTenures, MemoryPersons, MemoryEvents>;

pub(super) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0)
        .single()
        .expect("valid instant")
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn form(value: Value) -> FormData {
    match value {
        Value::Object(map) => map,
        other => panic!("form data must be an object, got {other}"),
    }
}

/// A secure sole tenancy with one adult household member eligible to join it.
#[derive(Debug, Clone, Copy)]
pub(super) struct Household {
    pub(super) tenure_id: Uuid,
    pub(super) tenant_id: Uuid,
    pub(super) incoming_id: Uuid,
}

impl Household {
    pub(super) fn new() -> Self {
        Self {
            tenure_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            incoming_id: Uuid::new_v4(),
        }
    }

    pub(super) fn tenure(&self) -> TenureInformation {
        TenureInformation {
            id: self.tenure_id,
            tenure_type: TenureType::secure(),
            start_of_tenure_date: Some(date(2015, 4, 1)),
            end_of_tenure_date: None,
            household_members: vec![
                HouseholdMember {
                    id: self.tenant_id,
                    full_name: "Maya Okafor".to_string(),
                    is_responsible: true,
                },
                HouseholdMember {
                    id: self.incoming_id,
                    full_name: "Theo Okafor".to_string(),
                    is_responsible: false,
                },
            ],
        }
    }

    pub(super) fn tenant(&self) -> PersonRecord {
        PersonRecord {
            id: self.tenant_id,
            first_name: "Maya".to_string(),
            surname: "Okafor".to_string(),
            date_of_birth: Some(date(1971, 8, 9)),
            tenures: vec![PersonTenure {
                id: self.tenure_id,
                tenure_type_code: TenureType::SECURE_CODE.to_string(),
                end_date: None,
                is_responsible: true,
            }],
        }
    }

    pub(super) fn incoming(&self) -> PersonRecord {
        PersonRecord {
            id: self.incoming_id,
            first_name: "Theo".to_string(),
            surname: "Okafor".to_string(),
            date_of_birth: Some(date(1990, 3, 15)),
            tenures: Vec::new(),
        }
    }

    pub(super) fn eligibility_form(&self) -> FormData {
        form(json!({
            keys::TENANT_ID: self.tenant_id.to_string(),
            keys::INCOMING_TENANT_ID: self.incoming_id.to_string(),
        }))
    }

    pub(super) fn gateways(&self) -> (Arc<MemoryTenures>, Arc<MemoryPersons>) {
        let tenures = Arc::new(MemoryTenures::default());
        tenures.insert(self.tenure());
        let persons = Arc::new(MemoryPersons::default());
        persons.insert(self.tenant());
        persons.insert(self.incoming());
        (tenures, persons)
    }
}

#[derive(Default)]
pub(super) struct MemoryTenures {
    records: Mutex<HashMap<Uuid, TenureInformation>>,
}

impl MemoryTenures {
    pub(super) fn insert(&self, tenure: TenureInformation) {
        self.records
            .lock()
            .expect("tenure mutex poisoned")
            .insert(tenure.id, tenure);
    }

    pub(super) fn update(&self, id: &Uuid, change: impl FnOnce(&mut TenureInformation)) {
        let mut guard = self.records.lock().expect("tenure mutex poisoned");
        change(guard.get_mut(id).expect("tenure seeded"));
    }
}

impl TenureGateway for MemoryTenures {
    fn tenure_by_id(&self, id: &Uuid) -> Result<Option<TenureInformation>, GatewayError> {
        Ok(self
            .records
            .lock()
            .expect("tenure mutex poisoned")
            .get(id)
            .cloned())
    }
}

#[derive(Default)]
pub(super) struct MemoryPersons {
    records: Mutex<HashMap<Uuid, PersonRecord>>,
}

impl MemoryPersons {
    pub(super) fn insert(&self, person: PersonRecord) {
        self.records
            .lock()
            .expect("person mutex poisoned")
            .insert(person.id, person);
    }
}

impl PersonGateway for MemoryPersons {
    fn person_by_id(&self, id: &Uuid) -> Result<Option<PersonRecord>, GatewayError> {
        Ok(self
            .records
            .lock()
            .expect("person mutex poisoned")
            .get(id)
            .cloned())
    }
}

pub(super) struct OfflineTenures;

impl TenureGateway for OfflineTenures {
    fn tenure_by_id(&self, _id: &Uuid) -> Result<Option<TenureInformation>, GatewayError> {
        Err(GatewayError::Unavailable {
            system: "tenure",
            detail: "connection refused".to_string(),
        })
    }
}

#[derive(Default)]
pub(super) struct MemoryEvents {
    events: Mutex<Vec<ProcessEvent>>,
    offline: bool,
}

impl MemoryEvents {
    pub(super) fn offline() -> Self {
        Self {
            events: Mutex::default(),
            offline: true,
        }
    }

    pub(super) fn events(&self) -> Vec<ProcessEvent> {
        self.events.lock().expect("event mutex poisoned").clone()
    }
}

impl ProcessEventPublisher for MemoryEvents {
    fn publish(&self, event: ProcessEvent) -> Result<(), EventError> {
        if self.offline {
            return Err(EventError::Transport("broker offline".to_string()));
        }
        self.events.lock().expect("event mutex poisoned").push(event);
        Ok(())
    }
}

pub(super) struct Fixture {
    pub(super) service: TestService,
    pub(super) store: Arc<InMemoryProcessStore>,
    pub(super) tenures: Arc<MemoryTenures>,
    pub(super) events: Arc<MemoryEvents>,
    pub(super) household: Household,
}

pub(super) fn fixture() -> Fixture {
    fixture_with_events(MemoryEvents::default())
}

pub(super) fn fixture_with_events(events: MemoryEvents) -> Fixture {
    let household = Household::new();
    let (tenures, persons) = household.gateways();
    let store = Arc::new(InMemoryProcessStore::new());
    let events = Arc::new(events);
    let service = ProcessService::new(
        Arc::new(WorkflowRegistry::standard()),
        store.clone(),
        tenures.clone(),
        persons,
        events.clone(),
    )
    .with_clock(fixed_now);
    Fixture {
        service,
        store,
        tenures,
        events,
        household,
    }
}

pub(super) fn router(service: TestService) -> axum::Router {
    process_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn unstarted(name: ProcessName, target_type: TargetType) -> Process {
    Process::unstarted(
        ProcessId::generate(),
        name,
        Uuid::new_v4(),
        target_type,
        Vec::new(),
    )
}

/// Gate stub that returns the same verdict for every gate name.
pub(super) struct FixedGate(pub(super) bool);

impl GateEvaluator for FixedGate {
    fn evaluate(
        &self,
        _gate: &str,
        _context: &GateContext<'_>,
    ) -> Result<EligibilityReport, ProcessError> {
        let rules: RuleSet<bool> = RuleSet::new(vec![BusinessRule::new(
            "stubbed",
            "verdict fixed by the test",
            |verdict: &bool| *verdict,
        )]);
        Ok(rules.evaluate(&self.0))
    }
}

/// Gate stub whose lookup always reports the tenure as missing.
pub(super) struct MissingTenureGate;

impl GateEvaluator for MissingTenureGate {
    fn evaluate(
        &self,
        _gate: &str,
        context: &GateContext<'_>,
    ) -> Result<EligibilityReport, ProcessError> {
        Err(ProcessError::not_found(
            crate::processes::EntityKind::Tenure,
            context.process.target_id(),
        ))
    }
}

/// Workflow whose `Review` state immediately fires `AutoApprove` on entry.
pub(super) fn chained_definition() -> WorkflowDefinition {
    WorkflowDefinition::builder(ProcessName::ChangeOfName, TargetType::Person, "Initial", "Start")
        .states(["Draft", "Review", "Approved", "Archived"])
        .triggers(["Start", "Submit", "AutoApprove", "Archive"])
        .edge("Initial", "Start", EdgeTarget::fixed("Draft"))
        .edge("Draft", "Submit", EdgeTarget::fixed("Review"))
        .on_entry("Review", EntryAction::Fire("AutoApprove"))
        .edge("Review", "AutoApprove", EdgeTarget::fixed("Approved"))
        .edge("Approved", "Archive", EdgeTarget::fixed("Archived"))
        .build()
}

/// Workflow whose entry actions bounce between two states forever.
pub(super) fn looping_definition() -> WorkflowDefinition {
    WorkflowDefinition::builder(ProcessName::ChangeOfName, TargetType::Person, "Initial", "Start")
        .states(["Ping", "Pong"])
        .triggers(["Start", "Bounce"])
        .edge("Initial", "Start", EdgeTarget::fixed("Ping"))
        .edge("Ping", "Bounce", EdgeTarget::fixed("Pong"))
        .edge("Pong", "Bounce", EdgeTarget::fixed("Ping"))
        .on_entry("Pong", EntryAction::Fire("Bounce"))
        .on_entry("Ping", EntryAction::Fire("Bounce"))
        .build()
}
