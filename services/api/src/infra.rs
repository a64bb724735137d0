use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, RwLock};
use tenancy_processes::config::PaginationConfig;
use tenancy_processes::error::AppError;
use tenancy_processes::processes::{
    EventError, GatewayError, HouseholdMember, InMemoryProcessStore, PersonGateway, PersonRecord,
    ProcessEvent, ProcessEventPublisher, ProcessService, TenureGateway, TenureInformation,
    TenureType, WorkflowRegistry,
};
use tracing::info;
use uuid::Uuid;

pub(crate) type ApiService =
    ProcessService<InMemoryProcessStore, InMemoryTenures, InMemoryPersons, TracingEventPublisher>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
pub(crate) struct InMemoryTenures {
    records: RwLock<HashMap<Uuid, TenureInformation>>,
}

impl InMemoryTenures {
    fn seeded(tenures: Vec<TenureInformation>) -> Self {
        Self {
            records: RwLock::new(tenures.into_iter().map(|t| (t.id, t)).collect()),
        }
    }
}

impl TenureGateway for InMemoryTenures {
    fn tenure_by_id(&self, id: &Uuid) -> Result<Option<TenureInformation>, GatewayError> {
        let guard = self.records.read().map_err(|_| GatewayError::Unavailable {
            system: "tenure",
            detail: "fixture lock poisoned".to_string(),
        })?;
        Ok(guard.get(id).cloned())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryPersons {
    records: RwLock<HashMap<Uuid, PersonRecord>>,
}

impl InMemoryPersons {
    fn seeded(persons: Vec<PersonRecord>) -> Self {
        Self {
            records: RwLock::new(persons.into_iter().map(|p| (p.id, p)).collect()),
        }
    }
}

impl PersonGateway for InMemoryPersons {
    fn person_by_id(&self, id: &Uuid) -> Result<Option<PersonRecord>, GatewayError> {
        let guard = self.records.read().map_err(|_| GatewayError::Unavailable {
            system: "person",
            detail: "fixture lock poisoned".to_string(),
        })?;
        Ok(guard.get(id).cloned())
    }
}

/// Writes each domain event to the log; stands in for a message bus.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct TracingEventPublisher;

impl ProcessEventPublisher for TracingEventPublisher {
    fn publish(&self, event: ProcessEvent) -> Result<(), EventError> {
        info!(
            event = event.event_type.label(),
            process_id = %event.process_id,
            process_name = %event.process_name,
            version = ?event.version_number,
            old_state = event.old_state.as_ref().map(|state| state.name.as_str()),
            new_state = %event.new_state.name,
            actor = %event.actor.email,
            "process event"
        );
        Ok(())
    }
}

/// Seed data for the in-memory tenure and person collaborators.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Fixtures {
    #[serde(default)]
    pub(crate) tenures: Vec<TenureInformation>,
    #[serde(default)]
    pub(crate) persons: Vec<PersonRecord>,
}

/// Household identifiers used by the built-in fixtures.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DemoHousehold {
    pub(crate) tenure_id: Uuid,
    pub(crate) tenant_id: Uuid,
    pub(crate) incoming_id: Uuid,
}

impl DemoHousehold {
    pub(crate) const fn standard() -> Self {
        Self {
            tenure_id: Uuid::from_u128(0x6f3b_1c2a_8d4e_4f10_9a01_0000_0000_0001),
            tenant_id: Uuid::from_u128(0x6f3b_1c2a_8d4e_4f10_9a01_0000_0000_0002),
            incoming_id: Uuid::from_u128(0x6f3b_1c2a_8d4e_4f10_9a01_0000_0000_0003),
        }
    }
}

impl Fixtures {
    pub(crate) fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|source| AppError::Fixtures {
            path: path.to_path_buf(),
            source,
        })
    }

    /// A secure sole tenancy with an adult household member; `incoming_born` lets the demo
    /// switch the incoming tenant to a minor.
    pub(crate) fn demo(incoming_born: NaiveDate) -> Self {
        let household = DemoHousehold::standard();
        let tenure = TenureInformation {
            id: household.tenure_id,
            tenure_type: TenureType::secure(),
            start_of_tenure_date: NaiveDate::from_ymd_opt(2011, 6, 13),
            end_of_tenure_date: None,
            household_members: vec![
                HouseholdMember {
                    id: household.tenant_id,
                    full_name: "Joan Adeyemi".to_string(),
                    is_responsible: true,
                },
                HouseholdMember {
                    id: household.incoming_id,
                    full_name: "Tunde Adeyemi".to_string(),
                    is_responsible: false,
                },
            ],
        };
        let persons = vec![
            PersonRecord {
                id: household.tenant_id,
                first_name: "Joan".to_string(),
                surname: "Adeyemi".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1966, 2, 27),
                tenures: Vec::new(),
            },
            PersonRecord {
                id: household.incoming_id,
                first_name: "Tunde".to_string(),
                surname: "Adeyemi".to_string(),
                date_of_birth: Some(incoming_born),
                tenures: Vec::new(),
            },
        ];
        Self {
            tenures: vec![tenure],
            persons,
        }
    }

    pub(crate) fn adult_incoming_tenant() -> NaiveDate {
        NaiveDate::from_ymd_opt(1993, 9, 4).unwrap_or_default()
    }
}

pub(crate) fn build_service(
    registry: WorkflowRegistry,
    fixtures: Fixtures,
    pagination: PaginationConfig,
) -> ApiService {
    ProcessService::new(
        Arc::new(registry),
        Arc::new(InMemoryProcessStore::new()),
        Arc::new(InMemoryTenures::seeded(fixtures.tenures)),
        Arc::new(InMemoryPersons::seeded(fixtures.persons)),
        Arc::new(TracingEventPublisher),
    )
    .with_pagination(pagination)
}
