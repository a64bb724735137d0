use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Free-form payload submitted alongside a trigger.
pub type FormData = Map<String, Value>;

/// Identifier wrapper for persisted processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub Uuid);

impl ProcessId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Workflow type; fixes which state/trigger vocabulary and rule set apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessName {
    SoleToJoint,
    ChangeOfName,
}

impl ProcessName {
    pub const fn ordered() -> [Self; 2] {
        [Self::SoleToJoint, Self::ChangeOfName]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SoleToJoint => "soletojoint",
            Self::ChangeOfName => "changeofname",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::SoleToJoint => "Sole to Joint",
            Self::ChangeOfName => "Change of Name",
        }
    }
}

impl fmt::Display for ProcessName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessName {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|name| name.as_str() == normalized)
            .ok_or_else(|| format!("unknown process name '{raw}'"))
    }
}

/// Kind of entity a process (or a related entity) refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Tenure,
    Person,
    Asset,
}

impl TargetType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Tenure => "tenure",
            Self::Person => "person",
            Self::Asset => "asset",
        }
    }
}

/// Entities that may be reported as missing by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Process,
    Tenure,
    Person,
    Asset,
}

impl From<TargetType> for EntityKind {
    fn from(value: TargetType) -> Self {
        match value {
            TargetType::Tenure => Self::Tenure,
            TargetType::Person => Self::Person,
            TargetType::Asset => Self::Asset,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Process => "process",
            Self::Tenure => "tenure",
            Self::Person => "person",
            Self::Asset => "asset",
        };
        f.write_str(label)
    }
}

/// Reference to an entity accumulated while the process runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedEntity {
    pub id: Uuid,
    pub target_type: TargetType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentKind {
    Team,
    Unassigned,
}

/// Who or what the process is currently routed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    #[serde(rename = "type")]
    pub kind: AssignmentKind,
    pub value: String,
}

impl Assignment {
    pub fn team(value: &str) -> Self {
        Self {
            kind: AssignmentKind::Team,
            value: value.to_string(),
        }
    }

    pub fn unassigned() -> Self {
        Self {
            kind: AssignmentKind::Unassigned,
            value: String::new(),
        }
    }
}

/// Form data and attached documents captured when a state was entered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessData {
    #[serde(default)]
    pub form_data: FormData,
    #[serde(default)]
    pub documents: Vec<Uuid>,
}

/// Immutable snapshot of a process at one point of its lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessState {
    #[serde(rename = "state")]
    pub name: String,
    pub permitted_triggers: Vec<String>,
    pub assignment: Assignment,
    pub process_data: ProcessData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProcessState {
    pub fn new(
        name: &str,
        permitted_triggers: Vec<String>,
        assignment: Assignment,
        process_data: ProcessData,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.to_string(),
            permitted_triggers,
            assignment,
            process_data,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Aggregate root tracked by the engine.
///
/// Only the engine mutates `current_state`, `previous_states`, and `related_entities`; the
/// store alone assigns `version_number`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    id: ProcessId,
    process_name: ProcessName,
    target_id: Uuid,
    target_type: TargetType,
    #[serde(default)]
    related_entities: Vec<RelatedEntity>,
    current_state: Option<ProcessState>,
    #[serde(default)]
    previous_states: Vec<ProcessState>,
    version_number: Option<u32>,
}

impl Process {
    /// A process that has not yet received its first trigger.
    pub fn unstarted(
        id: ProcessId,
        process_name: ProcessName,
        target_id: Uuid,
        target_type: TargetType,
        related_entities: Vec<RelatedEntity>,
    ) -> Self {
        let mut process = Self {
            id,
            process_name,
            target_id,
            target_type,
            related_entities: Vec::new(),
            current_state: None,
            previous_states: Vec::new(),
            version_number: None,
        };
        for entity in related_entities {
            process.add_related_entity(entity);
        }
        process
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    pub fn process_name(&self) -> ProcessName {
        self.process_name
    }

    pub fn target_id(&self) -> Uuid {
        self.target_id
    }

    pub fn target_type(&self) -> TargetType {
        self.target_type
    }

    pub fn related_entities(&self) -> &[RelatedEntity] {
        &self.related_entities
    }

    pub fn current_state(&self) -> Option<&ProcessState> {
        self.current_state.as_ref()
    }

    pub fn current_state_name(&self) -> Option<&str> {
        self.current_state.as_ref().map(|state| state.name.as_str())
    }

    pub fn previous_states(&self) -> &[ProcessState] {
        &self.previous_states
    }

    pub fn version_number(&self) -> Option<u32> {
        self.version_number
    }

    /// Makes `state` current, moving the prior current state to the end of the history.
    pub(crate) fn enter(&mut self, state: ProcessState) {
        if let Some(previous) = self.current_state.replace(state) {
            self.previous_states.push(previous);
        }
    }

    /// Adds an entity unless one with the same id is already recorded.
    pub(crate) fn add_related_entity(&mut self, entity: RelatedEntity) -> bool {
        if self
            .related_entities
            .iter()
            .any(|existing| existing.id == entity.id)
        {
            return false;
        }
        self.related_entities.push(entity);
        true
    }

    pub(crate) fn with_version(mut self, version: u32) -> Self {
        self.version_number = Some(version);
        self
    }
}

pub(crate) fn describe_value(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
