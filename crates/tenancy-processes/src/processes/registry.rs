use std::collections::BTreeMap;

use super::definition::{DefinitionError, WorkflowDefinition};
use super::domain::ProcessName;
use super::machine::ProcessError;
use super::workflows::{change_of_name, sole_to_joint};

/// Static lookup from process name to its workflow definition, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct WorkflowRegistry {
    definitions: BTreeMap<ProcessName, WorkflowDefinition>,
}

impl WorkflowRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding every workflow shipped with the crate.
    pub fn standard() -> Self {
        Self::empty()
            .with(sole_to_joint::definition())
            .with(change_of_name::definition())
    }

    /// Adds or replaces the definition for its process name.
    pub fn register(&mut self, definition: WorkflowDefinition) {
        self.definitions.insert(definition.name(), definition);
    }

    pub fn with(mut self, definition: WorkflowDefinition) -> Self {
        self.register(definition);
        self
    }

    pub fn get(&self, name: ProcessName) -> Result<&WorkflowDefinition, ProcessError> {
        self.definitions
            .get(&name)
            .ok_or(ProcessError::UnknownProcess(name))
    }

    pub fn definitions(&self) -> impl Iterator<Item = &WorkflowDefinition> {
        self.definitions.values()
    }

    pub fn validate(&self) -> Result<(), DefinitionError> {
        self.definitions().try_for_each(WorkflowDefinition::validate)
    }
}
