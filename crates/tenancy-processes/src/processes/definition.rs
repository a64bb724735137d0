use std::collections::{HashMap, HashSet};
use std::fmt::{self, Write as _};

use super::domain::{Assignment, ProcessName, TargetType};

/// Shape a required form value must have before a transition is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormValueKind {
    Text,
    Boolean,
    Uuid,
    DateTime,
}

impl FormValueKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "a non-empty string",
            Self::Boolean => "a boolean",
            Self::Uuid => "a uuid string",
            Self::DateTime => "an RFC 3339 date-time string",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormRequirement {
    pub key: &'static str,
    pub kind: FormValueKind,
}

impl FormRequirement {
    pub const fn text(key: &'static str) -> Self {
        Self {
            key,
            kind: FormValueKind::Text,
        }
    }

    pub const fn boolean(key: &'static str) -> Self {
        Self {
            key,
            kind: FormValueKind::Boolean,
        }
    }

    pub const fn uuid(key: &'static str) -> Self {
        Self {
            key,
            kind: FormValueKind::Uuid,
        }
    }

    pub const fn date_time(key: &'static str) -> Self {
        Self {
            key,
            kind: FormValueKind::DateTime,
        }
    }
}

/// Where a trigger leads from a given state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeTarget {
    Fixed(&'static str),
    /// Destination chosen by the verdict of a named business-rule gate.
    Gated {
        gate: &'static str,
        passed: &'static str,
        failed: &'static str,
    },
    /// Destination chosen by an enumerated form value.
    Decision {
        key: &'static str,
        choices: Vec<(&'static str, &'static str)>,
    },
}

impl EdgeTarget {
    pub fn fixed(state: impl Into<&'static str>) -> Self {
        Self::Fixed(state.into())
    }

    pub fn gated(
        gate: &'static str,
        passed: impl Into<&'static str>,
        failed: impl Into<&'static str>,
    ) -> Self {
        Self::Gated {
            gate,
            passed: passed.into(),
            failed: failed.into(),
        }
    }

    pub fn decision<S>(
        key: &'static str,
        choices: impl IntoIterator<Item = (&'static str, S)>,
    ) -> Self
    where
        S: Into<&'static str>,
    {
        Self::Decision {
            key,
            choices: choices
                .into_iter()
                .map(|(value, state)| (value, state.into()))
                .collect(),
        }
    }

    /// Every state this target can lead to.
    pub fn destinations(&self) -> Vec<&'static str> {
        match self {
            Self::Fixed(state) => vec![*state],
            Self::Gated { passed, failed, .. } => vec![*passed, *failed],
            Self::Decision { choices, .. } => choices.iter().map(|(_, state)| *state).collect(),
        }
    }
}

impl fmt::Display for EdgeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(state) => f.write_str(state),
            Self::Gated {
                gate,
                passed,
                failed,
            } => write!(f, "{passed} | {failed} (gate {gate})"),
            Self::Decision { key, choices } => {
                let options: Vec<String> = choices
                    .iter()
                    .map(|(value, state)| format!("{value} => {state}"))
                    .collect();
                write!(f, "{} (by {key})", options.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: &'static str,
    pub trigger: &'static str,
    pub target: EdgeTarget,
    pub requires: Vec<FormRequirement>,
}

/// Side effect executed once when a state is entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryAction {
    /// Record the entity whose id is held in form data under `key`.
    AddRelatedEntity {
        key: &'static str,
        target_type: TargetType,
        sub_type: &'static str,
    },
    /// Fire a further trigger from the state just entered.
    Fire(&'static str),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("{process}: state '{state}' is used by an edge but never declared")]
    UnknownState { process: ProcessName, state: String },
    #[error("{process}: edge uses undeclared trigger '{trigger}'")]
    UnknownTrigger {
        process: ProcessName,
        trigger: String,
    },
    #[error("{process}: trigger '{trigger}' declared twice from state '{state}'")]
    DuplicateEdge {
        process: ProcessName,
        state: String,
        trigger: String,
    },
    #[error("{process}: no edge leaves the initial state with the start trigger")]
    MissingStartEdge { process: ProcessName },
}

/// Transition table, entry actions, and assignments for one process type.
#[derive(Debug, Clone)]
pub struct WorkflowDefinition {
    name: ProcessName,
    target_type: TargetType,
    initial_state: &'static str,
    start_trigger: &'static str,
    states: Vec<&'static str>,
    triggers: Vec<&'static str>,
    edges: Vec<Edge>,
    entry_actions: HashMap<&'static str, Vec<EntryAction>>,
    assignments: HashMap<&'static str, Assignment>,
    default_assignment: Assignment,
}

impl WorkflowDefinition {
    pub fn builder(
        name: ProcessName,
        target_type: TargetType,
        initial_state: impl Into<&'static str>,
        start_trigger: impl Into<&'static str>,
    ) -> WorkflowBuilder {
        let initial_state = initial_state.into();
        WorkflowBuilder {
            definition: Self {
                name,
                target_type,
                initial_state,
                start_trigger: start_trigger.into(),
                states: vec![initial_state],
                triggers: Vec::new(),
                edges: Vec::new(),
                entry_actions: HashMap::new(),
                assignments: HashMap::new(),
                default_assignment: Assignment::unassigned(),
            },
        }
    }

    pub fn name(&self) -> ProcessName {
        self.name
    }

    pub fn target_type(&self) -> TargetType {
        self.target_type
    }

    /// Pseudo-state used for lookups while a process has no current state.
    pub fn initial_state(&self) -> &'static str {
        self.initial_state
    }

    pub fn start_trigger(&self) -> &'static str {
        self.start_trigger
    }

    pub fn states(&self) -> &[&'static str] {
        &self.states
    }

    pub fn triggers(&self) -> &[&'static str] {
        &self.triggers
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, state: &str, trigger: &str) -> Option<&Edge> {
        self.edges
            .iter()
            .find(|edge| edge.from == state && edge.trigger == trigger)
    }

    /// Outbound triggers of `state` in declaration order, restricted to the vocabulary.
    pub fn permitted_triggers(&self, state: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.edges
            .iter()
            .filter(|edge| edge.from == state && self.triggers.contains(&edge.trigger))
            .filter(|edge| seen.insert(edge.trigger))
            .map(|edge| edge.trigger.to_string())
            .collect()
    }

    pub fn is_terminal(&self, state: &str) -> bool {
        !self.edges.iter().any(|edge| edge.from == state)
    }

    pub fn assignment_for(&self, state: &str) -> Assignment {
        self.assignments
            .get(state)
            .cloned()
            .unwrap_or_else(|| self.default_assignment.clone())
    }

    pub fn entry_actions(&self, state: &str) -> &[EntryAction] {
        self.entry_actions
            .get(state)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), DefinitionError> {
        let mut seen = HashSet::new();
        for edge in &self.edges {
            for state in std::iter::once(edge.from).chain(edge.target.destinations()) {
                if !self.states.contains(&state) {
                    return Err(DefinitionError::UnknownState {
                        process: self.name,
                        state: state.to_string(),
                    });
                }
            }
            if !self.triggers.contains(&edge.trigger) {
                return Err(DefinitionError::UnknownTrigger {
                    process: self.name,
                    trigger: edge.trigger.to_string(),
                });
            }
            if !seen.insert((edge.from, edge.trigger)) {
                return Err(DefinitionError::DuplicateEdge {
                    process: self.name,
                    state: edge.from.to_string(),
                    trigger: edge.trigger.to_string(),
                });
            }
        }
        for action in self.entry_actions.values().flatten() {
            if let EntryAction::Fire(trigger) = action {
                if !self.triggers.contains(trigger) {
                    return Err(DefinitionError::UnknownTrigger {
                        process: self.name,
                        trigger: trigger.to_string(),
                    });
                }
            }
        }
        if self.edge(self.initial_state, self.start_trigger).is_none() {
            return Err(DefinitionError::MissingStartEdge { process: self.name });
        }
        Ok(())
    }

    /// Human-readable outline of the transition table, one edge per line.
    pub fn describe(&self) -> String {
        let mut out = format!(
            "{} ({}), target: {}, {} states, {} triggers\n",
            self.name,
            self.name.label(),
            self.target_type.label(),
            self.states.len(),
            self.triggers.len()
        );
        for edge in &self.edges {
            let _ = write!(out, "  {} --{}--> {}", edge.from, edge.trigger, edge.target);
            if !edge.requires.is_empty() {
                let keys: Vec<&str> = edge.requires.iter().map(|req| req.key).collect();
                let _ = write!(out, " [requires {}]", keys.join(", "));
            }
            out.push('\n');
        }
        out
    }
}

/// Incrementally assembles a [`WorkflowDefinition`].
#[derive(Debug)]
pub struct WorkflowBuilder {
    definition: WorkflowDefinition,
}

impl WorkflowBuilder {
    pub fn states<S>(mut self, states: impl IntoIterator<Item = S>) -> Self
    where
        S: Into<&'static str>,
    {
        for state in states {
            let state = state.into();
            if !self.definition.states.contains(&state) {
                self.definition.states.push(state);
            }
        }
        self
    }

    pub fn triggers<T>(mut self, triggers: impl IntoIterator<Item = T>) -> Self
    where
        T: Into<&'static str>,
    {
        for trigger in triggers {
            let trigger = trigger.into();
            if !self.definition.triggers.contains(&trigger) {
                self.definition.triggers.push(trigger);
            }
        }
        self
    }

    pub fn default_assignment(mut self, assignment: Assignment) -> Self {
        self.definition.default_assignment = assignment;
        self
    }

    pub fn assign(mut self, state: impl Into<&'static str>, assignment: Assignment) -> Self {
        self.definition.assignments.insert(state.into(), assignment);
        self
    }

    pub fn edge(
        self,
        from: impl Into<&'static str>,
        trigger: impl Into<&'static str>,
        target: EdgeTarget,
    ) -> Self {
        self.edge_requiring(from, trigger, target, Vec::new())
    }

    pub fn edge_requiring(
        mut self,
        from: impl Into<&'static str>,
        trigger: impl Into<&'static str>,
        target: EdgeTarget,
        requires: Vec<FormRequirement>,
    ) -> Self {
        self.definition.edges.push(Edge {
            from: from.into(),
            trigger: trigger.into(),
            target,
            requires,
        });
        self
    }

    pub fn on_entry(mut self, state: impl Into<&'static str>, action: EntryAction) -> Self {
        self.definition
            .entry_actions
            .entry(state.into())
            .or_default()
            .push(action);
        self
    }

    pub fn declared_states(&self) -> &[&'static str] {
        &self.definition.states
    }

    pub fn build(self) -> WorkflowDefinition {
        self.definition
    }
}
