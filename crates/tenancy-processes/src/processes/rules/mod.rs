//! Named business-rule predicates and the eligibility reports they produce.

pub mod sole_to_joint;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A pure, named predicate over already-fetched data.
pub struct BusinessRule<D> {
    pub name: &'static str,
    pub description: &'static str,
    check: fn(&D) -> bool,
}

impl<D> BusinessRule<D> {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        check: fn(&D) -> bool,
    ) -> Self {
        Self {
            name,
            description,
            check,
        }
    }

    pub fn holds(&self, data: &D) -> bool {
        (self.check)(data)
    }
}

/// Open set of rules; every rule runs and the verdict is the conjunction of all outcomes.
pub struct RuleSet<D> {
    rules: Vec<BusinessRule<D>>,
}

impl<D> RuleSet<D> {
    pub fn new(rules: Vec<BusinessRule<D>>) -> Self {
        Self { rules }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name).collect()
    }

    pub fn evaluate(&self, data: &D) -> EligibilityReport {
        EligibilityReport {
            outcomes: self
                .rules
                .iter()
                .map(|rule| RuleOutcome {
                    rule: rule.name.to_string(),
                    description: rule.description.to_string(),
                    passed: rule.holds(data),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule: String,
    pub description: String,
    pub passed: bool,
}

/// Individual rule outcomes retained for audit, in evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityReport {
    pub outcomes: Vec<RuleOutcome>,
}

impl EligibilityReport {
    pub fn is_eligible(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.passed)
    }

    pub fn failed_rules(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|outcome| !outcome.passed)
            .map(|outcome| outcome.rule.as_str())
            .collect()
    }

    pub fn as_map(&self) -> BTreeMap<&str, bool> {
        self.outcomes
            .iter()
            .map(|outcome| (outcome.rule.as_str(), outcome.passed))
            .collect()
    }

    pub fn summary(&self) -> String {
        let failed = self.failed_rules();
        if failed.is_empty() {
            format!("all {} rules passed", self.outcomes.len())
        } else {
            format!("failed: {}", failed.join(", "))
        }
    }
}
