//! Gate evaluator backed by the tenure and person collaborator systems.

use std::sync::Arc;

use tracing::debug;

use super::domain::EntityKind;
use super::form;
use super::gateway::{PersonGateway, TenureGateway};
use super::machine::{GateContext, GateEvaluator, ProcessError};
use super::rules::sole_to_joint::{
    self, AutomatedCheckInput, BreachCheckInput, ManualCheckInput, AUTOMATED_CHECKS_GATE,
    BREACH_CHECKS_GATE, MANUAL_CHECKS_GATE,
};
use super::rules::{EligibilityReport, RuleSet};
use super::workflows::sole_to_joint::keys;

/// Resolves every gate used by the standard workflows.
///
/// Records are fetched before any rule runs; a missing record fails the gate with
/// `EntityNotFound` instead of producing a verdict.
pub struct EligibilityGates<T, P> {
    tenures: Arc<T>,
    persons: Arc<P>,
    automated: RuleSet<AutomatedCheckInput>,
    manual: RuleSet<ManualCheckInput>,
    breach: RuleSet<BreachCheckInput>,
}

impl<T, P> EligibilityGates<T, P>
where
    T: TenureGateway,
    P: PersonGateway,
{
    pub fn new(tenures: Arc<T>, persons: Arc<P>) -> Self {
        Self {
            tenures,
            persons,
            automated: sole_to_joint::automated_checks(),
            manual: sole_to_joint::manual_checks(),
            breach: sole_to_joint::breach_checks(),
        }
    }

    pub fn tenures(&self) -> &T {
        &self.tenures
    }

    pub fn persons(&self) -> &P {
        &self.persons
    }

    fn automated_input(
        &self,
        context: &GateContext<'_>,
    ) -> Result<AutomatedCheckInput, ProcessError> {
        let tenant_id = form::uuid(context.form_data, keys::TENANT_ID)?;
        let incoming_tenant_id = form::uuid(context.form_data, keys::INCOMING_TENANT_ID)?;

        let tenure_id = context.process.target_id();
        let tenure = self
            .tenures
            .tenure_by_id(&tenure_id)?
            .ok_or_else(|| ProcessError::not_found(EntityKind::Tenure, tenure_id))?;
        let tenant = self
            .persons
            .person_by_id(&tenant_id)?
            .ok_or_else(|| ProcessError::not_found(EntityKind::Person, tenant_id))?;
        let proposed_tenant = self
            .persons
            .person_by_id(&incoming_tenant_id)?
            .ok_or_else(|| ProcessError::not_found(EntityKind::Person, incoming_tenant_id))?;

        Ok(AutomatedCheckInput {
            tenure,
            tenant,
            proposed_tenant,
            today: context.today,
        })
    }
}

impl<T, P> GateEvaluator for EligibilityGates<T, P>
where
    T: TenureGateway,
    P: PersonGateway,
{
    fn evaluate(
        &self,
        gate: &str,
        context: &GateContext<'_>,
    ) -> Result<EligibilityReport, ProcessError> {
        let report = match gate {
            AUTOMATED_CHECKS_GATE => self.automated.evaluate(&self.automated_input(context)?),
            MANUAL_CHECKS_GATE => self
                .manual
                .evaluate(&ManualCheckInput::from_form(context.form_data)?),
            BREACH_CHECKS_GATE => self
                .breach
                .evaluate(&BreachCheckInput::from_form(context.form_data)?),
            other => return Err(ProcessError::UnknownGate(other.to_string())),
        };
        debug!(
            process_id = %context.process.id(),
            gate,
            outcomes = ?report.as_map(),
            "rule outcomes collected"
        );
        Ok(report)
    }
}
