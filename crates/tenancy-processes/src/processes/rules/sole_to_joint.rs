//! Eligibility rules gating the Sole-to-Joint workflow.
//!
//! Automated checks run against tenure and person records fetched from collaborator systems.
//! Manual and breach checks run against confirmations an officer records in form data.

use chrono::NaiveDate;

use super::{BusinessRule, RuleSet};
use crate::processes::domain::FormData;
use crate::processes::form;
use crate::processes::gateway::{PersonRecord, TenureInformation};
use crate::processes::machine::ProcessError;
use crate::processes::workflows::sole_to_joint::keys;

pub const AUTOMATED_CHECKS_GATE: &str = "sole_to_joint_automated_checks";
pub const MANUAL_CHECKS_GATE: &str = "sole_to_joint_manual_checks";
pub const BREACH_CHECKS_GATE: &str = "sole_to_joint_breach_checks";

/// Youngest age at which a person may hold a tenure.
pub const MINIMUM_TENANT_AGE: u32 = 18;

/// Records the automated checks run against.
#[derive(Debug, Clone)]
pub struct AutomatedCheckInput {
    pub tenure: TenureInformation,
    pub tenant: PersonRecord,
    pub proposed_tenant: PersonRecord,
    pub today: NaiveDate,
}

pub fn automated_checks() -> RuleSet<AutomatedCheckInput> {
    RuleSet::new(vec![
        BusinessRule::new(
            "tenant_is_named_tenure_holder",
            "the requesting tenant is a responsible member of the tenure",
            tenant_is_named_tenure_holder,
        ),
        BusinessRule::new(
            "tenure_is_secure",
            "the tenure is a secure tenancy",
            tenure_is_secure,
        ),
        BusinessRule::new(
            "tenure_is_active",
            "the tenure has not ended",
            tenure_is_active,
        ),
        BusinessRule::new(
            "tenure_is_sole",
            "the tenure has exactly one responsible tenant",
            tenure_is_sole,
        ),
        BusinessRule::new(
            "proposed_tenant_is_household_member",
            "the proposed tenant is listed in the tenure's household",
            proposed_tenant_is_household_member,
        ),
        BusinessRule::new(
            "proposed_tenant_is_not_a_minor",
            "the proposed tenant is at least 18 years old",
            proposed_tenant_is_not_a_minor,
        ),
        BusinessRule::new(
            "proposed_tenant_has_no_active_tenure",
            "the proposed tenant holds no other active tenure",
            proposed_tenant_has_no_active_tenure,
        ),
    ])
}

fn tenant_is_named_tenure_holder(input: &AutomatedCheckInput) -> bool {
    input
        .tenure
        .member(&input.tenant.id)
        .is_some_and(|member| member.is_responsible)
}

fn tenure_is_secure(input: &AutomatedCheckInput) -> bool {
    input.tenure.tenure_type.is_secure()
}

fn tenure_is_active(input: &AutomatedCheckInput) -> bool {
    input.tenure.is_active(input.today)
}

fn tenure_is_sole(input: &AutomatedCheckInput) -> bool {
    input.tenure.responsible_members().count() == 1
}

fn proposed_tenant_is_household_member(input: &AutomatedCheckInput) -> bool {
    input.proposed_tenant.id != input.tenant.id
        && input.tenure.member(&input.proposed_tenant.id).is_some()
}

fn proposed_tenant_is_not_a_minor(input: &AutomatedCheckInput) -> bool {
    input
        .proposed_tenant
        .age_on(input.today)
        .is_some_and(|age| age >= MINIMUM_TENANT_AGE)
}

fn proposed_tenant_has_no_active_tenure(input: &AutomatedCheckInput) -> bool {
    !input.proposed_tenant.tenures.iter().any(|tenure| {
        tenure.id != input.tenure.id && tenure.is_responsible && tenure.is_active(input.today)
    })
}

/// Officer confirmations about the proposed tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManualCheckInput {
    pub lived_together_twelve_months: bool,
    pub not_subject_to_immigration_control: bool,
    pub no_prior_eviction: bool,
}

impl ManualCheckInput {
    pub fn from_form(form_data: &FormData) -> Result<Self, ProcessError> {
        Ok(Self {
            lived_together_twelve_months: form::boolean(
                form_data,
                keys::LIVED_TOGETHER_TWELVE_MONTHS,
            )?,
            not_subject_to_immigration_control: form::boolean(
                form_data,
                keys::NOT_SUBJECT_TO_IMMIGRATION_CONTROL,
            )?,
            no_prior_eviction: form::boolean(form_data, keys::NO_PRIOR_EVICTION)?,
        })
    }
}

pub fn manual_checks() -> RuleSet<ManualCheckInput> {
    RuleSet::new(vec![
        BusinessRule::new(
            "lived_together_for_twelve_months",
            "the proposed tenant has lived at the property with the tenant for twelve months",
            |input: &ManualCheckInput| input.lived_together_twelve_months,
        ),
        BusinessRule::new(
            "not_subject_to_immigration_control",
            "the proposed tenant is not subject to immigration control",
            |input: &ManualCheckInput| input.not_subject_to_immigration_control,
        ),
        BusinessRule::new(
            "no_prior_eviction",
            "the proposed tenant has not previously been evicted",
            |input: &ManualCheckInput| input.no_prior_eviction,
        ),
    ])
}

/// Officer confirmations about the existing tenancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreachCheckInput {
    pub no_subletting: bool,
    pub no_antisocial_behaviour_action: bool,
    pub no_unauthorised_alterations: bool,
}

impl BreachCheckInput {
    pub fn from_form(form_data: &FormData) -> Result<Self, ProcessError> {
        Ok(Self {
            no_subletting: form::boolean(form_data, keys::NO_SUBLETTING)?,
            no_antisocial_behaviour_action: form::boolean(
                form_data,
                keys::NO_ANTISOCIAL_BEHAVIOUR_ACTION,
            )?,
            no_unauthorised_alterations: form::boolean(
                form_data,
                keys::NO_UNAUTHORISED_ALTERATIONS,
            )?,
        })
    }
}

pub fn breach_checks() -> RuleSet<BreachCheckInput> {
    RuleSet::new(vec![
        BusinessRule::new(
            "property_is_not_sublet",
            "the tenant is not subletting the property",
            |input: &BreachCheckInput| input.no_subletting,
        ),
        BusinessRule::new(
            "no_antisocial_behaviour_action",
            "no antisocial behaviour action is open against the tenancy",
            |input: &BreachCheckInput| input.no_antisocial_behaviour_action,
        ),
        BusinessRule::new(
            "no_unauthorised_alterations",
            "no unauthorised alterations have been made to the property",
            |input: &BreachCheckInput| input.no_unauthorised_alterations,
        ),
    ])
}
