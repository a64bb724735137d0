//! Sole-to-Joint: a sole tenant asks for a household member to be added as a joint tenant.

use super::shared::{
    self, appointment, cancellation, close_requirements, review_stages, ReviewStages,
    ReviewState, ReviewTrigger,
};
use super::HOUSING_OFFICER_TEAM;
use crate::processes::definition::{
    EdgeTarget, EntryAction, FormRequirement, WorkflowDefinition,
};
use crate::processes::domain::{Assignment, ProcessName, TargetType};
use crate::processes::rules::sole_to_joint::{
    AUTOMATED_CHECKS_GATE, BREACH_CHECKS_GATE, MANUAL_CHECKS_GATE,
};

vocabulary! {
    pub enum SoleToJointState {
        SelectTenants,
        AutomatedChecksFailed,
        AutomatedChecksPassed,
        ManualChecksFailed,
        ManualChecksPassed,
        BreachChecksFailed,
        BreachChecksPassed,
        TenureAppointmentScheduled,
        TenureAppointmentRescheduled,
        TenureUpdated,
    }
}

vocabulary! {
    pub enum SoleToJointTrigger {
        CheckEligibility,
        CheckManualEligibility,
        CheckTenancyBreach,
        ScheduleTenureAppointment,
        RescheduleTenureAppointment,
        UpdateTenure,
    }
}

pub mod keys {
    pub const TENANT_ID: &str = "tenantId";
    pub const INCOMING_TENANT_ID: &str = "incomingTenantId";
    pub const NEW_TENURE_ID: &str = "newTenureId";

    pub const LIVED_TOGETHER_TWELVE_MONTHS: &str = "incomingTenantLivedWithTenantForTwelveMonths";
    pub const NOT_SUBJECT_TO_IMMIGRATION_CONTROL: &str =
        "incomingTenantNotSubjectToImmigrationControl";
    pub const NO_PRIOR_EVICTION: &str = "incomingTenantHasNoPriorEviction";

    pub const NO_SUBLETTING: &str = "tenancyHasNoSubletting";
    pub const NO_ANTISOCIAL_BEHAVIOUR_ACTION: &str = "tenancyHasNoAntisocialBehaviourAction";
    pub const NO_UNAUTHORISED_ALTERATIONS: &str = "tenancyHasNoUnauthorisedAlterations";

    pub const SEEN_PROOF_OF_RELATIONSHIP: &str = "seenProofOfRelationship";
}

pub const INCOMING_TENANT_SUB_TYPE: &str = "householdMember";
pub const NEW_TENURE_SUB_TYPE: &str = "newTenure";

pub fn definition() -> WorkflowDefinition {
    use ReviewState as R;
    use ReviewTrigger as RT;
    use SoleToJointState as S;
    use SoleToJointTrigger as T;

    let add_incoming_tenant = EntryAction::AddRelatedEntity {
        key: keys::INCOMING_TENANT_ID,
        target_type: TargetType::Person,
        sub_type: INCOMING_TENANT_SUB_TYPE,
    };

    let builder = WorkflowDefinition::builder(
        ProcessName::SoleToJoint,
        TargetType::Tenure,
        R::ApplicationInitialised,
        RT::StartApplication,
    )
    .states(S::ordered().iter().copied())
    .states(R::ordered().iter().copied())
    .triggers(RT::ordered().iter().copied())
    .triggers(T::ordered().iter().copied())
    .default_assignment(Assignment::team(HOUSING_OFFICER_TEAM))
    .edge(
        R::ApplicationInitialised,
        RT::StartApplication,
        EdgeTarget::fixed(S::SelectTenants),
    )
    .edge_requiring(
        S::SelectTenants,
        T::CheckEligibility,
        EdgeTarget::gated(
            AUTOMATED_CHECKS_GATE,
            S::AutomatedChecksPassed,
            S::AutomatedChecksFailed,
        ),
        vec![
            FormRequirement::uuid(keys::TENANT_ID),
            FormRequirement::uuid(keys::INCOMING_TENANT_ID),
        ],
    )
    .on_entry(S::AutomatedChecksPassed, add_incoming_tenant.clone())
    .on_entry(S::AutomatedChecksFailed, add_incoming_tenant)
    .edge_requiring(
        S::AutomatedChecksFailed,
        RT::CloseProcess,
        EdgeTarget::fixed(R::ProcessClosed),
        close_requirements(),
    )
    .edge_requiring(
        S::AutomatedChecksPassed,
        T::CheckManualEligibility,
        EdgeTarget::gated(
            MANUAL_CHECKS_GATE,
            S::ManualChecksPassed,
            S::ManualChecksFailed,
        ),
        vec![
            FormRequirement::boolean(keys::LIVED_TOGETHER_TWELVE_MONTHS),
            FormRequirement::boolean(keys::NOT_SUBJECT_TO_IMMIGRATION_CONTROL),
            FormRequirement::boolean(keys::NO_PRIOR_EVICTION),
        ],
    )
    .edge_requiring(
        S::ManualChecksFailed,
        RT::CloseProcess,
        EdgeTarget::fixed(R::ProcessClosed),
        close_requirements(),
    )
    .edge_requiring(
        S::ManualChecksPassed,
        T::CheckTenancyBreach,
        EdgeTarget::gated(
            BREACH_CHECKS_GATE,
            S::BreachChecksPassed,
            S::BreachChecksFailed,
        ),
        vec![
            FormRequirement::boolean(keys::NO_SUBLETTING),
            FormRequirement::boolean(keys::NO_ANTISOCIAL_BEHAVIOUR_ACTION),
            FormRequirement::boolean(keys::NO_UNAUTHORISED_ALTERATIONS),
        ],
    )
    .edge_requiring(
        S::BreachChecksFailed,
        RT::CloseProcess,
        EdgeTarget::fixed(R::ProcessClosed),
        close_requirements(),
    );

    let builder = review_stages(
        builder,
        ReviewStages {
            documents_from: S::BreachChecksPassed.name(),
            document_checks: vec![
                FormRequirement::boolean(shared::keys::SEEN_PHOTOGRAPHIC_ID),
                FormRequirement::boolean(shared::keys::SEEN_SECOND_ID),
                FormRequirement::boolean(keys::SEEN_PROOF_OF_RELATIONSHIP),
            ],
        },
    )
    .edge_requiring(
        R::HOApprovalPassed,
        T::ScheduleTenureAppointment,
        EdgeTarget::fixed(S::TenureAppointmentScheduled),
        appointment(),
    );

    let mut builder = builder;
    for state in [
        S::TenureAppointmentScheduled,
        S::TenureAppointmentRescheduled,
    ] {
        builder = builder
            .edge_requiring(
                state,
                T::RescheduleTenureAppointment,
                EdgeTarget::fixed(S::TenureAppointmentRescheduled),
                appointment(),
            )
            .edge_requiring(
                state,
                T::UpdateTenure,
                EdgeTarget::fixed(S::TenureUpdated),
                vec![FormRequirement::uuid(keys::NEW_TENURE_ID)],
            );
    }

    let builder = builder
        .on_entry(
            S::TenureUpdated,
            EntryAction::AddRelatedEntity {
                key: keys::NEW_TENURE_ID,
                target_type: TargetType::Tenure,
                sub_type: NEW_TENURE_SUB_TYPE,
            },
        )
        .edge(
            S::TenureUpdated,
            RT::CompleteProcess,
            EdgeTarget::fixed(R::ProcessCompleted),
        );

    cancellation(builder, &[S::TenureUpdated.name()]).build()
}
