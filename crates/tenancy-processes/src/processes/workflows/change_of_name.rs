//! Change of Name: a tenant asks for the name on their record to be changed.

use super::shared::{
    self, cancellation, review_stages, ReviewStages, ReviewState, ReviewTrigger,
};
use super::HOUSING_OFFICER_TEAM;
use crate::processes::definition::{EdgeTarget, FormRequirement, WorkflowDefinition};
use crate::processes::domain::{Assignment, ProcessName, TargetType};

vocabulary! {
    pub enum ChangeOfNameState {
        EnterNewName,
        NameSubmitted,
        NameUpdated,
    }
}

vocabulary! {
    pub enum ChangeOfNameTrigger {
        EnterNewName,
        UpdateName,
    }
}

pub mod keys {
    pub const FIRST_NAME: &str = "firstName";
    pub const SURNAME: &str = "surname";
    pub const SEEN_PROOF_OF_NAME_CHANGE: &str = "seenProofOfNameChange";
}

pub fn definition() -> WorkflowDefinition {
    use ChangeOfNameState as S;
    use ChangeOfNameTrigger as T;
    use ReviewState as R;
    use ReviewTrigger as RT;

    let builder = WorkflowDefinition::builder(
        ProcessName::ChangeOfName,
        TargetType::Person,
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
        EdgeTarget::fixed(S::EnterNewName),
    )
    .edge_requiring(
        S::EnterNewName,
        T::EnterNewName,
        EdgeTarget::fixed(S::NameSubmitted),
        vec![
            FormRequirement::text(keys::FIRST_NAME),
            FormRequirement::text(keys::SURNAME),
        ],
    );

    let builder = review_stages(
        builder,
        ReviewStages {
            documents_from: S::NameSubmitted.name(),
            document_checks: vec![
                FormRequirement::boolean(shared::keys::SEEN_PHOTOGRAPHIC_ID),
                FormRequirement::boolean(shared::keys::SEEN_SECOND_ID),
                FormRequirement::boolean(keys::SEEN_PROOF_OF_NAME_CHANGE),
            ],
        },
    )
    .edge(
        R::HOApprovalPassed,
        T::UpdateName,
        EdgeTarget::fixed(S::NameUpdated),
    )
    .edge(
        S::NameUpdated,
        RT::CompleteProcess,
        EdgeTarget::fixed(R::ProcessCompleted),
    );

    cancellation(builder, &[S::NameUpdated.name()]).build()
}
