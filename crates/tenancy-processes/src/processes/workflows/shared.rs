//! States and triggers common to every tenancy process: the initial pseudo-state, document
//! review, tenure investigation, housing-officer approval, and cancellation/closure.

use super::AREA_MANAGER_TEAM;
use crate::processes::definition::{EdgeTarget, FormRequirement, WorkflowBuilder};
use crate::processes::domain::Assignment;

vocabulary! {
    pub enum ReviewState {
        ApplicationInitialised,
        DocumentsRequestedDes,
        DocumentsRequestedAppointment,
        DocumentsAppointmentRescheduled,
        DocumentChecksPassed,
        ApplicationSubmitted,
        TenureInvestigationFailed,
        TenureInvestigationPassed,
        TenureInvestigationPassedWithInt,
        InterviewScheduled,
        InterviewRescheduled,
        HOApprovalFailed,
        HOApprovalPassed,
        ProcessCancelled,
        ProcessClosed,
        ProcessCompleted,
    }
}

vocabulary! {
    pub enum ReviewTrigger {
        StartApplication,
        RequestDocumentsDes,
        RequestDocumentsAppointment,
        RescheduleDocumentsAppointment,
        ReviewDocuments,
        SubmitApplication,
        TenureInvestigation,
        ScheduleInterview,
        RescheduleInterview,
        HOApproval,
        CancelProcess,
        CloseProcess,
        CompleteProcess,
    }
}

pub mod keys {
    pub const APPOINTMENT_DATE_TIME: &str = "appointmentDateTime";
    pub const COMMENT: &str = "comment";
    pub const HAS_NOTIFIED_RESIDENT: &str = "hasNotifiedResident";
    pub const TENURE_INVESTIGATION_RECOMMENDATION: &str = "tenureInvestigationRecommendation";
    pub const HO_RECOMMENDATION: &str = "hoRecommendation";
    pub const SEEN_PHOTOGRAPHIC_ID: &str = "seenPhotographicId";
    pub const SEEN_SECOND_ID: &str = "seenSecondId";
}

pub(super) struct ReviewStages {
    /// State from which documents are first requested.
    pub(super) documents_from: &'static str,
    /// Officer confirmations required by `ReviewDocuments`.
    pub(super) document_checks: Vec<FormRequirement>,
}

pub(super) fn appointment() -> Vec<FormRequirement> {
    vec![FormRequirement::date_time(keys::APPOINTMENT_DATE_TIME)]
}

pub(super) fn close_requirements() -> Vec<FormRequirement> {
    vec![FormRequirement::boolean(keys::HAS_NOTIFIED_RESIDENT)]
}

pub(super) fn review_stages(builder: WorkflowBuilder, stages: ReviewStages) -> WorkflowBuilder {
    use ReviewState as S;
    use ReviewTrigger as T;

    let mut builder = builder
        .edge(
            stages.documents_from,
            T::RequestDocumentsDes,
            EdgeTarget::fixed(S::DocumentsRequestedDes),
        )
        .edge_requiring(
            stages.documents_from,
            T::RequestDocumentsAppointment,
            EdgeTarget::fixed(S::DocumentsRequestedAppointment),
            appointment(),
        )
        .edge_requiring(
            S::DocumentsRequestedDes,
            T::RequestDocumentsAppointment,
            EdgeTarget::fixed(S::DocumentsRequestedAppointment),
            appointment(),
        );

    for state in [
        S::DocumentsRequestedAppointment,
        S::DocumentsAppointmentRescheduled,
    ] {
        builder = builder.edge_requiring(
            state,
            T::RescheduleDocumentsAppointment,
            EdgeTarget::fixed(S::DocumentsAppointmentRescheduled),
            appointment(),
        );
    }

    for state in [
        S::DocumentsRequestedDes,
        S::DocumentsRequestedAppointment,
        S::DocumentsAppointmentRescheduled,
    ] {
        builder = builder.edge_requiring(
            state,
            T::ReviewDocuments,
            EdgeTarget::fixed(S::DocumentChecksPassed),
            stages.document_checks.clone(),
        );
    }

    builder = builder
        .edge(
            S::DocumentChecksPassed,
            T::SubmitApplication,
            EdgeTarget::fixed(S::ApplicationSubmitted),
        )
        .edge(
            S::ApplicationSubmitted,
            T::TenureInvestigation,
            EdgeTarget::decision(
                keys::TENURE_INVESTIGATION_RECOMMENDATION,
                [
                    ("approve", S::TenureInvestigationPassed),
                    ("appointment", S::TenureInvestigationPassedWithInt),
                    ("decline", S::TenureInvestigationFailed),
                ],
            ),
        );

    for state in [
        S::TenureInvestigationPassed,
        S::TenureInvestigationFailed,
        S::TenureInvestigationPassedWithInt,
    ] {
        builder = builder.edge_requiring(
            state,
            T::ScheduleInterview,
            EdgeTarget::fixed(S::InterviewScheduled),
            appointment(),
        );
    }

    for state in [S::InterviewScheduled, S::InterviewRescheduled] {
        builder = builder.edge_requiring(
            state,
            T::RescheduleInterview,
            EdgeTarget::fixed(S::InterviewRescheduled),
            appointment(),
        );
    }

    // An investigation recommending an interview cannot skip straight to approval.
    for state in [
        S::TenureInvestigationPassed,
        S::TenureInvestigationFailed,
        S::InterviewScheduled,
        S::InterviewRescheduled,
    ] {
        builder = builder.edge(
            state,
            T::HOApproval,
            EdgeTarget::decision(
                keys::HO_RECOMMENDATION,
                [
                    ("approve", S::HOApprovalPassed),
                    ("decline", S::HOApprovalFailed),
                ],
            ),
        );
    }

    builder = builder.edge_requiring(
        S::HOApprovalFailed,
        T::CloseProcess,
        EdgeTarget::fixed(S::ProcessClosed),
        close_requirements(),
    );

    for state in [
        S::TenureInvestigationFailed,
        S::TenureInvestigationPassed,
        S::TenureInvestigationPassedWithInt,
        S::InterviewScheduled,
        S::InterviewRescheduled,
    ] {
        builder = builder.assign(state, Assignment::team(AREA_MANAGER_TEAM));
    }

    builder
        .assign(S::ProcessCancelled, Assignment::unassigned())
        .assign(S::ProcessClosed, Assignment::unassigned())
        .assign(S::ProcessCompleted, Assignment::unassigned())
}

/// Lets every live state be cancelled, then lets a cancelled process be closed.
///
/// Must run after all other edges are declared so `CancelProcess` is listed last.
pub(super) fn cancellation(builder: WorkflowBuilder, except: &[&'static str]) -> WorkflowBuilder {
    use ReviewState as S;
    use ReviewTrigger as T;

    let closed_states = [
        S::ApplicationInitialised.name(),
        S::ProcessCancelled.name(),
        S::ProcessClosed.name(),
        S::ProcessCompleted.name(),
    ];
    let cancellable: Vec<&'static str> = builder
        .declared_states()
        .iter()
        .copied()
        .filter(|state| !closed_states.contains(state) && !except.contains(state))
        .collect();

    let mut builder = builder;
    for state in cancellable {
        builder = builder.edge_requiring(
            state,
            T::CancelProcess,
            EdgeTarget::fixed(S::ProcessCancelled),
            vec![FormRequirement::text(keys::COMMENT)],
        );
    }

    builder.edge_requiring(
        S::ProcessCancelled,
        T::CloseProcess,
        EdgeTarget::fixed(S::ProcessClosed),
        close_requirements(),
    )
}
