use crate::infra::{build_service, ApiService, DemoHousehold, Fixtures};
use chrono::NaiveDate;
use clap::Args;
use serde_json::{json, Value};
use tenancy_processes::config::PaginationConfig;
use tenancy_processes::error::AppError;
use tenancy_processes::processes::{
    Actor, CreateProcessRequest, Process, ProcessName, UpdateProcessRequest, WorkflowRegistry,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Make the incoming tenant a minor so the automated checks fail.
    #[arg(long)]
    pub(crate) fail_eligibility: bool,
    /// Print the final process as JSON.
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DescribeArgs {
    /// Workflow to describe (e.g. soletojoint, change-of-name). Describes all when omitted.
    #[arg(value_parser = parse_process_name)]
    pub(crate) process: Option<ProcessName>,
}

fn parse_process_name(raw: &str) -> Result<ProcessName, String> {
    raw.parse()
}

pub(crate) fn run_describe(args: DescribeArgs) -> Result<(), AppError> {
    let registry = WorkflowRegistry::standard();
    registry.validate()?;

    match args.process {
        Some(name) => {
            let definition = registry
                .get(name)
                .map_err(|err| AppError::Process(err.into()))?;
            print!("{}", definition.describe());
        }
        None => {
            for definition in registry.definitions() {
                println!("{}", definition.describe());
            }
        }
    }
    Ok(())
}

/// One officer action in the scripted walkthrough.
struct Step {
    trigger: &'static str,
    form: Value,
}

fn step(trigger: &'static str, form: Value) -> Step {
    Step { trigger, form }
}

fn happy_path(household: &DemoHousehold) -> Vec<Step> {
    vec![
        step(
            "CheckEligibility",
            json!({
                "tenantId": household.tenant_id,
                "incomingTenantId": household.incoming_id,
            }),
        ),
        step(
            "CheckManualEligibility",
            json!({
                "incomingTenantLivedWithTenantForTwelveMonths": true,
                "incomingTenantNotSubjectToImmigrationControl": true,
                "incomingTenantHasNoPriorEviction": true,
            }),
        ),
        step(
            "CheckTenancyBreach",
            json!({
                "tenancyHasNoSubletting": true,
                "tenancyHasNoAntisocialBehaviourAction": true,
                "tenancyHasNoUnauthorisedAlterations": true,
            }),
        ),
        step("RequestDocumentsDes", json!({})),
        step(
            "ReviewDocuments",
            json!({
                "seenPhotographicId": true,
                "seenSecondId": true,
                "seenProofOfRelationship": true,
            }),
        ),
        step("SubmitApplication", json!({})),
        step(
            "TenureInvestigation",
            json!({ "tenureInvestigationRecommendation": "approve" }),
        ),
        step("HOApproval", json!({ "hoRecommendation": "approve" })),
        step(
            "ScheduleTenureAppointment",
            json!({ "appointmentDateTime": "2025-10-06T11:00:00+01:00" }),
        ),
        step("UpdateTenure", json!({ "newTenureId": uuid::Uuid::new_v4() })),
        step("CompleteProcess", json!({})),
    ]
}

fn failed_eligibility_path(household: &DemoHousehold) -> Vec<Step> {
    vec![
        step(
            "CheckEligibility",
            json!({
                "tenantId": household.tenant_id,
                "incomingTenantId": household.incoming_id,
            }),
        ),
        step("CloseProcess", json!({ "hasNotifiedResident": true })),
    ]
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let household = DemoHousehold::standard();
    let incoming_born = if args.fail_eligibility {
        NaiveDate::from_ymd_opt(2012, 1, 17).unwrap_or_default()
    } else {
        Fixtures::adult_incoming_tenant()
    };
    let service = build_service(
        WorkflowRegistry::standard(),
        Fixtures::demo(incoming_born),
        PaginationConfig::default(),
    );
    let actor = Actor::new("Demo Officer", "demo.officer@example.org");

    println!("Sole-to-joint walkthrough for tenure {}", household.tenure_id);
    let steps = if args.fail_eligibility {
        failed_eligibility_path(&household)
    } else {
        happy_path(&household)
    };
    let process = walk(&service, &household, steps, &actor)?;

    if args.json {
        let rendered = serde_json::to_string_pretty(&process).map_err(|source| {
            AppError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, source))
        })?;
        println!("{rendered}");
    }
    Ok(())
}

fn walk(
    service: &ApiService,
    household: &DemoHousehold,
    steps: Vec<Step>,
    actor: &Actor,
) -> Result<Process, AppError> {
    let mut process = service.create(
        ProcessName::SoleToJoint,
        CreateProcessRequest {
            target_id: household.tenure_id,
            ..CreateProcessRequest::default()
        },
        actor,
    )?;
    print_state("StartApplication", &process);

    for Step { trigger, form } in steps {
        let form_data = match form {
            Value::Object(map) => map,
            _ => Default::default(),
        };
        process = service.trigger(
            ProcessName::SoleToJoint,
            process.id(),
            trigger,
            UpdateProcessRequest {
                form_data,
                documents: Vec::new(),
            },
            process.version_number(),
            actor,
        )?;
        print_state(trigger, &process);
    }
    Ok(process)
}

fn print_state(trigger: &str, process: &Process) {
    let Some(state) = process.current_state() else {
        return;
    };
    let version = process
        .version_number()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "  v{version:<3} {trigger:<28} -> {:<30} [{}] next: {}",
        state.name,
        state.assignment.value,
        if state.permitted_triggers.is_empty() {
            "(none)".to_string()
        } else {
            state.permitted_triggers.join(", ")
        }
    );
}
