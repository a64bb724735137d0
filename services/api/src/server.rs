use crate::cli::ServeArgs;
use crate::infra::{build_service, AppState, Fixtures};
use crate::routes::with_process_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tenancy_processes::config::AppConfig;
use tenancy_processes::error::AppError;
use tenancy_processes::processes::WorkflowRegistry;
use tenancy_processes::telemetry;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let registry = WorkflowRegistry::standard();
    registry.validate()?;

    let fixtures = match config.fixtures_path.as_deref() {
        Some(path) => {
            let fixtures = Fixtures::load(path)?;
            info!(
                path = %path.display(),
                tenures = fixtures.tenures.len(),
                persons = fixtures.persons.len(),
                "loaded collaborator fixtures"
            );
            fixtures
        }
        None => {
            warn!("APP_FIXTURES_PATH not set; serving the built-in demo household");
            Fixtures::demo(Fixtures::adult_incoming_tenant())
        }
    };

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let service = Arc::new(build_service(registry, fixtures, config.pagination));

    let app = with_process_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "tenancy process service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
