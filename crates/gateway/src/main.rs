use common::TelemetryGuard;
use gateway::{config::GatewayConfig, logging::setup_logging, routes::app, state::AppState};
use inference::{DetectionBackend, Detector, DetectorConfig, backend::ort::OrtBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::from_env()?;
    let detector_config = DetectorConfig::from_env()?;

    let _telemetry = config
        .otel_endpoint
        .as_ref()
        .map(|endpoint| TelemetryGuard::init("gateway", endpoint))
        .transpose()?;

    setup_logging(&config);

    tracing::info!(
        config = ?config,
        detector_config = ?detector_config,
        "Loaded configuration"
    );

    tracing::info!("Loading detection model");
    let backend = OrtBackend::load_model(&detector_config.model_path)?;
    tracing::info!("Model loaded successfully");

    let detector = Detector::new(backend, detector_config);
    let state = AppState::new(detector)?;

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Gateway listening");

    axum::serve(listener, app(state)).await?;

    Ok(())
}
