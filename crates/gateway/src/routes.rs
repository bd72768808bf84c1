use crate::{
    annotate::ProcessedOutput,
    error::ApiError,
    state::{AppState, PredictResponse},
};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::Engine as _;
use inference::DetectionBackend;
use std::time::Instant;
use tower_http::cors::CorsLayer;

/// Uploads above this size are rejected before decoding
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn app<B>(state: AppState<B>) -> Router
where
    B: DetectionBackend + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(root))
        .route("/api/predict", post(predict))
        .route("/api/predict/image", post(predict_image))
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Backend is alive" }))
}

async fn predict<B>(
    State(state): State<AppState<B>>,
    multipart: Multipart,
) -> Result<Json<PredictResponse>, ApiError>
where
    B: DetectionBackend + Send + Sync + 'static,
{
    let output = run_prediction(&state, multipart).await?;

    let annotated_image = output
        .annotated_jpeg
        .map(|jpeg| base64::engine::general_purpose::STANDARD.encode(jpeg));

    Ok(Json(PredictResponse {
        status: "success",
        detections: output.detections,
        annotated_image,
    }))
}

async fn predict_image<B>(
    State(state): State<AppState<B>>,
    multipart: Multipart,
) -> Result<Response, ApiError>
where
    B: DetectionBackend + Send + Sync + 'static,
{
    let output = run_prediction(&state, multipart).await?;

    let jpeg = output
        .annotated_jpeg
        .ok_or_else(|| ApiError::NotFound("No annotated image produced".to_string()))?;

    Ok(([(header::CONTENT_TYPE, "image/jpeg")], jpeg).into_response())
}

/// Shared handler body: extract the upload, decode it, then run the model
/// call and the annotation pass on worker threads.
async fn run_prediction<B>(
    state: &AppState<B>,
    mut multipart: Multipart,
) -> Result<ProcessedOutput, ApiError>
where
    B: DetectionBackend + Send + Sync + 'static,
{
    let start = Instant::now();

    let mut file_bytes = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {e}")))?
    {
        if field.name() == Some("file") {
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {e}")))?;
            file_bytes = Some(data);
            break;
        }
    }

    let file_bytes =
        file_bytes.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;

    let image = image::load_from_memory(&file_bytes)
        .map_err(|e| ApiError::BadRequest(format!("Invalid image: {e}")))?
        .to_rgb8();

    state.metrics.requests.add(1, &[]);

    // Model call and annotation are both CPU-bound; keep them off the
    // request-handling loop
    let detector = state.detector.clone();
    let (raw, image) = tokio::task::spawn_blocking(move || {
        let raw = detector.predict(&image)?;
        Ok::<_, anyhow::Error>((raw, image))
    })
    .await
    .map_err(|e| ApiError::Inference(anyhow::anyhow!("Inference task failed: {e}")))?
    .map_err(ApiError::Inference)?;

    let annotator = state.annotator.clone();
    let output = tokio::task::spawn_blocking(move || annotator.process(raw.as_deref(), &image))
        .await
        .map_err(|e| ApiError::Inference(anyhow::anyhow!("Annotation task failed: {e}")))?
        .map_err(ApiError::Inference)?;

    state.metrics.duration.record(start.elapsed().as_secs_f64(), &[]);
    state
        .metrics
        .detections
        .add(output.detections.len() as u64, &[]);

    tracing::debug!(
        detections = output.detections.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Prediction served"
    );

    Ok(output)
}
