use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use tracing::{info_span, Instrument, Span};
use uuid::Uuid;

use super::dto::{CloudStatus, HealthData, ImageRequest, OfflineStatus};
use super::extractors::AppJson;
use super::response::{normalize, RecognitionResponse};
use super::AppState;
use crate::error::{Result, SignsightError};
use crate::media::AudioUpload;
use crate::recognition::RecognitionResult;
use crate::services::Operation;

const AUDIO_FIELD: &str = "audio";

fn request_span(operation: Operation) -> Span {
    info_span!(
        "recognition",
        request_id = %Uuid::new_v4(),
        operation = %operation,
    )
}

/// `POST /api/ocr`
///
/// Offline sign reading. Without a local engine every request gets the same
/// 501, whatever the body looks like.
pub async fn read_sign_offline(
    State(state): State<AppState>,
    body: std::result::Result<AppJson<ImageRequest>, SignsightError>,
) -> RecognitionResponse {
    let operation = Operation::ReadSignOffline;
    async move {
        let result = run_offline(&state, body).await;
        normalize(result, operation)
    }
    .instrument(request_span(operation))
    .await
}

async fn run_offline(
    state: &AppState,
    body: std::result::Result<AppJson<ImageRequest>, SignsightError>,
) -> RecognitionResult {
    state.dispatcher.offline_ready()?;
    let AppJson(request) = body?;
    state
        .dispatcher
        .read_sign_offline(request.image.as_deref())
        .await
}

/// `POST /api/analyze_sign`
pub async fn read_sign_cloud(
    State(state): State<AppState>,
    body: std::result::Result<AppJson<ImageRequest>, SignsightError>,
) -> RecognitionResponse {
    let operation = Operation::ReadSignCloud;
    async move {
        let result = match body {
            Ok(AppJson(request)) => {
                state
                    .dispatcher
                    .read_sign_cloud(request.image.as_deref())
                    .await
            }
            Err(err) => Err(err),
        };
        normalize(result, operation)
    }
    .instrument(request_span(operation))
    .await
}

/// `POST /api/transcribe`, multipart with the clip in the `audio` field.
pub async fn transcribe_audio(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> RecognitionResponse {
    let operation = Operation::TranscribeAudio;
    async move {
        let result = match read_audio_field(multipart).await {
            Ok(upload) => state.dispatcher.transcribe_audio(upload).await,
            Err(err) => Err(err),
        };
        normalize(result, operation)
    }
    .instrument(request_span(operation))
    .await
}

/// First `audio` field of the form, if any. Other fields are skipped.
async fn read_audio_field(
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Option<AudioUpload>> {
    let mut multipart = multipart?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        return Ok(Some(AudioUpload {
            file_name,
            bytes: bytes.to_vec(),
        }));
    }

    Ok(None)
}

/// `GET /api/health`
pub async fn health_check(State(state): State<AppState>) -> Json<HealthData> {
    Json(HealthData {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        offline: OfflineStatus {
            available: state.dispatcher.offline().is_available(),
        },
        cloud: CloudStatus {
            available: state.dispatcher.cloud().is_available(),
            model: state.config.remote.model.clone(),
        },
    })
}
