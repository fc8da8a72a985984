//! `POST /clean-audio`: base64 μ-law in, base64 cleaned μ-law out.
//!
//! Precondition order: suppressor loaded (503), declared sample rate (400),
//! base64 transport encoding (400), payload size (400). Only then does the
//! pipeline run, on the blocking pool since it is pure CPU work.

use crate::audio::processor::AudioProcessor;
use crate::audio::TELEPHONY_SAMPLE_RATE;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::PoisonError;
use tracing::{error, info, warn};

fn default_sample_rate() -> u32 {
    TELEPHONY_SAMPLE_RATE
}

#[derive(Debug, Deserialize)]
pub struct CleanAudioRequest {
    /// Base64 encoded μ-law audio
    pub audio_payload: String,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CleanAudioResponse {
    /// Base64 encoded cleaned μ-law audio
    pub cleaned_audio: String,
    /// Reserved, always false
    pub noise_detected: bool,
    pub success: bool,
    pub frames: usize,
    pub fallback_frames: usize,
    pub mean_confidence: Option<f32>,
}

pub async fn clean_audio(
    state: web::Data<AppState>,
    body: web::Json<CleanAudioRequest>,
) -> AppResult<HttpResponse> {
    let pipeline = state.pipeline.clone().ok_or_else(|| {
        AppError::ServiceUnavailable(
            "Noise suppressor not loaded; enable suppression in the configuration".to_string(),
        )
    })?;

    let config = state.get_config();
    let processor = AudioProcessor::new(config.audio.sample_rate, config.audio.max_payload_bytes);
    let request = body.into_inner();

    processor
        .validate_sample_rate(request.sample_rate)
        .map_err(AppError::ValidationError)?;

    let payload = STANDARD.decode(request.audio_payload.trim())?;

    processor
        .validate_payload(&payload)
        .map_err(AppError::ValidationError)?;

    let duration_ms = processor.duration_ms(&payload);

    state.begin_cleaning();
    let outcome = web::block(move || {
        // Suppressor panics are caught per frame, so a poisoned lock still
        // guards a usable pipeline.
        let mut pipeline = pipeline.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            warn!("Noise suppressor lock was poisoned; recovering");
            poisoned.into_inner()
        });
        pipeline.clean(&payload).map_err(AppError::from)
    })
    .await
    .map_err(AppError::from)
    .and_then(|result| result);
    state.end_cleaning();

    let (cleaned, report) = match outcome {
        Ok(cleaned) => cleaned,
        Err(e) => {
            error!(error = %e, "Audio cleaning failed");
            state.record_cleaning_failure();
            return Err(e);
        }
    };

    state.record_cleaning(&report);

    info!(
        audio_ms = duration_ms,
        frames = report.frames,
        fallback_frames = report.fallback_frames,
        processing_time_ms = report.processing_time_ms,
        "Audio cleaning completed"
    );

    Ok(HttpResponse::Ok().json(CleanAudioResponse {
        cleaned_audio: STANDARD.encode(&cleaned),
        noise_detected: report.noise_detected,
        success: true,
        frames: report.frames,
        fallback_frames: report.fallback_frames,
        mean_confidence: report.mean_confidence,
    }))
}
