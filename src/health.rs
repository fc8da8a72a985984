//! # Status, Health and Metrics Endpoints
//!
//! - `GET /`: liveness plus whether the suppressor is available
//! - `GET /health`: `healthy` with a loaded suppressor, `degraded` without one.
//!   Both answer 200 so load balancers keep routing; callers decide what
//!   degraded means for them.
//! - `GET /metrics`: request, endpoint and cleaning counters

use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;

const SERVICE_NAME: &str = "call-audio-cleaner";

pub async fn root_status(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "running",
        "service": SERVICE_NAME,
        "rnnoise_available": state.is_suppressor_loaded()
    }))
}

pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let metrics = state.get_metrics_snapshot();
    let config = state.get_config();
    let loaded = state.is_suppressor_loaded();

    HttpResponse::Ok().json(json!({
        "status": if loaded { "healthy" } else { "degraded" },
        "rnnoise_loaded": loaded,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": state.get_uptime_seconds(),
        "service": {
            "name": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "host": config.server.host,
            "port": config.server.port
        },
        "suppressor": {
            "enabled": config.suppression.enabled,
            "backend": state.suppressor_name,
        },
        "metrics": {
            "total_requests": metrics.request_count,
            "total_errors": metrics.error_count,
            "active_cleanings": metrics.active_cleanings,
            "cleaned_requests": metrics.cleaning.cleaned_requests,
            "fallback_rate": metrics.cleaning.fallback_rate()
        },
        "memory": get_memory_info()
    }))
}

pub async fn detailed_metrics(state: web::Data<AppState>) -> HttpResponse {
    let metrics = state.get_metrics_snapshot();
    let uptime_seconds = state.get_uptime_seconds();

    let mut endpoint_stats: Vec<_> = metrics
        .endpoint_metrics
        .iter()
        .map(|(endpoint, metric)| {
            json!({
                "endpoint": endpoint,
                "request_count": metric.request_count,
                "error_count": metric.error_count,
                "error_rate": metric.error_rate(),
                "average_duration_ms": metric.average_duration_ms()
            })
        })
        .collect();
    endpoint_stats.sort_by(|a, b| a["endpoint"].as_str().cmp(&b["endpoint"].as_str()));

    let cleaning = &metrics.cleaning;

    HttpResponse::Ok().json(json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds,
        "overall": {
            "total_requests": metrics.request_count,
            "total_errors": metrics.error_count,
            "error_rate": if metrics.request_count > 0 {
                metrics.error_count as f64 / metrics.request_count as f64
            } else {
                0.0
            },
            "requests_per_second": if uptime_seconds > 0 {
                metrics.request_count as f64 / uptime_seconds as f64
            } else {
                0.0
            }
        },
        "cleaning": {
            "cleaned_requests": cleaning.cleaned_requests,
            "failed_requests": cleaning.failed_requests,
            "active_cleanings": metrics.active_cleanings,
            "total_frames": cleaning.total_frames,
            "fallback_frames": cleaning.fallback_frames,
            "fallback_rate": cleaning.fallback_rate(),
            "total_input_samples": cleaning.total_input_samples,
            "average_processing_ms": cleaning.average_processing_ms()
        },
        "endpoints": endpoint_stats,
        "memory": get_memory_info()
    }))
}

/// Resident and virtual memory from `/proc/self/status`, where available.
fn get_memory_info() -> serde_json::Value {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            return json!({
                "resident_memory_bytes": proc_status_bytes(&status, "VmRSS:"),
                "virtual_memory_bytes": proc_status_bytes(&status, "VmSize:"),
                "available": true
            });
        }
    }

    json!({
        "resident_memory_bytes": 0,
        "virtual_memory_bytes": 0,
        "available": false
    })
}

/// `VmRSS:   1234 kB` → 1263616
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn proc_status_bytes(status: &str, key: &str) -> u64 {
    status
        .lines()
        .find(|line| line.starts_with(key))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|kb| kb.parse::<u64>().ok())
        .map(|kb| kb * 1024)
        .unwrap_or(0)
}
