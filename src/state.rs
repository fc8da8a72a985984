//! # Application State Management
//!
//! Shared state accessed by every HTTP request handler: runtime configuration,
//! request and cleaning metrics, and the one noise suppression pipeline.
//!
//! ## Arc<RwLock<T>> / Arc<Mutex<T>>
//! - **Config and metrics** are read far more often than written, so they sit
//!   behind `RwLock`s.
//! - **The pipeline** owns a stateful suppressor whose output depends on frame
//!   order, so it sits behind a `Mutex`: one request cleans at a time.

use crate::audio::pipeline::CleanReport;
use crate::audio::{CleaningPipeline, NoiseSuppressor};
use crate::config::AppConfig;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

/// The suppression pipeline as shared between workers.
pub type SharedPipeline = Arc<Mutex<CleaningPipeline<Box<dyn NoiseSuppressor>>>>;

/// The main application state that's shared across all HTTP request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration (can be updated at runtime)
    pub config: Arc<RwLock<AppConfig>>,

    /// Performance metrics (updated by middleware and the cleaning handler)
    pub metrics: Arc<RwLock<AppMetrics>>,

    /// `None` when suppression is disabled; cleaning requests then get 503
    pub pipeline: Option<SharedPipeline>,

    /// Name of the loaded suppressor backend, for health reports
    pub suppressor_name: Option<String>,

    /// When the server started
    pub start_time: Instant,
}

/// Metrics collected across all HTTP requests.
#[derive(Debug, Default)]
pub struct AppMetrics {
    /// Total number of HTTP requests processed since server start
    pub request_count: u64,

    /// Total number of errors encountered since server start
    pub error_count: u64,

    /// Cleaning requests currently in progress
    pub active_cleanings: u32,

    /// Audio cleaning statistics
    pub cleaning: CleaningMetrics,

    /// Key: endpoint name (e.g., "POST /clean-audio")
    pub endpoint_metrics: HashMap<String, EndpointMetric>,
}

/// Totals over every successful `clean` call.
#[derive(Debug, Default, Clone)]
pub struct CleaningMetrics {
    pub cleaned_requests: u64,
    pub failed_requests: u64,
    pub total_frames: u64,
    pub fallback_frames: u64,
    pub total_input_samples: u64,
    pub total_processing_ms: u64,
}

impl CleaningMetrics {
    pub fn average_processing_ms(&self) -> f64 {
        if self.cleaned_requests > 0 {
            self.total_processing_ms as f64 / self.cleaned_requests as f64
        } else {
            0.0
        }
    }

    /// Share of frames that fell back to pass-through (0.0 to 1.0).
    pub fn fallback_rate(&self) -> f64 {
        if self.total_frames > 0 {
            self.fallback_frames as f64 / self.total_frames as f64
        } else {
            0.0
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct EndpointMetric {
    pub request_count: u64,
    pub total_duration_ms: u64,
    pub error_count: u64,
}

impl AppState {
    /// Create state without a suppressor (suppression disabled).
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            metrics: Arc::new(RwLock::new(AppMetrics::default())),
            pipeline: None,
            suppressor_name: None,
            start_time: Instant::now(),
        }
    }

    /// Create state around an already-built suppressor.
    ///
    /// The suppressor is injected by the host so tests can hand in fakes and
    /// deployments can choose the backend.
    pub fn with_suppressor(config: AppConfig, suppressor: Box<dyn NoiseSuppressor>) -> Self {
        let pipeline = CleaningPipeline::new(suppressor);
        let suppressor_name = pipeline.suppressor_name().to_string();
        Self {
            pipeline: Some(Arc::new(Mutex::new(pipeline))),
            suppressor_name: Some(suppressor_name),
            ..Self::new(config)
        }
    }

    pub fn is_suppressor_loaded(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Get a copy of the current configuration.
    ///
    /// Cloning releases the lock immediately, so other threads aren't blocked.
    pub fn get_config(&self) -> AppConfig {
        self.config.read().unwrap().clone()
    }

    /// Replace the configuration if it validates.
    pub fn update_config(&self, new_config: AppConfig) -> Result<(), String> {
        match new_config.validate() {
            Ok(_) => {
                *self.config.write().unwrap() = new_config;
                Ok(())
            }
            Err(e) => Err(e.to_string()),
        }
    }

    pub fn increment_request_count(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.request_count += 1;
    }

    pub fn increment_error_count(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.error_count += 1;
    }

    pub fn record_endpoint_request(&self, endpoint: &str, duration_ms: u64, is_error: bool) {
        let mut metrics = self.metrics.write().unwrap();

        let endpoint_metric = metrics.endpoint_metrics.entry(endpoint.to_string()).or_default();

        endpoint_metric.request_count += 1;
        endpoint_metric.total_duration_ms += duration_ms;

        if is_error {
            endpoint_metric.error_count += 1;
        }
    }

    pub fn begin_cleaning(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.active_cleanings += 1;
    }

    /// Decrement the in-progress counter (never below zero).
    pub fn end_cleaning(&self) {
        let mut metrics = self.metrics.write().unwrap();
        if metrics.active_cleanings > 0 {
            metrics.active_cleanings -= 1;
        }
    }

    /// Fold one successful cleaning into the totals.
    pub fn record_cleaning(&self, report: &CleanReport) {
        let mut metrics = self.metrics.write().unwrap();
        let cleaning = &mut metrics.cleaning;
        cleaning.cleaned_requests += 1;
        cleaning.total_frames += report.frames as u64;
        cleaning.fallback_frames += report.fallback_frames as u64;
        cleaning.total_input_samples += report.input_samples as u64;
        cleaning.total_processing_ms += report.processing_time_ms;
    }

    pub fn record_cleaning_failure(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.cleaning.failed_requests += 1;
    }

    /// Get a snapshot of current metrics (used for /health and /metrics).
    pub fn get_metrics_snapshot(&self) -> AppMetrics {
        let metrics = self.metrics.read().unwrap();
        AppMetrics {
            request_count: metrics.request_count,
            error_count: metrics.error_count,
            active_cleanings: metrics.active_cleanings,
            cleaning: metrics.cleaning.clone(),
            endpoint_metrics: metrics.endpoint_metrics.clone(),
        }
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl EndpointMetric {
    pub fn average_duration_ms(&self) -> f64 {
        if self.request_count > 0 {
            self.total_duration_ms as f64 / self.request_count as f64
        } else {
            0.0
        }
    }

    pub fn error_rate(&self) -> f64 {
        if self.request_count > 0 {
            self.error_count as f64 / self.request_count as f64
        } else {
            0.0
        }
    }
}
