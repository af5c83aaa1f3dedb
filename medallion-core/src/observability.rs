//! Observability boundary: events, metrics and traces.
//!
//! Stages report through the `Observability` trait. Calls never fail back into
//! the caller; a sink that cannot record something drops it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

/// Opaque id correlating a trace start with its end.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceId(pub String);

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait Observability: Send + Sync {
    fn log_event(&self, name: &str, payload: Value);

    fn track_metric(&self, name: &str, value: f64, dimensions: &[(&str, &str)]);

    fn start_trace(&self, name: &str, attributes: Value) -> TraceId;

    fn end_trace(&self, id: &TraceId, success: bool, attributes: Value);
}

/// Sink that writes everything as `tracing` events.
#[derive(Debug)]
pub struct TracingObservability {
    service_name: String,
    environment: String,
    counter: AtomicU64,
}

impl TracingObservability {
    pub fn new(service_name: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            environment: environment.into(),
            counter: AtomicU64::new(0),
        }
    }

    fn next_trace_id(&self, name: &str) -> TraceId {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.service_name.as_bytes());
        hasher.update(name.as_bytes());
        hasher.update(&Utc::now().timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
        hasher.update(&n.to_le_bytes());
        let hex = hasher.finalize().to_hex();
        TraceId(hex.as_str()[..16].to_string())
    }
}

impl Observability for TracingObservability {
    fn log_event(&self, name: &str, payload: Value) {
        if name.ends_with("_failed") {
            error!(
                service = %self.service_name,
                env = %self.environment,
                event = name,
                payload = %payload,
                "pipeline event"
            );
        } else {
            info!(
                service = %self.service_name,
                env = %self.environment,
                event = name,
                payload = %payload,
                "pipeline event"
            );
        }
    }

    fn track_metric(&self, name: &str, value: f64, dimensions: &[(&str, &str)]) {
        info!(
            service = %self.service_name,
            metric = name,
            value,
            dimensions = ?dimensions,
            "metric"
        );
    }

    fn start_trace(&self, name: &str, attributes: Value) -> TraceId {
        let id = self.next_trace_id(name);
        info!(trace_id = %id, trace = name, attributes = %attributes, "trace started");
        id
    }

    fn end_trace(&self, id: &TraceId, success: bool, attributes: Value) {
        info!(trace_id = %id, success, attributes = %attributes, "trace ended");
    }
}

/// One recorded observability call.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Event {
        name: String,
        payload: Value,
    },
    Metric {
        name: String,
        value: f64,
        dimensions: Vec<(String, String)>,
    },
    TraceStart {
        id: TraceId,
        name: String,
        attributes: Value,
    },
    TraceEnd {
        id: TraceId,
        success: bool,
        attributes: Value,
    },
}

/// Sink that keeps every call in memory, for tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingObservability {
    records: Mutex<Vec<Record>>,
    counter: AtomicU64,
}

impl RecordingObservability {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Record>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn records(&self) -> Vec<Record> {
        self.lock().clone()
    }

    /// Names of logged events, in call order.
    pub fn event_names(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|r| match r {
                Record::Event { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Payload of the first event called `name`.
    pub fn event(&self, name: &str) -> Option<Value> {
        self.lock().iter().find_map(|r| match r {
            Record::Event { name: n, payload } if n == name => Some(payload.clone()),
            _ => None,
        })
    }

    /// Values reported for metric `name`.
    pub fn metric_values(&self, name: &str) -> Vec<f64> {
        self.lock()
            .iter()
            .filter_map(|r| match r {
                Record::Metric { name: n, value, .. } if n == name => Some(*value),
                _ => None,
            })
            .collect()
    }

    /// (trace name, success) for every trace that has ended.
    pub fn finished_traces(&self) -> Vec<(String, bool)> {
        let records = self.lock();
        records
            .iter()
            .filter_map(|r| match r {
                Record::TraceEnd { id, success, .. } => records.iter().find_map(|s| match s {
                    Record::TraceStart { id: sid, name, .. } if sid == id => {
                        Some((name.clone(), *success))
                    }
                    _ => None,
                }),
                _ => None,
            })
            .collect()
    }
}

impl Observability for RecordingObservability {
    fn log_event(&self, name: &str, payload: Value) {
        self.lock().push(Record::Event {
            name: name.to_string(),
            payload,
        });
    }

    fn track_metric(&self, name: &str, value: f64, dimensions: &[(&str, &str)]) {
        self.lock().push(Record::Metric {
            name: name.to_string(),
            value,
            dimensions: dimensions
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
    }

    fn start_trace(&self, name: &str, attributes: Value) -> TraceId {
        let id = TraceId(format!("trace-{}", self.counter.fetch_add(1, Ordering::Relaxed)));
        self.lock().push(Record::TraceStart {
            id: id.clone(),
            name: name.to_string(),
            attributes,
        });
        id
    }

    fn end_trace(&self, id: &TraceId, success: bool, attributes: Value) {
        self.lock().push(Record::TraceEnd {
            id: id.clone(),
            success,
            attributes,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recording_keeps_order_and_pairs_traces() {
        let obs = RecordingObservability::new();
        let id = obs.start_trace("batch_process", json!({"tickers": 2}));
        obs.log_event("bronze_layer_load_started", json!({"ticker": "A"}));
        obs.track_metric("bronze_rows_written", 3.0, &[("ticker", "A")]);
        obs.end_trace(&id, true, json!({}));

        assert_eq!(obs.event_names(), vec!["bronze_layer_load_started"]);
        assert_eq!(obs.event("bronze_layer_load_started").unwrap()["ticker"], "A");
        assert_eq!(obs.metric_values("bronze_rows_written"), vec![3.0]);
        assert_eq!(obs.finished_traces(), vec![("batch_process".to_string(), true)]);
    }

    #[test]
    fn tracing_trace_ids_are_unique() {
        let obs = TracingObservability::new("medallion", "test");
        let a = obs.start_trace("t", Value::Null);
        let b = obs.start_trace("t", Value::Null);
        assert_ne!(a, b);
        assert_eq!(a.0.len(), 16);
        obs.end_trace(&a, true, Value::Null);
        obs.log_event("x_failed", json!({"error": "boom"}));
        obs.track_metric("m", 1.0, &[]);
    }
}
