//! Batch report returned by the orchestrator.

use serde::{Deserialize, Serialize};

use crate::gold::GoldKeys;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TickerOutcome {
    Success {
        price_points: usize,
        bronze_key: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        silver_key: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        indicators_calculated: Option<usize>,
        gold_keys: GoldKeys,
    },
    Error {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerReport {
    pub ticker: String,
    #[serde(flatten)]
    pub outcome: TickerOutcome,
}

impl TickerReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, TickerOutcome::Success { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            TickerOutcome::Error { error } => Some(error),
            TickerOutcome::Success { .. } => None,
        }
    }
}

/// Per-invocation summary. `successful + failed == total` always.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: String,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// One entry per requested ticker, in request order.
    pub results: Vec<TickerReport>,
}

impl BatchReport {
    pub fn from_results(batch_id: impl Into<String>, results: Vec<TickerReport>) -> Self {
        let total = results.len();
        let failed = results.iter().filter(|r| !r.is_success()).count();
        Self {
            batch_id: batch_id.into(),
            total,
            successful: total - failed,
            failed,
            results,
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = (&str, &str)> {
        self.results
            .iter()
            .filter_map(|r| r.error().map(|e| (r.ticker.as_str(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(ticker: &str) -> TickerReport {
        TickerReport {
            ticker: ticker.to_string(),
            outcome: TickerOutcome::Success {
                price_points: 3,
                bronze_key: format!("bronze/{ticker}/k.parquet"),
                silver_key: None,
                indicators_calculated: None,
                gold_keys: GoldKeys::default(),
            },
        }
    }

    fn failed(ticker: &str) -> TickerReport {
        TickerReport {
            ticker: ticker.to_string(),
            outcome: TickerOutcome::Error {
                error: "boom".to_string(),
            },
        }
    }

    #[test]
    fn counts_add_up() {
        let r = BatchReport::from_results("batch_1", vec![ok("A"), failed("B"), ok("C")]);
        assert_eq!((r.total, r.successful, r.failed), (3, 2, 1));
        assert_eq!(r.errors().collect::<Vec<_>>(), vec![("B", "boom")]);
    }

    #[test]
    fn json_shape_is_tagged_by_status() {
        let v = serde_json::to_value(BatchReport::from_results("b", vec![ok("A"), failed("B")])).unwrap();
        assert_eq!(v["results"][0]["status"], "success");
        assert_eq!(v["results"][0]["ticker"], "A");
        assert!(v["results"][0].get("silver_key").is_none());
        assert_eq!(v["results"][1]["status"], "error");
        assert_eq!(v["results"][1]["error"], "boom");
    }
}
