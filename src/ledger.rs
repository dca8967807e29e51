//! Cost & Cache Ledger: accumulates per-stage API cost across a pipeline
//! run, grounded on the teacher's `usage_tracker::UsageTracker`
//! accumulate-and-report shape.

use serde::{Deserialize, Serialize};

/// Accumulated API cost for one document's pipeline run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CostLedger {
    pub cost_ocr: f64,
    pub cost_llm: f64,
}

impl CostLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_ocr(&mut self, cost: f64) {
        self.cost_ocr += cost;
    }

    pub fn record_llm(&mut self, cost: f64) {
        self.cost_llm += cost;
    }

    pub fn cost_total(&self) -> f64 {
        self.cost_ocr + self.cost_llm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_across_stages() {
        let mut ledger = CostLedger::new();
        ledger.record_ocr(0.50);
        ledger.record_llm(0.10);
        ledger.record_llm(0.05);
        assert!((ledger.cost_total() - 0.65).abs() < 1e-9);
    }

    #[test]
    fn skip_ocr_reuse_leaves_cost_ocr_at_zero() {
        let ledger = CostLedger::new();
        assert_eq!(ledger.cost_ocr, 0.0);
    }
}
