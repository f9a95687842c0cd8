//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring a deal.
//!
//! # Metrics
//!
//! - `deal_invest_total` - Total accepted invest calls
//! - `deal_invest_refunded_units` - Units refunded as over-target excess
//! - `deal_purchases_total` - Total completed purchases
//! - `deal_notifications_total` - Total authenticated deal notifications
//! - `deal_rejections_total` - Total rejected operations
//! - `deal_invested_units` - Current escrowed total
//! - `deal_state_code` - Numeric code of the current state

use prometheus::{IntCounter, IntGauge, Registry};
use std::fmt;
use std::sync::Arc;

/// Metrics collector
///
/// Each collector owns its registry, so independent deals in one process
/// never collide on metric names.
#[derive(Clone)]
pub struct Metrics {
    /// Total accepted invest calls
    pub invest_total: IntCounter,

    /// Units refunded as over-target excess
    pub invest_refunded_units: IntCounter,

    /// Total completed purchases
    pub purchases_total: IntCounter,

    /// Total authenticated deal notifications
    pub notifications_total: IntCounter,

    /// Total rejected operations
    pub rejections_total: IntCounter,

    /// Current escrowed total
    pub invested_units: IntGauge,

    /// Numeric code of the current state
    pub state_code: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let invest_total =
            IntCounter::new("deal_invest_total", "Total accepted invest calls")?;
        registry.register(Box::new(invest_total.clone()))?;

        let invest_refunded_units = IntCounter::new(
            "deal_invest_refunded_units",
            "Units refunded as over-target excess",
        )?;
        registry.register(Box::new(invest_refunded_units.clone()))?;

        let purchases_total =
            IntCounter::new("deal_purchases_total", "Total completed purchases")?;
        registry.register(Box::new(purchases_total.clone()))?;

        let notifications_total = IntCounter::new(
            "deal_notifications_total",
            "Total authenticated deal notifications",
        )?;
        registry.register(Box::new(notifications_total.clone()))?;

        let rejections_total =
            IntCounter::new("deal_rejections_total", "Total rejected operations")?;
        registry.register(Box::new(rejections_total.clone()))?;

        let invested_units = IntGauge::new("deal_invested_units", "Current escrowed total")?;
        registry.register(Box::new(invested_units.clone()))?;

        let state_code = IntGauge::new("deal_state_code", "Numeric code of the current state")?;
        registry.register(Box::new(state_code.clone()))?;

        Ok(Self {
            invest_total,
            invest_refunded_units,
            purchases_total,
            notifications_total,
            rejections_total,
            invested_units,
            state_code,
            registry,
        })
    }

    /// Record an accepted invest call
    pub fn record_invest(&self, refunded_units: u128) {
        self.invest_total.inc();
        // Saturate rather than wrap if a refund ever exceeds u64 units
        self.invest_refunded_units
            .inc_by(u64::try_from(refunded_units).unwrap_or(u64::MAX));
    }

    /// Record a completed purchase
    pub fn record_purchase(&self) {
        self.purchases_total.inc();
    }

    /// Record an authenticated notification
    pub fn record_notification(&self) {
        self.notifications_total.inc();
    }

    /// Record a rejected operation
    pub fn record_rejection(&self) {
        self.rejections_total.inc();
    }

    /// Update the escrowed-total gauge
    pub fn update_invested(&self, units: u128) {
        self.invested_units
            .set(i64::try_from(units).unwrap_or(i64::MAX));
    }

    /// Update the state gauge
    pub fn update_state(&self, code: u8) {
        self.state_code.set(i64::from(code));
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics")
            .field("invest_total", &self.invest_total.get())
            .field("purchases_total", &self.purchases_total.get())
            .field("rejections_total", &self.rejections_total.get())
            .field("state_code", &self.state_code.get())
            .finish_non_exhaustive()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.invest_total.get(), 0);
        assert_eq!(metrics.purchases_total.get(), 0);
    }

    #[test]
    fn test_record_invest() {
        let metrics = Metrics::new().unwrap();
        metrics.record_invest(0);
        metrics.record_invest(10);
        assert_eq!(metrics.invest_total.get(), 2);
        assert_eq!(metrics.invest_refunded_units.get(), 10);
    }

    #[test]
    fn test_independent_registries() {
        // Two collectors must not collide on metric names
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.record_purchase();
        assert_eq!(a.purchases_total.get(), 1);
        assert_eq!(b.purchases_total.get(), 0);
    }

    #[test]
    fn test_gauges() {
        let metrics = Metrics::new().unwrap();
        metrics.update_invested(100);
        metrics.update_state(2);
        assert_eq!(metrics.invested_units.get(), 100);
        assert_eq!(metrics.state_code.get(), 2);
    }
}
