//! `PositionPhase` — decides whether to close, skip, or resize the exchange
//! position based on the liability threshold. See spec section 4.E.

use std::sync::Arc;

use crate::model::PositionDelta;
use crate::strategy::HedgingStrategy;

pub struct PositionPhase {
    strategy: Arc<dyn HedgingStrategy>,
    minimum_positive_liability_usd: f64,
}

impl PositionPhase {
    pub fn new(strategy: Arc<dyn HedgingStrategy>, minimum_positive_liability_usd: f64) -> Self {
        Self {
            strategy,
            minimum_positive_liability_usd,
        }
    }

    /// Returns `(position_skipped, position_result)`, matching the two
    /// `TickOutcome` fields this phase owns.
    pub async fn run(
        &self,
        usd_liability: f64,
        btc_price_in_usd: f64,
    ) -> (bool, Option<Result<PositionDelta, String>>) {
        if usd_liability < self.minimum_positive_liability_usd {
            // Fire-and-advance: the strategy owns its own idempotence, and
            // the close_position outcome is surfaced only through
            // telemetry, never through the tick's Result (spec section 9).
            let _ = self.strategy.close_position().await;
            (true, None)
        } else {
            let result = self
                .strategy
                .update_position(usd_liability, btc_price_in_usd)
                .await
                .map_err(|e| e.to_string());
            (false, Some(result))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DealerError;
    use crate::strategy::MockHedgingStrategy;
    use serde_json::json;

    #[tokio::test]
    async fn below_threshold_closes_and_skips_update() {
        let mut strategy = MockHedgingStrategy::new();
        strategy.expect_close_position().times(1).returning(|| Ok(()));
        strategy.expect_update_position().times(0);

        let phase = PositionPhase::new(Arc::new(strategy), 5.0);
        let (skipped, result) = phase.run(2.0, 50_000.0).await;
        assert!(skipped);
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn at_or_above_threshold_updates_position_exactly_once() {
        let mut strategy = MockHedgingStrategy::new();
        strategy.expect_close_position().times(0);
        strategy
            .expect_update_position()
            .withf(|liability, price| *liability == 1000.0 && *price == 50_000.0)
            .times(1)
            .returning(|_, _| {
                Ok(PositionDelta {
                    original_position: json!(0),
                    updated_position: json!(-0.02),
                })
            });

        let phase = PositionPhase::new(Arc::new(strategy), 5.0);
        let (skipped, result) = phase.run(1000.0, 50_000.0).await;
        assert!(!skipped);
        assert!(result.unwrap().is_ok());
    }

    #[tokio::test]
    async fn close_position_error_is_swallowed_not_surfaced() {
        let mut strategy = MockHedgingStrategy::new();
        strategy
            .expect_close_position()
            .times(1)
            .returning(|| Err(DealerError::Strategy("exchange down".into())));

        let phase = PositionPhase::new(Arc::new(strategy), 5.0);
        let (skipped, result) = phase.run(0.0, 50_000.0).await;
        assert!(skipped);
        assert!(result.is_none());
    }
}
