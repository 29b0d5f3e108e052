//! Data model for the dealer control loop: in-flight transfers and the
//! per-tick outcome record. See spec section 3.

use serde::{Deserialize, Serialize};

pub const SATS_PER_BTC: f64 = 100_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferDirection {
    DepositToExchange,
    WithdrawFromExchange,
}

impl TransferDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferDirection::DepositToExchange => "deposit_to_exchange",
            TransferDirection::WithdrawFromExchange => "withdraw_from_exchange",
        }
    }
}

/// An on-chain transfer the dealer initiated but that has not yet been
/// observed as settled. `direction` and `size_sats` are fixed at
/// construction and never mutated; only `completed` ever changes, and only
/// from false to true, and only by the reconciler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub direction: TransferDirection,
    pub address: String,
    pub size_sats: u64,
    pub memo: String,
    pub completed: bool,
}

impl Transfer {
    pub fn new_pending(
        direction: TransferDirection,
        address: impl Into<String>,
        size_sats: u64,
        memo: impl Into<String>,
    ) -> Self {
        Self {
            direction,
            address: address.into(),
            size_sats,
            memo: memo.into(),
            completed: false,
        }
    }
}

/// Opaque payload returned by `HedgingStrategy::update_position`. The core
/// never inspects its contents; it only logs it verbatim. Wrapped around a
/// JSON value (rather than an associated type) so `dyn HedgingStrategy`
/// stays object-safe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionDelta {
    pub original_position: serde_json::Value,
    pub updated_position: serde_json::Value,
}

/// Opaque payload returned by `HedgingStrategy::update_leverage`. Logged
/// verbatim, never inspected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeverageDelta(pub serde_json::Value);

/// The result of one tick. Exactly one of `{skipped, result}` is populated
/// per phase — there is no code path that produces both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickOutcome {
    pub position_skipped: bool,
    pub position_result: Option<Result<PositionDelta, String>>,
    pub leverage_skipped: bool,
    pub leverage_result: Option<Result<LeverageDelta, String>>,
}

impl TickOutcome {
    pub fn position_failed(&self) -> bool {
        matches!(self.position_result, Some(Err(_)))
    }

    pub fn leverage_failed(&self) -> bool {
        matches!(self.leverage_result, Some(Err(_)))
    }

    pub fn is_success(&self) -> bool {
        !self.position_failed() && !self.leverage_failed()
    }
}

/// Round a BTC amount to 8 decimal places (1 sat) of precision, to avoid
/// sub-satoshi drift across halving retries.
pub fn round_btc(btc: f64) -> f64 {
    (btc * SATS_PER_BTC).round() / SATS_PER_BTC
}

/// Convert a (rounded) BTC amount to an integer satoshi count.
pub fn btc_to_sats(btc: f64) -> u64 {
    (btc * SATS_PER_BTC).round().max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_btc_kills_sub_satoshi_drift() {
        let halved = round_btc(0.4 / 2.0);
        assert_eq!(halved, 0.2);
        let halved_again = round_btc(halved / 2.0);
        assert_eq!(halved_again, 0.1);
    }

    #[test]
    fn btc_to_sats_matches_spec_example() {
        assert_eq!(btc_to_sats(0.1), 10_000_000);
    }

    #[test]
    fn tick_outcome_success_requires_no_phase_failure() {
        let outcome = TickOutcome {
            position_skipped: true,
            position_result: None,
            leverage_skipped: false,
            leverage_result: Some(Err("boom".to_string())),
        };
        assert!(!outcome.is_success());
        assert!(outcome.leverage_failed());
        assert!(!outcome.position_failed());
    }
}
