//! Error taxonomy for the dealer control loop.
//!
//! Every external collaborator (wallet, strategy, ledger) returns
//! `Result<_, DealerError>` directly — no `anyhow::Error` crosses a trait
//! method boundary, so `ControlLoop` can match on variant when it selects
//! which error to surface (see `control_loop::aggregate`).

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum DealerError {
    /// Missing strategy/wallet selector, or an invalid threshold, at
    /// construction time. Fatal; never surfaced from `tick()`.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The wallet or the exchange (via the strategy) returned a failure, or
    /// a value that isn't finite where a finite one was required.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// A precondition the tick cannot proceed without was violated, e.g. a
    /// missing on-chain deposit address.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// A ledger insert/query/mark-complete call failed.
    #[error("ledger error: {0}")]
    Ledger(String),

    /// An opaque failure surfaced from a `HedgingStrategy` operation.
    #[error("strategy error: {0}")]
    Strategy(String),
}

impl DealerError {
    /// The literal the aggregation step in `ControlLoop::tick` falls back to
    /// when neither phase result actually carries an error (spec: "unknown
    /// cases collapse to 'Unknown error'"). Kept as a constructor so call
    /// sites read as intentional rather than an ad-hoc string literal.
    pub fn unknown() -> Self {
        DealerError::Strategy("Unknown error".to_string())
    }
}
