//! Core control-loop library: reconciles in-flight transfers, decides
//! whether to resize or close the hedge position, and rebalances leverage
//! against the exchange. Binaries wire concrete wallet/strategy/ledger
//! implementations together and drive `control_loop::ControlLoop::tick`.

pub mod callbacks;
pub mod config;
pub mod control_loop;
pub mod error;
pub mod ledger;
pub mod model;
pub mod paper;
pub mod position;
pub mod rebalance;
pub mod reconciler;
pub mod server;
pub mod strategy;
pub mod telemetry;
pub mod wallet;

pub use control_loop::ControlLoop;
pub use error::DealerError;
