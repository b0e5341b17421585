//! Search orchestration: concurrent dispatch, dedup, scoring, ranking.
//!
//! [`dispatch::Dispatcher`] fans a parsed query out to the eligible
//! engines and collects their settled outcomes; [`rank::rank`] fuses the
//! successful result lists into one ordered list.

pub mod dedup;
pub mod dispatch;
pub mod rank;
pub mod scoring;
pub mod url_normalize;

pub use dispatch::{DispatchOutcome, Dispatcher};
pub use rank::rank;
