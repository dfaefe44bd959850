//! Beat tracking modules
//!
//! Follow candidate beat periods through the onset sequence:
//! - Hypothesis agents with bounded tempo drift
//! - Priority-queue population sweep with forking, dedup, and expiry

pub mod population;
pub mod tracker;
