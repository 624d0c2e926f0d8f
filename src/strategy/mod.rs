//! Strategy module
//!
//! Contains the reward claim scheduler.

pub mod claimer;

pub use claimer::{evaluate_eligibility, AutoClaimer, ClaimReport, ClaimerConfig};
