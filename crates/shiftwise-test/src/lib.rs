//! Shared test fixtures for Shiftwise crates.
//!
//! This crate provides data builders and canned scenarios for testing.
//! It depends only on `shiftwise-core` so every other crate can use it as a
//! dev-dependency without circular dependencies.
//!
//! - [`time`] - `date` / `at` / `utc` helpers for readable timestamps
//! - [`plan`] - plan and assignment builders, canned conflict scenarios
//! - [`rules`] - rule definitions used across loader, detector and engine tests
//! - [`roster`] - employee profiles, leave and staffing demand
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! shiftwise-test = { workspace = true }
//! ```
//!
//! ```
//! use shiftwise_test::plan::overlap_plan;
//!
//! let plan = overlap_plan();
//! assert_eq!(plan.assignments.len(), 2);
//! ```

pub mod plan;
pub mod roster;
pub mod rules;
pub mod time;

pub use plan::{assign, PlanBuilder};
pub use time::{at, date, utc};
