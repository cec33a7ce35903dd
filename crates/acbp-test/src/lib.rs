//! Shared test fixtures for ACBP crates.
//!
//! This crate provides model declarations and seeded observation samplers
//! for testing. It does NOT depend on `acbp-space` to avoid circular
//! dependencies.
//!
//! - [`clinic`] - Outpatient visit model with category-only rules
//! - [`inpatient`] - Admission model with bit and category-conditioned rules
//! - [`sampler`] - Seeded weighted sampling helpers
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! acbp-test = { workspace = true }
//! ```
//!
//! Then import the fixtures you need:
//!
//! ```ignore
//! use acbp_test::inpatient::{self, IN_ICU};
//!
//! let f = inpatient::function();
//! let rows = inpatient::sample_observations(7, 500);
//! ```

pub mod clinic;
pub mod inpatient;
pub mod sampler;

use tracing_subscriber::EnvFilter;

/// Installs a test-writer subscriber filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
