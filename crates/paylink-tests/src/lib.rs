//! Integration test infrastructure for Paylink.
//!
//! Runs the real HTTP server on an ephemeral port, backed by an in-memory
//! payment provider and a webhook handler that records what it was given.
//!
//! # Usage
//!
//! ```ignore
//! use paylink_tests::{TestConfig, TestContext};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let ctx = TestContext::start(TestConfig::default()).await.unwrap();
//!     // Use ctx.client, ctx.provider, ctx.handler
//! }
//! ```

pub mod context;
pub mod fixtures;
pub mod helpers;
pub mod mocks;

pub use context::{TestConfig, TestContext};
pub use fixtures::*;
pub use helpers::*;
pub use mocks::*;

/// Initialize test logging (call once per test binary).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,paylink_tests=debug")),
        )
        .with_test_writer()
        .try_init();
}
