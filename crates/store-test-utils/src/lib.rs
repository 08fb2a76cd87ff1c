//! # Store Test Utilities
//!
//! Shared test utilities for the music store gateway.
//!
//! This crate provides:
//! - Server test harness (`TestStoreServer` for E2E tests)
//! - Access token builders (`TestTokenBuilder`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use store_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<()> {
//!     let server = TestStoreServer::spawn(Arc::new(MemoryStore::new())).await?;
//!     let token = TestTokenBuilder::new().for_email("alice@example.com").sign();
//!
//!     let response = reqwest::Client::new()
//!         .get(format!("{}/user", server.url()))
//!         .bearer_auth(token)
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use server_harness::*;
pub use token_builders::*;
