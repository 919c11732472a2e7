// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition and liveness. Nothing here may assume a user context, so
// every input is validated from scratch.

pub mod auth;
pub mod health;

pub use health::health;
