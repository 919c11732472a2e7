// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every route here sits behind `require_auth`, which resolves the bearer
// token to a user and injects it as `Extension<CurrentUser>`.

pub mod auth; // Current user profile
pub mod notes; // PDF uploads, shared links, listings, deletion
