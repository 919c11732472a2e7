// handlers/public/auth/mod.rs - Account creation and token acquisition

pub mod login; // POST /api/auth/login - verify credentials, issue JWT
pub mod register; // POST /api/auth/register - create account (multipart)

pub use login::login_post;
pub use register::register_post;
