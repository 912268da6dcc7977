// handlers/public/auth/mod.rs - Token acquisition
pub mod login; // POST /auth/login - authenticate and get JWT

pub use login::login_post;
