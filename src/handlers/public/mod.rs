// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Security Level: None
// Route Prefix: No /api prefix (e.g., /auth/login)
pub mod auth;
pub mod root;

pub use root::{health, root};
