// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (JWT auth, validated user and school)
pub mod protected; // JWT authentication required (/api/*)
pub mod public; // No authentication required (/, /health, /auth/*)
