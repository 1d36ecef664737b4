// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (bearer token resolved to a user by
// `middleware::jwt_auth_middleware`)
pub mod extract;
pub mod protected;
pub mod public;
