// handlers/mod.rs - Handler tiers
//
// Public (no auth) → AI (JWT + per-user quota) → Admin (JWT + admin role)
//
// Each tier maps onto one or more route groups in `app.rs`, and each route
// group owns its own rate limiter.
pub mod admin;
pub mod ai;
pub mod public;
