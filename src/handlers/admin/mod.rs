// handlers/admin/mod.rs - Admin handlers (JWT + admin role required)
//
// Route groups carry separate rate limit quotas:
//   /api/admin/security/*  users, roles, token inspection
//   /api/admin/settings/*  platform configuration

pub mod security;
pub mod settings;
