//! Credential hashing for the tealeaf storefront. One PBKDF2 implementation
//! serves admin login, customer login, and the seeding CLI, so stored values
//! written by any of them verify in all of them.

pub mod accounts;
pub mod config;
pub mod crypto;
pub mod telemetry;
