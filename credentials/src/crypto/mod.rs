//! Central cryptography module. `passwords` owns the PBKDF2 parameters and the
//! hash/verify pair; `stored` owns the byte layout of the persisted value.

pub mod passwords;
pub mod stored;
