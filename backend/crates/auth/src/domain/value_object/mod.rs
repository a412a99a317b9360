//! Value Object Module

pub mod email;
pub mod identity_id;
pub mod user_password;
pub mod user_role;
pub mod verification_code;
