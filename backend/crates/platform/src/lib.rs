//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (CSPRNG bytes, URL-safe Base64)
//! - Password hashing (Argon2id with configurable cost)

pub mod crypto;
pub mod password;
