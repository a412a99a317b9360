//! Infrastructure Layer
//!
//! Database implementations and external service integrations.

pub mod mail;
pub mod memory;
pub mod postgres;

pub use mail::{AppMailer, HttpMailer, LogMailer};
pub use memory::MemoryAuthRepository;
pub use postgres::PgAuthRepository;
