//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, request authenticator and access guard.

pub mod dto;
pub mod guard;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use guard::{AuthenticatedIdentity, CurrentIdentity, check};
pub use handlers::AuthAppState;
pub use middleware::attach_identity;
pub use router::{auth_router, auth_router_generic};
