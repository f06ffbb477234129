//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and middleware.

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use extractors::{JsonBody, QueryParams, SignedIn};
pub use handlers::{AppState, Viewer};
pub use middleware::{ban_gate, resolve_identity};
pub use router::{community_router, community_router_generic};
