//! Portfolio Item Verification
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository and collaborator traits
//! - `application/` - Use cases
//! - `infra/` - PostgreSQL stores, email notifier and templates
//! - `presentation/` - HTTP handlers, DTOs, identity middleware
//!
//! ## Model
//! - A request moves PENDING -> APPROVED | REJECTED exactly once
//! - Expiry is judged at read time; an expired PENDING request is dead
//! - At most one live PENDING request per item (atomic check-and-insert)
//! - Decisions are a conditional update, so concurrent decisions cannot both win
//! - The emailed token is the only credential for the unauthenticated verifier
//! - Dead, unknown and already-decided links look identical to the caller
//! - Audit log writes and notifications never fail the operation

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::VerificationConfig;
pub use error::{VerificationError, VerificationResult};
pub use infra::postgres::PgVerificationRepository;
pub use presentation::router::{verification_router, verification_router_generic};
