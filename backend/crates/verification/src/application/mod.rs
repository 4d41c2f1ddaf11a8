//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.
//! Contains use case implementations.

pub mod audit;
pub mod config;
pub mod decide;
pub mod dispatch;
pub mod history;
pub mod request_verification;
pub mod review;
pub mod withdraw;
