//! AWS-oriented adapters and handlers for user registration.
//!
//! This crate owns runtime integration details (the Lambda handler and the
//! DynamoDB storage adapter) and keeps the contract and record primitives in
//! `user_registration_core`.

pub mod adapters;
pub mod handlers;
