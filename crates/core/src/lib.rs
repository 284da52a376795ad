//! Core business logic for Notara.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `permission` - Permission flags, principal snapshots, and the permission gate
//! - `period` - Accounting period state machine, closing and reopening engines
//! - `release` - Invoice release domain types and validation
//! - `storage` - Object storage service for release images and XML payloads

pub mod period;
pub mod permission;
pub mod release;
pub mod storage;
