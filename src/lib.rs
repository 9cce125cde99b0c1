//! Company Transfer - HR transfer workflow service
//!
//! Moves employees between companies, branches and departments, books the
//! end-of-service gratuity in both companies' ledgers and keeps contracts and
//! access in step with each transition.
//!
//! # Modules
//!
//! - [`core_types`] - Host record id aliases
//! - [`models`] - Host platform records (employee, contract, journal entry, ...)
//! - [`gratuity`] - End-of-service benefit calculator
//! - [`transfer`] - Transfer state machine and collaborator traits
//! - [`gateway`] - HTTP API
//! - [`config`] / [`logging`] - Ambient setup

// Core types - must be first!
pub mod core_types;

pub mod config;
pub mod demo;
pub mod gateway;
pub mod gratuity;
pub mod logging;
pub mod models;
pub mod transfer;

// Convenient re-exports at crate root
pub use gratuity::{GratuityBreakdown, GratuityCalculator, GratuityError, GratuityInput};
pub use transfer::{
    Actor, Collaborators, CoordinatorSettings, TransferCoordinator, TransferError, TransferKind,
    TransferMode, TransferRequest, TransferState,
};
