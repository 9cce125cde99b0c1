//! Company Transfer Workflow
//!
//! Moves an employee between companies (inter) or between branches and
//! departments of one company (intra), temporarily or permanently.
//!
//! # State Machine
//!
//! ```text
//! DRAFT → SUBMIT → APPROVE → TRANSFER → PROBATION
//!   ↓       ↓  ↓       ↓         ↓          ↓
//! CANCEL  CANCEL REJECT CANCEL   REVERSE ← ──┘
//! ```
//!
//! `set_draft` returns any request to DRAFT regardless of state.
//!
//! # Invariants
//!
//! 1. **Check-Before-Write**: every precondition of a transition (role, state,
//!    company setup, gratuity inputs) is checked before the first host write
//! 2. **Union Access**: execution and reversal only ever add company/branch
//!    access, they never revoke it
//! 3. **Balanced Books**: each gratuity entry is self-balancing in its own
//!    company's ledger

pub mod adapters;
pub mod coordinator;
pub mod db;
pub mod effects;
pub mod error;
pub mod ledger;
pub mod notify;
pub mod payslip;
pub mod state;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports for convenience
pub use coordinator::{Collaborators, CoordinatorSettings, TransferCoordinator};
pub use db::PgTransferStore;
pub use error::{ErrorKind, TransferError};
pub use notify::{LogNotifier, Notification, TransferEvent};
pub use state::TransferState;
pub use types::{
    Actor, DestinationInput, LeaveSummary, Role, SideAttributes, TransferDraft, TransferId,
    TransferKind, TransferMode, TransferRequest,
};
