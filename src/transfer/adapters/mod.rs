//! Host Collaborators
//!
//! Traits for the host HR platform services a transfer touches. The
//! coordinator never talks to a database or mail server directly; it sequences
//! calls through these seams.
//!
//! Every method either completes or returns an error. A failing call aborts
//! the transition; rollback of already-applied effects belongs to the host's
//! unit of work.

pub mod memory;

pub use memory::{
    MemoryContracts, MemoryDirectory, MemoryLeave, MemoryLedger, MemoryPayroll,
    MemoryTransferStore, RecordingNotifier,
};

use async_trait::async_trait;

use super::error::TransferError;
use super::notify::Notification;
use super::state::TransferState;
use super::types::{TransferId, TransferKind, TransferRequest};
use crate::core_types::{CompanyId, ContractId, EmployeeId, EntryId, PayslipId, UserId};
use crate::models::{
    AccessUpdate, Company, Contract, Employee, EmployeeUpdate, JournalEntry, LeaveReportLine,
    NewContract, NewPayslip, PostedEntry, UserAccess,
};

/// Employee directory: employee records and their login access
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn employee(&self, id: EmployeeId) -> anyhow::Result<Option<Employee>>;

    async fn update_employee(&self, id: EmployeeId, update: &EmployeeUpdate)
    -> anyhow::Result<()>;

    async fn user_access(&self, user_id: UserId) -> anyhow::Result<Option<UserAccess>>;

    /// Switch default company/branch and add them to the allowed sets
    async fn grant_access(&self, user_id: UserId, update: AccessUpdate) -> anyhow::Result<()>;
}

/// Contract registry
#[async_trait]
pub trait ContractRegistry: Send + Sync {
    async fn contracts_for(&self, employee_id: EmployeeId) -> anyhow::Result<Vec<Contract>>;

    async fn create(&self, contract: NewContract) -> anyhow::Result<ContractId>;

    async fn cancel(&self, id: ContractId) -> anyhow::Result<()>;
}

/// Accounting ledger
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Company accounting setup (journal and gratuity accounts)
    async fn company(&self, id: CompanyId) -> anyhow::Result<Option<Company>>;

    async fn create_entry(&self, entry: JournalEntry) -> anyhow::Result<EntryId>;

    /// Finalize an entry
    async fn post(&self, id: EntryId) -> anyhow::Result<()>;

    /// Entries booked for a transfer reference
    async fn entries_for(&self, transfer_ref: &str) -> anyhow::Result<Vec<PostedEntry>>;
}

/// Leave/allocation service (read-only here)
#[async_trait]
pub trait LeaveService: Send + Sync {
    async fn leave_report(&self, employee_id: EmployeeId) -> anyhow::Result<Vec<LeaveReportLine>>;
}

/// Payroll service
#[async_trait]
pub trait PayrollService: Send + Sync {
    async fn create_payslip(&self, payslip: NewPayslip) -> anyhow::Result<PayslipId>;

    /// Compute salary lines for a payslip
    async fn compute_sheet(&self, id: PayslipId) -> anyhow::Result<()>;
}

/// Notification delivery (template rendering and mail transport live here)
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// Persistence for transfer requests
#[async_trait]
pub trait TransferStore: Send + Sync {
    async fn get(&self, id: TransferId) -> Result<Option<TransferRequest>, TransferError>;

    /// Insert or replace
    async fn save(&self, request: &TransferRequest) -> Result<(), TransferError>;

    /// Atomic CAS: set the state to `to` only if it is still `from`
    ///
    /// Returns false when the stored state differs (another caller moved it).
    async fn update_state_if(
        &self,
        id: TransferId,
        from: TransferState,
        to: TransferState,
    ) -> Result<bool, TransferError>;

    /// Next value of the per-kind reference sequence (starts at 1)
    async fn next_sequence(&self, kind: TransferKind) -> Result<u64, TransferError>;

    async fn list_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Vec<TransferRequest>, TransferError>;
}
