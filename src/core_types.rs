//! Core types used throughout the system
//!
//! Identifiers for records owned by the host HR platform. They are opaque
//! numeric keys; this crate never allocates them, it only copies them between
//! a transfer request and the collaborators.

/// Employee ID - key into the employee directory.
pub type EmployeeId = u64;

/// User ID - login account linked to an employee (optional on the employee).
///
/// # Usage:
/// - Reporting-manager approval compares the acting user against the
///   manager's linked user
/// - Allowed company/branch sets hang off the user, not the employee
pub type UserId = u64;

/// Company ID - a legal entity with its own books.
pub type CompanyId = u64;

/// Branch ID
pub type BranchId = u64;

/// Department ID
pub type DepartmentId = u64;

/// Job (designation) ID
pub type JobId = u64;

/// Contract ID - unique within the contract registry
pub type ContractId = u64;

/// Salary structure ID
pub type StructureId = u64;

/// Accounting journal ID
pub type JournalId = u64;

/// Ledger account ID
pub type AccountId = u64;

/// Journal entry (move) ID
pub type EntryId = u64;

/// Payslip ID
pub type PayslipId = u64;
