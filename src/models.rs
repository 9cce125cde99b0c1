//! Host platform records
//!
//! Plain data exchanged with the collaborator traits in
//! [`crate::transfer::adapters`]. Every write goes through a typed struct
//! (`EmployeeUpdate`, `AccessUpdate`, `NewContract`, ...) rather than a loose
//! field map.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core_types::{
    AccountId, BranchId, CompanyId, ContractId, DepartmentId, EmployeeId, EntryId, JobId,
    JournalId, StructureId, UserId,
};

// ============================================================================
// Organisation
// ============================================================================

/// Seniority grade.
///
/// `level` is the ordinal tier (1 = most senior). Levels at or below
/// [`Grade::SENIOR_LEVEL_MAX`] need an explicit supervisor hand-off on transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grade {
    pub id: u64,
    pub level: u32,
}

impl Grade {
    pub const SENIOR_LEVEL_MAX: u32 = 2;

    pub fn new(id: u64, level: u32) -> Self {
        Self { id, level }
    }

    #[inline]
    pub fn is_senior(&self) -> bool {
        self.level <= Self::SENIOR_LEVEL_MAX
    }
}

/// Company accounting setup used for gratuity postings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub journal_id: Option<JournalId>,
    pub gratuity_debit_account: Option<AccountId>,
    pub gratuity_credit_account: Option<AccountId>,
}

impl Company {
    pub fn new(id: CompanyId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            journal_id: None,
            gratuity_debit_account: None,
            gratuity_credit_account: None,
        }
    }

    pub fn with_gratuity_accounts(
        mut self,
        journal_id: JournalId,
        debit: AccountId,
        credit: AccountId,
    ) -> Self {
        self.journal_id = Some(journal_id);
        self.gratuity_debit_account = Some(debit);
        self.gratuity_credit_account = Some(credit);
        self
    }
}

// ============================================================================
// Employee
// ============================================================================

/// Wage components carried on employees, contracts and both sides of a transfer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WageComponents {
    pub basic: Decimal,
    pub housing_allowance: Decimal,
    pub travel_allowance: Decimal,
    pub other_allowance: Decimal,
    pub wage: Decimal,
}

impl WageComponents {
    /// Largest amount accepted for a single component
    pub const MAX_COMPONENT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

    /// First component that is negative or above [`Self::MAX_COMPONENT`]
    pub fn out_of_range(&self) -> Option<(&'static str, Decimal)> {
        [
            ("basic", self.basic),
            ("housing_allowance", self.housing_allowance),
            ("travel_allowance", self.travel_allowance),
            ("other_allowance", self.other_allowance),
            ("wage", self.wage),
        ]
        .into_iter()
        .find(|(_, amount)| *amount < Decimal::ZERO || *amount > Self::MAX_COMPONENT)
    }
}

/// Employee record as exposed by the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub work_email: Option<String>,
    pub user_id: Option<UserId>,
    pub company_id: CompanyId,
    pub branch_id: BranchId,
    pub department_id: DepartmentId,
    pub job_id: JobId,
    pub grade: Grade,
    pub reporting_manager: Option<EmployeeId>,
    pub supervisor: Option<EmployeeId>,
    pub current_contract: Option<ContractId>,
    pub joining_date: Option<NaiveDate>,
    pub wages: WageComponents,
}

/// Typed write for the employee directory.
///
/// `supervisor` is a double option: `None` leaves the field alone,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeUpdate {
    pub company_id: Option<CompanyId>,
    pub branch_id: Option<BranchId>,
    pub department_id: Option<DepartmentId>,
    pub job_id: Option<JobId>,
    pub grade: Option<Grade>,
    pub reporting_manager: Option<EmployeeId>,
    pub supervisor: Option<Option<EmployeeId>>,
    pub joining_date: Option<NaiveDate>,
    pub current_contract: Option<ContractId>,
}

impl Employee {
    /// Apply a typed update in place
    pub fn apply(&mut self, update: &EmployeeUpdate) {
        if let Some(v) = update.company_id {
            self.company_id = v;
        }
        if let Some(v) = update.branch_id {
            self.branch_id = v;
        }
        if let Some(v) = update.department_id {
            self.department_id = v;
        }
        if let Some(v) = update.job_id {
            self.job_id = v;
        }
        if let Some(v) = update.grade {
            self.grade = v;
        }
        if let Some(v) = update.reporting_manager {
            self.reporting_manager = Some(v);
        }
        if let Some(v) = update.supervisor {
            self.supervisor = v;
        }
        if let Some(v) = update.joining_date {
            self.joining_date = Some(v);
        }
        if let Some(v) = update.current_contract {
            self.current_contract = Some(v);
        }
    }
}

/// Company/branch access of a login user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccess {
    pub default_company: Option<CompanyId>,
    pub allowed_companies: BTreeSet<CompanyId>,
    pub default_branch: Option<BranchId>,
    pub allowed_branches: BTreeSet<BranchId>,
}

/// Typed write for user access: switch defaults and grant (never revoke)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessUpdate {
    pub company_id: CompanyId,
    pub branch_id: BranchId,
}

impl UserAccess {
    /// Make `update` the default company/branch and add both to the allowed sets
    pub fn grant(&mut self, update: AccessUpdate) {
        self.default_company = Some(update.company_id);
        self.default_branch = Some(update.branch_id);
        self.allowed_companies.insert(update.company_id);
        self.allowed_branches.insert(update.branch_id);
    }
}

// ============================================================================
// Contract
// ============================================================================

/// Contract type - selects the gratuity accrual schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    FixedTerm,
    OpenEnded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractState {
    Draft,
    Running,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub employee_id: EmployeeId,
    pub company_id: CompanyId,
    pub name: String,
    pub contract_type: ContractType,
    pub state: ContractState,
    pub date_start: NaiveDate,
    pub date_end: Option<NaiveDate>,
    pub job_id: JobId,
    pub department_id: DepartmentId,
    pub wages: WageComponents,
    pub structure_id: Option<StructureId>,
    pub journal_id: Option<JournalId>,
}

/// Contract creation payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContract {
    pub employee_id: EmployeeId,
    pub name: String,
    pub notes: String,
    pub company_id: CompanyId,
    pub job_id: JobId,
    pub department_id: DepartmentId,
    pub contract_type: ContractType,
    pub date_start: NaiveDate,
    pub date_end: Option<NaiveDate>,
    pub wages: WageComponents,
    pub structure_id: Option<StructureId>,
    pub journal_id: Option<JournalId>,
}

// ============================================================================
// Ledger
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    pub name: String,
    pub account_id: AccountId,
    pub debit: Decimal,
    pub credit: Decimal,
    pub partner: Option<EmployeeId>,
}

/// A journal entry draft; the ledger assigns the [`EntryId`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub journal_id: JournalId,
    pub company_id: CompanyId,
    pub branch_id: BranchId,
    pub reference: String,
    /// Transfer request this entry was booked for
    pub transfer_ref: String,
    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    pub fn total_debit(&self) -> Decimal {
        self.lines.iter().map(|l| l.debit).sum()
    }

    pub fn total_credit(&self) -> Decimal {
        self.lines.iter().map(|l| l.credit).sum()
    }

    #[inline]
    pub fn is_balanced(&self) -> bool {
        self.total_debit() == self.total_credit()
    }
}

/// A journal entry as stored by the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedEntry {
    pub id: EntryId,
    pub entry: JournalEntry,
    pub posted: bool,
}

// ============================================================================
// Leave & payroll
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveLineKind {
    Allocation,
    Request,
}

/// One line of the host's leave report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveReportLine {
    pub employee_id: EmployeeId,
    pub kind: LeaveLineKind,
    /// Signed day count as reported by the host (requests are negative)
    pub number_of_days: Decimal,
}

/// Payslip creation payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPayslip {
    pub employee_id: EmployeeId,
    pub name: String,
    pub number: String,
    pub company_id: CompanyId,
    pub branch_id: BranchId,
    pub contract_id: Option<ContractId>,
    pub structure_id: Option<StructureId>,
    pub date: NaiveDate,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub transfer_ref: String,
}
