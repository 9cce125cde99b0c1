//! In-memory collaborators
//!
//! Back the gateway when no host platform is wired in, and serve as test
//! doubles. State lives in `DashMap`s; ids come from atomic counters.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use dashmap::DashMap;

use super::{
    ContractRegistry, EmployeeDirectory, Ledger, LeaveService, Notifier, PayrollService,
    TransferStore,
};
use crate::core_types::{CompanyId, ContractId, EmployeeId, EntryId, PayslipId, UserId};
use crate::models::{
    AccessUpdate, Company, Contract, ContractState, Employee, EmployeeUpdate, JournalEntry,
    LeaveReportLine, NewContract, NewPayslip, PostedEntry, UserAccess,
};
use crate::transfer::error::TransferError;
use crate::transfer::notify::Notification;
use crate::transfer::state::TransferState;
use crate::transfer::types::{TransferId, TransferKind, TransferRequest};

// ============================================================================
// Employee directory
// ============================================================================

#[derive(Default)]
pub struct MemoryDirectory {
    employees: DashMap<EmployeeId, Employee>,
    access: DashMap<UserId, UserAccess>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_employee(&self, employee: Employee) {
        self.employees.insert(employee.id, employee);
    }

    pub fn set_access(&self, user_id: UserId, access: UserAccess) {
        self.access.insert(user_id, access);
    }

    pub fn get(&self, id: EmployeeId) -> Option<Employee> {
        self.employees.get(&id).map(|e| e.value().clone())
    }

    pub fn access(&self, user_id: UserId) -> Option<UserAccess> {
        self.access.get(&user_id).map(|a| a.value().clone())
    }
}

#[async_trait]
impl EmployeeDirectory for MemoryDirectory {
    async fn employee(&self, id: EmployeeId) -> anyhow::Result<Option<Employee>> {
        Ok(self.get(id))
    }

    async fn update_employee(
        &self,
        id: EmployeeId,
        update: &EmployeeUpdate,
    ) -> anyhow::Result<()> {
        let mut employee = self
            .employees
            .get_mut(&id)
            .ok_or_else(|| anyhow!("employee {id} not found"))?;
        employee.apply(update);
        Ok(())
    }

    async fn user_access(&self, user_id: UserId) -> anyhow::Result<Option<UserAccess>> {
        Ok(self.access(user_id))
    }

    async fn grant_access(&self, user_id: UserId, update: AccessUpdate) -> anyhow::Result<()> {
        self.access.entry(user_id).or_default().grant(update);
        Ok(())
    }
}

// ============================================================================
// Contracts
// ============================================================================

pub struct MemoryContracts {
    contracts: DashMap<ContractId, Contract>,
    next_id: AtomicU64,
}

impl Default for MemoryContracts {
    fn default() -> Self {
        Self {
            contracts: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }
}

impl MemoryContracts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing contract; keeps generated ids above it
    pub fn insert(&self, contract: Contract) {
        self.next_id.fetch_max(contract.id + 1, Ordering::SeqCst);
        self.contracts.insert(contract.id, contract);
    }

    pub fn get(&self, id: ContractId) -> Option<Contract> {
        self.contracts.get(&id).map(|c| c.value().clone())
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    fn sorted_for(&self, employee_id: EmployeeId) -> Vec<Contract> {
        let mut out: Vec<Contract> = self
            .contracts
            .iter()
            .filter(|c| c.employee_id == employee_id)
            .map(|c| c.value().clone())
            .collect();
        out.sort_by_key(|c| c.id);
        out
    }
}

#[async_trait]
impl ContractRegistry for MemoryContracts {
    async fn contracts_for(&self, employee_id: EmployeeId) -> anyhow::Result<Vec<Contract>> {
        Ok(self.sorted_for(employee_id))
    }

    async fn create(&self, c: NewContract) -> anyhow::Result<ContractId> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.contracts.insert(
            id,
            Contract {
                id,
                employee_id: c.employee_id,
                company_id: c.company_id,
                name: c.name,
                contract_type: c.contract_type,
                state: ContractState::Running,
                date_start: c.date_start,
                date_end: c.date_end,
                job_id: c.job_id,
                department_id: c.department_id,
                wages: c.wages,
                structure_id: c.structure_id,
                journal_id: c.journal_id,
            },
        );
        Ok(id)
    }

    async fn cancel(&self, id: ContractId) -> anyhow::Result<()> {
        let mut contract = self
            .contracts
            .get_mut(&id)
            .ok_or_else(|| anyhow!("contract {id} not found"))?;
        contract.state = ContractState::Cancelled;
        Ok(())
    }
}

// ============================================================================
// Ledger
// ============================================================================

pub struct MemoryLedger {
    companies: DashMap<CompanyId, Company>,
    entries: DashMap<EntryId, PostedEntry>,
    next_id: AtomicU64,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self {
            companies: DashMap::new(),
            entries: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_company(&self, company: Company) {
        self.companies.insert(company.id, company);
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn company(&self, id: CompanyId) -> anyhow::Result<Option<Company>> {
        Ok(self.companies.get(&id).map(|c| c.value().clone()))
    }

    async fn create_entry(&self, entry: JournalEntry) -> anyhow::Result<EntryId> {
        if !entry.is_balanced() {
            bail!(
                "unbalanced entry {}: debit {} credit {}",
                entry.reference,
                entry.total_debit(),
                entry.total_credit()
            );
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.entries.insert(
            id,
            PostedEntry {
                id,
                entry,
                posted: false,
            },
        );
        Ok(id)
    }

    async fn post(&self, id: EntryId) -> anyhow::Result<()> {
        let mut entry = self
            .entries
            .get_mut(&id)
            .ok_or_else(|| anyhow!("journal entry {id} not found"))?;
        entry.posted = true;
        Ok(())
    }

    async fn entries_for(&self, transfer_ref: &str) -> anyhow::Result<Vec<PostedEntry>> {
        let mut out: Vec<PostedEntry> = self
            .entries
            .iter()
            .filter(|e| e.entry.transfer_ref == transfer_ref)
            .map(|e| e.value().clone())
            .collect();
        out.sort_by_key(|e| e.id);
        Ok(out)
    }
}

// ============================================================================
// Leave & payroll
// ============================================================================

#[derive(Default)]
pub struct MemoryLeave {
    lines: DashMap<EmployeeId, Vec<LeaveReportLine>>,
}

impl MemoryLeave {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, line: LeaveReportLine) {
        self.lines.entry(line.employee_id).or_default().push(line);
    }
}

#[async_trait]
impl LeaveService for MemoryLeave {
    async fn leave_report(&self, employee_id: EmployeeId) -> anyhow::Result<Vec<LeaveReportLine>> {
        Ok(self
            .lines
            .get(&employee_id)
            .map(|l| l.value().clone())
            .unwrap_or_default())
    }
}

pub struct MemoryPayroll {
    payslips: DashMap<PayslipId, (NewPayslip, bool)>,
    next_id: AtomicU64,
}

impl Default for MemoryPayroll {
    fn default() -> Self {
        Self {
            payslips: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }
}

impl MemoryPayroll {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payslip and whether its sheet was computed
    pub fn get(&self, id: PayslipId) -> Option<(NewPayslip, bool)> {
        self.payslips.get(&id).map(|p| p.value().clone())
    }
}

#[async_trait]
impl PayrollService for MemoryPayroll {
    async fn create_payslip(&self, payslip: NewPayslip) -> anyhow::Result<PayslipId> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.payslips.insert(id, (payslip, false));
        Ok(id)
    }

    async fn compute_sheet(&self, id: PayslipId) -> anyhow::Result<()> {
        let mut slip = self
            .payslips
            .get_mut(&id)
            .ok_or_else(|| anyhow!("payslip {id} not found"))?;
        slip.1 = true;
        Ok(())
    }
}

// ============================================================================
// Notifications
// ============================================================================

/// Keeps every notification it is handed; can be told to fail
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            bail!("mail server unavailable");
        }
        self.sent
            .lock()
            .map_err(|_| anyhow!("notification log poisoned"))?
            .push(notification.clone());
        Ok(())
    }
}

// ============================================================================
// Transfer store
// ============================================================================

#[derive(Default)]
pub struct MemoryTransferStore {
    requests: DashMap<TransferId, TransferRequest>,
    sequences: DashMap<TransferKind, u64>,
}

impl MemoryTransferStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransferStore for MemoryTransferStore {
    async fn get(&self, id: TransferId) -> Result<Option<TransferRequest>, TransferError> {
        Ok(self.requests.get(&id).map(|r| r.value().clone()))
    }

    async fn save(&self, request: &TransferRequest) -> Result<(), TransferError> {
        self.requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn update_state_if(
        &self,
        id: TransferId,
        from: TransferState,
        to: TransferState,
    ) -> Result<bool, TransferError> {
        // get_mut holds the shard lock across the check and the write
        match self.requests.get_mut(&id) {
            Some(mut request) if request.state == from => {
                request.state = to;
                request.touch();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn next_sequence(&self, kind: TransferKind) -> Result<u64, TransferError> {
        let mut seq = self.sequences.entry(kind).or_insert(0);
        *seq += 1;
        Ok(*seq)
    }

    async fn list_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Vec<TransferRequest>, TransferError> {
        let mut out: Vec<TransferRequest> = self
            .requests
            .iter()
            .filter(|r| r.employee_id == employee_id)
            .map(|r| r.value().clone())
            .collect();
        out.sort_by_key(|r| r.id);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JournalLine, WageComponents};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_ledger_rejects_unbalanced_entry() {
        let ledger = MemoryLedger::new();
        let entry = JournalEntry {
            journal_id: 1,
            company_id: 1,
            branch_id: 1,
            reference: "INTER/00001".into(),
            transfer_ref: "x".into(),
            lines: vec![JournalLine {
                name: "Ref: A".into(),
                account_id: 1,
                debit: dec!(10),
                credit: Decimal::ZERO,
                partner: None,
            }],
        };
        assert!(ledger.create_entry(entry).await.is_err());
        assert_eq!(ledger.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_contract_ids_stay_above_seeded() {
        let contracts = MemoryContracts::new();
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        contracts.insert(Contract {
            id: 40,
            employee_id: 1,
            company_id: 1,
            name: "Seed".into(),
            contract_type: crate::models::ContractType::OpenEnded,
            state: ContractState::Running,
            date_start: start,
            date_end: None,
            job_id: 1,
            department_id: 1,
            wages: WageComponents::default(),
            structure_id: None,
            journal_id: None,
        });
        let id = contracts
            .create(NewContract {
                employee_id: 1,
                name: "New".into(),
                notes: String::new(),
                company_id: 2,
                job_id: 1,
                department_id: 1,
                contract_type: crate::models::ContractType::OpenEnded,
                date_start: start,
                date_end: None,
                wages: WageComponents::default(),
                structure_id: None,
                journal_id: None,
            })
            .await
            .unwrap();
        assert_eq!(id, 41);
        assert_eq!(contracts.contracts_for(1).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_sequences_are_per_kind() {
        let store = MemoryTransferStore::new();
        assert_eq!(store.next_sequence(TransferKind::Inter).await.unwrap(), 1);
        assert_eq!(store.next_sequence(TransferKind::Inter).await.unwrap(), 2);
        assert_eq!(store.next_sequence(TransferKind::Intra).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_state_if_only_from_expected() {
        let store = MemoryTransferStore::new();
        let request = crate::transfer::test_support::sample_request(
            TransferKind::Inter,
            crate::transfer::types::TransferMode::Permanent,
        );
        let id = request.id;
        assert!(
            !store
                .update_state_if(id, TransferState::Draft, TransferState::Submit)
                .await
                .unwrap()
        );

        store.save(&request).await.unwrap();
        assert!(
            store
                .update_state_if(id, TransferState::Draft, TransferState::Submit)
                .await
                .unwrap()
        );
        assert!(
            !store
                .update_state_if(id, TransferState::Draft, TransferState::Submit)
                .await
                .unwrap()
        );
        assert_eq!(
            store.get(id).await.unwrap().unwrap().state,
            TransferState::Submit
        );
    }
}
