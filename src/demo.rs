//! In-memory host with demo records
//!
//! Lets the gateway run without a host HR platform: two configured
//! companies, one employee with a running contract and their two managers.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::core_types::{CompanyId, EmployeeId, UserId};
use crate::models::{
    Company, Contract, ContractState, ContractType, Employee, Grade, LeaveLineKind,
    LeaveReportLine, UserAccess, WageComponents,
};
use crate::transfer::Collaborators;
use crate::transfer::adapters::{
    MemoryContracts, MemoryDirectory, MemoryLeave, MemoryLedger, MemoryPayroll,
    MemoryTransferStore, Notifier, TransferStore,
};

pub const SOURCE_COMPANY_ID: CompanyId = 1;
pub const DESTINATION_COMPANY_ID: CompanyId = 2;
pub const EMPLOYEE_ID: EmployeeId = 1;
pub const EMPLOYEE_USER_ID: UserId = 501;
pub const SOURCE_MANAGER_ID: EmployeeId = 201;
pub const SOURCE_MANAGER_USER_ID: UserId = 601;
pub const DESTINATION_MANAGER_ID: EmployeeId = 202;

/// In-memory host services
#[derive(Default)]
pub struct MemoryHost {
    pub directory: Arc<MemoryDirectory>,
    pub contracts: Arc<MemoryContracts>,
    pub ledger: Arc<MemoryLedger>,
    pub leave: Arc<MemoryLeave>,
    pub payroll: Arc<MemoryPayroll>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collaborators(
        &self,
        store: Arc<dyn TransferStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Collaborators {
        Collaborators {
            store,
            directory: self.directory.clone(),
            contracts: self.contracts.clone(),
            ledger: self.ledger.clone(),
            leave: self.leave.clone(),
            payroll: self.payroll.clone(),
            notifier,
        }
    }

    /// Load the demo records
    pub fn seed_demo(&self) {
        self.ledger.insert_company(
            Company::new(SOURCE_COMPANY_ID, "Northwind Holdings").with_gratuity_accounts(
                10, 1101, 2101,
            ),
        );
        self.ledger.insert_company(
            Company::new(DESTINATION_COMPANY_ID, "Northwind Trading FZE")
                .with_gratuity_accounts(20, 1102, 2102),
        );

        let wages = WageComponents {
            basic: Decimal::from(6000),
            housing_allowance: Decimal::from(1500),
            travel_allowance: Decimal::from(300),
            other_allowance: Decimal::from(200),
            wage: Decimal::from(8000),
        };
        let joined = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap_or_default();

        self.directory.insert_employee(Employee {
            id: EMPLOYEE_ID,
            name: "Asha Menon".into(),
            work_email: Some("asha.menon@northwind.example".into()),
            user_id: Some(EMPLOYEE_USER_ID),
            company_id: SOURCE_COMPANY_ID,
            branch_id: 10,
            department_id: 100,
            job_id: 1000,
            grade: Grade::new(3, 3),
            reporting_manager: Some(SOURCE_MANAGER_ID),
            supervisor: Some(301),
            current_contract: Some(11),
            joining_date: Some(joined),
            wages,
        });
        for (id, name, email, user_id, company_id) in [
            (
                SOURCE_MANAGER_ID,
                "Ravi Iyer",
                "ravi.iyer@northwind.example",
                SOURCE_MANAGER_USER_ID,
                SOURCE_COMPANY_ID,
            ),
            (
                DESTINATION_MANAGER_ID,
                "Lena Park",
                "lena.park@northwind.example",
                602,
                DESTINATION_COMPANY_ID,
            ),
        ] {
            self.directory.insert_employee(Employee {
                id,
                name: name.into(),
                work_email: Some(email.into()),
                user_id: Some(user_id),
                company_id,
                branch_id: 10,
                department_id: 100,
                job_id: 1001,
                grade: Grade::new(2, 2),
                reporting_manager: None,
                supervisor: None,
                current_contract: None,
                joining_date: Some(joined),
                wages,
            });
        }
        self.directory.set_access(
            EMPLOYEE_USER_ID,
            UserAccess {
                default_company: Some(SOURCE_COMPANY_ID),
                allowed_companies: BTreeSet::from([SOURCE_COMPANY_ID]),
                default_branch: Some(10),
                allowed_branches: BTreeSet::from([10]),
            },
        );

        self.contracts.insert(Contract {
            id: 11,
            employee_id: EMPLOYEE_ID,
            company_id: SOURCE_COMPANY_ID,
            name: "Contract for Asha Menon".into(),
            contract_type: ContractType::OpenEnded,
            state: ContractState::Running,
            date_start: joined,
            date_end: None,
            job_id: 1000,
            department_id: 100,
            wages,
            structure_id: Some(6),
            journal_id: Some(5),
        });

        for (kind, days) in [
            (LeaveLineKind::Allocation, 30),
            (LeaveLineKind::Request, -8),
        ] {
            self.leave.push(LeaveReportLine {
                employee_id: EMPLOYEE_ID,
                kind,
                number_of_days: Decimal::from(days),
            });
        }
        tracing::info!("Demo host records loaded");
    }
}

/// Seeded in-memory host with an in-memory transfer store
pub fn memory_collaborators(notifier: Arc<dyn Notifier>) -> Collaborators {
    let host = MemoryHost::new();
    host.seed_demo();
    host.collaborators(Arc::new(MemoryTransferStore::new()), notifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_demo() {
        let host = MemoryHost::new();
        host.seed_demo();
        let employee = host.directory.get(EMPLOYEE_ID).unwrap();
        assert_eq!(employee.reporting_manager, Some(SOURCE_MANAGER_ID));
        assert_eq!(host.contracts.len(), 1);
        assert!(
            host.directory
                .get(SOURCE_MANAGER_ID)
                .is_some_and(|m| m.user_id == Some(SOURCE_MANAGER_USER_ID))
        );
    }
}
