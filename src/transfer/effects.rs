//! Employee-facing effects of executing or reversing a transfer
//!
//! One parametrized set of writes per direction. Execution moves the employee
//! onto the destination side; reversal moves them back onto the source side.

use chrono::NaiveDate;

use super::types::{SideAttributes, TransferMode, TransferRequest};
use crate::core_types::EmployeeId;
use crate::models::{AccessUpdate, ContractType, EmployeeUpdate, NewContract};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Source → destination
    Forward,
    /// Destination → source
    Back,
}

impl Direction {
    /// The side the employee ends up on
    pub fn target<'a>(&self, request: &'a TransferRequest) -> &'a SideAttributes {
        match self {
            Direction::Forward => &request.destination,
            Direction::Back => &request.source,
        }
    }
}

/// Supervisor after execution.
///
/// Senior grades (level ≤ 2) keep their source supervisor unless a
/// destination supervisor was named; other grades take the destination value,
/// which may be empty.
pub fn supervisor_after_transfer(request: &TransferRequest) -> Option<EmployeeId> {
    if request.source.grade.is_senior() {
        request.destination.supervisor.or(request.source.supervisor)
    } else {
        request.destination.supervisor
    }
}

/// Employee write for `direction`.
///
/// Forward execution of a gratuity-bearing transfer restarts tenure at the
/// effective date; reversal leaves the joining date alone.
pub fn employee_update(request: &TransferRequest, direction: Direction) -> EmployeeUpdate {
    let side = direction.target(request);
    let (supervisor, joining_date) = match direction {
        Direction::Forward => (
            supervisor_after_transfer(request),
            request
                .requires_gratuity()
                .then(|| request.effective_date()),
        ),
        Direction::Back => (request.source.supervisor, None),
    };

    EmployeeUpdate {
        company_id: Some(side.company_id),
        branch_id: Some(side.branch_id),
        department_id: Some(side.department_id),
        job_id: Some(side.job_id),
        grade: Some(side.grade),
        reporting_manager: Some(side.reporting_manager),
        supervisor: Some(supervisor),
        joining_date,
        current_contract: None,
    }
}

/// Access grant for `direction`: never removes previously allowed entries
pub fn access_update(request: &TransferRequest, direction: Direction) -> AccessUpdate {
    let side = direction.target(request);
    AccessUpdate {
        company_id: side.company_id,
        branch_id: side.branch_id,
    }
}

/// Contract to create for `direction`.
///
/// `date_start` is the effective date when moving forward and the reversal
/// date when moving back.
pub fn new_contract(
    request: &TransferRequest,
    direction: Direction,
    contract_type: ContractType,
    date_start: NaiveDate,
) -> NewContract {
    let side = direction.target(request);
    let (structure_id, journal_id) = match direction {
        Direction::Forward => (request.structure_id, None),
        Direction::Back => (request.source_structure_id, request.journal_id),
    };
    let date_end = match request.mode {
        TransferMode::Temporary => request.end_date,
        TransferMode::Permanent => None,
    };

    NewContract {
        employee_id: request.employee_id,
        name: format!("Contract for {}", request.employee_name),
        notes: format!("Contract (Transfer) for {}", request.employee_name),
        company_id: side.company_id,
        job_id: side.job_id,
        department_id: side.department_id,
        contract_type,
        date_start,
        date_end: date_end.filter(|end| *end > date_start),
        wages: side.wages,
        structure_id,
        journal_id,
    }
}
