//! Transfer Core Types
//!
//! Type definitions for the transfer FSM.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::TransferError;
use super::state::TransferState;
use crate::core_types::{
    BranchId, CompanyId, ContractId, DepartmentId, EmployeeId, JobId, JournalId, PayslipId,
    StructureId, UserId,
};
use crate::models::{Grade, LeaveLineKind, LeaveReportLine, UserAccess, WageComponents};

/// Transfer ID - ULID-based unique identifier
///
/// Sortable by creation time, no coordination needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(ulid::Ulid);

impl TransferId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    pub fn inner(&self) -> ulid::Ulid {
        self.0
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransferId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

/// Transfer kind: across legal entities or within one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    Inter,
    Intra,
}

impl TransferKind {
    /// Upper-case label used in notification subjects and sequences
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferKind::Inter => "INTER",
            TransferKind::Intra => "INTRA",
        }
    }

    /// Title-case label ("Inter"/"Intra") passed to templates
    pub fn title(&self) -> &'static str {
        match self {
            TransferKind::Inter => "Inter",
            TransferKind::Intra => "Intra",
        }
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferMode {
    Temporary,
    Permanent,
}

/// HR roles recognised by the transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    HrManager,
    HrUser,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hr_manager" => Ok(Role::HrManager),
            "hr_user" => Ok(Role::HrUser),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// The user performing a transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub email: Option<String>,
    pub roles: BTreeSet<Role>,
}

impl Actor {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            email: None,
            roles: BTreeSet::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.insert(role);
        self
    }

    /// Holds an elevated HR role
    #[inline]
    pub fn is_hr(&self) -> bool {
        self.roles.contains(&Role::HrManager) || self.roles.contains(&Role::HrUser)
    }
}

/// One side (source or destination) of a transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideAttributes {
    pub company_id: CompanyId,
    pub branch_id: BranchId,
    pub department_id: DepartmentId,
    pub job_id: JobId,
    pub reporting_manager: EmployeeId,
    pub supervisor: Option<EmployeeId>,
    pub grade: Grade,
    /// Source: contract running at creation. Destination: contract created on execution.
    pub contract_id: Option<ContractId>,
    pub wages: WageComponents,
}

/// Destination values supplied when a transfer is drafted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationInput {
    /// Required for inter-company; ignored for intra-company
    pub company_id: Option<CompanyId>,
    pub branch_id: BranchId,
    pub department_id: DepartmentId,
    pub job_id: JobId,
    pub reporting_manager: EmployeeId,
    #[serde(default)]
    pub supervisor: Option<EmployeeId>,
    pub grade: Grade,
    /// Defaults to the employee's current wages
    #[serde(default)]
    pub wages: Option<WageComponents>,
}

/// Input to [`TransferCoordinator::create`](super::TransferCoordinator::create)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferDraft {
    pub employee_id: EmployeeId,
    pub kind: TransferKind,
    pub mode: TransferMode,
    pub requested_date: NaiveDate,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub destination: DestinationInput,
    /// Salary structure for the destination contract
    #[serde(default)]
    pub structure_id: Option<StructureId>,
    /// Salary journal for the restored contract on reversal
    #[serde(default)]
    pub journal_id: Option<JournalId>,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Transfer record as persisted by the [`TransferStore`](super::adapters::TransferStore)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub id: TransferId,
    /// Human reference, e.g. `INTER/00001`
    pub name: String,
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub kind: TransferKind,
    pub mode: TransferMode,
    pub requested_date: NaiveDate,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub state: TransferState,
    pub source: SideAttributes,
    pub destination: SideAttributes,
    pub source_structure_id: Option<StructureId>,
    pub structure_id: Option<StructureId>,
    pub journal_id: Option<JournalId>,
    /// Employee's access before the transfer (None when the employee has no login)
    pub prior_access: Option<UserAccess>,
    pub gratuity_amount: Decimal,
    /// Closing payslip created for the source company, at most one per transfer
    #[serde(default)]
    pub payslip_id: Option<PayslipId>,
    /// Cached notice-period counter; see [`TransferRequest::notice_period_days`]
    pub notice_period: i64,
    pub remarks: Option<String>,
    pub requested_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransferRequest {
    /// Notice period in days: `end - start` for temporary transfers, else 0
    pub fn notice_period_days(&self) -> i64 {
        match (self.mode, self.start_date, self.end_date) {
            (TransferMode::Temporary, Some(start), Some(end)) => (end - start).num_days(),
            _ => 0,
        }
    }

    /// Gratuity is only booked when the employee leaves one company's books for good
    #[inline]
    pub fn requires_gratuity(&self) -> bool {
        self.kind == TransferKind::Inter && self.mode == TransferMode::Permanent
    }

    /// Date used for the gratuity calculation and payslip cut-off
    pub fn effective_date(&self) -> NaiveDate {
        self.start_date.unwrap_or(self.requested_date)
    }

    /// Inter-company transfers must change company
    pub fn check_companies(&self) -> Result<(), TransferError> {
        if self.kind == TransferKind::Inter
            && self.source.company_id == self.destination.company_id
        {
            return Err(TransferError::SameCompany {
                employee: self.employee_name.clone(),
            });
        }
        Ok(())
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Validate the date window of a draft
pub fn check_dates(
    mode: TransferMode,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(), TransferError> {
    if let (Some(start), Some(end)) = (start, end)
        && end <= start
    {
        return Err(TransferError::EndBeforeStart);
    }
    if mode == TransferMode::Temporary && (start.is_none() || end.is_none()) {
        return Err(TransferError::MissingTemporaryDates);
    }
    Ok(())
}

/// Reject wage components that are negative or out of range
pub fn check_wages(wages: &WageComponents) -> Result<(), TransferError> {
    match wages.out_of_range() {
        Some((component, amount)) => Err(TransferError::InvalidWage { component, amount }),
        None => Ok(()),
    }
}

/// Remaining leave snapshot for the employee on a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LeaveSummary {
    pub allocated_days: Decimal,
    pub taken_days: Decimal,
    pub remaining_days: Decimal,
}

impl LeaveSummary {
    /// Allocation lines add to the balance; request lines (reported negative) draw on it
    pub fn from_lines(lines: &[LeaveReportLine]) -> Self {
        let (allocated, requested) =
            lines
                .iter()
                .fold((Decimal::ZERO, Decimal::ZERO), |(a, r), line| match line.kind {
                    LeaveLineKind::Allocation => (a + line.number_of_days, r),
                    LeaveLineKind::Request => (a, r + line.number_of_days),
                });
        let taken = requested.abs();
        Self {
            allocated_days: allocated,
            taken_days: taken,
            remaining_days: allocated - taken,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_check_wages_bounds() {
        let mut wages = WageComponents {
            basic: Decimal::from(6000),
            wage: Decimal::from(8000),
            ..Default::default()
        };
        assert!(check_wages(&wages).is_ok());

        wages.travel_allowance = Decimal::from(-1);
        assert!(matches!(
            check_wages(&wages),
            Err(TransferError::InvalidWage { component: "travel_allowance", .. })
        ));

        wages.travel_allowance = Decimal::ZERO;
        wages.basic = WageComponents::MAX_COMPONENT + Decimal::ONE;
        assert!(matches!(
            check_wages(&wages),
            Err(TransferError::InvalidWage { component: "basic", .. })
        ));
    }

    #[test]
    fn test_payslip_id_defaults_when_absent() {
        let request = crate::transfer::test_support::sample_request(
            TransferKind::Inter,
            TransferMode::Permanent,
        );
        let mut doc = serde_json::to_value(&request).unwrap();
        doc.as_object_mut().unwrap().remove("payslip_id");
        let decoded: TransferRequest = serde_json::from_value(doc).unwrap();
        assert_eq!(decoded.payslip_id, None);
    }

    #[test]
    fn test_transfer_id_parse_roundtrip() {
        let id = TransferId::new();
        let parsed: TransferId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-ulid".parse::<TransferId>().is_err());
    }

    #[test]
    fn test_check_dates() {
        let s = Some(date(2024, 1, 1));
        let e = Some(date(2024, 2, 1));
        assert!(check_dates(TransferMode::Temporary, s, e).is_ok());
        assert!(check_dates(TransferMode::Permanent, None, None).is_ok());
        assert!(matches!(
            check_dates(TransferMode::Permanent, e, s),
            Err(TransferError::EndBeforeStart)
        ));
        assert!(matches!(
            check_dates(TransferMode::Temporary, s, s),
            Err(TransferError::EndBeforeStart)
        ));
        assert!(matches!(
            check_dates(TransferMode::Temporary, s, None),
            Err(TransferError::MissingTemporaryDates)
        ));
    }

    #[test]
    fn test_actor_roles() {
        assert!(!Actor::new(1).is_hr());
        assert!(Actor::new(1).with_role(Role::HrUser).is_hr());
        assert!(Actor::new(1).with_role(Role::HrManager).is_hr());
        assert_eq!("HR_Manager".parse::<Role>(), Ok(Role::HrManager));
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_leave_summary() {
        use rust_decimal_macros::dec;

        let line = |kind, days| LeaveReportLine {
            employee_id: 1,
            kind,
            number_of_days: days,
        };
        let summary = LeaveSummary::from_lines(&[
            line(LeaveLineKind::Allocation, dec!(21)),
            line(LeaveLineKind::Allocation, dec!(5)),
            line(LeaveLineKind::Request, dec!(-3)),
            line(LeaveLineKind::Request, dec!(-1.5)),
        ]);
        assert_eq!(summary.allocated_days, dec!(26));
        assert_eq!(summary.taken_days, dec!(4.5));
        assert_eq!(summary.remaining_days, dec!(21.5));

        assert_eq!(LeaveSummary::from_lines(&[]).remaining_days, Decimal::ZERO);
    }
}
