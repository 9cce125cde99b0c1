//! Transfer Error Types
//!
//! Every failure aborts the transition before the first side effect, so the
//! caller can surface the message verbatim.

use rust_decimal::Decimal;
use thiserror::Error;

use super::state::TransferState;
use crate::core_types::{CompanyId, EmployeeId, PayslipId};
use crate::gratuity::GratuityError;

/// Broad class of a [`TransferError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Business-rule violation or missing configuration
    Validation,
    /// Actor lacks the required role or relationship
    Authorization,
    /// Host data needed by the transition is missing
    DataIntegrity,
    /// Collaborator or storage failure
    System,
}

/// Transfer error types
#[derive(Error, Debug, Clone)]
pub enum TransferError {
    // === Validation Errors ===
    #[error("Current Company and Transferred Company cannot be same for {employee}.")]
    SameCompany { employee: String },

    #[error("End Date should be greater than start date")]
    EndBeforeStart,

    #[error("Start and end dates are required for a temporary transfer")]
    MissingTemporaryDates,

    #[error("Please select the journal for the company {company}")]
    MissingJournal { company: String },

    #[error(
        "Please select the Gratuity debit account and Gratuity credit account for the company {company}"
    )]
    MissingGratuityAccounts { company: String },

    #[error("Cannot move transfer {reference} from {from} to {to}")]
    InvalidStateTransition {
        reference: String,
        from: TransferState,
        to: TransferState,
    },

    #[error("A closing payslip needs a start date on transfer {0}")]
    MissingStartDate(String),

    #[error("Transfer to Company is required for an inter-company transfer")]
    MissingDestinationCompany,

    #[error("Transfer {reference} is not in effect (state {state})")]
    NotInEffect {
        reference: String,
        state: TransferState,
    },

    #[error("Closing payslip {payslip_id} was already generated for transfer {reference}")]
    PayslipAlreadyGenerated {
        reference: String,
        payslip_id: PayslipId,
    },

    #[error("Wage component {component} out of range: {amount}")]
    InvalidWage {
        component: &'static str,
        amount: Decimal,
    },

    // === Authorization Errors ===
    #[error("You are not allowed to {action} the {kind} Company Transfer. Only the Reporting Manager or HR may do so.")]
    NotApprover { action: &'static str, kind: String },

    #[error("You are not allowed to {0}. HR role required.")]
    HrRoleRequired(&'static str),

    // === Data Integrity Errors ===
    #[error(transparent)]
    Gratuity(#[from] GratuityError),

    #[error("Employee not found: {0}")]
    EmployeeNotFound(EmployeeId),

    #[error("Reporting manager missing for employee {0}")]
    MissingReportingManager(String),

    #[error("Company not found: {0}")]
    CompanyNotFound(CompanyId),

    #[error("Transfer not found: {0}")]
    TransferNotFound(String),

    // === System Errors ===
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Collaborator {service} failed: {message}")]
    Collaborator {
        service: &'static str,
        message: String,
    },
}

impl TransferError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransferError::SameCompany { .. }
            | TransferError::EndBeforeStart
            | TransferError::MissingTemporaryDates
            | TransferError::MissingJournal { .. }
            | TransferError::MissingGratuityAccounts { .. }
            | TransferError::InvalidStateTransition { .. }
            | TransferError::MissingStartDate(_)
            | TransferError::MissingDestinationCompany
            | TransferError::NotInEffect { .. }
            | TransferError::PayslipAlreadyGenerated { .. }
            | TransferError::InvalidWage { .. }
            | TransferError::Gratuity(GratuityError::Overflow { .. }) => ErrorKind::Validation,
            TransferError::NotApprover { .. } | TransferError::HrRoleRequired(_) => {
                ErrorKind::Authorization
            }
            TransferError::Gratuity(_)
            | TransferError::EmployeeNotFound(_)
            | TransferError::MissingReportingManager(_)
            | TransferError::CompanyNotFound(_)
            | TransferError::TransferNotFound(_) => ErrorKind::DataIntegrity,
            TransferError::Storage(_) | TransferError::Collaborator { .. } => ErrorKind::System,
        }
    }

    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::SameCompany { .. } => "SAME_COMPANY",
            TransferError::EndBeforeStart => "END_BEFORE_START",
            TransferError::MissingTemporaryDates => "MISSING_TEMPORARY_DATES",
            TransferError::MissingJournal { .. } => "MISSING_JOURNAL",
            TransferError::MissingGratuityAccounts { .. } => "MISSING_GRATUITY_ACCOUNTS",
            TransferError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            TransferError::MissingStartDate(_) => "MISSING_START_DATE",
            TransferError::MissingDestinationCompany => "MISSING_DESTINATION_COMPANY",
            TransferError::NotInEffect { .. } => "NOT_IN_EFFECT",
            TransferError::PayslipAlreadyGenerated { .. } => "PAYSLIP_ALREADY_GENERATED",
            TransferError::InvalidWage { .. } => "INVALID_WAGE",
            TransferError::NotApprover { .. } => "NOT_APPROVER",
            TransferError::HrRoleRequired(_) => "HR_ROLE_REQUIRED",
            TransferError::Gratuity(GratuityError::MissingJoinDate(_)) => "MISSING_JOIN_DATE",
            TransferError::Gratuity(GratuityError::NoContract(_)) => "NO_CONTRACT",
            TransferError::Gratuity(GratuityError::Overflow { .. }) => "GRATUITY_OVERFLOW",
            TransferError::EmployeeNotFound(_) => "EMPLOYEE_NOT_FOUND",
            TransferError::MissingReportingManager(_) => "MISSING_REPORTING_MANAGER",
            TransferError::CompanyNotFound(_) => "COMPANY_NOT_FOUND",
            TransferError::TransferNotFound(_) => "TRANSFER_NOT_FOUND",
            TransferError::Storage(_) => "STORAGE_ERROR",
            TransferError::Collaborator { .. } => "COLLABORATOR_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::TransferNotFound(_) => 404,
            TransferError::InvalidStateTransition { .. }
            | TransferError::NotInEffect { .. }
            | TransferError::PayslipAlreadyGenerated { .. } => 409,
            _ => match self.kind() {
                ErrorKind::Validation => 400,
                ErrorKind::Authorization => 403,
                ErrorKind::DataIntegrity => 422,
                ErrorKind::System => 500,
            },
        }
    }

    pub(crate) fn collaborator(service: &'static str, e: impl std::fmt::Display) -> Self {
        TransferError::Collaborator {
            service,
            message: e.to_string(),
        }
    }
}

impl From<sqlx::Error> for TransferError {
    fn from(e: sqlx::Error) -> Self {
        TransferError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for TransferError {
    fn from(e: serde_json::Error) -> Self {
        TransferError::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let same = TransferError::SameCompany {
            employee: "Asha".into(),
        };
        assert_eq!(same.kind(), ErrorKind::Validation);
        assert_eq!(
            TransferError::HrRoleRequired("transfer").kind(),
            ErrorKind::Authorization
        );
        assert_eq!(
            TransferError::from(GratuityError::NoContract(1)).kind(),
            ErrorKind::DataIntegrity
        );
        let overflow = TransferError::from(GratuityError::Overflow {
            basic: Decimal::MAX,
        });
        assert_eq!(overflow.kind(), ErrorKind::Validation);
        assert_eq!(overflow.http_status(), 400);
        assert_eq!(
            TransferError::PayslipAlreadyGenerated {
                reference: "INTER/00001".into(),
                payslip_id: 3,
            }
            .http_status(),
            409
        );
    }

    #[test]
    fn test_http_status() {
        assert_eq!(TransferError::EndBeforeStart.http_status(), 400);
        assert_eq!(TransferError::HrRoleRequired("reverse").http_status(), 403);
        assert_eq!(
            TransferError::TransferNotFound("x".into()).http_status(),
            404
        );
        assert_eq!(
            TransferError::InvalidStateTransition {
                reference: "INTER/00001".into(),
                from: TransferState::Draft,
                to: TransferState::Transfer,
            }
            .http_status(),
            409
        );
        assert_eq!(TransferError::Storage("down".into()).http_status(), 500);
    }

    #[test]
    fn test_messages_name_the_offending_entity() {
        let err = TransferError::MissingGratuityAccounts {
            company: "Acme FZE".into(),
        };
        assert!(err.to_string().contains("Acme FZE"));
        assert_eq!(err.code(), "MISSING_GRATUITY_ACCOUNTS");

        let err = TransferError::from(GratuityError::MissingJoinDate(9));
        assert_eq!(err.code(), "MISSING_JOIN_DATE");
        assert!(err.to_string().contains('9'));
    }
}
