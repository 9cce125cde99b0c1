//! Closing payslip for the source company
//!
//! The source company pays up to the day before the transfer starts. The
//! period opens on the first day of that last month.

use chrono::{Datelike, Days, NaiveDate};

use super::error::TransferError;
use super::types::TransferRequest;
use crate::models::NewPayslip;

/// `(date_from, date_to)` of the closing period for a transfer starting on `start`
pub fn closing_period(start: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let date_to = start.checked_sub_days(Days::new(1))?;
    let date_from = date_to.with_day(1)?;
    Some((date_from, date_to))
}

/// Payslip payload for the source side of `request`
pub fn closing_payslip(request: &TransferRequest) -> Result<NewPayslip, TransferError> {
    let start = request
        .start_date
        .ok_or_else(|| TransferError::MissingStartDate(request.name.clone()))?;
    let (date_from, date_to) =
        closing_period(start).ok_or_else(|| TransferError::MissingStartDate(request.name.clone()))?;

    Ok(NewPayslip {
        employee_id: request.employee_id,
        name: format!(
            "Salary Slip of {} for {}",
            request.employee_name,
            request.requested_date.format("%B-%Y")
        ),
        number: request.name.clone(),
        company_id: request.source.company_id,
        branch_id: request.source.branch_id,
        contract_id: request.source.contract_id,
        structure_id: request.source_structure_id,
        date: request.requested_date,
        date_from,
        date_to,
        transfer_ref: request.id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::test_support::sample_request;
    use crate::transfer::types::{TransferKind, TransferMode};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_mid_month_start() {
        assert_eq!(
            closing_period(date(2024, 5, 15)),
            Some((date(2024, 5, 1), date(2024, 5, 14)))
        );
    }

    #[test]
    fn test_first_of_month_start_closes_previous_month() {
        assert_eq!(
            closing_period(date(2024, 3, 1)),
            Some((date(2024, 2, 1), date(2024, 2, 29)))
        );
        assert_eq!(
            closing_period(date(2025, 1, 1)),
            Some((date(2024, 12, 1), date(2024, 12, 31)))
        );
    }

    #[test]
    fn test_closing_payslip_uses_source_side() {
        let req = sample_request(TransferKind::Inter, TransferMode::Permanent);
        let slip = closing_payslip(&req).unwrap();
        assert_eq!(slip.company_id, req.source.company_id);
        assert_eq!(slip.branch_id, req.source.branch_id);
        assert_eq!(slip.contract_id, req.source.contract_id);
        assert!(slip.name.starts_with(&format!("Salary Slip of {} for ", req.employee_name)));
    }

    #[test]
    fn test_closing_payslip_requires_start_date() {
        let mut req = sample_request(TransferKind::Inter, TransferMode::Permanent);
        req.start_date = None;
        assert!(matches!(
            closing_payslip(&req),
            Err(TransferError::MissingStartDate(_))
        ));
    }
}
