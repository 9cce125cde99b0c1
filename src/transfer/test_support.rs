//! Shared fixtures for the transfer unit tests

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::state::TransferState;
use super::types::{SideAttributes, TransferId, TransferKind, TransferMode, TransferRequest};
use crate::models::{Grade, WageComponents};

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub(crate) fn wages(basic: Decimal) -> WageComponents {
    WageComponents {
        basic,
        housing_allowance: dec!(1500),
        travel_allowance: dec!(300),
        other_allowance: dec!(200),
        wage: basic + dec!(2000),
    }
}

/// A request in DRAFT for employee 1 ("Asha Menon")
///
/// Source: company 1, branch 10. Destination: company 2 (1 when intra),
/// branch 20.
pub(crate) fn sample_request(kind: TransferKind, mode: TransferMode) -> TransferRequest {
    let (start_date, end_date) = match mode {
        TransferMode::Temporary => (Some(date(2024, 3, 1)), Some(date(2024, 9, 1))),
        TransferMode::Permanent => (Some(date(2024, 3, 1)), None),
    };
    let destination_company = match kind {
        TransferKind::Inter => 2,
        TransferKind::Intra => 1,
    };
    let now = Utc::now();

    TransferRequest {
        id: TransferId::new(),
        name: format!("{}/00001", kind.as_str()),
        employee_id: 1,
        employee_name: "Asha Menon".into(),
        kind,
        mode,
        requested_date: date(2024, 2, 15),
        start_date,
        end_date,
        state: TransferState::Draft,
        source: SideAttributes {
            company_id: 1,
            branch_id: 10,
            department_id: 100,
            job_id: 1000,
            reporting_manager: 201,
            supervisor: Some(301),
            grade: Grade::new(1, 3),
            contract_id: Some(11),
            wages: wages(dec!(6000)),
        },
        destination: SideAttributes {
            company_id: destination_company,
            branch_id: 20,
            department_id: 200,
            job_id: 2000,
            reporting_manager: 202,
            supervisor: Some(302),
            grade: Grade::new(2, 2),
            contract_id: None,
            wages: wages(dec!(7000)),
        },
        source_structure_id: Some(6),
        structure_id: Some(7),
        journal_id: Some(5),
        prior_access: None,
        gratuity_amount: Decimal::ZERO,
        payslip_id: None,
        notice_period: 0,
        remarks: None,
        requested_by: 900,
        created_at: now,
        updated_at: now,
    }
}
