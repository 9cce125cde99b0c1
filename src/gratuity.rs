//! Gratuity (End-of-Service Benefit) Calculator
//!
//! Tiered accrual by completed service years. The tier is chosen from total
//! tenure and applied to the whole service period; once tenure reaches five
//! years the first five years accrue at 21 days/year and every day after the
//! five-year mark accrues a full month's basic per year.
//!
//! ```text
//!               years:  0     1     3     4     5
//! fixed-term            |---------- 0 -------|-14-|-- 21 lump + remainder
//! open-ended            |- 0 -|- 7 -|--- 14 -----|-- 21 lump + remainder
//! ```
//!
//! Tier contribution = basic / 30 × rate × days / 365.
//! Remainder         = days after year 5 / 365 × basic.
//!
//! Service days are counted inclusively (join date and calculation date both
//! count). The schedule is pending confirmation by payroll before it drives
//! real postings.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::core_types::EmployeeId;
use crate::models::{Contract, ContractState, ContractType, Employee};

const DAYS_PER_YEAR: i64 = 365;
const DAYS_PER_MONTH: i64 = 30;
const LUMP_YEARS: u32 = 5;
const LUMP_RATE_DAYS: i64 = 21;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GratuityError {
    #[error("Employee joining date missing for employee {0}")]
    MissingJoinDate(EmployeeId),

    #[error("No contract found for employee {0}")]
    NoContract(EmployeeId),

    #[error("Gratuity on basic wage {basic} is out of range")]
    Overflow { basic: Decimal },
}

/// Calculator input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GratuityInput {
    /// Monthly basic wage
    pub basic: Decimal,
    pub contract_type: ContractType,
    pub join_date: NaiveDate,
    pub calc_date: NaiveDate,
}

/// Calculator output with the parts that made up the total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GratuityBreakdown {
    pub service_days: i64,
    /// Day-rate of the tier that applied (0 when none accrues)
    pub tier_rate_days: i64,
    pub tier_days: i64,
    pub tier_amount: Decimal,
    pub remainder_days: i64,
    pub remainder_amount: Decimal,
    pub total: Decimal,
}

impl GratuityBreakdown {
    fn zero(service_days: i64) -> Self {
        Self {
            service_days,
            tier_rate_days: 0,
            tier_days: 0,
            tier_amount: Decimal::ZERO,
            remainder_days: 0,
            remainder_amount: Decimal::ZERO,
            total: Decimal::ZERO,
        }
    }
}

pub struct GratuityCalculator;

impl GratuityCalculator {
    /// Compute the accrued gratuity for `input`
    ///
    /// Fails with [`GratuityError::Overflow`] when the amounts leave the
    /// `Decimal` range.
    pub fn calculate(input: &GratuityInput) -> Result<GratuityBreakdown, GratuityError> {
        let elapsed = (input.calc_date - input.join_date).num_days();
        if elapsed < 0 {
            return Ok(GratuityBreakdown::zero(0));
        }
        let service_days = elapsed + 1;
        if input.basic <= Decimal::ZERO {
            return Ok(GratuityBreakdown::zero(service_days));
        }

        let five_year_mark = match input
            .join_date
            .checked_add_months(Months::new(12 * LUMP_YEARS))
        {
            Some(d) => d,
            None => return Ok(GratuityBreakdown::zero(service_days)),
        };
        let overflow = || GratuityError::Overflow { basic: input.basic };

        if input.calc_date >= five_year_mark || service_days >= DAYS_PER_YEAR * 5 {
            let tier_days = (five_year_mark - input.join_date).num_days();
            let remainder_days = ((input.calc_date - five_year_mark).num_days() + 1).max(0);
            let tier_amount = accrue(input.basic, LUMP_RATE_DAYS, tier_days).ok_or_else(overflow)?;
            let remainder_amount = input
                .basic
                .checked_mul(Decimal::from(remainder_days))
                .and_then(|v| v.checked_div(Decimal::from(DAYS_PER_YEAR)))
                .ok_or_else(overflow)?;
            let total = tier_amount
                .checked_add(remainder_amount)
                .ok_or_else(overflow)?;
            return Ok(GratuityBreakdown {
                service_days,
                tier_rate_days: LUMP_RATE_DAYS,
                tier_days,
                tier_amount: tier_amount.round_dp(2),
                remainder_days,
                remainder_amount: remainder_amount.round_dp(2),
                total: total.round_dp(2),
            });
        }

        let rate = tier_rate(input.contract_type, service_days);
        let tier_amount = accrue(input.basic, rate, service_days)
            .ok_or_else(overflow)?
            .round_dp(2);
        Ok(GratuityBreakdown {
            service_days,
            tier_rate_days: rate,
            tier_days: service_days,
            tier_amount,
            remainder_days: 0,
            remainder_amount: Decimal::ZERO,
            total: tier_amount,
        })
    }

    /// Resolve inputs from host records and compute
    ///
    /// Uses the running contract when there is one, else the earliest contract.
    pub fn for_employee(
        employee: &Employee,
        contracts: &[Contract],
        calc_date: NaiveDate,
    ) -> Result<GratuityBreakdown, GratuityError> {
        let join_date = employee
            .joining_date
            .ok_or(GratuityError::MissingJoinDate(employee.id))?;

        let contract = contracts
            .iter()
            .find(|c| c.state == ContractState::Running)
            .or_else(|| contracts.iter().min_by_key(|c| (c.date_start, c.id)))
            .ok_or(GratuityError::NoContract(employee.id))?;

        Self::calculate(&GratuityInput {
            basic: contract.wages.basic,
            contract_type: contract.contract_type,
            join_date,
            calc_date,
        })
    }
}

/// Day-rate per year of the sub-five-year tier for `service_days`
fn tier_rate(contract_type: ContractType, service_days: i64) -> i64 {
    // Compare days against whole-year multiples; equivalent to years = days / 365
    let y = |n: i64| n * DAYS_PER_YEAR;
    match contract_type {
        ContractType::FixedTerm => match service_days {
            d if d <= y(4) => 0,
            d if d < y(5) => 14,
            _ => LUMP_RATE_DAYS,
        },
        ContractType::OpenEnded => match service_days {
            d if d <= y(1) => 0,
            d if d <= y(3) => 7,
            d if d < y(5) => 14,
            _ => LUMP_RATE_DAYS,
        },
    }
}

/// `basic / 30 × rate × days / 365`, `None` on overflow
fn accrue(basic: Decimal, rate_days: i64, days: i64) -> Option<Decimal> {
    basic
        .checked_mul(Decimal::from(rate_days))?
        .checked_mul(Decimal::from(days))?
        .checked_div(Decimal::from(DAYS_PER_MONTH * DAYS_PER_YEAR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Grade, WageComponents};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn input(contract_type: ContractType, join: NaiveDate, calc: NaiveDate) -> GratuityInput {
        GratuityInput {
            basic: dec!(3000),
            contract_type,
            join_date: join,
            calc_date: calc,
        }
    }

    #[test]
    fn test_zero_tenure_is_zero() {
        let d = date(2024, 3, 1);
        for ct in [ContractType::FixedTerm, ContractType::OpenEnded] {
            let out = GratuityCalculator::calculate(&input(ct, d, d)).unwrap();
            assert_eq!(out.total, Decimal::ZERO);
        }
    }

    #[test]
    fn test_calc_before_join_is_zero() {
        let out = GratuityCalculator::calculate(&input(
            ContractType::OpenEnded,
            date(2024, 3, 1),
            date(2023, 3, 1),
        ))
        .unwrap();
        assert_eq!(out.total, Decimal::ZERO);
        assert_eq!(out.service_days, 0);
    }

    #[test]
    fn test_fixed_term_under_four_years_accrues_nothing() {
        let out = GratuityCalculator::calculate(&input(
            ContractType::FixedTerm,
            date(2020, 1, 1),
            date(2023, 6, 30),
        ))
        .unwrap();
        assert_eq!(out.tier_rate_days, 0);
        assert_eq!(out.total, Decimal::ZERO);
    }

    #[test]
    fn test_fixed_term_four_and_a_half_years_uses_14_day_rate() {
        let join = date(2019, 1, 1);
        let calc = date(2023, 7, 1);
        let out = GratuityCalculator::calculate(&input(ContractType::FixedTerm, join, calc)).unwrap();

        assert_eq!(out.tier_rate_days, 14);
        assert_eq!(out.remainder_days, 0);
        let days = (calc - join).num_days() + 1;
        let expected = (dec!(3000) * dec!(14) * Decimal::from(days) / dec!(10950)).round_dp(2);
        assert_eq!(out.total, expected);
        assert!(out.total > Decimal::ZERO);
    }

    #[test]
    fn test_open_ended_tiers() {
        let join = date(2018, 1, 1);
        let cases = [
            (date(2018, 6, 1), 0),
            (date(2020, 1, 1), 7),
            (date(2021, 12, 1), 14),
        ];
        for (calc, rate) in cases {
            let out = GratuityCalculator::calculate(&input(ContractType::OpenEnded, join, calc)).unwrap();
            assert_eq!(out.tier_rate_days, rate, "calc date {calc}");
        }
    }

    #[test]
    fn test_five_years_plus_includes_lump_and_remainder() {
        let join = date(2015, 1, 1);
        let calc = date(2021, 1, 1);
        for ct in [ContractType::FixedTerm, ContractType::OpenEnded] {
            let out = GratuityCalculator::calculate(&input(ct, join, calc)).unwrap();
            let mark = date(2020, 1, 1);

            assert_eq!(out.tier_rate_days, 21);
            assert_eq!(out.tier_days, (mark - join).num_days());
            assert_eq!(out.remainder_days, (calc - mark).num_days() + 1);
            // leap-year 2020 plus the calc date, at a full basic per 365 days
            assert_eq!(out.remainder_amount, (dec!(3000) * dec!(367) / dec!(365)).round_dp(2));
            assert!(out.tier_amount > Decimal::ZERO);
            assert_eq!(
                out.total,
                (accrue(dec!(3000), 21, out.tier_days).unwrap()
                    + dec!(3000) * Decimal::from(out.remainder_days) / dec!(365))
                .round_dp(2)
            );
        }
    }

    #[test]
    fn test_zero_basic_keeps_service_days() {
        let mut zero = input(ContractType::OpenEnded, date(2020, 1, 1), date(2020, 1, 10));
        zero.basic = Decimal::ZERO;
        let out = GratuityCalculator::calculate(&zero).unwrap();
        assert_eq!(out.service_days, 10);
        assert_eq!(out.total, Decimal::ZERO);
    }

    #[test]
    fn test_oversized_basic_is_an_error() {
        let basic = Decimal::from_i128_with_scale(10_i128.pow(25), 0);
        for (join, calc) in [
            (date(2015, 1, 1), date(2024, 1, 1)),
            (date(2021, 1, 1), date(2024, 1, 1)),
        ] {
            let mut big = input(ContractType::OpenEnded, join, calc);
            big.basic = basic;
            assert_eq!(
                GratuityCalculator::calculate(&big),
                Err(GratuityError::Overflow { basic })
            );
        }
    }

    #[test]
    fn test_exactly_five_years_has_one_remainder_day() {
        let join = date(2016, 3, 1);
        let calc = date(2021, 3, 1);
        let out = GratuityCalculator::calculate(&input(ContractType::FixedTerm, join, calc)).unwrap();
        assert_eq!(out.tier_rate_days, 21);
        assert_eq!(out.remainder_days, 1);
    }

    fn employee(joining_date: Option<NaiveDate>) -> Employee {
        Employee {
            id: 42,
            name: "Ravi".into(),
            work_email: None,
            user_id: None,
            company_id: 1,
            branch_id: 1,
            department_id: 1,
            job_id: 1,
            grade: Grade::new(1, 3),
            reporting_manager: None,
            supervisor: None,
            current_contract: None,
            joining_date,
            wages: WageComponents::default(),
        }
    }

    fn contract(id: u64, state: ContractState, start: NaiveDate, basic: Decimal) -> Contract {
        Contract {
            id,
            employee_id: 42,
            company_id: 1,
            name: format!("Contract {id}"),
            contract_type: ContractType::OpenEnded,
            state,
            date_start: start,
            date_end: None,
            job_id: 1,
            department_id: 1,
            wages: WageComponents {
                basic,
                ..Default::default()
            },
            structure_id: None,
            journal_id: None,
        }
    }

    #[test]
    fn test_for_employee_missing_join_date() {
        let err = GratuityCalculator::for_employee(&employee(None), &[], date(2024, 1, 1))
            .unwrap_err();
        assert_eq!(err, GratuityError::MissingJoinDate(42));
    }

    #[test]
    fn test_for_employee_no_contract() {
        let err = GratuityCalculator::for_employee(
            &employee(Some(date(2020, 1, 1))),
            &[],
            date(2024, 1, 1),
        )
        .unwrap_err();
        assert_eq!(err, GratuityError::NoContract(42));
    }

    #[test]
    fn test_for_employee_prefers_running_contract() {
        let emp = employee(Some(date(2020, 1, 1)));
        let contracts = [
            contract(1, ContractState::Expired, date(2020, 1, 1), dec!(1000)),
            contract(2, ContractState::Running, date(2022, 1, 1), dec!(5000)),
        ];
        let calc = date(2022, 6, 1);
        let out = GratuityCalculator::for_employee(&emp, &contracts, calc).unwrap();
        let direct = GratuityCalculator::calculate(&GratuityInput {
            basic: dec!(5000),
            contract_type: ContractType::OpenEnded,
            join_date: date(2020, 1, 1),
            calc_date: calc,
        })
        .unwrap();
        assert_eq!(out, direct);
    }
}
