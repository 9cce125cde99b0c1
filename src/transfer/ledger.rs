//! Dual-ledger gratuity posting
//!
//! One self-balancing entry per company (source first, then destination),
//! each with a debit line on the company's gratuity-debit account and a credit
//! line on its gratuity-credit account for the full amount. The two books are
//! kept independent; there is no inter-company entry.

use rust_decimal::Decimal;

use super::error::TransferError;
use super::types::TransferRequest;
use crate::core_types::{AccountId, BranchId, JournalId};
use crate::models::{Company, JournalEntry, JournalLine};

/// Accounting setup checked for completeness
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GratuityAccounts {
    pub journal_id: JournalId,
    pub debit: AccountId,
    pub credit: AccountId,
}

impl GratuityAccounts {
    /// Fails with a configuration error naming the company
    pub fn of(company: &Company) -> Result<Self, TransferError> {
        let journal_id = company
            .journal_id
            .ok_or_else(|| TransferError::MissingJournal {
                company: company.name.clone(),
            })?;
        match (company.gratuity_debit_account, company.gratuity_credit_account) {
            (Some(debit), Some(credit)) => Ok(Self {
                journal_id,
                debit,
                credit,
            }),
            _ => Err(TransferError::MissingGratuityAccounts {
                company: company.name.clone(),
            }),
        }
    }
}

/// Build the two gratuity entries for `request`.
///
/// Both companies are validated before any entry is built.
pub fn gratuity_entries(
    request: &TransferRequest,
    source: &Company,
    destination: &Company,
    amount: Decimal,
) -> Result<[JournalEntry; 2], TransferError> {
    let source_accounts = GratuityAccounts::of(source)?;
    let destination_accounts = GratuityAccounts::of(destination)?;

    Ok([
        entry(
            request,
            source,
            source_accounts,
            request.source.branch_id,
            amount,
        ),
        entry(
            request,
            destination,
            destination_accounts,
            request.destination.branch_id,
            amount,
        ),
    ])
}

fn entry(
    request: &TransferRequest,
    company: &Company,
    accounts: GratuityAccounts,
    branch_id: BranchId,
    amount: Decimal,
) -> JournalEntry {
    let label = format!("Ref: {}", request.employee_name);
    JournalEntry {
        journal_id: accounts.journal_id,
        company_id: company.id,
        branch_id,
        reference: request.name.clone(),
        transfer_ref: request.id.to_string(),
        lines: vec![
            JournalLine {
                name: label.clone(),
                account_id: accounts.debit,
                debit: amount,
                credit: Decimal::ZERO,
                partner: Some(request.employee_id),
            },
            JournalLine {
                name: label,
                account_id: accounts.credit,
                debit: Decimal::ZERO,
                credit: amount,
                partner: Some(request.employee_id),
            },
        ],
    }
}
