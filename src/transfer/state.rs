//! Transfer FSM State Definitions
//!
//! ```text
//! DRAFT → SUBMIT → APPROVE → TRANSFER → PROBATION
//!   │       │  ↘      │          │   ↘       │
//!   │       │  REJECT │          │   REVERSE ←┘
//!   └───────┴────────┴→ CANCEL
//! ```
//!
//! `set_draft` may move any state back to DRAFT.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Transfer FSM States
///
/// State IDs are stored as SMALLINT by the PostgreSQL store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum TransferState {
    /// Created, editable
    Draft = 0,

    /// Waiting for reporting manager approval
    Submit = 10,

    /// Approved, waiting for HR to execute
    Approve = 20,

    /// Effects applied: contracts swapped, employee moved
    Transfer = 30,

    /// Temporary transfer flagged for probation approval
    Probation = 40,

    /// Rejected by the reporting manager or HR
    Reject = -10,

    /// Cancelled before execution
    Cancel = -20,

    /// Executed transfer rolled back to source-side terms
    Reverse = -30,
}

impl TransferState {
    /// Check if this is a terminal state for the normal transitions
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferState::Reject | TransferState::Cancel | TransferState::Reverse
        )
    }

    /// Whether a named transition from `self` to `next` is allowed.
    ///
    /// Resetting to DRAFT is not covered here; it is unconditional.
    pub fn can_transition_to(&self, next: TransferState) -> bool {
        use TransferState::*;
        matches!(
            (self, next),
            (Draft, Submit)
                | (Submit, Approve)
                | (Submit, Reject)
                | (Approve, Transfer)
                | (Transfer, Probation)
                | (Transfer, Reverse)
                | (Probation, Reverse)
                | (Draft, Cancel)
                | (Submit, Cancel)
                | (Approve, Cancel)
        )
    }

    /// Get the numeric state ID for PostgreSQL storage
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    /// Convert from PostgreSQL state ID
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(TransferState::Draft),
            10 => Some(TransferState::Submit),
            20 => Some(TransferState::Approve),
            30 => Some(TransferState::Transfer),
            40 => Some(TransferState::Probation),
            -10 => Some(TransferState::Reject),
            -20 => Some(TransferState::Cancel),
            -30 => Some(TransferState::Reverse),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferState::Draft => "draft",
            TransferState::Submit => "submit",
            TransferState::Approve => "approve",
            TransferState::Transfer => "transfer",
            TransferState::Probation => "probation",
            TransferState::Reject => "reject",
            TransferState::Cancel => "cancel",
            TransferState::Reverse => "reverse",
        }
    }

    /// Label shown to users
    pub fn label(&self) -> &'static str {
        match self {
            TransferState::Draft => "Draft",
            TransferState::Submit => "Waiting for Reporting Manager Approval",
            TransferState::Approve => "Approved",
            TransferState::Transfer => "Transferred",
            TransferState::Probation => "Request for Probation Approval",
            TransferState::Reject => "Rejected",
            TransferState::Cancel => "Cancelled",
            TransferState::Reverse => "Reversed",
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<i16> for TransferState {
    type Error = ();

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        TransferState::from_id(value).ok_or(())
    }
}

impl FromStr for TransferState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Ok(TransferState::Draft),
            "submit" => Ok(TransferState::Submit),
            "approve" => Ok(TransferState::Approve),
            "transfer" => Ok(TransferState::Transfer),
            "probation" => Ok(TransferState::Probation),
            "reject" => Ok(TransferState::Reject),
            "cancel" => Ok(TransferState::Cancel),
            "reverse" => Ok(TransferState::Reverse),
            other => Err(format!("unknown transfer state: {other}")),
        }
    }
}
