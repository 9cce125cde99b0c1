//! Transfer notifications
//!
//! Builds the message for each user-visible transition. Rendering and
//! delivery belong to the [`Notifier`] implementation.

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use super::adapters::Notifier;
use super::types::{Actor, TransferId, TransferKind, TransferRequest};

/// Which transition produced the notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferEvent {
    Submitted,
    Approved,
    Rejected,
    Cancelled,
    Transferred,
    Reversed,
}

impl TransferEvent {
    /// Template key the host renders
    pub fn template(&self) -> &'static str {
        match self {
            TransferEvent::Submitted => "company_transfer_submit",
            TransferEvent::Approved => "company_transfer_approved",
            TransferEvent::Rejected => "company_transfer_rejected",
            TransferEvent::Cancelled => "company_transfer_cancelled",
            TransferEvent::Transferred => "company_transfer_transferred",
            TransferEvent::Reversed => "company_transfer_reversed",
        }
    }

    pub fn subject(&self, kind: TransferKind) -> String {
        match self {
            TransferEvent::Submitted => format!("{kind} COMPANY APPROVAL NOTIFICATION"),
            TransferEvent::Approved => format!("EMPLOYEE {kind} COMPANY APPROVED NOTIFICATION"),
            TransferEvent::Rejected => format!("EMPLOYEE {kind} COMPANY REJECTED NOTIFICATION"),
            TransferEvent::Cancelled => format!("EMPLOYEE {kind} COMPANY CANCELLED NOTIFICATION"),
            TransferEvent::Transferred => {
                format!("EMPLOYEE {kind} COMPANY TRANSFERRED NOTIFICATION")
            }
            TransferEvent::Reversed => format!("EMPLOYEE {kind} COMPANY REVERSED NOTIFICATION"),
        }
    }
}

/// Work emails of the people a transfer concerns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipients {
    pub employee: Option<String>,
    pub source_manager: Option<String>,
    pub destination_manager: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub event: TransferEvent,
    pub template: &'static str,
    pub subject: String,
    pub email_from: Option<String>,
    pub email_to: Vec<String>,
    pub email_cc: Vec<String>,
    /// Deep link to the transfer record
    pub url: String,
    /// "Inter" / "Intra"
    pub line: &'static str,
    pub transfer_id: TransferId,
    pub transfer_ref: String,
    pub employee_name: String,
}

impl Notification {
    /// Build the notification for `event`.
    ///
    /// Submission goes to the source reporting manager; execution goes to both
    /// managers with the employee in copy; everything else goes to the
    /// employee with the destination manager in copy.
    pub fn build(
        event: TransferEvent,
        request: &TransferRequest,
        actor: &Actor,
        recipients: &Recipients,
        base_url: &str,
    ) -> Self {
        let (to, cc) = match event {
            TransferEvent::Submitted => (vec![recipients.source_manager.clone()], vec![]),
            TransferEvent::Transferred => (
                vec![
                    recipients.destination_manager.clone(),
                    recipients.source_manager.clone(),
                ],
                vec![recipients.employee.clone()],
            ),
            TransferEvent::Approved
            | TransferEvent::Rejected
            | TransferEvent::Cancelled
            | TransferEvent::Reversed => (
                vec![recipients.employee.clone()],
                vec![recipients.destination_manager.clone()],
            ),
        };

        Self {
            event,
            template: event.template(),
            subject: event.subject(request.kind),
            email_from: actor.email.clone(),
            email_to: dedup(to.into_iter().flatten()),
            email_cc: dedup(cc.into_iter().flatten()),
            url: deep_link(base_url, request.id),
            line: request.kind.title(),
            transfer_id: request.id,
            transfer_ref: request.name.clone(),
            employee_name: request.employee_name.clone(),
        }
    }

    #[inline]
    pub fn has_recipients(&self) -> bool {
        !self.email_to.is_empty()
    }
}

pub fn deep_link(base_url: &str, id: TransferId) -> String {
    format!("{}/transfers/{}", base_url.trim_end_matches('/'), id)
}

fn dedup(emails: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for e in emails {
        if !e.is_empty() && !out.contains(&e) {
            out.push(e);
        }
    }
    out
}

/// Notifier that writes messages to the log instead of mailing them
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, n: &Notification) -> anyhow::Result<()> {
        info!(
            transfer_id = %n.transfer_id,
            template = n.template,
            to = ?n.email_to,
            cc = ?n.email_cc,
            url = %n.url,
            "{}",
            n.subject
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subjects() {
        assert_eq!(
            TransferEvent::Submitted.subject(TransferKind::Inter),
            "INTER COMPANY APPROVAL NOTIFICATION"
        );
        assert_eq!(
            TransferEvent::Rejected.subject(TransferKind::Intra),
            "EMPLOYEE INTRA COMPANY REJECTED NOTIFICATION"
        );
    }

    #[test]
    fn test_deep_link_trims_slash() {
        let id = TransferId::new();
        assert_eq!(
            deep_link("https://hr.example.com/", id),
            format!("https://hr.example.com/transfers/{id}")
        );
    }

    #[test]
    fn test_dedup_drops_empty_and_repeats() {
        let out = dedup(
            ["a@x".to_string(), String::new(), "a@x".to_string(), "b@x".to_string()].into_iter(),
        );
        assert_eq!(out, vec!["a@x".to_string(), "b@x".to_string()]);
    }
}
