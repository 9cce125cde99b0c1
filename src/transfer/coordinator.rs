//! Transfer Coordinator
//!
//! Drives a transfer request through its lifecycle. Each operation loads the
//! request, checks every precondition, then applies the host effects in a
//! fixed order and persists the new state.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use super::adapters::{
    ContractRegistry, EmployeeDirectory, Ledger, LeaveService, Notifier, PayrollService,
    TransferStore,
};
use super::effects::{self, Direction};
use super::error::TransferError;
use super::ledger;
use super::notify::{Notification, Recipients, TransferEvent};
use super::payslip;
use super::state::TransferState;
use super::types::{
    Actor, LeaveSummary, SideAttributes, TransferDraft, TransferId, TransferKind, TransferRequest,
    check_dates, check_wages,
};
use crate::core_types::{CompanyId, ContractId, EmployeeId, PayslipId};
use crate::gratuity::{GratuityBreakdown, GratuityCalculator};
use crate::models::{
    Company, Contract, ContractState, ContractType, Employee, JournalEntry, PostedEntry,
};

/// Host services the coordinator sequences calls into
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn TransferStore>,
    pub directory: Arc<dyn EmployeeDirectory>,
    pub contracts: Arc<dyn ContractRegistry>,
    pub ledger: Arc<dyn Ledger>,
    pub leave: Arc<dyn LeaveService>,
    pub payroll: Arc<dyn PayrollService>,
    pub notifier: Arc<dyn Notifier>,
}

#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    /// Prefix of the deep link placed in notifications
    pub base_url: String,
    /// Fail the transition when a notification cannot be delivered
    pub notifications_required: bool,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            notifications_required: false,
        }
    }
}

/// Transfer Coordinator - the transfer state machine
pub struct TransferCoordinator {
    services: Collaborators,
    settings: CoordinatorSettings,
}

impl TransferCoordinator {
    pub fn new(services: Collaborators, settings: CoordinatorSettings) -> Self {
        Self { services, settings }
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn get(&self, id: TransferId) -> Result<TransferRequest, TransferError> {
        self.services
            .store
            .get(id)
            .await?
            .ok_or_else(|| TransferError::TransferNotFound(id.to_string()))
    }

    pub async fn list_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Vec<TransferRequest>, TransferError> {
        self.services.store.list_for_employee(employee_id).await
    }

    /// Leave balance of the employee on `id`
    pub async fn leave_summary(&self, id: TransferId) -> Result<LeaveSummary, TransferError> {
        let request = self.get(id).await?;
        let lines = self
            .services
            .leave
            .leave_report(request.employee_id)
            .await
            .map_err(|e| TransferError::collaborator("leave", e))?;
        Ok(LeaveSummary::from_lines(&lines))
    }

    /// Gratuity the employee would be paid if the transfer took effect on its
    /// effective date. Nothing is booked.
    pub async fn preview_gratuity(
        &self,
        id: TransferId,
    ) -> Result<GratuityBreakdown, TransferError> {
        let request = self.get(id).await?;
        let employee = self.employee(request.employee_id).await?;
        let contracts = self.contracts_for(request.employee_id).await?;
        Ok(GratuityCalculator::for_employee(
            &employee,
            &contracts,
            request.effective_date(),
        )?)
    }

    /// Journal entries booked for `id`
    pub async fn gratuity_entries(
        &self,
        id: TransferId,
    ) -> Result<Vec<PostedEntry>, TransferError> {
        self.get(id).await?;
        self.services
            .ledger
            .entries_for(&id.to_string())
            .await
            .map_err(|e| TransferError::collaborator("ledger", e))
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Draft a new request from the employee's current record
    pub async fn create(
        &self,
        draft: TransferDraft,
        actor: &Actor,
    ) -> Result<TransferRequest, TransferError> {
        check_dates(draft.mode, draft.start_date, draft.end_date)?;
        if let Some(wages) = &draft.destination.wages {
            check_wages(wages)?;
        }

        let employee = self.employee(draft.employee_id).await?;
        let reporting_manager = employee
            .reporting_manager
            .ok_or_else(|| TransferError::MissingReportingManager(employee.name.clone()))?;
        let destination_company = match draft.kind {
            TransferKind::Inter => draft
                .destination
                .company_id
                .ok_or(TransferError::MissingDestinationCompany)?,
            TransferKind::Intra => employee.company_id,
        };

        let contracts = self.contracts_for(employee.id).await?;
        let source_contract = current_contract(&employee, &contracts);
        let prior_access = match employee.user_id {
            Some(user_id) => self
                .services
                .directory
                .user_access(user_id)
                .await
                .map_err(|e| TransferError::collaborator("directory", e))?,
            None => None,
        };

        let seq = self.services.store.next_sequence(draft.kind).await?;
        let now = Utc::now();
        let request = TransferRequest {
            id: TransferId::new(),
            name: format!("{}/{:05}", draft.kind.as_str(), seq),
            employee_id: employee.id,
            employee_name: employee.name.clone(),
            kind: draft.kind,
            mode: draft.mode,
            requested_date: draft.requested_date,
            start_date: draft.start_date,
            end_date: draft.end_date,
            state: TransferState::Draft,
            source: SideAttributes {
                company_id: employee.company_id,
                branch_id: employee.branch_id,
                department_id: employee.department_id,
                job_id: employee.job_id,
                reporting_manager,
                supervisor: employee.supervisor,
                grade: employee.grade,
                contract_id: source_contract.map(|c| c.id),
                wages: source_contract.map_or(employee.wages, |c| c.wages),
            },
            destination: SideAttributes {
                company_id: destination_company,
                branch_id: draft.destination.branch_id,
                department_id: draft.destination.department_id,
                job_id: draft.destination.job_id,
                reporting_manager: draft.destination.reporting_manager,
                supervisor: draft.destination.supervisor,
                grade: draft.destination.grade,
                contract_id: None,
                wages: draft.destination.wages.unwrap_or(employee.wages),
            },
            source_structure_id: source_contract.and_then(|c| c.structure_id),
            structure_id: draft.structure_id,
            journal_id: draft.journal_id,
            prior_access,
            gratuity_amount: Decimal::ZERO,
            payslip_id: None,
            notice_period: 0,
            remarks: draft.remarks,
            requested_by: actor.user_id,
            created_at: now,
            updated_at: now,
        };
        self.services.store.save(&request).await?;
        info!(
            transfer_id = %request.id,
            reference = %request.name,
            employee_id = request.employee_id,
            kind = %request.kind,
            "Transfer drafted"
        );
        Ok(request)
    }

    pub async fn submit(
        &self,
        id: TransferId,
        actor: &Actor,
    ) -> Result<TransferRequest, TransferError> {
        let mut request = self.get(id).await?;
        guard(&request, TransferState::Submit)?;
        request.check_companies()?;

        self.notify(TransferEvent::Submitted, &request, actor).await?;
        self.advance(&mut request, TransferState::Submit).await?;
        Ok(request)
    }

    pub async fn approve(
        &self,
        id: TransferId,
        actor: &Actor,
    ) -> Result<TransferRequest, TransferError> {
        let mut request = self.get(id).await?;
        self.check_approver(&request, actor, "approve").await?;
        guard(&request, TransferState::Approve)?;

        self.notify(TransferEvent::Approved, &request, actor).await?;
        self.advance(&mut request, TransferState::Approve).await?;
        Ok(request)
    }

    pub async fn reject(
        &self,
        id: TransferId,
        actor: &Actor,
    ) -> Result<TransferRequest, TransferError> {
        let mut request = self.get(id).await?;
        self.check_approver(&request, actor, "reject").await?;
        guard(&request, TransferState::Reject)?;

        self.notify(TransferEvent::Rejected, &request, actor).await?;
        self.advance(&mut request, TransferState::Reject).await?;
        Ok(request)
    }

    /// Withdraw a request that has not taken effect. Open to the requester,
    /// the reporting manager and HR.
    pub async fn cancel(
        &self,
        id: TransferId,
        actor: &Actor,
    ) -> Result<TransferRequest, TransferError> {
        let mut request = self.get(id).await?;
        if request.requested_by != actor.user_id {
            self.check_approver(&request, actor, "cancel").await?;
        }
        guard(&request, TransferState::Cancel)?;

        self.notify(TransferEvent::Cancelled, &request, actor).await?;
        self.advance(&mut request, TransferState::Cancel).await?;
        Ok(request)
    }

    /// Put the transfer into effect
    ///
    /// Inter-company permanent transfers first book the gratuity in both
    /// companies' ledgers. Every transfer then swaps the running contract for
    /// a destination contract and moves the employee and their access.
    ///
    /// The TRANSFER state is claimed in the store before the first effect, so
    /// of two overlapping calls only one books anything.
    pub async fn execute_transfer(
        &self,
        id: TransferId,
        actor: &Actor,
    ) -> Result<TransferRequest, TransferError> {
        let mut request = self.get(id).await?;
        require_hr(actor, "execute the transfer")?;
        guard(&request, TransferState::Transfer)?;
        request.check_companies()?;

        let employee = self.employee(request.employee_id).await?;
        let contracts = self.contracts_for(employee.id).await?;

        // Everything that can fail on configuration is resolved up front
        let gratuity = if request.requires_gratuity() {
            let source = self.company(request.source.company_id).await?;
            let destination = self.company(request.destination.company_id).await?;
            let breakdown = GratuityCalculator::for_employee(
                &employee,
                &contracts,
                request.effective_date(),
            )?;
            let entries =
                ledger::gratuity_entries(&request, &source, &destination, breakdown.total)?;
            Some((breakdown, entries))
        } else {
            None
        };

        self.claim(&request, TransferState::Transfer).await?;
        let applied = self
            .apply_forward(&mut request, &employee, &contracts, gratuity)
            .await;
        if let Err(e) = applied {
            self.release(&request, TransferState::Transfer).await;
            return Err(e);
        }

        request.notice_period = request.notice_period_days();
        self.persist(&mut request, TransferState::Transfer).await?;
        self.notify(TransferEvent::Transferred, &request, actor).await?;
        Ok(request)
    }

    /// Move the employee back to the source side
    ///
    /// Gratuity postings stay booked and access granted on execution is kept.
    pub async fn reverse_transfer(
        &self,
        id: TransferId,
        actor: &Actor,
    ) -> Result<TransferRequest, TransferError> {
        let mut request = self.get(id).await?;
        require_hr(actor, "reverse the transfer")?;
        guard(&request, TransferState::Reverse)?;

        let employee = self.employee(request.employee_id).await?;
        let contracts = self.contracts_for(employee.id).await?;

        self.claim(&request, TransferState::Reverse).await?;
        if let Err(e) = self.apply_back(&request, &employee, &contracts).await {
            self.release(&request, TransferState::Reverse).await;
            return Err(e);
        }

        self.persist(&mut request, TransferState::Reverse).await?;
        self.notify(TransferEvent::Reversed, &request, actor).await?;
        Ok(request)
    }

    /// Return the request to DRAFT from any state
    pub async fn set_draft(&self, id: TransferId) -> Result<TransferRequest, TransferError> {
        let mut request = self.get(id).await?;
        let from = request.state;
        request.state = TransferState::Draft;
        request.touch();
        self.services.store.save(&request).await?;
        info!(transfer_id = %request.id, from = %from, "Transfer reset to draft");
        Ok(request)
    }

    /// Move a transfer whose notice period has run down to one day into
    /// probation; otherwise clear the counter.
    pub async fn notify_probation(&self, id: TransferId) -> Result<TransferRequest, TransferError> {
        let mut request = self.get(id).await?;
        let notice = request.notice_period_days();
        if request.state == TransferState::Transfer && notice == 1 {
            request.notice_period = notice;
            self.advance(&mut request, TransferState::Probation).await?;
        } else {
            debug!(
                transfer_id = %request.id,
                state = %request.state,
                notice,
                "No probation, notice counter cleared"
            );
            request.notice_period = 0;
            request.touch();
            self.services.store.save(&request).await?;
        }
        Ok(request)
    }

    /// Create and compute the source company's closing payslip
    ///
    /// Only one closing payslip is generated per transfer.
    pub async fn generate_transfer_payslip(
        &self,
        id: TransferId,
        actor: &Actor,
    ) -> Result<PayslipId, TransferError> {
        let mut request = self.get(id).await?;
        require_hr(actor, "generate the transfer payslip")?;
        if request.state != TransferState::Transfer {
            return Err(TransferError::NotInEffect {
                reference: request.name.clone(),
                state: request.state,
            });
        }
        if let Some(payslip_id) = request.payslip_id {
            return Err(TransferError::PayslipAlreadyGenerated {
                reference: request.name.clone(),
                payslip_id,
            });
        }
        let slip = payslip::closing_payslip(&request)?;

        let payroll = &self.services.payroll;
        let payslip_id = payroll
            .create_payslip(slip)
            .await
            .map_err(|e| TransferError::collaborator("payroll", e))?;
        request.payslip_id = Some(payslip_id);
        request.touch();
        self.services.store.save(&request).await?;

        payroll
            .compute_sheet(payslip_id)
            .await
            .map_err(|e| TransferError::collaborator("payroll", e))?;

        info!(transfer_id = %request.id, payslip_id, "Closing payslip generated");
        Ok(payslip_id)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn advance(
        &self,
        request: &mut TransferRequest,
        to: TransferState,
    ) -> Result<(), TransferError> {
        self.claim(request, to).await?;
        self.persist(request, to).await
    }

    /// Take `to` in the store, failing if another caller moved the request
    /// since it was read
    async fn claim(
        &self,
        request: &TransferRequest,
        to: TransferState,
    ) -> Result<(), TransferError> {
        let store = &self.services.store;
        if store.update_state_if(request.id, request.state, to).await? {
            return Ok(());
        }
        let current = store.get(request.id).await?.map_or(request.state, |r| r.state);
        warn!(
            transfer_id = %request.id,
            expected = %request.state,
            current = %current,
            to = %to,
            "Transition lost to a concurrent update"
        );
        Err(TransferError::InvalidStateTransition {
            reference: request.name.clone(),
            from: current,
            to,
        })
    }

    /// Hand a claimed state back after an effect failed
    async fn release(&self, request: &TransferRequest, claimed: TransferState) {
        match self
            .services
            .store
            .update_state_if(request.id, claimed, request.state)
            .await
        {
            Ok(true) => warn!(
                transfer_id = %request.id,
                state = %request.state,
                "Transition failed, state restored"
            ),
            Ok(false) => error!(
                transfer_id = %request.id,
                claimed = %claimed,
                "Transition failed and the claimed state was changed meanwhile"
            ),
            Err(e) => error!(
                transfer_id = %request.id,
                claimed = %claimed,
                error = %e,
                "Transition failed and the state could not be restored"
            ),
        }
    }

    /// Write the full record in state `to`
    async fn persist(
        &self,
        request: &mut TransferRequest,
        to: TransferState,
    ) -> Result<(), TransferError> {
        let from = request.state;
        request.state = to;
        request.touch();
        self.services.store.save(request).await?;
        info!(
            transfer_id = %request.id,
            reference = %request.name,
            from = %from,
            to = %to,
            "Transfer state changed"
        );
        Ok(())
    }

    /// Book the gratuity, swap contracts and move the employee forward
    async fn apply_forward(
        &self,
        request: &mut TransferRequest,
        employee: &Employee,
        contracts: &[Contract],
        gratuity: Option<(GratuityBreakdown, [JournalEntry; 2])>,
    ) -> Result<(), TransferError> {
        if let Some((breakdown, entries)) = gratuity {
            info!(
                transfer_id = %request.id,
                service_days = breakdown.service_days,
                amount = %breakdown.total,
                "Booking gratuity"
            );
            self.post_entries(entries).await?;
            request.gratuity_amount = breakdown.total;
        }

        let contract_type = current_contract(employee, contracts)
            .map_or(ContractType::OpenEnded, |c| c.contract_type);
        self.cancel_running(contracts).await?;
        let contract_id = self
            .open_contract(
                request,
                Direction::Forward,
                contract_type,
                request.effective_date(),
            )
            .await?;
        self.move_employee(request, employee, Direction::Forward, contract_id)
            .await?;
        request.destination.contract_id = Some(contract_id);
        Ok(())
    }

    /// Swap back to a source-side contract and restore the employee
    async fn apply_back(
        &self,
        request: &TransferRequest,
        employee: &Employee,
        contracts: &[Contract],
    ) -> Result<(), TransferError> {
        let contract_type = contracts
            .iter()
            .find(|c| Some(c.id) == request.source.contract_id)
            .or_else(|| current_contract(employee, contracts))
            .map_or(ContractType::OpenEnded, |c| c.contract_type);

        self.cancel_running(contracts).await?;
        let contract_id = self
            .open_contract(
                request,
                Direction::Back,
                contract_type,
                Utc::now().date_naive(),
            )
            .await?;
        self.move_employee(request, employee, Direction::Back, contract_id)
            .await
    }

    async fn employee(&self, id: EmployeeId) -> Result<Employee, TransferError> {
        self.services
            .directory
            .employee(id)
            .await
            .map_err(|e| TransferError::collaborator("directory", e))?
            .ok_or(TransferError::EmployeeNotFound(id))
    }

    async fn contracts_for(&self, employee_id: EmployeeId) -> Result<Vec<Contract>, TransferError> {
        self.services
            .contracts
            .contracts_for(employee_id)
            .await
            .map_err(|e| TransferError::collaborator("contracts", e))
    }

    async fn company(&self, id: CompanyId) -> Result<Company, TransferError> {
        self.services
            .ledger
            .company(id)
            .await
            .map_err(|e| TransferError::collaborator("ledger", e))?
            .ok_or(TransferError::CompanyNotFound(id))
    }

    /// Approver rule: the source reporting manager's login or an HR role
    async fn check_approver(
        &self,
        request: &TransferRequest,
        actor: &Actor,
        action: &'static str,
    ) -> Result<(), TransferError> {
        if actor.is_hr() {
            return Ok(());
        }
        let manager = self
            .services
            .directory
            .employee(request.source.reporting_manager)
            .await
            .map_err(|e| TransferError::collaborator("directory", e))?;
        if let Some(manager) = manager
            && manager.user_id == Some(actor.user_id)
        {
            return Ok(());
        }
        warn!(
            transfer_id = %request.id,
            user_id = actor.user_id,
            action,
            "Transition refused"
        );
        Err(TransferError::NotApprover {
            action,
            kind: request.kind.title().to_string(),
        })
    }

    async fn post_entries(&self, entries: [JournalEntry; 2]) -> Result<(), TransferError> {
        for entry in entries {
            let company_id = entry.company_id;
            let entry_id = self
                .services
                .ledger
                .create_entry(entry)
                .await
                .map_err(|e| TransferError::collaborator("ledger", e))?;
            self.services
                .ledger
                .post(entry_id)
                .await
                .map_err(|e| TransferError::collaborator("ledger", e))?;
            debug!(entry_id, company_id, "Gratuity entry posted");
        }
        Ok(())
    }

    async fn cancel_running(&self, contracts: &[Contract]) -> Result<(), TransferError> {
        for contract in contracts.iter().filter(|c| c.state == ContractState::Running) {
            self.services
                .contracts
                .cancel(contract.id)
                .await
                .map_err(|e| TransferError::collaborator("contracts", e))?;
            debug!(contract_id = contract.id, "Contract cancelled");
        }
        Ok(())
    }

    async fn open_contract(
        &self,
        request: &TransferRequest,
        direction: Direction,
        contract_type: ContractType,
        date_start: NaiveDate,
    ) -> Result<ContractId, TransferError> {
        let contract = effects::new_contract(request, direction, contract_type, date_start);
        self.services
            .contracts
            .create(contract)
            .await
            .map_err(|e| TransferError::collaborator("contracts", e))
    }

    async fn move_employee(
        &self,
        request: &TransferRequest,
        employee: &Employee,
        direction: Direction,
        contract_id: ContractId,
    ) -> Result<(), TransferError> {
        let mut update = effects::employee_update(request, direction);
        update.current_contract = Some(contract_id);
        let directory = &self.services.directory;
        directory
            .update_employee(employee.id, &update)
            .await
            .map_err(|e| TransferError::collaborator("directory", e))?;

        if let Some(user_id) = employee.user_id {
            directory
                .grant_access(user_id, effects::access_update(request, direction))
                .await
                .map_err(|e| TransferError::collaborator("directory", e))?;
        }
        Ok(())
    }

    async fn recipients(&self, request: &TransferRequest) -> Recipients {
        Recipients {
            employee: self.work_email(request.employee_id).await,
            source_manager: self.work_email(request.source.reporting_manager).await,
            destination_manager: self.work_email(request.destination.reporting_manager).await,
        }
    }

    async fn work_email(&self, id: EmployeeId) -> Option<String> {
        match self.services.directory.employee(id).await {
            Ok(employee) => employee.and_then(|e| e.work_email),
            Err(e) => {
                warn!(employee_id = id, error = %e, "Recipient lookup failed");
                None
            }
        }
    }

    /// Deliver the notification for `event`
    ///
    /// Delivery failures are logged and swallowed unless notifications are
    /// configured as required.
    async fn notify(
        &self,
        event: TransferEvent,
        request: &TransferRequest,
        actor: &Actor,
    ) -> Result<(), TransferError> {
        let recipients = self.recipients(request).await;
        let notification =
            Notification::build(event, request, actor, &recipients, &self.settings.base_url);
        if !notification.has_recipients() {
            debug!(transfer_id = %request.id, ?event, "No recipients, notification skipped");
            return Ok(());
        }

        match self.services.notifier.send(&notification).await {
            Ok(()) => Ok(()),
            Err(e) if self.settings.notifications_required => {
                Err(TransferError::collaborator("notifier", e))
            }
            Err(e) => {
                warn!(transfer_id = %request.id, ?event, error = %e, "Notification not delivered");
                Ok(())
            }
        }
    }
}

/// Reject `request.state → to` when the lifecycle does not allow it
fn guard(request: &TransferRequest, to: TransferState) -> Result<(), TransferError> {
    if request.state.can_transition_to(to) {
        Ok(())
    } else {
        Err(TransferError::InvalidStateTransition {
            reference: request.name.clone(),
            from: request.state,
            to,
        })
    }
}

fn require_hr(actor: &Actor, action: &'static str) -> Result<(), TransferError> {
    if actor.is_hr() {
        Ok(())
    } else {
        Err(TransferError::HrRoleRequired(action))
    }
}

/// The employee's current contract: the one on the record when it is still
/// running, else any running contract.
fn current_contract<'a>(employee: &Employee, contracts: &'a [Contract]) -> Option<&'a Contract> {
    let running = |c: &&Contract| c.state == ContractState::Running;
    contracts
        .iter()
        .filter(running)
        .find(|c| Some(c.id) == employee.current_contract)
        .or_else(|| contracts.iter().find(running))
}
