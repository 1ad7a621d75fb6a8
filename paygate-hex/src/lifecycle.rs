//! Payment lifecycle engine.
//!
//! Authorize earmarks funds: the payer's balance moves into held funds and the
//! payee's held funds grow by the same amount. Capture settles held funds to
//! the payee, cancel releases them back to the payer, and refund moves settled
//! funds from the payee back to the payer.
//!
//! Every operation reads what it needs, computes the resulting ledger state,
//! and hands one [`LedgerCommit`] to the repository. Business declines are
//! returned as `Ok(payment)` with a declined status; only caller mistakes,
//! missing records and failed commits are errors.

use paygate_types::{
    Account, AccountId, AccountUpdate, AppError, AuthorizeRequest, DomainError, HoldChange,
    LedgerCommit, Money, Operation, Payment, PaymentActionRequest, PaymentHold, PaymentId,
    PaymentRepository, PaymentStatus,
};

use crate::PaymentService;

impl<R: PaymentRepository> PaymentService<R> {
    /// Authorizes a card payment from `req.payer_id` to `payee_id`.
    #[tracing::instrument(
        skip(self, req),
        fields(payer_id = %req.payer_id, order_id = %req.order_id, amount = req.amount)
    )]
    pub async fn authorize(
        &self,
        payee_id: AccountId,
        req: AuthorizeRequest,
    ) -> Result<Payment, AppError> {
        if req.amount <= 0 {
            return Err(AppError::BadRequest("Amount must be positive".into()));
        }
        if req.payer_id == payee_id {
            return Err(AppError::BadRequest(
                "Payer and payee must be different accounts".into(),
            ));
        }
        req.card.validate()?;

        let payee = self.require_account(payee_id).await?;
        let payer = self.require_account(req.payer_id).await?;

        if payer.currency() != req.currency || payee.currency() != req.currency {
            return Err(AppError::BadRequest(format!(
                "Currency {} does not match the accounts",
                req.currency
            )));
        }
        let amount = Money::new(req.amount, req.currency)?;
        let card = payer.card.snapshot();

        if !payer.matches_card(&req.card) {
            let status = PaymentStatus::WrongPaymentRequest;
            let payment = Payment::authorization(payee.id, req.order_id, amount, card, status);
            return self.record(payment, vec![payee.id]).await;
        }

        if !payer.has_sufficient_funds(&amount) {
            let status = PaymentStatus::InsufficientFunds;
            let payment = Payment::authorization(payee.id, req.order_id, amount, card, status);
            return self.record(payment, vec![payee.id]).await;
        }

        let mut payer_after = payer.clone();
        payer_after.place_hold(amount)?;
        let mut payee_after = payee.clone();
        payee_after.add_hold(amount)?;

        let payment = Payment::authorization(
            payee.id,
            req.order_id,
            amount,
            card,
            PaymentStatus::Approved,
        );
        let hold = PaymentHold::for_authorization(&payment);

        self.apply(LedgerCommit {
            accounts: vec![
                AccountUpdate::from_change(&payer, &payer_after),
                AccountUpdate::from_change(&payee, &payee_after),
            ],
            statements: vec![payer.id, payee.id],
            holds: vec![HoldChange::Open(hold)],
            payment,
        })
        .await
    }

    /// Settles part or all of an approved authorization to the payee.
    pub async fn capture(
        &self,
        payee_id: AccountId,
        payment_id: PaymentId,
        req: PaymentActionRequest,
    ) -> Result<Payment, AppError> {
        self.follow_up(Operation::Capture, payee_id, payment_id, req)
            .await
    }

    /// Returns part or all of a captured amount to the payer.
    pub async fn refund(
        &self,
        payee_id: AccountId,
        payment_id: PaymentId,
        req: PaymentActionRequest,
    ) -> Result<Payment, AppError> {
        self.follow_up(Operation::Refund, payee_id, payment_id, req)
            .await
    }

    /// Releases part or all of an uncaptured authorization back to the payer.
    pub async fn cancel(
        &self,
        payee_id: AccountId,
        payment_id: PaymentId,
        req: PaymentActionRequest,
    ) -> Result<Payment, AppError> {
        self.follow_up(Operation::Cancel, payee_id, payment_id, req)
            .await
    }

    #[tracing::instrument(
        skip(self, req),
        fields(order_id = %req.order_id, amount = req.amount)
    )]
    async fn follow_up(
        &self,
        operation: Operation,
        payee_id: AccountId,
        payment_id: PaymentId,
        req: PaymentActionRequest,
    ) -> Result<Payment, AppError> {
        if req.amount <= 0 {
            return Err(AppError::BadRequest("Amount must be positive".into()));
        }

        let payee = self.require_account(payee_id).await?;
        let reference = self
            .repo
            .get_payment(payment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment {}", payment_id)))?;
        let amount = Money::new(req.amount, reference.amount.currency())?;

        let hold = match self.repo.get_hold(reference.id).await? {
            Some(hold) if hold.permits(operation) && reference.payee_id == payee.id => hold,
            other => {
                let state = other.map_or_else(|| "NONE".to_string(), |h| h.state.to_string());
                tracing::info!(hold_state = %state, "{} refused for this payment", operation);
                return Ok(Payment::invalid_transaction(
                    &reference,
                    operation,
                    req.order_id,
                    amount,
                ));
            }
        };

        if !hold.covers(&amount) {
            let status = PaymentStatus::InvalidAmount;
            let payment = Payment::follow_up(&reference, operation, req.order_id, amount, status);
            return self.record(payment, vec![payee.id]).await;
        }

        let payer = self
            .repo
            .get_account_by_card(&reference.card.number)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Payer account for payment {}", reference.id))
            })?;

        if operation == Operation::Refund && !payee.has_sufficient_funds(&amount) {
            let status = PaymentStatus::InsufficientFunds;
            let payment = Payment::follow_up(&reference, operation, req.order_id, amount, status);
            return self.record(payment, vec![payee.id]).await;
        }

        let hold_after = hold.consume(operation, amount)?;
        let (payer_after, payee_after) = move_funds(operation, &payer, &payee, amount)?;

        let status = operation.success_status();
        let payment = Payment::follow_up(&reference, operation, req.order_id, amount, status);

        let mut holds = vec![HoldChange::consume(&hold, &hold_after)];
        if operation == Operation::Capture {
            holds.push(HoldChange::Open(PaymentHold::for_settlement(&payment)));
        }

        self.apply(LedgerCommit {
            accounts: vec![
                AccountUpdate::from_change(&payer, &payer_after),
                AccountUpdate::from_change(&payee, &payee_after),
            ],
            statements: vec![payer.id, payee.id],
            holds,
            payment,
        })
        .await
    }

    async fn require_account(&self, id: AccountId) -> Result<Account, AppError> {
        self.repo
            .get_account(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account {}", id)))
    }

    /// Persists a declined outcome on the given statements without moving funds.
    async fn record(
        &self,
        payment: Payment,
        statements: Vec<AccountId>,
    ) -> Result<Payment, AppError> {
        self.apply(LedgerCommit::record_only(payment, statements))
            .await
    }

    async fn apply(&self, changes: LedgerCommit) -> Result<Payment, AppError> {
        match self.repo.commit(changes).await {
            Ok(payment) => {
                tracing::info!(
                    payment_id = %payment.id,
                    operation = %payment.operation,
                    status = %payment.status,
                    amount = payment.amount.amount(),
                    "payment recorded"
                );
                Ok(payment)
            }
            Err(e) => {
                tracing::warn!(error = %e, "ledger commit failed");
                Err(e.into())
            }
        }
    }
}

/// Computes both accounts after `operation` moves `amount` between them.
fn move_funds(
    operation: Operation,
    payer: &Account,
    payee: &Account,
    amount: Money,
) -> Result<(Account, Account), DomainError> {
    let mut payer = payer.clone();
    let mut payee = payee.clone();

    match operation {
        Operation::Capture => {
            payer.remove_hold(amount)?;
            payee.release_hold(amount)?;
        }
        Operation::Refund => {
            payer.credit(amount)?;
            payee.debit(amount)?;
        }
        Operation::Cancel => {
            payer.release_hold(amount)?;
            payee.remove_hold(amount)?;
        }
        Operation::Authorization => {
            return Err(DomainError::ValidationError(
                "Authorization does not act on an earlier payment".into(),
            ));
        }
    }

    Ok((payer, payee))
}
