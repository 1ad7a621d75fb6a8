//! Payment lifecycle tests against the in-memory repository.

use paygate_types::{
    Account, AccountId, AppError, AuthorizeRequest, Currency, DepositRequest, Disposition,
    HoldKind, HoldState, Operation, Payment, PaymentActionRequest, PaymentId, PaymentStatus,
};

use crate::PaymentService;
use crate::service_tests::tests::{MockRepo, account_request};

type Service = PaymentService<MockRepo>;

/// A funded payer and an empty merchant.
async fn setup(payer_balance: i64) -> (Service, Account, Account) {
    let service = PaymentService::new(MockRepo::new());
    let payer = service.create_account(account_request("Olga")).await.unwrap();
    let payee = service.create_account(account_request("Shop")).await.unwrap();

    if payer_balance > 0 {
        service
            .deposit(DepositRequest {
                account_id: payer.id,
                amount: payer_balance,
            })
            .await
            .unwrap();
    }

    let payer = service.get_account(payer.id).await.unwrap();
    (service, payer, payee)
}

fn auth_request(payer: &Account, amount: i64) -> AuthorizeRequest {
    AuthorizeRequest {
        payer_id: payer.id,
        order_id: "order-1".into(),
        amount,
        currency: Currency::RUB,
        card: payer.card.clone(),
    }
}

fn action(amount: i64) -> PaymentActionRequest {
    PaymentActionRequest {
        order_id: "order-1".into(),
        amount,
    }
}

/// (balance, held) as stored.
fn funds(service: &Service, id: AccountId) -> (i64, i64) {
    let account = service.repo().account(id);
    (account.balance.amount(), account.held.amount())
}

fn total(service: &Service, ids: &[AccountId]) -> i64 {
    ids.iter()
        .map(|id| service.repo().account(*id).total().unwrap().amount())
        .sum()
}

/// Scenario A: an approved authorization of the whole balance.
async fn authorized(amount: i64) -> (Service, Account, Account, Payment) {
    let (service, payer, payee) = setup(amount).await;
    let auth = service
        .authorize(payee.id, auth_request(&payer, amount))
        .await
        .unwrap();
    assert_eq!(auth.status, PaymentStatus::Approved);
    (service, payer, payee, auth)
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorize
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_authorize_holds_funds() {
    let (service, payer, payee, auth) = authorized(50).await;

    assert_eq!(auth.operation, Operation::Authorization);
    assert_eq!(auth.disposition(), Disposition::Accepted);
    assert_eq!(auth.reference_id, None);
    assert_eq!(auth.card, payer.card.snapshot());
    assert_eq!(funds(&service, payer.id), (0, 50));
    assert_eq!(funds(&service, payee.id), (0, 50));

    let hold = service.repo().hold(auth.id).unwrap();
    assert_eq!(hold.kind, HoldKind::Authorization);
    assert_eq!(hold.state, HoldState::Held);
    assert_eq!(hold.remaining.amount(), 50);

    assert_eq!(service.repo().account(payer.id).statement, vec![auth.id]);
    assert_eq!(service.repo().account(payee.id).statement, vec![auth.id]);
}

#[tokio::test]
async fn test_authorize_partial_amount_deltas() {
    let (service, payer, payee) = setup(500).await;

    service
        .authorize(payee.id, auth_request(&payer, 120))
        .await
        .unwrap();

    assert_eq!(funds(&service, payer.id), (380, 120));
    assert_eq!(funds(&service, payee.id), (0, 120));
}

#[tokio::test]
async fn test_authorize_insufficient_funds_is_recorded() {
    let (service, payer, payee) = setup(30).await;

    let payment = service
        .authorize(payee.id, auth_request(&payer, 50))
        .await
        .unwrap();

    assert_eq!(payment.status, PaymentStatus::InsufficientFunds);
    assert_eq!(payment.disposition(), Disposition::Declined);
    assert_eq!(funds(&service, payer.id), (30, 0));
    assert_eq!(funds(&service, payee.id), (0, 0));
    assert!(service.repo().hold(payment.id).is_none());

    let stored = service.get_payment(payment.id).await.unwrap();
    assert_eq!(stored.status, PaymentStatus::InsufficientFunds);
    assert_eq!(service.repo().account(payee.id).statement, vec![payment.id]);
}

#[tokio::test]
async fn test_authorize_boundary() {
    let (service, payer, payee) = setup(100).await;

    let over = service
        .authorize(payee.id, auth_request(&payer, 101))
        .await
        .unwrap();
    assert_eq!(over.status, PaymentStatus::InsufficientFunds);
    assert_eq!(funds(&service, payer.id), (100, 0));

    let exact = service
        .authorize(payee.id, auth_request(&payer, 100))
        .await
        .unwrap();
    assert_eq!(exact.status, PaymentStatus::Approved);
    assert_eq!(funds(&service, payer.id), (0, 100));
}

#[tokio::test]
async fn test_authorize_wrong_card() {
    let (service, payer, payee) = setup(100).await;
    let mut req = auth_request(&payer, 40);
    req.card.security_code = if payer.card.security_code == "999" {
        "998".into()
    } else {
        "999".into()
    };

    let payment = service.authorize(payee.id, req).await.unwrap();

    assert_eq!(payment.status, PaymentStatus::WrongPaymentRequest);
    assert_eq!(funds(&service, payer.id), (100, 0));
    assert_eq!(funds(&service, payee.id), (0, 0));
}

#[tokio::test]
async fn test_authorize_rejects_bad_requests() {
    let (service, payer, payee) = setup(100).await;

    let zero = service.authorize(payee.id, auth_request(&payer, 0)).await;
    assert!(matches!(zero, Err(AppError::BadRequest(_))));

    let to_self = service.authorize(payer.id, auth_request(&payer, 10)).await;
    assert!(matches!(to_self, Err(AppError::BadRequest(_))));

    let mut usd = auth_request(&payer, 10);
    usd.currency = Currency::USD;
    let currency = service.authorize(payee.id, usd).await;
    assert!(matches!(currency, Err(AppError::BadRequest(_))));

    let mut bad_card = auth_request(&payer, 10);
    bad_card.card.expiry_month = 13;
    let card = service.authorize(payee.id, bad_card).await;
    assert!(matches!(card, Err(AppError::BadRequest(_))));

    assert_eq!(service.repo().payment_count(), 0);
}

#[tokio::test]
async fn test_authorize_unknown_accounts() {
    let (service, payer, payee) = setup(100).await;

    let merchant = service
        .authorize(AccountId::new(), auth_request(&payer, 10))
        .await;
    assert!(matches!(merchant, Err(AppError::NotFound(_))));

    let mut req = auth_request(&payer, 10);
    req.payer_id = AccountId::new();
    let unknown_payer = service.authorize(payee.id, req).await;
    assert!(matches!(unknown_payer, Err(AppError::NotFound(_))));
}

// ─────────────────────────────────────────────────────────────────────────────
// Capture / Cancel
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_capture_settles_to_payee() {
    let (service, payer, payee, auth) = authorized(50).await;

    let capture = service.capture(payee.id, auth.id, action(50)).await.unwrap();

    assert_eq!(capture.status, PaymentStatus::SuccessfulPayment);
    assert_eq!(capture.reference_id, Some(auth.id));
    assert_eq!(funds(&service, payer.id), (0, 0));
    assert_eq!(funds(&service, payee.id), (50, 0));

    let auth_hold = service.repo().hold(auth.id).unwrap();
    assert_eq!(auth_hold.state, HoldState::Captured);
    assert!(auth_hold.remaining.is_zero());

    let settlement = service.repo().hold(capture.id).unwrap();
    assert_eq!(settlement.kind, HoldKind::Settlement);
    assert_eq!(settlement.state, HoldState::Captured);
    assert_eq!(settlement.remaining.amount(), 50);

    assert_eq!(
        service.repo().account(payee.id).statement,
        vec![auth.id, capture.id]
    );
}

#[tokio::test]
async fn test_capture_over_remaining_is_invalid_amount() {
    let (service, payer, payee, auth) = authorized(50).await;

    let payment = service.capture(payee.id, auth.id, action(80)).await.unwrap();

    assert_eq!(payment.status, PaymentStatus::InvalidAmount);
    assert_eq!(service.repo().hold(auth.id).unwrap().remaining.amount(), 50);
    assert_eq!(funds(&service, payer.id), (0, 50));
    assert_eq!(funds(&service, payee.id), (0, 50));
}

#[tokio::test]
async fn test_cancel_releases_hold() {
    let (service, payer, payee, auth) = authorized(50).await;

    let cancel = service.cancel(payee.id, auth.id, action(50)).await.unwrap();

    assert_eq!(cancel.status, PaymentStatus::SuccessfulCancel);
    assert_eq!(funds(&service, payer.id), (50, 0));
    assert_eq!(funds(&service, payee.id), (0, 0));
    assert_eq!(
        service.repo().hold(auth.id).unwrap().state,
        HoldState::Cancelled
    );
}

#[tokio::test]
async fn test_authorize_then_cancel_round_trip() {
    let (service, payer, payee) = setup(200).await;

    let auth = service
        .authorize(payee.id, auth_request(&payer, 100))
        .await
        .unwrap();
    service.cancel(payee.id, auth.id, action(100)).await.unwrap();

    assert_eq!(funds(&service, payer.id), (200, 0));
    assert_eq!(funds(&service, payee.id), (0, 0));
}

#[tokio::test]
async fn test_follow_ups_conserve_funds() {
    let (service, payer, payee) = setup(100).await;
    let ids = [payer.id, payee.id];
    let auth = service
        .authorize(payee.id, auth_request(&payer, 60))
        .await
        .unwrap();
    let before = total(&service, &ids);

    let capture = service.capture(payee.id, auth.id, action(30)).await.unwrap();
    assert_eq!(capture.status, PaymentStatus::SuccessfulPayment);
    assert_eq!(total(&service, &ids), before);

    let refund = service.refund(payee.id, capture.id, action(10)).await.unwrap();
    assert_eq!(refund.status, PaymentStatus::SuccessfulRefund);
    assert_eq!(total(&service, &ids), before);

    let cancel = service.cancel(payee.id, auth.id, action(30)).await.unwrap();
    assert_eq!(cancel.status, PaymentStatus::SuccessfulCancel);
    assert_eq!(total(&service, &ids), before);

    assert_eq!(funds(&service, payer.id), (80, 0));
    assert_eq!(funds(&service, payee.id), (20, 0));
}

#[tokio::test]
async fn test_exhausted_hold_refuses_follow_ups() {
    let (service, payer, payee, auth) = authorized(50).await;
    service.capture(payee.id, auth.id, action(20)).await.unwrap();
    service.cancel(payee.id, auth.id, action(30)).await.unwrap();
    let balances = (funds(&service, payer.id), funds(&service, payee.id));
    let recorded = service.repo().payment_count();

    for op in [Operation::Capture, Operation::Cancel] {
        let payment = match op {
            Operation::Capture => service.capture(payee.id, auth.id, action(1)).await,
            _ => service.cancel(payee.id, auth.id, action(1)).await,
        }
        .unwrap();

        assert_eq!(payment.status, PaymentStatus::InvalidTransaction);
        assert_eq!(payment.id, auth.id);
        assert_eq!(payment.operation, op);
    }

    assert_eq!(
        (funds(&service, payer.id), funds(&service, payee.id)),
        balances
    );
    assert_eq!(service.repo().payment_count(), recorded);
}

#[tokio::test]
async fn test_capture_of_declined_authorization_is_invalid() {
    let (service, payer, payee) = setup(10).await;
    let declined = service
        .authorize(payee.id, auth_request(&payer, 50))
        .await
        .unwrap();

    let payment = service
        .capture(payee.id, declined.id, action(10))
        .await
        .unwrap();

    assert_eq!(payment.status, PaymentStatus::InvalidTransaction);
    assert_eq!(funds(&service, payer.id), (10, 0));
}

#[tokio::test]
async fn test_capture_by_other_merchant_is_invalid() {
    let (service, payer, payee, auth) = authorized(50).await;
    let other = service
        .create_account(account_request("Kiosk"))
        .await
        .unwrap();

    let payment = service.capture(other.id, auth.id, action(50)).await.unwrap();

    assert_eq!(payment.status, PaymentStatus::InvalidTransaction);
    assert_eq!(funds(&service, payer.id), (0, 50));
    assert_eq!(funds(&service, payee.id), (0, 50));
}

#[tokio::test]
async fn test_follow_up_of_unknown_payment() {
    let (service, _payer, payee) = setup(10).await;

    let result = service
        .capture(payee.id, PaymentId::new(), action(10))
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_follow_up_rejects_non_positive_amount() {
    let (service, _payer, payee, auth) = authorized(50).await;

    let result = service.cancel(payee.id, auth.id, action(0)).await;

    assert!(matches!(result, Err(AppError::BadRequest(_))));
}

// ─────────────────────────────────────────────────────────────────────────────
// Refund
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_refund_returns_settled_funds() {
    let (service, payer, payee, auth) = authorized(50).await;
    let capture = service.capture(payee.id, auth.id, action(50)).await.unwrap();

    let refund = service.refund(payee.id, capture.id, action(20)).await.unwrap();

    assert_eq!(refund.status, PaymentStatus::SuccessfulRefund);
    assert_eq!(refund.reference_id, Some(capture.id));
    assert_eq!(funds(&service, payer.id), (20, 0));
    assert_eq!(funds(&service, payee.id), (30, 0));
    assert_eq!(
        service.repo().hold(capture.id).unwrap().remaining.amount(),
        30
    );

    let over = service.refund(payee.id, capture.id, action(40)).await.unwrap();
    assert_eq!(over.status, PaymentStatus::InvalidAmount);

    service.refund(payee.id, capture.id, action(30)).await.unwrap();
    assert_eq!(
        service.repo().hold(capture.id).unwrap().state,
        HoldState::Refunded
    );
    assert_eq!(funds(&service, payer.id), (50, 0));
}

#[tokio::test]
async fn test_exhausted_settlement_refuses_refund() {
    let (service, payer, payee, auth) = authorized(50).await;
    let capture = service.capture(payee.id, auth.id, action(50)).await.unwrap();
    service.refund(payee.id, capture.id, action(50)).await.unwrap();
    let hold = service.repo().hold(capture.id).unwrap();
    assert_eq!(hold.state, HoldState::Refunded);
    assert_eq!(hold.remaining.amount(), 0);
    let recorded = service.repo().payment_count();

    let payment = service.refund(payee.id, capture.id, action(1)).await.unwrap();

    assert_eq!(payment.status, PaymentStatus::InvalidTransaction);
    assert_eq!(payment.id, capture.id);
    assert_eq!(payment.operation, Operation::Refund);
    assert_eq!(funds(&service, payer.id), (50, 0));
    assert_eq!(funds(&service, payee.id), (0, 0));
    assert_eq!(service.repo().payment_count(), recorded);
}

#[tokio::test]
async fn test_refund_of_authorization_is_invalid() {
    let (service, _payer, payee, auth) = authorized(50).await;

    let payment = service.refund(payee.id, auth.id, action(10)).await.unwrap();

    assert_eq!(payment.status, PaymentStatus::InvalidTransaction);
}

#[tokio::test]
async fn test_refund_declined_when_payee_spent_funds() {
    let (service, payer, payee, auth) = authorized(50).await;
    let capture = service.capture(payee.id, auth.id, action(50)).await.unwrap();

    // The merchant pays someone else with the settled money.
    let supplier = service
        .create_account(account_request("Supplier"))
        .await
        .unwrap();
    let payee = service.get_account(payee.id).await.unwrap();
    service
        .authorize(supplier.id, auth_request(&payee, 50))
        .await
        .unwrap();

    let refund = service.refund(payee.id, capture.id, action(20)).await.unwrap();

    assert_eq!(refund.status, PaymentStatus::InsufficientFunds);
    assert_eq!(funds(&service, payer.id), (0, 0));
    assert_eq!(
        service.repo().hold(capture.id).unwrap().remaining.amount(),
        50
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Atomicity
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_failed_commit_leaves_ledger_untouched() {
    let (service, payer, payee) = setup(100).await;
    service.repo().fail_next_commit();

    let result = service.authorize(payee.id, auth_request(&payer, 40)).await;

    assert!(matches!(result, Err(AppError::TransactionFailed(_))));
    assert_eq!(funds(&service, payer.id), (100, 0));
    assert_eq!(funds(&service, payee.id), (0, 0));
    assert_eq!(service.repo().payment_count(), 0);
    assert!(service.repo().account(payer.id).statement.is_empty());

    let retry = service
        .authorize(payee.id, auth_request(&payer, 40))
        .await
        .unwrap();
    assert_eq!(retry.status, PaymentStatus::Approved);
}

#[tokio::test]
async fn test_failed_capture_keeps_hold() {
    let (service, payer, payee, auth) = authorized(50).await;
    service.repo().fail_next_commit();

    let result = service.capture(payee.id, auth.id, action(50)).await;

    assert!(matches!(result, Err(AppError::TransactionFailed(_))));
    let hold = service.repo().hold(auth.id).unwrap();
    assert_eq!(hold.state, HoldState::Held);
    assert_eq!(hold.remaining.amount(), 50);
    assert_eq!(funds(&service, payer.id), (0, 50));
}

#[tokio::test]
async fn test_stale_account_version_is_rejected() {
    let (service, payer, payee, auth) = authorized(50).await;
    service.repo().interfere_before_commit(payee.id);

    let result = service.capture(payee.id, auth.id, action(50)).await;

    assert!(matches!(result, Err(AppError::TransactionFailed(_))));
    assert_eq!(funds(&service, payer.id), (0, 50));
    assert_eq!(funds(&service, payee.id), (0, 50));
    assert_eq!(service.repo().hold(auth.id).unwrap().remaining.amount(), 50);
}
