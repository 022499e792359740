use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicI32, Ordering},
        Arc,
        Mutex,
    },
};

use market_payment_engine::{
    db_types::{Article, Customer, OrderId, Won},
    ArticleProvider,
    MarketplaceDatabase,
    MarketplaceError,
    PaymentGatewayClient,
    SqliteDatabase,
    UserProvider,
    ORDER_CANCELLED_CODE,
};
use mockall::mock;
use toss_tools::{PaymentCancellation, PaymentConfirmation, TossApiError};

const CONFIRMATION: &str = include_str!("../assets/confirmation.json");
const CANCELLATION: &str = include_str!("../assets/cancellation.json");

/// The gateway's confirmation of `payment_key` for `order_id`, built from the recorded asset.
pub fn confirmation_for(payment_key: &str, order_id: &str, amount: Won) -> PaymentConfirmation {
    let mut confirmation: PaymentConfirmation = serde_json::from_str(CONFIRMATION).unwrap();
    confirmation.payment_key = payment_key.to_string();
    confirmation.order_id = order_id.to_string();
    confirmation.total_amount = amount;
    confirmation
}

/// How the fake gateway answers the next calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeed,
    /// The gateway answers with this HTTP status
    Fail(u16),
    /// 200 with an empty body
    Empty,
    /// Confirms a different amount from the one requested
    WrongAmount,
}

#[derive(Clone)]
pub struct FakeGateway {
    outcome: Arc<Mutex<Outcome>>,
    confirm_calls: Arc<AtomicI32>,
    cancel_calls: Arc<AtomicI32>,
    // payment key -> order id, as the real gateway would remember them
    confirmed: Arc<Mutex<HashMap<String, String>>>,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self::new(Outcome::Succeed)
    }
}

impl FakeGateway {
    pub fn new(outcome: Outcome) -> Self {
        Self {
            outcome: Arc::new(Mutex::new(outcome)),
            confirm_calls: Arc::new(AtomicI32::new(0)),
            cancel_calls: Arc::new(AtomicI32::new(0)),
            confirmed: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn set_outcome(&self, outcome: Outcome) {
        *self.outcome.lock().unwrap() = outcome;
    }

    pub fn confirm_calls(&self) -> i32 {
        self.confirm_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> i32 {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    fn check_outcome(&self) -> Result<Outcome, MarketplaceError> {
        let outcome = *self.outcome.lock().unwrap();
        match outcome {
            Outcome::Fail(status) => Err(TossApiError::QueryError {
                status,
                message: r#"{"code":"PROVIDER_ERROR","message":"Temporary failure"}"#.to_string(),
            }
            .into()),
            Outcome::Empty => Err(TossApiError::EmptyResponse.into()),
            o => Ok(o),
        }
    }
}

impl PaymentGatewayClient for FakeGateway {
    async fn confirm_payment(
        &self,
        payment_key: &str,
        order_id: &str,
        amount: Won,
    ) -> Result<PaymentConfirmation, MarketplaceError> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self.check_outcome()?;
        let amount = match outcome {
            Outcome::WrongAmount => Won::from(amount.value() - 1),
            _ => amount,
        };
        let confirmation = confirmation_for(payment_key, order_id, amount);
        self.confirmed.lock().unwrap().insert(payment_key.to_string(), order_id.to_string());
        Ok(confirmation)
    }

    async fn cancel_payment(
        &self,
        payment_key: &str,
        cancel_reason: &str,
    ) -> Result<PaymentCancellation, MarketplaceError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        self.check_outcome()?;
        let mut cancellation: PaymentCancellation = serde_json::from_str(CANCELLATION).unwrap();
        cancellation.payment_key = payment_key.to_string();
        if let Some(order_id) = self.confirmed.lock().unwrap().get(payment_key) {
            cancellation.order_id = order_id.clone();
        }
        cancellation.cancels[0].cancel_reason = cancel_reason.to_string();
        Ok(cancellation)
    }
}

/// A gateway that confirms the charge, but only after something else has moved the local payment out of PENDING
/// (here, the buyer's order being cancelled while the confirmation is in flight).
#[derive(Clone)]
pub struct InterferingGateway {
    pub inner: FakeGateway,
    db: SqliteDatabase,
    fail_reversal: bool,
}

impl InterferingGateway {
    pub fn new(db: SqliteDatabase, fail_reversal: bool) -> Self {
        Self { inner: FakeGateway::default(), db, fail_reversal }
    }
}

impl PaymentGatewayClient for InterferingGateway {
    async fn confirm_payment(
        &self,
        payment_key: &str,
        order_id: &str,
        amount: Won,
    ) -> Result<PaymentConfirmation, MarketplaceError> {
        let order_key = OrderId::from(order_id);
        self.db.mark_payment_failed(&order_key, ORDER_CANCELLED_CODE, "cancelled during checkout").await?;
        let confirmation = self.inner.confirm_payment(payment_key, order_id, amount).await?;
        if self.fail_reversal {
            self.inner.set_outcome(Outcome::Fail(503));
        }
        Ok(confirmation)
    }

    async fn cancel_payment(
        &self,
        payment_key: &str,
        cancel_reason: &str,
    ) -> Result<PaymentCancellation, MarketplaceError> {
        self.inner.cancel_payment(payment_key, cancel_reason).await
    }
}

mock! {
    pub Gateway {}
    impl Clone for Gateway {
        fn clone(&self) -> Self;
    }
    impl PaymentGatewayClient for Gateway {
        async fn confirm_payment(
            &self,
            payment_key: &str,
            order_id: &str,
            amount: Won,
        ) -> Result<PaymentConfirmation, MarketplaceError>;
        async fn cancel_payment(
            &self,
            payment_key: &str,
            cancel_reason: &str,
        ) -> Result<PaymentCancellation, MarketplaceError>;
    }
}

/// Articles and users keyed by id and username.
#[derive(Default, Clone)]
pub struct StaticCatalog {
    articles: HashMap<String, Article>,
    users: HashMap<String, Customer>,
}

impl StaticCatalog {
    pub fn add_article(&mut self, id: &str, title: &str, price: i64, seller: &str) -> Article {
        let article =
            Article { api_id: id.to_string(), title: title.to_string(), price: Won::from(price), seller: seller.into() };
        self.articles.insert(id.to_string(), article.clone());
        article
    }

    pub fn add_user(&mut self, username: &str) -> Customer {
        let customer = Customer {
            api_id: format!("user-{username}"),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            display_name: username.to_uppercase(),
        };
        self.users.insert(username.to_string(), customer.clone());
        customer
    }
}

impl ArticleProvider for StaticCatalog {
    async fn fetch_article(&self, article_id: &str) -> Result<Option<Article>, MarketplaceError> {
        Ok(self.articles.get(article_id).cloned())
    }
}

impl UserProvider for StaticCatalog {
    async fn fetch_user(&self, username: &str) -> Result<Option<Customer>, MarketplaceError> {
        Ok(self.users.get(username).cloned())
    }
}
