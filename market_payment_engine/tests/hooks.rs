use std::sync::{
    atomic::{AtomicI32, Ordering},
    Arc,
    Mutex,
};

use futures_util::FutureExt;
use log::*;
use market_payment_engine::{
    db_types::{OrderStatusType, PaymentStatus, Won},
    events::{EventHandlers, EventHooks},
};
use support::{
    fakes::{FakeGateway, Outcome, StaticCatalog},
    prepare_env::{setup_with, tear_down},
};
use tokio::runtime::Runtime;

mod support;

#[derive(Default, Clone)]
struct HookCalled {
    called: Arc<AtomicI32>,
}

impl HookCalled {
    pub fn called(&self) {
        let _ = self.called.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> i32 {
        self.called.load(Ordering::Relaxed)
    }
}

fn catalog() -> StaticCatalog {
    let mut catalog = StaticCatalog::default();
    catalog.add_article("camera", "Vintage film camera", 50_000, "alice");
    catalog.add_user("bob");
    catalog
}

#[test]
fn on_payment_confirmed() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let rt = Runtime::new().unwrap();
    let event = HookCalled::default();
    let event_copy = event.clone();
    let amounts = Arc::new(Mutex::new(Vec::new()));
    let amounts_copy = Arc::clone(&amounts);
    rt.block_on(async move {
        let mut hooks = EventHooks::default();
        hooks.on_payment_confirmed(move |ev| {
            info!("🪝️ {ev:?}");
            event_copy.called();
            amounts_copy.lock().unwrap().push((ev.payment.status, ev.receipt.total_amount));
            async {}.boxed()
        });
        let handlers = EventHandlers::new(10, hooks);
        let gateway = FakeGateway::new(Outcome::Fail(500));
        let api = setup_with(gateway.clone(), handlers.producers()).await;
        let tasks = handlers.start_handlers();
        let catalog = catalog();
        let intent = api.payments().start_payment(&catalog, &catalog, "camera", "bob").await.unwrap();
        // Failures and replays are not confirmations
        let _ = api.payments().confirm("pk_001", &intent.order_id, Won::from(50_000)).await.unwrap_err();
        gateway.set_outcome(Outcome::Succeed);
        api.payments().confirm("pk_001", &intent.order_id, Won::from(50_000)).await.unwrap();
        let replay = api.payments().confirm("pk_001", &intent.order_id, Won::from(50_000)).await.unwrap();
        assert!(replay.replayed);
        tear_down(api).await;
        for task in tasks {
            task.await.unwrap();
        }
    });
    assert_eq!(event.count(), 1);
    assert_eq!(*amounts.lock().unwrap(), vec![(PaymentStatus::Success, Won::from(50_000))]);
    info!("🪝️ test complete");
}

#[test]
fn on_payment_cancelled_and_order_status_changed() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let rt = Runtime::new().unwrap();
    let cancelled = HookCalled::default();
    let cancelled_copy = cancelled.clone();
    let changed = HookCalled::default();
    let changed_copy = changed.clone();
    let transitions = Arc::new(Mutex::new(Vec::new()));
    let transitions_copy = Arc::clone(&transitions);
    rt.block_on(async move {
        let mut hooks = EventHooks::default();
        hooks
            .on_payment_cancelled(move |ev| {
                info!("🪝️ {ev:?}");
                assert_eq!(ev.payment.status, PaymentStatus::Canceled);
                cancelled_copy.called();
                async {}.boxed()
            })
            .on_order_status_changed(move |ev| {
                info!("🪝️ {ev:?}");
                changed_copy.called();
                transitions_copy.lock().unwrap().push((ev.old_status, ev.order.status));
                async {}.boxed()
            });
        let handlers = EventHandlers::new(10, hooks);
        let api = setup_with(FakeGateway::default(), handlers.producers()).await;
        let tasks = handlers.start_handlers();
        let catalog = catalog();
        let paid = api.payments().start_payment(&catalog, &catalog, "camera", "bob").await.unwrap();
        api.payments().confirm("pk_001", &paid.order_id, Won::from(50_000)).await.unwrap();
        api.update_status(&paid.order_id, "bob", OrderStatusType::Cancel, Some("customer request")).await.unwrap();
        let done = api.payments().start_payment(&catalog, &catalog, "camera", "bob").await.unwrap();
        api.payments().confirm("pk_002", &done.order_id, Won::from(50_000)).await.unwrap();
        api.update_status(&done.order_id, "alice", OrderStatusType::End, None).await.unwrap();
        // Rejected transitions are not announced
        let _ = api.update_status(&done.order_id, "alice", OrderStatusType::Cancel, Some("oops")).await.unwrap_err();
        tear_down(api).await;
        for task in tasks {
            task.await.unwrap();
        }
    });
    assert_eq!(cancelled.count(), 1);
    assert_eq!(changed.count(), 2);
    let mut transitions = transitions.lock().unwrap().clone();
    transitions.sort_by_key(|(_, new)| new.to_string());
    assert_eq!(transitions, vec![
        (OrderStatusType::Progress, OrderStatusType::Cancel),
        (OrderStatusType::Progress, OrderStatusType::End),
    ]);
    info!("🪝️ test complete");
}
