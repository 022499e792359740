use market_payment_engine::{
    db_types::{OrderId, OrderStatusType, PaymentStatus, Won},
    order_objects::{OrderRole, Paging},
    MarketplaceDatabase,
    MarketplaceError,
    ORDER_CANCELLED_CODE,
};
use support::{
    fakes::{FakeGateway, Outcome, StaticCatalog},
    prepare_env::{setup, tear_down},
};

mod support;

fn catalog() -> StaticCatalog {
    let mut catalog = StaticCatalog::default();
    catalog.add_article("camera", "Vintage film camera", 50_000, "alice");
    catalog.add_article("lens", "50mm prime lens", 120_000, "alice");
    catalog.add_article("bike", "Road bike", 300_000, "carol");
    catalog.add_user("bob");
    catalog.add_user("dave");
    catalog
}

#[tokio::test]
async fn orders_end_and_stay_ended() {
    let api = setup(FakeGateway::default()).await;
    let mut catalog = catalog();
    let article = catalog.add_article("tripod", "Carbon tripod", 80_000, "alice");
    let order = api.create_order(&article, "bob").await.unwrap();
    assert_eq!(order.status, OrderStatusType::Progress);
    assert_eq!(order.price, Won::from(80_000));
    assert_eq!(order.article_title, "Carbon tripod");

    let ended = api.update_status(&order.api_id, "alice", OrderStatusType::End, None).await.unwrap();
    assert_eq!(ended.status, OrderStatusType::End);
    for status in [OrderStatusType::Progress, OrderStatusType::End, OrderStatusType::Cancel] {
        let err = api.update_status(&order.api_id, "bob", status, Some("changed my mind")).await.unwrap_err();
        assert!(matches!(err, MarketplaceError::InvalidStateTransition(_)), "{status}: {err}");
    }
    assert_eq!(api.order_by_api_id(&order.api_id).await.unwrap().status, OrderStatusType::End);
    tear_down(api).await;
}

#[tokio::test]
async fn only_parties_can_touch_an_order() {
    let api = setup(FakeGateway::default()).await;
    let catalog = catalog();
    let intent = api.payments().start_payment(&catalog, &catalog, "camera", "bob").await.unwrap();

    let err = api.order_detail(&intent.order_id, "dave").await.unwrap_err();
    assert!(matches!(err, MarketplaceError::AccessDenied(_)));
    let err = api.update_status(&intent.order_id, "dave", OrderStatusType::End, None).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::AccessDenied(_)));
    let err = api.soft_delete(&intent.order_id, "dave").await.unwrap_err();
    assert!(matches!(err, MarketplaceError::AccessDenied(_)));

    let detail = api.order_detail(&intent.order_id, "alice").await.unwrap();
    assert_eq!(detail.order.api_id, intent.order_id);
    assert_eq!(detail.payment.unwrap().status, PaymentStatus::Pending);
    assert!(detail.receipt_api_id.is_none());

    let err = api.order_detail(&OrderId::from("missing"), "alice").await.unwrap_err();
    assert!(matches!(err, MarketplaceError::OrderNotFound(_)));
    tear_down(api).await;
}

#[tokio::test]
async fn cancelling_a_paid_order_refunds_it() {
    let gateway = FakeGateway::default();
    let api = setup(gateway.clone()).await;
    let catalog = catalog();
    let intent = api.payments().start_payment(&catalog, &catalog, "camera", "bob").await.unwrap();
    let confirmed = api.payments().confirm("pk_001", &intent.order_id, Won::from(50_000)).await.unwrap();
    let detail = api.order_detail(&intent.order_id, "bob").await.unwrap();
    assert_eq!(detail.receipt_api_id.as_deref(), Some(confirmed.receipt_id.as_str()));

    let err = api.update_status(&intent.order_id, "bob", OrderStatusType::Cancel, Some(" ")).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::MissingCancelReason));
    assert_eq!(gateway.cancel_calls(), 0);

    let order =
        api.update_status(&intent.order_id, "bob", OrderStatusType::Cancel, Some("customer request")).await.unwrap();
    assert_eq!(order.status, OrderStatusType::Cancel);
    assert_eq!(gateway.cancel_calls(), 1);
    let payment = api.payments().payment_for_order(&intent.order_id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Canceled);
    assert_eq!(payment.cancel_reason.as_deref(), Some("customer request"));
    tear_down(api).await;
}

#[tokio::test]
async fn failed_refund_keeps_the_order_in_progress() {
    let gateway = FakeGateway::default();
    let api = setup(gateway.clone()).await;
    let catalog = catalog();
    let intent = api.payments().start_payment(&catalog, &catalog, "camera", "bob").await.unwrap();
    api.payments().confirm("pk_001", &intent.order_id, Won::from(50_000)).await.unwrap();

    gateway.set_outcome(Outcome::Fail(503));
    let err = api
        .update_status(&intent.order_id, "alice", OrderStatusType::Cancel, Some("out of stock"))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketplaceError::ExternalServiceError(_)));
    assert_eq!(api.order_by_api_id(&intent.order_id).await.unwrap().status, OrderStatusType::Progress);
    let payment = api.payments().payment_for_order(&intent.order_id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Success);
    tear_down(api).await;
}

#[tokio::test]
async fn cancelling_before_checkout_fails_the_pending_payment() {
    let gateway = FakeGateway::default();
    let api = setup(gateway.clone()).await;
    let catalog = catalog();
    let intent = api.payments().start_payment(&catalog, &catalog, "camera", "bob").await.unwrap();

    let order =
        api.update_status(&intent.order_id, "bob", OrderStatusType::Cancel, Some("changed my mind")).await.unwrap();
    assert_eq!(order.status, OrderStatusType::Cancel);
    assert_eq!(gateway.cancel_calls(), 0);
    let payment = api.payments().payment_for_order(&intent.order_id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Failed);
    assert_eq!(payment.fail_code.as_deref(), Some(ORDER_CANCELLED_CODE));
    assert_eq!(payment.fail_message.as_deref(), Some("changed my mind"));

    // The buyer can no longer complete the checkout
    let err = api.payments().confirm("pk_001", &intent.order_id, Won::from(50_000)).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::AlreadyProcessed(_)));
    tear_down(api).await;
}

#[tokio::test]
async fn orders_without_payment_cancel_without_a_reason() {
    let api = setup(FakeGateway::default()).await;
    let mut catalog = catalog();
    let article = catalog.add_article("tripod", "Carbon tripod", 80_000, "alice");
    let order = api.create_order(&article, "bob").await.unwrap();
    let order = api.update_status(&order.api_id, "alice", OrderStatusType::Cancel, None).await.unwrap();
    assert_eq!(order.status, OrderStatusType::Cancel);
    tear_down(api).await;
}

#[tokio::test]
async fn soft_deleted_orders_disappear() {
    let api = setup(FakeGateway::default()).await;
    let catalog = catalog();
    let intent = api.payments().start_payment(&catalog, &catalog, "camera", "bob").await.unwrap();

    let deleted = api.soft_delete(&intent.order_id, "bob").await.unwrap();
    assert!(deleted.is_deleted());
    let err = api.order_by_api_id(&intent.order_id).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::OrderNotFound(_)));
    let audit = api.order_by_api_id_including_deleted(&intent.order_id).await.unwrap();
    assert_eq!(audit.api_id, intent.order_id);
    assert!(audit.deleted_at.is_some());

    // The unsettled payment went with it
    assert!(api.payments().payment_for_order(&intent.order_id).await.unwrap().is_none());
    let err = api.payments().confirm("pk_001", &intent.order_id, Won::from(50_000)).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::PaymentNotFound(_)));

    let page = api.orders_for_user("bob", OrderRole::Consumer, None, None, Paging::default()).await.unwrap();
    assert_eq!(page.total, 0);
    assert!(page.orders.is_empty());
    let err = api.soft_delete(&intent.order_id, "bob").await.unwrap_err();
    assert!(matches!(err, MarketplaceError::OrderNotFound(_)));
    tear_down(api).await;
}

#[tokio::test]
async fn settled_payments_survive_soft_delete() {
    let api = setup(FakeGateway::default()).await;
    let catalog = catalog();
    let intent = api.payments().start_payment(&catalog, &catalog, "camera", "bob").await.unwrap();
    api.payments().confirm("pk_001", &intent.order_id, Won::from(50_000)).await.unwrap();
    api.soft_delete(&intent.order_id, "alice").await.unwrap();
    let payment = api.payments().payment_for_order(&intent.order_id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Success);
    assert!(payment.deleted_at.is_none());
    tear_down(api).await;
}

#[tokio::test]
async fn listings_filter_and_page() {
    let api = setup(FakeGateway::default()).await;
    let catalog = catalog();
    let mut camera_orders = Vec::new();
    for buyer in ["bob", "dave", "bob"] {
        let intent = api.payments().start_payment(&catalog, &catalog, "camera", buyer).await.unwrap();
        camera_orders.push(intent.order_id);
    }
    api.payments().start_payment(&catalog, &catalog, "lens", "bob").await.unwrap();
    api.payments().start_payment(&catalog, &catalog, "bike", "bob").await.unwrap();
    api.update_status(&camera_orders[1], "alice", OrderStatusType::End, None).await.unwrap();

    // Seller view of one article
    let page = api.orders_for_article(&catalog, "camera", "alice", None, Paging::default()).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.orders.iter().map(|o| o.api_id.clone()).collect::<Vec<_>>(), camera_orders);
    let page = api
        .orders_for_article(&catalog, "camera", "alice", Some(OrderStatusType::End), Paging::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.orders[0].consumer, "dave");
    let err = api.orders_for_article(&catalog, "camera", "bob", None, Paging::default()).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::AccessDenied(_)));
    let err = api.orders_for_article(&catalog, "piano", "alice", None, Paging::default()).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::ArticleNotFound(_)));

    // User views
    let page = api.orders_for_user("alice", OrderRole::Seller, None, None, Paging::default()).await.unwrap();
    assert_eq!(page.total, 4);
    let page = api.orders_for_user("bob", OrderRole::Consumer, None, None, Paging::default()).await.unwrap();
    assert_eq!(page.total, 4);
    let page = api
        .orders_for_user("bob", OrderRole::Consumer, Some(OrderStatusType::Progress), Some("film"), Paging::default())
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert!(page.orders.iter().all(|o| o.article_title == "Vintage film camera"));
    let page = api.orders_for_user("bob", OrderRole::Seller, None, None, Paging::default()).await.unwrap();
    assert_eq!(page.total, 0);

    // Paging
    let page = api.orders_for_user("bob", OrderRole::Consumer, None, None, Paging::new(0, 3)).await.unwrap();
    assert_eq!(page.orders.len(), 3);
    assert_eq!(page.total, 4);
    assert_eq!(page.total_pages(), 2);
    let page = api.orders_for_user("bob", OrderRole::Consumer, None, None, Paging::new(1, 3)).await.unwrap();
    assert_eq!(page.orders.len(), 1);
    assert_eq!(page.orders[0].article_title, "Road bike");
    let page =
        api.orders_for_user("bob", OrderRole::Consumer, None, None, Paging::new(0, 1).descending()).await.unwrap();
    assert_eq!(page.orders[0].article_title, "Road bike");
    tear_down(api).await;
}

#[tokio::test]
async fn payment_confirmed_during_cancel_keeps_the_order_open() {
    let gateway = FakeGateway::default();
    let api = setup(gateway.clone()).await;
    let catalog = catalog();
    let intent = api.payments().start_payment(&catalog, &catalog, "camera", "bob").await.unwrap();
    // The cancel reads the order while the payment is still PENDING, then the buyer's confirmation lands
    let order = api.order_by_api_id(&intent.order_id).await.unwrap();
    api.payments().confirm("pk_001", &intent.order_id, Won::from(50_000)).await.unwrap();

    let err = api
        .db()
        .update_order_status(&order, OrderStatusType::Cancel, Some((ORDER_CANCELLED_CODE, "changed my mind")))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketplaceError::InvalidStateTransition(_)));
    let order = api.order_by_api_id(&intent.order_id).await.unwrap();
    assert_eq!(order.status, OrderStatusType::Progress);
    let payment = api.payments().payment_for_order(&intent.order_id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Success);
    assert!(payment.fail_code.is_none());

    // Going through the front door again takes the refund path
    let order =
        api.update_status(&intent.order_id, "bob", OrderStatusType::Cancel, Some("customer request")).await.unwrap();
    assert_eq!(order.status, OrderStatusType::Cancel);
    assert_eq!(gateway.cancel_calls(), 1);
    let payment = api.payments().payment_for_order(&intent.order_id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Canceled);
    tear_down(api).await;
}
