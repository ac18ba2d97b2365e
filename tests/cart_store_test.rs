use async_trait::async_trait;
use cart_sync::cart_actor::{self, CartAction, CartActionResult, CartError, MergeMode};
use cart_sync::clients::{CartClient, CartService, CartStore, ServerCartClient, ServiceError};
use cart_sync::framework::mock::{create_mock_client, expect_action, MockClient};
use cart_sync::framework::{FrameworkError, ResourceClient};
use cart_sync::model::{
    Cart, CartCreate, CartId, DeliveryInfo, LineId, MutationReply, NewCartItem, NoticeLevel,
    PriceUpdateReply, RemoteLine, RemotePriceChange, ServerCart, StoreEvent,
};
use cart_sync::server_actor::{ServerCartAction, ServerCartResult, ServerError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

fn cart_id() -> CartId {
    CartId::from("cart_1")
}

fn line(id: &str, key: &str, quantity: u32, stock: Option<u32>) -> RemoteLine {
    let mut item = NewCartItem::new(format!("Part {key}"), 100.0, quantity).with_offer_key(key);
    item.stock = stock;
    RemoteLine::from_new(LineId::from(id), item)
}

/// Real mirror actor, opened and ready.
async fn mirror() -> CartClient {
    let (actor, client) = cart_actor::new(16);
    tokio::spawn(actor.run(()));
    let cart = CartClient::new(client, cart_id());
    cart.open(CartCreate {
        delivery: DeliveryInfo::default(),
    })
    .await
    .expect("Failed to open mirror");
    cart
}

/// Store over a real mirror and a backend client talking to `backend`.
async fn store_over(backend: ResourceClient<ServerCart>) -> (CartStore, CartClient) {
    let cart = mirror().await;
    let service = ServerCartClient::new(backend, cart_id());
    (CartStore::new(cart.clone(), Arc::new(service), 16), cart)
}

fn notices(events: &mut broadcast::Receiver<StoreEvent>) -> Vec<(NoticeLevel, String)> {
    let mut notices = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let StoreEvent::Notice(notice) = event {
            notices.push((notice.level, notice.message));
        }
    }
    notices
}

/// Pattern: real mirror actor + mocked backend.
/// The clamped quantity is what goes over the wire, never the requested one.
#[tokio::test]
async fn test_clamped_quantity_is_what_gets_sent() {
    let mut backend = MockClient::<ServerCart>::new();
    backend
        .expect_get(cart_id())
        .return_ok(Some(ServerCart::with_lines(
            cart_id(),
            vec![line("line_1", "X", 2, Some(5))],
        )));
    backend
        .expect_action(cart_id())
        .return_ok(ServerCartResult::SetQuantity(vec![line(
            "line_1",
            "X",
            5,
            Some(5),
        )]));

    let (store, _) = store_over(backend.client()).await;
    assert_eq!(store.load().await.unwrap(), 1);
    store
        .update_quantity(LineId::from("line_1"), 10)
        .await
        .unwrap();

    let calls = backend.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].kind, "action");
    assert_eq!(
        calls[1].detail,
        "SetQuantity { line: LineId(\"line_1\"), quantity: 5 }"
    );
    assert_eq!(store.snapshot().await.unwrap().items[0].quantity(), 5);
    backend.verify();
}

#[tokio::test]
async fn test_clamp_at_ceiling_sends_nothing() {
    let mut backend = MockClient::<ServerCart>::new();
    backend
        .expect_get(cart_id())
        .return_ok(Some(ServerCart::with_lines(
            cart_id(),
            vec![line("line_1", "X", 5, Some(5))],
        )));

    let (store, _) = store_over(backend.client()).await;
    store.load().await.unwrap();
    let mut events = store.events();

    store
        .update_quantity(LineId::from("line_1"), 8)
        .await
        .unwrap();

    assert_eq!(backend.calls().len(), 1);
    assert_eq!(
        notices(&mut events),
        vec![(
            NoticeLevel::Info,
            "Only 5 available, quantity limited to 5".to_string()
        )]
    );
    assert!(!store.snapshot().await.unwrap().is_loading());
    backend.verify();
}

#[tokio::test]
async fn test_backend_refusal_message_reaches_user() {
    let mut backend = MockClient::<ServerCart>::new();
    backend
        .expect_action(cart_id())
        .return_err(FrameworkError::EntityError(Box::new(
            ServerError::InsufficientStock {
                requested: 2,
                available: 1,
            },
        )));

    let (store, _) = store_over(backend.client()).await;
    let mut events = store.events();

    let err = store
        .add_item(NewCartItem::new("Spark plug", 300.0, 2).with_product_id("p1"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Insufficient stock: requested 2, available 1");

    let cart = store.snapshot().await.unwrap();
    assert!(cart.is_empty());
    assert_eq!(cart.pending, 0);
    assert_eq!(cart.last_error.as_deref(), Some(err.to_string().as_str()));
    assert_eq!(notices(&mut events), vec![(NoticeLevel::Error, err.to_string())]);
    backend.verify();
}

#[tokio::test]
async fn test_unreachable_backend_gets_generic_message() {
    let mut backend = MockClient::<ServerCart>::new();
    backend
        .expect_action(cart_id())
        .return_err(FrameworkError::ActorClosed);

    let (store, _) = store_over(backend.client()).await;

    let err = store
        .add_item(NewCartItem::new("Spark plug", 300.0, 1).with_product_id("p1"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Could not add the item to the cart");
    assert_eq!(store.snapshot().await.unwrap().pending, 0);
    backend.verify();
}

#[tokio::test]
async fn test_bulk_removal_reports_failures_once() {
    let mut backend = MockClient::<ServerCart>::new();
    let both = vec![line("line_1", "A", 1, None), line("line_2", "B", 1, None)];
    backend
        .expect_action(cart_id())
        .return_ok(ServerCartResult::Remove(both.clone()));
    backend
        .expect_action(cart_id())
        .return_err(FrameworkError::EntityError(Box::new(
            ServerError::LineNotFound("gone".into()),
        )));

    let (store, cart) = store_over(backend.client()).await;
    cart.merge(both, MergeMode::Full).await.unwrap();
    let mut events = store.events();

    assert_eq!(store.remove_selected().await.unwrap(), 1);

    let snapshot = store.snapshot().await.unwrap();
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.pending, 0);
    assert_eq!(snapshot.last_error.as_deref(), Some("Cart item not found: gone"));
    assert_eq!(
        notices(&mut events),
        vec![(NoticeLevel::Error, "Removed: 1, failed: 1".to_string())]
    );
    backend.verify();
}

#[tokio::test]
async fn test_nothing_selected_removes_nothing() {
    let backend = MockClient::<ServerCart>::new();
    let (store, cart) = store_over(backend.client()).await;
    cart.merge(vec![line("line_1", "A", 1, None)], MergeMode::Full)
        .await
        .unwrap();
    store.toggle_select(LineId::from("line_1")).await.unwrap();

    assert_eq!(store.remove_selected().await.unwrap(), 0);
    assert!(backend.calls().is_empty());
    backend.verify();
}

/// Pattern: manual request handling.
/// A second refresh while the first waits on the backend is skipped.
#[tokio::test]
async fn test_price_refresh_is_single_flight() {
    let (client, mut receiver) = create_mock_client::<ServerCart>(4);
    let (store, cart) = store_over(client).await;
    cart.merge(vec![line("line_1", "X", 2, None)], MergeMode::Full)
        .await
        .unwrap();

    let first = tokio::spawn({
        let store = store.clone();
        async move { store.update_prices().await }
    });

    let (id, action, responder) = expect_action(&mut receiver)
        .await
        .expect("Expected Action request");
    assert_eq!(id, cart_id());
    assert!(matches!(action, ServerCartAction::RevalidatePrices));

    assert_eq!(store.update_prices().await.unwrap(), None);
    assert!(store.snapshot().await.unwrap().refreshing_prices);

    let mut repriced = line("line_1", "X", 2, None);
    repriced.price = 120.0;
    responder
        .send(Ok(ServerCartResult::RevalidatePrices {
            lines: vec![repriced],
            changes: vec![RemotePriceChange {
                item_id: None,
                offer_key: Some("X".into()),
                product_id: None,
                old_price: 100.0,
                new_price: 120.0,
            }],
        }))
        .unwrap();

    let changes = first.await.unwrap().unwrap().expect("Refresh skipped");
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].line_id, LineId::from("line_1"));
    assert_eq!(changes[0].difference(), 20.0);

    let snapshot = store.snapshot().await.unwrap();
    assert!(!snapshot.refreshing_prices);
    assert_eq!(snapshot.summary.total_price, 240.0);
}

#[tokio::test]
async fn test_failed_price_refresh_releases_guard() {
    let mut backend = MockClient::<ServerCart>::new();
    backend
        .expect_action(cart_id())
        .return_err(FrameworkError::ActorClosed);
    backend
        .expect_action(cart_id())
        .return_ok(ServerCartResult::RevalidatePrices {
            lines: vec![line("line_1", "X", 1, None)],
            changes: Vec::new(),
        });

    let (store, cart) = store_over(backend.client()).await;
    cart.merge(vec![line("line_1", "X", 1, None)], MergeMode::Full)
        .await
        .unwrap();
    let mut events = store.events();

    let err = store.update_prices().await.unwrap_err();
    assert_eq!(err.to_string(), "Could not check current prices");
    let snapshot = store.snapshot().await.unwrap();
    assert!(!snapshot.refreshing_prices);
    assert_eq!(snapshot.last_error.as_deref(), Some("Could not check current prices"));
    assert_eq!(notices(&mut events), vec![(NoticeLevel::Error, err.to_string())]);

    assert_eq!(store.update_prices().await.unwrap(), Some(Vec::new()));
    backend.verify();
}

/// A backend that answers from a script, for reply shapes the in-memory
/// backend never produces.
#[derive(Default)]
struct ScriptedService {
    lines: Mutex<Vec<RemoteLine>>,
    replies: Mutex<VecDeque<MutationReply>>,
    fetches: Mutex<usize>,
    added: Mutex<Vec<NewCartItem>>,
}

impl ScriptedService {
    fn reply(&self, reply: MutationReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    fn next(&self) -> Result<MutationReply, ServiceError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ServiceError::Transport("no scripted reply".into()))
    }
}

#[async_trait]
impl CartService for ScriptedService {
    async fn get_cart(&self) -> Result<Vec<RemoteLine>, ServiceError> {
        *self.fetches.lock().unwrap() += 1;
        Ok(self.lines.lock().unwrap().clone())
    }

    async fn add_to_cart(&self, item: NewCartItem) -> Result<MutationReply, ServiceError> {
        self.added.lock().unwrap().push(item);
        self.next()
    }

    async fn remove_from_cart(&self, _line: LineId) -> Result<MutationReply, ServiceError> {
        self.next()
    }

    async fn update_quantity(
        &self,
        _line: LineId,
        _quantity: u32,
    ) -> Result<MutationReply, ServiceError> {
        self.next()
    }

    async fn update_prices(&self) -> Result<PriceUpdateReply, ServiceError> {
        self.next().map(|reply| PriceUpdateReply {
            reply,
            price_changes: Vec::new(),
        })
    }

    async fn clear_cart(&self) -> Result<MutationReply, ServiceError> {
        self.next()
    }
}

#[tokio::test]
async fn test_reply_without_cart_triggers_refetch() {
    let service = Arc::new(ScriptedService::default());
    *service.lines.lock().unwrap() = vec![line("line_7", "X", 1, None)];
    service.reply(MutationReply {
        success: true,
        message: Some("Added".into()),
        error: None,
        cart: None,
    });

    let store = CartStore::new(mirror().await, service.clone(), 16);
    store
        .add_item(NewCartItem::new("Part X", 100.0, 1).with_offer_key("X"))
        .await
        .unwrap();

    assert_eq!(*service.fetches.lock().unwrap(), 1);
    let cart = store.snapshot().await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].id(), &LineId::from("line_7"));
}

#[tokio::test]
async fn test_removal_without_cart_drops_line_and_uses_server_message() {
    let service = Arc::new(ScriptedService::default());
    service.reply(MutationReply {
        success: true,
        message: None,
        error: None,
        cart: None,
    }
    .with_message("Brake pads removed"));

    let cart = mirror().await;
    cart.merge(
        vec![line("line_1", "A", 1, None), line("line_2", "B", 1, None)],
        MergeMode::Full,
    )
    .await
    .unwrap();
    let store = CartStore::new(cart, service.clone(), 16);
    let mut events = store.events();

    store.remove_item(LineId::from("line_1")).await.unwrap();

    assert_eq!(*service.fetches.lock().unwrap(), 0);
    let snapshot = store.snapshot().await.unwrap();
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.items[0].id(), &LineId::from("line_2"));
    assert_eq!(
        notices(&mut events),
        vec![(NoticeLevel::Success, "Brake pads removed".to_string())]
    );
}

#[tokio::test]
async fn test_silent_removal_emits_nothing() {
    let service = Arc::new(ScriptedService::default());
    service.reply(MutationReply::rejected("Line is locked"));

    let cart = mirror().await;
    cart.merge(vec![line("line_1", "A", 1, None)], MergeMode::Full)
        .await
        .unwrap();
    let store = CartStore::new(cart, service, 16);
    let mut events = store.events();

    let err = store
        .remove_item_silently(LineId::from("line_1"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Line is locked");
    assert!(notices(&mut events).is_empty());
    assert_eq!(store.snapshot().await.unwrap().items.len(), 1);
}

#[tokio::test]
async fn test_added_item_gets_store_currency() {
    let service = Arc::new(ScriptedService::default());
    service.reply(MutationReply::ok(Vec::new()));
    let store = CartStore::new(mirror().await, service.clone(), 16).with_currency("EUR");

    // Local-only edits on unknown lines fail without touching the backend.
    assert!(store.toggle_select(LineId::from("nope")).await.is_err());
    store
        .add_item(NewCartItem::new("Wiper", 10.0, 1).with_currency(""))
        .await
        .unwrap();
    assert!(store.snapshot().await.unwrap().is_empty());
    assert_eq!(service.added.lock().unwrap()[0].currency, "EUR");
}

/// A refresh that reports a line above its new stock clamps it, says so,
/// and stores the ceiling on the backend without a second notice.
#[tokio::test]
async fn test_stock_drop_seen_on_refresh_is_clamped_and_synced() {
    let mut backend = MockClient::<ServerCart>::new();
    backend
        .expect_action(cart_id())
        .return_ok(ServerCartResult::RevalidatePrices {
            lines: vec![line("line_1", "X", 4, Some(2))],
            changes: Vec::new(),
        });
    backend
        .expect_action(cart_id())
        .return_ok(ServerCartResult::SetQuantity(vec![line(
            "line_1",
            "X",
            2,
            Some(2),
        )]));

    let (store, cart) = store_over(backend.client()).await;
    cart.merge(vec![line("line_1", "X", 4, Some(10))], MergeMode::Full)
        .await
        .unwrap();
    let mut events = store.events();

    assert_eq!(store.update_prices().await.unwrap(), Some(Vec::new()));

    let calls = backend.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[1].detail,
        "SetQuantity { line: LineId(\"line_1\"), quantity: 2 }"
    );
    let snapshot = store.snapshot().await.unwrap();
    assert_eq!(snapshot.items[0].quantity(), 2);
    assert_eq!(snapshot.items[0].line.stock, Some(2));
    assert_eq!(snapshot.pending, 0);
    assert_eq!(snapshot.last_error, None);
    assert_eq!(
        notices(&mut events),
        vec![(
            NoticeLevel::Info,
            "Only 2 available, quantity limited to 2".to_string()
        )]
    );
    backend.verify();
}

/// A load that finds a line above its stock keeps the mirror within the
/// ceiling even when the backend refuses to store it.
#[tokio::test]
async fn test_clamp_holds_when_backend_refuses_ceiling() {
    let mut backend = MockClient::<ServerCart>::new();
    backend
        .expect_get(cart_id())
        .return_ok(Some(ServerCart::with_lines(
            cart_id(),
            vec![line("line_1", "X", 3, Some(1))],
        )));
    backend
        .expect_action(cart_id())
        .return_err(FrameworkError::EntityError(Box::new(
            ServerError::LineNotFound("line_1".into()),
        )));

    let (store, _) = store_over(backend.client()).await;
    assert_eq!(store.load().await.unwrap(), 1);

    let snapshot = store.snapshot().await.unwrap();
    assert_eq!(snapshot.items[0].quantity(), 1);
    assert_eq!(snapshot.pending, 0);
    assert_eq!(
        snapshot.last_error.as_deref(),
        Some("Cart item not found: line_1")
    );
    backend.verify();
}

/// Pattern: mocked mirror, answered by hand.
/// When applying re-validated prices fails, the slot is still released.
#[tokio::test]
async fn test_failed_price_apply_releases_guard() {
    let (client, mut receiver) = create_mock_client::<Cart>(4);
    let service = Arc::new(ScriptedService::default());
    service.reply(MutationReply::ok(vec![line("line_1", "X", 1, None)]));
    let store = CartStore::new(CartClient::new(client, cart_id()), service, 16);
    let mut events = store.events();

    let refresh = tokio::spawn({
        let store = store.clone();
        async move { store.update_prices().await }
    });

    let (_, action, responder) = expect_action(&mut receiver)
        .await
        .expect("Expected Action request");
    assert!(matches!(action, CartAction::BeginPriceRefresh));
    responder
        .send(Ok(CartActionResult::BeginPriceRefresh(Some(3))))
        .unwrap();

    let (_, action, responder) = expect_action(&mut receiver).await.unwrap();
    assert!(matches!(action, CartAction::ApplyPrices { basis: 3, .. }));
    responder.send(Err(FrameworkError::ActorClosed)).unwrap();

    let (_, action, responder) = expect_action(&mut receiver).await.unwrap();
    assert!(matches!(action, CartAction::AbortPriceRefresh(Some(_))));
    responder
        .send(Ok(CartActionResult::AbortPriceRefresh(())))
        .unwrap();

    let err = refresh.await.unwrap().unwrap_err();
    assert!(matches!(err, CartError::ActorCommunicationError(_)));
    assert_eq!(notices(&mut events), vec![(NoticeLevel::Error, err.to_string())]);
}
