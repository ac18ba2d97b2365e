//! # Mock Framework
//!
//! `MockClient<T>` hands out a real [`ResourceClient<T>`] whose requests are
//! answered from a queue of scripted expectations instead of a running actor.
//! It is how the cart store is tested against a misbehaving backend:
//! rejections, transport failures and hand-picked cart contents are all a
//! `return_ok` / `return_err` away.
//!
//! ## When to use Mocks vs Real Actors
//!
//! | Feature | MockClient | Real Actor |
//! |---------|------------|------------|
//! | **State** | None (scripted replies) | Real state management |
//! | **Use Case** | Testing logic *around* a client | Testing the entity itself or the full system |
//! | **Error Injection** | `return_err` | Requires specific state |
//!
//! Expectations are consumed in FIFO order regardless of which id a request
//! carries. A request that arrives with no matching expectation is recorded
//! as a mismatch and its reply channel is dropped, so the caller observes
//! [`FrameworkError::ActorDropped`]; [`MockClient::verify`] then fails.
//!
//! ```rust
//! use cart_sync::framework::mock::MockClient;
//! use cart_sync::framework::FrameworkError;
//! use cart_sync::model::{CartId, ServerCart};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockClient::<ServerCart>::new();
//!     mock.expect_get(CartId::from("guest"))
//!         .return_err(FrameworkError::ActorClosed);
//!
//!     let client = mock.client();
//!     let result = client.get(CartId::from("guest")).await;
//!     assert!(matches!(result, Err(FrameworkError::ActorClosed)));
//!     mock.verify();
//! }
//! ```

use super::client::ResourceClient;
use super::entity::ActorEntity;
use super::error::FrameworkError;
use super::message::ResourceRequest;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

/// Represents an expected request to the mock client.
enum Expectation<T: ActorEntity> {
    Get {
        response: Result<Option<T>, FrameworkError>,
    },
    Create {
        response: Result<T::Id, FrameworkError>,
    },
    Update {
        response: Result<T, FrameworkError>,
    },
    Delete {
        response: Result<(), FrameworkError>,
    },
    Action {
        response: Result<T::ActionResult, FrameworkError>,
    },
}

impl<T: ActorEntity> Expectation<T> {
    fn kind(&self) -> &'static str {
        match self {
            Expectation::Get { .. } => "get",
            Expectation::Create { .. } => "create",
            Expectation::Update { .. } => "update",
            Expectation::Delete { .. } => "delete",
            Expectation::Action { .. } => "action",
        }
    }
}

/// A request the mock received, rendered for assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Operation name (`get`, `create`, `update`, `delete`, `action`, `subscribe`).
    pub kind: &'static str,
    /// The target id, via `Display`.
    pub id: String,
    /// `Debug` rendering of the payload (create params, update or action).
    pub detail: String,
}

struct MockState<T: ActorEntity> {
    expectations: VecDeque<Expectation<T>>,
    calls: Vec<RecordedCall>,
    mismatches: Vec<String>,
}

type Shared<T> = Arc<Mutex<MockState<T>>>;

fn lock<T: ActorEntity>(state: &Shared<T>) -> MutexGuard<'_, MockState<T>> {
    // A panicking test thread must not hide the recorded calls from the others.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn record<T: ActorEntity>(request: &ResourceRequest<T>) -> RecordedCall {
    let (id, detail) = match request {
        ResourceRequest::Create { id, params, .. } => (id.to_string(), format!("{params:?}")),
        ResourceRequest::Get { id, .. } => (id.to_string(), String::new()),
        ResourceRequest::Update { id, update, .. } => (id.to_string(), format!("{update:?}")),
        ResourceRequest::Delete { id, .. } => (id.to_string(), String::new()),
        ResourceRequest::Action { id, action, .. } => (id.to_string(), format!("{action:?}")),
        ResourceRequest::Subscribe { id, .. } => (id.to_string(), String::new()),
    };
    RecordedCall {
        kind: request.kind(),
        id,
        detail,
    }
}

/// A mock client with expectation tracking for fluent testing.
///
/// # Example
/// ```ignore
/// let mut mock = MockClient::<ServerCart>::new();
/// mock.expect_action(cart_id.clone()).return_ok(ServerCartResult::Clear(()));
///
/// let client = mock.client();
/// // Use client in tests...
/// mock.verify(); // Ensures all expectations were met
/// ```
pub struct MockClient<T: ActorEntity> {
    client: ResourceClient<T>,
    state: Shared<T>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: ActorEntity> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ActorEntity> MockClient<T> {
    /// Creates a new mock client with no expectations.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<ResourceRequest<T>>(100);
        let state: Shared<T> = Arc::new(Mutex::new(MockState {
            expectations: VecDeque::new(),
            calls: Vec::new(),
            mismatches: Vec::new(),
        }));
        let task_state = state.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = {
                    let mut state = lock(&task_state);
                    let call = record(&request);
                    state.calls.push(call);
                    state.expectations.pop_front()
                };

                match (request, expectation) {
                    (ResourceRequest::Get { respond_to, .. }, Some(Expectation::Get { response })) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::Create { respond_to, .. },
                        Some(Expectation::Create { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::Update { respond_to, .. },
                        Some(Expectation::Update { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::Delete { respond_to, .. },
                        Some(Expectation::Delete { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::Action { respond_to, .. },
                        Some(Expectation::Action { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (request, expectation) => {
                        let expected = expectation.as_ref().map_or("nothing", Expectation::kind);
                        let message =
                            format!("unexpected {} request (expected {})", request.kind(), expected);
                        tracing::warn!(%message, "Mock mismatch");
                        let mut state = lock(&task_state);
                        if let Some(expectation) = expectation {
                            state.expectations.push_front(expectation);
                        }
                        state.mismatches.push(message);
                    }
                }
            }
        });

        Self {
            client: ResourceClient::new(sender),
            state,
            _handle: handle,
        }
    }

    /// Returns the client for use in tests.
    pub fn client(&self) -> ResourceClient<T> {
        self.client.clone()
    }

    /// Expects a `get` operation.
    pub fn expect_get(&mut self, _id: T::Id) -> ExpectationBuilder<T, Option<T>> {
        ExpectationBuilder::new(self.state.clone(), |response| Expectation::Get { response })
    }

    /// Expects a `create` operation.
    pub fn expect_create(&mut self) -> ExpectationBuilder<T, T::Id> {
        ExpectationBuilder::new(self.state.clone(), |response| Expectation::Create { response })
    }

    /// Expects an `update` operation.
    pub fn expect_update(&mut self, _id: T::Id) -> ExpectationBuilder<T, T> {
        ExpectationBuilder::new(self.state.clone(), |response| Expectation::Update { response })
    }

    /// Expects a `delete` operation.
    pub fn expect_delete(&mut self, _id: T::Id) -> ExpectationBuilder<T, ()> {
        ExpectationBuilder::new(self.state.clone(), |response| Expectation::Delete { response })
    }

    /// Expects an `action` operation.
    pub fn expect_action(&mut self, _id: T::Id) -> ExpectationBuilder<T, T::ActionResult> {
        ExpectationBuilder::new(self.state.clone(), |response| Expectation::Action { response })
    }

    /// Every request received so far, in arrival order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.state).calls.clone()
    }

    /// Verifies that all expectations were met and nothing unexpected arrived.
    ///
    /// # Panics
    /// Panics with the outstanding expectations and mismatches otherwise.
    pub fn verify(&self) {
        let state = lock(&self.state);
        if !state.mismatches.is_empty() {
            panic!("Mock received unexpected requests: {:?}", state.mismatches);
        }
        if !state.expectations.is_empty() {
            panic!(
                "Not all expectations were met. {} remaining",
                state.expectations.len()
            );
        }
    }
}

/// Fluent builder queuing one expectation with its scripted response.
pub struct ExpectationBuilder<T: ActorEntity, R> {
    state: Shared<T>,
    wrap: fn(Result<R, FrameworkError>) -> Expectation<T>,
}

impl<T: ActorEntity, R> ExpectationBuilder<T, R> {
    fn new(state: Shared<T>, wrap: fn(Result<R, FrameworkError>) -> Expectation<T>) -> Self {
        Self { state, wrap }
    }

    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: R) {
        let expectation = (self.wrap)(Ok(value));
        lock(&self.state).expectations.push_back(expectation);
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: FrameworkError) {
        let expectation = (self.wrap)(Err(error));
        lock(&self.state).expectations.push_back(expectation);
    }
}

/// Creates a bare client and the receiver its requests land on, for tests
/// that want to inspect and answer each request by hand.
pub fn create_mock_client<T: ActorEntity>(
    buffer_size: usize,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Helper to take the next request if it is an Action.
pub async fn expect_action<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(
    T::Id,
    T::Action,
    tokio::sync::oneshot::Sender<Result<T::ActionResult, FrameworkError>>,
)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action {
            id,
            action,
            respond_to,
        }) => Some((id, action, respond_to)),
        _ => None,
    }
}
