//! Command-dispatch bus
//!
//! Serializes heterogeneous requests from UI surfaces into store
//! operations with a uniform `{ok, data|error}` reply envelope.
//!
//! Dispatch contract:
//! - Malformed request shape or an unknown/unregistered action is logged
//!   and dropped without a reply; callers apply their own timeout.
//! - A dispatched handler produces exactly one reply, and the bus is the
//!   sole writer of it. Handler failures of every kind (error return,
//!   panic) come back as `{ok: false, error}` — the bus never raises.

mod actions;
mod handlers;

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use actions::Action;
pub use handlers::register_all_handlers;

/// An inbound command: an action name and an optional JSON payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// Where a request came from, for handlers that care
#[derive(Debug, Clone, Default)]
pub struct CallerContext {
    /// Originating surface, e.g. a page URL or panel name
    pub origin: Option<String>,
}

/// The uniform reply envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// A registered command handler
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(
        &self,
        payload: Option<Value>,
        ctx: CallerContext,
    ) -> std::result::Result<Value, String>;
}

type BoxedHandlerFuture =
    std::pin::Pin<Box<dyn Future<Output = std::result::Result<Value, String>> + Send>>;

/// Adapter so plain async closures can be registered as handlers
struct FnHandler(Box<dyn Fn(Option<Value>, CallerContext) -> BoxedHandlerFuture + Send + Sync>);

#[async_trait]
impl CommandHandler for FnHandler {
    async fn handle(
        &self,
        payload: Option<Value>,
        ctx: CallerContext,
    ) -> std::result::Result<Value, String> {
        (self.0)(payload, ctx).await
    }
}

pub struct CommandBus {
    handlers: RwLock<HashMap<Action, Arc<dyn CommandHandler>>>,
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandBus {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Bind a handler to an action. Re-registration overwrites the
    /// previous binding; the last writer wins.
    pub fn register(&self, action: Action, handler: Arc<dyn CommandHandler>) {
        let mut handlers = self.handlers.write().unwrap();
        if handlers.insert(action, handler).is_some() {
            log::warn!("Handler for {} re-registered, previous binding replaced", action);
        }
    }

    /// Register an async closure as a handler
    pub fn register_fn<F, Fut>(&self, action: Action, handler: F)
    where
        F: Fn(Option<Value>, CallerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Value, String>> + Send + 'static,
    {
        let handler = FnHandler(Box::new(move |payload, ctx| Box::pin(handler(payload, ctx))));
        self.register(action, Arc::new(handler));
    }

    /// Dispatch a raw JSON message. A message without the basic
    /// `{action: string, payload?}` shape is logged and dropped.
    pub async fn dispatch_json(&self, message: Value, ctx: CallerContext) -> Option<Response> {
        let request: Request = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(e) => {
                log::warn!("Dropping malformed request: {}", e);
                return None;
            }
        };
        self.dispatch(request, ctx).await
    }

    /// Dispatch a request to its registered handler.
    ///
    /// `None` means the request was dropped (unknown or unregistered
    /// action); `Some` carries the single reply envelope.
    pub async fn dispatch(&self, request: Request, ctx: CallerContext) -> Option<Response> {
        let Ok(action) = request.action.parse::<Action>() else {
            log::warn!("No such action: {:?}, dropping request", request.action);
            return None;
        };

        let handler = {
            let handlers = self.handlers.read().unwrap();
            handlers.get(&action).cloned()
        };
        let Some(handler) = handler else {
            log::warn!("No handler registered for action {}, dropping request", action);
            return None;
        };

        let payload = request.payload;
        // Run the handler on its own task so a panic is contained and
        // reported through the envelope instead of unwinding into the
        // dispatch path.
        let outcome =
            tokio::spawn(async move { handler.handle(payload, ctx).await }).await;

        match outcome {
            Ok(Ok(data)) => Some(Response::ok(data)),
            Ok(Err(message)) => {
                log::warn!("Handler for {} failed: {}", action, message);
                Some(Response::err(message))
            }
            Err(e) => {
                log::error!("Handler for {} panicked: {}", action, e);
                Some(Response::err(format!("Internal error in {}", action)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_registered_handler_replies_ok() {
        let bus = CommandBus::new();
        bus.register_fn(Action::GetAllWords, |_payload, _ctx| async {
            Ok(json!(["a", "b"]))
        });

        let response = bus
            .dispatch(
                Request {
                    action: "GET_ALL_WORDS".to_string(),
                    payload: None,
                },
                CallerContext::default(),
            )
            .await
            .expect("registered action must reply");

        assert!(response.ok);
        assert_eq!(response.data, Some(json!(["a", "b"])));
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn test_failing_handler_becomes_error_envelope() {
        let bus = CommandBus::new();
        bus.register_fn(Action::SaveWord, |_payload, _ctx| async {
            Err("boom".to_string())
        });

        let response = bus
            .dispatch(
                Request {
                    action: "SAVE_WORD".to_string(),
                    payload: None,
                },
                CallerContext::default(),
            )
            .await
            .unwrap();

        assert!(!response.ok);
        assert_eq!(response.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_panicking_handler_becomes_error_envelope() {
        let bus = CommandBus::new();
        let trip = std::sync::atomic::AtomicBool::new(true);
        bus.register_fn(Action::SaveWord, move |_payload, _ctx| {
            let blow_up = trip.load(std::sync::atomic::Ordering::SeqCst);
            async move {
                if blow_up {
                    panic!("handler bug");
                }
                Ok(Value::Null)
            }
        });

        let response = bus
            .dispatch(
                Request {
                    action: "SAVE_WORD".to_string(),
                    payload: None,
                },
                CallerContext::default(),
            )
            .await
            .unwrap();

        assert!(!response.ok);
        assert!(response.error.is_some());
    }

    #[tokio::test]
    async fn test_unregistered_action_is_dropped() {
        let bus = CommandBus::new();
        let response = bus
            .dispatch(
                Request {
                    action: "GET_ALL_WORDS".to_string(),
                    payload: None,
                },
                CallerContext::default(),
            )
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_unknown_action_is_dropped() {
        let bus = CommandBus::new();
        bus.register_fn(Action::GetAllWords, |_payload, _ctx| async { Ok(Value::Null) });

        let response = bus
            .dispatch(
                Request {
                    action: "NOT_A_THING".to_string(),
                    payload: None,
                },
                CallerContext::default(),
            )
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_malformed_message_is_dropped() {
        let bus = CommandBus::new();
        assert!(bus
            .dispatch_json(json!({"payload": 1}), CallerContext::default())
            .await
            .is_none());
        assert!(bus
            .dispatch_json(json!("just a string"), CallerContext::default())
            .await
            .is_none());
        assert!(bus
            .dispatch_json(json!({"action": 42}), CallerContext::default())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_reregistration_last_writer_wins() {
        let bus = CommandBus::new();
        bus.register_fn(Action::Translate, |_payload, _ctx| async { Ok(json!("first")) });
        bus.register_fn(Action::Translate, |_payload, _ctx| async { Ok(json!("second")) });

        let response = bus
            .dispatch(
                Request {
                    action: "TRANSLATE".to_string(),
                    payload: None,
                },
                CallerContext::default(),
            )
            .await
            .unwrap();
        assert_eq!(response.data, Some(json!("second")));
    }
}
