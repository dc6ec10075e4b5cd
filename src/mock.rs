//! Scriptable provider used by the unit tests.

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, HashSet, VecDeque},
    rc::Rc,
};

use async_trait::async_trait;
use futures::channel::oneshot;

use super::provider::{EventHandler, ListenerId, Provider, ProviderError, UNSUPPORTED_METHOD};

pub type Reply = Result<serde_json::Value, ProviderError>;

enum Scripted {
    Ready(Reply),
    Deferred(oneshot::Receiver<Reply>),
}

#[derive(Default)]
pub struct MockProvider {
    replies: RefCell<HashMap<String, VecDeque<Scripted>>>,
    requests: RefCell<Vec<(String, Option<serde_json::Value>)>>,
    listeners: RefCell<Vec<(String, ListenerId, Rc<EventHandler>)>>,
    next_listener: Cell<u64>,
    refused_events: RefCell<HashSet<String>>,
    stuck_events: RefCell<HashSet<String>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the reply for the next `method` request.
    pub fn respond(&self, method: &str, reply: Reply) {
        self.script(method, Scripted::Ready(reply));
    }

    /// Queues a reply that resolves only once the returned sender is used.
    pub fn defer(&self, method: &str) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.script(method, Scripted::Deferred(rx));
        tx
    }

    /// Makes `on` fail for `event`.
    pub fn refuse_listeners(&self, event: &str) {
        self.refused_events.borrow_mut().insert(event.to_string());
    }

    /// Makes `remove_listener` fail for `event` until [`MockProvider::release`] is called.
    pub fn stick_listeners(&self, event: &str) {
        self.stuck_events.borrow_mut().insert(event.to_string());
    }

    pub fn release(&self, event: &str) {
        self.stuck_events.borrow_mut().remove(event);
    }

    pub fn requests(&self) -> Vec<(String, Option<serde_json::Value>)> {
        self.requests.borrow().clone()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.borrow().iter().filter(|(name, _, _)| name == event).count()
    }

    /// Fires `event` on every listener registered for it.
    pub fn emit(&self, event: &str, payload: serde_json::Value) {
        let handlers = self
            .listeners
            .borrow()
            .iter()
            .filter(|(name, _, _)| name == event)
            .map(|(_, _, handler)| handler.clone())
            .collect::<Vec<_>>();

        for handler in handlers {
            handler(payload.clone());
        }
    }

    fn script(&self, method: &str, scripted: Scripted) {
        self.replies.borrow_mut().entry(method.to_string()).or_default().push_back(scripted);
    }
}

#[async_trait(?Send)]
impl Provider for MockProvider {
    async fn request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, ProviderError> {
        self.requests.borrow_mut().push((method.to_string(), params));
        let scripted = self.replies.borrow_mut().get_mut(method).and_then(VecDeque::pop_front);

        match scripted {
            Some(Scripted::Ready(reply)) => reply,
            Some(Scripted::Deferred(rx)) => {
                rx.await.unwrap_or_else(|_| Err(ProviderError::internal("reply dropped")))
            }
            None => Err(ProviderError::new(UNSUPPORTED_METHOD, format!("unscripted {method}"))),
        }
    }

    fn on(&self, event: &str, handler: EventHandler) -> Result<ListenerId, ProviderError> {
        if self.refused_events.borrow().contains(event) {
            return Err(ProviderError::internal(format!("cannot listen to {event}")));
        }
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().push((event.to_string(), id, Rc::new(handler)));
        Ok(id)
    }

    fn remove_listener(&self, event: &str, id: ListenerId) -> Result<(), ProviderError> {
        if self.stuck_events.borrow().contains(event) {
            return Err(ProviderError::internal(format!("cannot remove {event} {id}")));
        }
        self.listeners
            .borrow_mut()
            .retain(|(name, listener, _)| !(name == event && *listener == id));
        Ok(())
    }
}
