//! Listener contract — callbacks notified of matching messages.

use std::any::Any;
use std::time::SystemTime;

use super::packet::Message;

/// Receives messages whose address matched the listener's selector.
///
/// Invoked synchronously on the dispatching thread. Any
/// `Fn(SystemTime, &Message, &str)` closure is a listener.
pub trait Listener: Send + Sync {
    /// `sender` identifies where the packet came from (e.g. `"127.0.0.1:9000"`)
    /// and is passed through uninterpreted.
    fn accept_message(&self, time: SystemTime, message: &Message, sender: &str);
}

impl<F> Listener for F
where
    F: Fn(SystemTime, &Message, &str) + Send + Sync,
{
    fn accept_message(&self, time: SystemTime, message: &Message, sender: &str) {
        self(time, message, sender)
    }
}

/// A listener that panicked while handling a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerFault {
    pub address: String,
    /// Debug rendering of the selector the listener was registered under.
    pub selector: String,
    pub reason: String,
}

impl ListenerFault {
    pub(crate) fn from_panic(address: &str, selector: String, payload: Box<dyn Any + Send>) -> Self {
        let reason = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "listener panicked".to_string()
        };
        Self {
            address: address.to_string(),
            selector,
            reason,
        }
    }
}
