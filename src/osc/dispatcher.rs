//! Packet dispatcher — routes every message in a packet tree to the
//! listeners whose selectors match its address.
//!
//! Timestamps resolve in this order: a timestamp supplied by the caller,
//! then the nearest enclosing bundle that carries one, then the wall clock
//! at delivery (read once per message).

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;

use tracing::{debug, error, trace};

use super::config::{DispatchConfig, FaultPolicy};
use super::error::PatternError;
use super::listener::{Listener, ListenerFault};
use super::packet::{Message, Packet};
use super::selector::{AddressSelector, PatternSelector, SelectorKey};

type Registry = HashMap<SelectorKey, Arc<dyn Listener>>;

/// Outcome of one dispatch call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Listener invocations that completed.
    pub delivered: usize,
    /// Messages that matched no selector.
    pub unmatched: usize,
    /// Listeners that panicked (only under [`FaultPolicy::Isolate`]).
    pub faults: Vec<ListenerFault>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}

/// Routes OSC packets to listeners registered under address selectors.
///
/// Registration and dispatch may interleave across threads. Listeners run
/// without the registry lock held, so they may register, remove or dispatch
/// on the same dispatcher.
pub struct Dispatcher {
    registry: RwLock<Registry>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::with_config(DispatchConfig::default())
    }

    pub fn with_config(config: DispatchConfig) -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Register `listener` for messages accepted by `selector`.
    ///
    /// Selectors are keyed by identity: registering the same `Arc` again
    /// replaces its listener and returns the previous one.
    pub fn add_listener(
        &self,
        selector: Arc<dyn AddressSelector>,
        listener: Arc<dyn Listener>,
    ) -> Option<Arc<dyn Listener>> {
        debug!(selector = ?selector, "registering listener");
        self.write().insert(SelectorKey::new(selector), listener)
    }

    /// Compile `pattern` into a [`PatternSelector`] and register `listener` under it.
    ///
    /// The returned selector is the handle for [`Dispatcher::remove_listener`].
    pub fn add_pattern_listener(
        &self,
        pattern: &str,
        listener: Arc<dyn Listener>,
    ) -> Result<Arc<dyn AddressSelector>, PatternError> {
        let selector: Arc<dyn AddressSelector> = Arc::new(PatternSelector::new(pattern)?);
        self.add_listener(selector.clone(), listener);
        Ok(selector)
    }

    pub fn remove_listener(&self, selector: &Arc<dyn AddressSelector>) -> Option<Arc<dyn Listener>> {
        let removed = self.write().remove(&SelectorKey::new(selector.clone()));
        if removed.is_some() {
            debug!(selector = ?selector, "removed listener");
        }
        removed
    }

    /// Number of registered selectors.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Dispatch a packet with no timestamp override.
    pub fn dispatch(&self, packet: &Packet, sender: &str) -> DispatchReport {
        self.dispatch_at(packet, sender, None)
    }

    /// Dispatch a packet. When `timestamp` is given it is used for every
    /// message in the tree, ahead of any bundle timestamps.
    pub fn dispatch_at(
        &self,
        packet: &Packet,
        sender: &str,
        timestamp: Option<SystemTime>,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        self.dispatch_packet(packet, sender, timestamp, None, &mut report);
        report
    }

    fn dispatch_packet(
        &self,
        packet: &Packet,
        sender: &str,
        forced: Option<SystemTime>,
        inherited: Option<SystemTime>,
        report: &mut DispatchReport,
    ) {
        match packet {
            Packet::Bundle(bundle) => {
                let inherited = bundle.timestamp.or(inherited);
                for child in &bundle.packets {
                    self.dispatch_packet(child, sender, forced, inherited, report);
                }
            }
            Packet::Message(message) => {
                self.dispatch_message(message, sender, forced.or(inherited), report);
            }
        }
    }

    fn dispatch_message(
        &self,
        message: &Message,
        sender: &str,
        time: Option<SystemTime>,
        report: &mut DispatchReport,
    ) {
        let targets = self.matching(&message.address);
        if targets.is_empty() {
            report.unmatched += 1;
            if self.config.log_unmatched {
                trace!(address = %message.address, sender, "no listener for message");
            }
            return;
        }

        let time = time.unwrap_or_else(SystemTime::now);
        for (key, listener) in targets {
            trace!(address = %message.address, sender, selector = ?key.selector(), "delivering message");
            match self.config.fault_policy {
                FaultPolicy::Propagate => listener.accept_message(time, message, sender),
                FaultPolicy::Isolate => {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                        listener.accept_message(time, message, sender)
                    }));
                    if let Err(payload) = outcome {
                        let fault = ListenerFault::from_panic(
                            &message.address,
                            format!("{:?}", key.selector()),
                            payload,
                        );
                        error!(
                            address = %fault.address,
                            selector = %fault.selector,
                            reason = %fault.reason,
                            "listener panicked"
                        );
                        report.faults.push(fault);
                        continue;
                    }
                }
            }
            report.delivered += 1;
        }
    }

    /// Snapshot the listeners matching `address` so the lock is released
    /// before any of them runs.
    fn matching(&self, address: &str) -> Vec<(SelectorKey, Arc<dyn Listener>)> {
        self.read()
            .iter()
            .filter(|(key, _)| key.selector().matches(address))
            .map(|(key, listener)| (key.clone(), listener.clone()))
            .collect()
    }

    // The registry is never left half-updated, so a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
