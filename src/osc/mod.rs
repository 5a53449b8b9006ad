//! OSC (Open Sound Control) dispatch — route decoded packets to listeners by address.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod listener;
pub mod packet;
pub mod pattern;
pub mod selector;

pub use config::{DispatchConfig, FaultPolicy};
pub use dispatcher::{DispatchReport, Dispatcher};
pub use error::{ConfigError, PatternError};
pub use listener::{Listener, ListenerFault};
pub use packet::{Bundle, Message, Packet};
pub use pattern::AddressPattern;
pub use selector::{AddressSelector, ExactSelector, PatternSelector, SelectorKey};
