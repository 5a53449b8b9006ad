//! osc-dispatch — routes decoded OSC messages and time-tagged bundles to
//! listeners registered under address selectors.

pub mod osc;
