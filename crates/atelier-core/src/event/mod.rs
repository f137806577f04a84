//! Event distribution for item transitions.

pub mod bus;

pub use bus::EventBus;
