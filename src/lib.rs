//! sockbot - a plugin-driven IRC chat bot.
//!
//! Raw protocol callbacks from the [`connection`] are normalized into
//! [`event::NormalizedEvent`]s and published on an [`bus::EventBus`].
//! [`plugins`] subscribe to event categories and respond through the
//! [`outbound::Outbound`] handle, whose sends are echoed back onto the bus.

pub mod bot;
pub mod bus;
pub mod config;
pub mod connection;
pub mod error;
pub mod event;
pub mod normalizer;
pub mod outbound;
pub mod plugins;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use bot::{Bot, Session};
pub use config::Config;
