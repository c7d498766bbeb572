//! Integration test common infrastructure.
//!
//! Provides a mock connection for driving sessions directly and a scripted
//! fake IRC server for exercising the real client.

pub mod connection;
pub mod server;

#[allow(unused_imports)]
pub use connection::MockConnection;
#[allow(unused_imports)]
pub use server::FakeServer;
