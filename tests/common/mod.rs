//! Integration test common infrastructure.
//!
//! Provides a spawned `tallyd` process for REST tests and an in-memory chat
//! gateway for driving the counting service directly.

pub mod gateway;
pub mod server;

#[allow(unused_imports)]
pub use gateway::FakeGateway;
#[allow(unused_imports)]
pub use server::TestServer;
