// src/ipc/mod.rs
//
// Local control channel: wire types, the socket server and a one-shot client.

pub mod client;
pub mod protocol;
pub mod server;

pub use client::send_request;
pub use protocol::{Command, Request, Response};
pub use server::{CommandHandler, ControlServer};
