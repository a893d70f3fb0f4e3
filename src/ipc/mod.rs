//! IPC codec and wire protocol: MessagePack framing between the CLI
//! client and the daemon.

pub mod codec;
pub mod protocol;
