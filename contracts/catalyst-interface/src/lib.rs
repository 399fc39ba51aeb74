pub mod catalyst_payload;
pub mod error;
pub mod ibc;
pub mod interface;
pub mod msg;
pub mod relay;

pub use crate::error::InterfaceError;
pub use crate::interface::CatalystInterface;
