//! Wire and domain types shared by every RPC crate: the driver frame
//! tags, the remote-server message envelope, the stable result-code
//! taxonomy, and the shared error type.
//!
//! Every other crate in this workspace depends on `rpc-protocol` rather
//! than redefining these — the same role `sa-protocol` plays for the
//! teacher's WebSocket message types.

pub mod driver_tags;
pub mod error;
pub mod remote;
pub mod result;

pub use error::{Operation, Result, RpcError};
pub use remote::RemoteMessage;
pub use result::ResultCode;
