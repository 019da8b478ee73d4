pub mod error;
pub mod message;
pub mod sink;

pub use error::BridgeError;
pub use message::{MessageInfo, NotificationEvent};
pub use sink::NotificationSink;
