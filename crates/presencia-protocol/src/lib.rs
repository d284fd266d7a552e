pub mod codec;
pub mod command;
pub mod event;

pub use codec::{RawFrame, WireCodec};
pub use command::{CheckoutReply, DeviceCommand};
pub use event::{AttendanceResult, CheckoutRequest, DeviceEvent, RegisterResult, tags};
