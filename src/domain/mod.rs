pub mod booking;
pub mod message;
pub mod rider;
pub mod tracking;

pub use booking::*;
pub use message::*;
pub use rider::*;
pub use tracking::*;
