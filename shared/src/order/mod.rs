//! Order lifecycle types

pub mod status;

pub use status::{OrderStatus, TransitionError};
