pub mod common;
pub mod dump;
pub mod info;
pub mod liveness;
pub mod resolve;
