pub mod cancellable;
pub mod error;
pub mod gateway;
