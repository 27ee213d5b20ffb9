pub mod consumer;
pub mod intake;
pub mod warehouse;
