pub mod client;
pub mod interpret;
