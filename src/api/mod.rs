pub mod client;
pub mod source;
pub mod types;

pub use client::RestClient;
pub use source::{Operation, RecordSource};
pub use types::{Record, RecordFields};
