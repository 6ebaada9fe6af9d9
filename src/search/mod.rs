pub mod filter;

pub use filter::{search, Query};
