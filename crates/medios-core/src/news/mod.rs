mod client;
pub mod sentinel;

pub use client::NewsClient;
