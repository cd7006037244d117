//! Package retrieval backends

pub mod command;
pub mod fetcher;

pub use command::CommandFetcher;
pub use fetcher::Fetcher;
