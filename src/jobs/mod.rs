//! Job submission, polling, and result retrieval.

pub mod fetcher;
pub mod poller;

pub use fetcher::ResultFetcher;
pub use poller::{JobEvent, JobPoller, JobStream};
