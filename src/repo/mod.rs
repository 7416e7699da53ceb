//! Repository references.

pub mod reference;

pub use reference::RepoRef;
