//! Destinations for a serialized deck. Paths are relative, `/`-separated and
//! interpreted by each sink against its own backing store.

mod directory;
mod github;
mod remote;

pub use directory::DirectorySink;
pub use github::GitHubStore;
pub use remote::{ContentEntry, ContentKind, ContentStore, RemoteError, RemoteFile, RemoteSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
	Created,
	Updated,
	/// The stored bytes already matched.
	Unchanged,
}

pub trait Sink {
	type Error: std::error::Error + Send + Sync + 'static;

	fn exists(&mut self, path: &str) -> Result<bool, Self::Error>;
	fn read(&mut self, path: &str) -> Result<Vec<u8>, Self::Error>;
	fn write(&mut self, path: &str, bytes: &[u8]) -> Result<WriteKind, Self::Error>;
}
