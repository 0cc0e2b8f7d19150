use std::collections::{BTreeSet, VecDeque};

use thiserror::Error;
use tracing::{debug, info, instrument};

use super::{Sink, WriteKind};
use crate::notifier::Notification;

#[derive(Debug, Error)]
pub enum RemoteError {
	#[error("Authentication with the repository host failed")]
	Authentication,

	#[error("Repository '{0}' not found")]
	RepositoryNotFound(String),

	#[error("Repository host answered {status}: {message}")]
	Http { status: u16, message: String },

	#[error(transparent)]
	Transport(#[from] reqwest::Error),

	#[error("Unexpected response from repository host: {0}")]
	Decode(String),

	#[error("Invalid API address '{0}'")]
	Endpoint(String),
}

impl RemoteError {
	/// What to tell the user about this failure.
	pub fn notification(&self) -> Notification {
		match self {
			RemoteError::Authentication => Notification::warning(
				"Authentication failed",
				"Authenticating with the repository host failed. Check that both the username and \
				 token are correct. Use a personal access token, never your account password.",
			),
			RemoteError::RepositoryNotFound(name) => Notification::warning(
				"Unable to find repository",
				format!("Unable to find the repository '{}'. Make sure it has been created first.", name),
			),
			other => Notification::warning(
				"Unknown error when uploading file",
				format!("Please report this error along with the details below.\n\n{}", other),
			),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
	File,
	Dir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEntry {
	pub path: String,
	pub kind: ContentKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
	pub content: Vec<u8>,
	/// Version token the host requires to update the file.
	pub sha:     String,
}

/// A hosted repository addressed by path.
pub trait ContentStore {
	/// Checks the credentials.
	fn authenticate(&mut self) -> Result<(), RemoteError>;
	/// Checks that the target repository exists and is reachable.
	fn open_repository(&mut self) -> Result<(), RemoteError>;

	/// Entries directly inside `dir` (`""` is the repository root).
	fn list(&mut self, dir: &str) -> Result<Vec<ContentEntry>, RemoteError>;
	fn get(&mut self, path: &str) -> Result<RemoteFile, RemoteError>;

	fn create(&mut self, path: &str, message: &str, content: &[u8], branch: &str) -> Result<(), RemoteError>;
	fn update(
		&mut self,
		path: &str,
		message: &str,
		content: &[u8],
		sha: &str,
		branch: &str,
	) -> Result<(), RemoteError>;
}

pub const CREATE_MESSAGE: &str = "Automated upload from flash-export";
pub const UPDATE_MESSAGE: &str = "Automated update from flash-export";

/// Sink over a [`ContentStore`]. Whether a write creates or updates depends
/// only on whether the path is already listed in the repository, never on the
/// stored content. Nothing is retried.
#[derive(Debug)]
pub struct RemoteSink<S> {
	store:   S,
	branch:  String,
	// every file path in the repository, listed once per sink
	listing: Option<BTreeSet<String>>,
}

impl<S: ContentStore> RemoteSink<S> {
	pub fn new(store: S, branch: impl Into<String>) -> Self { Self { store, branch: branch.into(), listing: None } }

	pub fn store(&self) -> &S { &self.store }

	#[instrument(skip(self))]
	pub fn connect(&mut self) -> Result<(), RemoteError> {
		self.store.authenticate()?;
		self.store.open_repository()?;
		info!("Connected to remote repository");
		Ok(())
	}

	fn listing(&mut self) -> Result<&BTreeSet<String>, RemoteError> {
		if self.listing.is_none() {
			let mut files = BTreeSet::new();
			let mut pending: VecDeque<ContentEntry> = self.store.list("")?.into();

			while let Some(entry) = pending.pop_front() {
				match entry.kind {
					ContentKind::Dir => pending.extend(self.store.list(&entry.path)?),
					ContentKind::File => {
						files.insert(entry.path);
					}
				}
			}

			debug!("Repository holds {} files", files.len());
			self.listing = Some(files);
		}

		Ok(self.listing.get_or_insert_with(BTreeSet::new))
	}
}

impl<S: ContentStore> Sink for RemoteSink<S> {
	type Error = RemoteError;

	fn exists(&mut self, path: &str) -> Result<bool, Self::Error> { Ok(self.listing()?.contains(path)) }

	fn read(&mut self, path: &str) -> Result<Vec<u8>, Self::Error> { Ok(self.store.get(path)?.content) }

	#[instrument(skip(self, bytes))]
	fn write(&mut self, path: &str, bytes: &[u8]) -> Result<WriteKind, Self::Error> {
		let branch = self.branch.clone();

		if self.exists(path)? {
			let existing = self.store.get(path)?;
			self.store.update(path, UPDATE_MESSAGE, bytes, &existing.sha, &branch)?;
			info!("Updated {} on {}", path, branch);
			Ok(WriteKind::Updated)
		} else {
			self.store.create(path, CREATE_MESSAGE, bytes, &branch)?;
			if let Some(listing) = self.listing.as_mut() {
				listing.insert(path.to_string());
			}
			info!("Created {} on {}", path, branch);
			Ok(WriteKind::Created)
		}
	}
}
