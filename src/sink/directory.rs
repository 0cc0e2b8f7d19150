use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use super::{Sink, WriteKind};

/// Writes into a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct DirectorySink {
	root: PathBuf,
}

impl DirectorySink {
	pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

	pub fn root(&self) -> &Path { &self.root }

	pub fn resolve(&self, path: &str) -> PathBuf {
		path.split('/').filter(|part| !part.is_empty()).fold(self.root.clone(), |acc, part| acc.join(part))
	}
}

impl Sink for DirectorySink {
	type Error = std::io::Error;

	fn exists(&mut self, path: &str) -> Result<bool, Self::Error> { Ok(self.resolve(path).is_file()) }

	fn read(&mut self, path: &str) -> Result<Vec<u8>, Self::Error> { fs_err::read(self.resolve(path)) }

	#[instrument(skip(self, bytes), fields(root = ?self.root))]
	fn write(&mut self, path: &str, bytes: &[u8]) -> Result<WriteKind, Self::Error> {
		let target = self.resolve(path);

		let kind = if self.exists(path)? {
			if self.read(path)? == bytes {
				debug!("{:?} is already up to date", target);
				return Ok(WriteKind::Unchanged);
			}
			WriteKind::Updated
		} else {
			WriteKind::Created
		};

		if let Some(parent) = target.parent() {
			fs_err::create_dir_all(parent)?;
		}
		fs_err::write(&target, bytes)?;

		debug!("Wrote {} bytes to {:?} ({:?})", bytes.len(), target, kind);
		Ok(kind)
	}
}
