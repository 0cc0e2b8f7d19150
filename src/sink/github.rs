use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::{Method, StatusCode, Url, blocking::{Client, RequestBuilder, Response}, header::ACCEPT};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::remote::{ContentEntry, ContentKind, ContentStore, RemoteError, RemoteFile};

const API_BASE: &str = "https://api.github.com";

/// [`ContentStore`] backed by the GitHub contents API. Blocking, one request
/// at a time.
#[derive(Debug)]
pub struct GitHubStore {
	client:     Client,
	api_base:   String,
	username:   String,
	token:      String,
	repository: String,
	// `owner/name`, known once authenticated
	full_name:  Option<String>,
}

#[derive(Deserialize)]
struct User {
	login: String,
}

#[derive(Deserialize)]
struct ListedEntry {
	path:   String,
	#[serde(rename = "type")]
	kind:   String,
}

#[derive(Deserialize)]
struct FileContent {
	sha:     String,
	#[serde(default)]
	content: String,
}

#[derive(Serialize)]
struct PutContent<'a> {
	message: &'a str,
	content: String,
	branch:  &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	sha:     Option<&'a str>,
}

impl GitHubStore {
	pub fn new(
		username: impl Into<String>,
		token: impl Into<String>,
		repository: impl Into<String>,
	) -> Result<Self, RemoteError> {
		let client = Client::builder().user_agent(concat!("flash-export/", env!("CARGO_PKG_VERSION"))).build()?;

		Ok(Self {
			client,
			api_base: API_BASE.to_string(),
			username: username.into(),
			token: token.into(),
			repository: repository.into(),
			full_name: None,
		})
	}

	/// Points the store at another API endpoint, e.g. GitHub Enterprise.
	pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
		self.api_base = api_base.into().trim_end_matches('/').to_string();
		self
	}

	fn request(&self, method: Method, url: Url) -> RequestBuilder {
		self.client
			.request(method, url)
			.basic_auth(&self.username, Some(&self.token))
			.header(ACCEPT, "application/vnd.github+json")
	}

	/// API address of `segments`, each one percent-encoded as a single path
	/// segment. Empty segments are dropped.
	fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
		let invalid = || RemoteError::Endpoint(self.api_base.clone());

		let mut url = Url::parse(&self.api_base).map_err(|_| invalid())?;
		url.path_segments_mut()
			.map_err(|()| invalid())?
			.pop_if_empty()
			.extend(segments.iter().filter(|segment| !segment.is_empty()));
		Ok(url)
	}

	fn full_name(&self) -> Result<&str, RemoteError> {
		self.full_name.as_deref().ok_or_else(|| RemoteError::Decode("repository used before authentication".into()))
	}

	fn repository_url(&self, rest: &[&str]) -> Result<Url, RemoteError> {
		let mut segments = vec!["repos"];
		segments.extend(self.full_name()?.split('/'));
		segments.extend_from_slice(rest);
		self.endpoint(&segments)
	}

	fn contents_url(&self, path: &str) -> Result<Url, RemoteError> {
		let mut rest = vec!["contents"];
		rest.extend(path.split('/'));
		self.repository_url(&rest)
	}

	fn put(&self, path: &str, body: &PutContent<'_>) -> Result<(), RemoteError> {
		let response = self.request(Method::PUT, self.contents_url(path)?).json(body).send()?;
		check(response).map(|_| ())
	}
}

fn check(response: Response) -> Result<Response, RemoteError> {
	let status = response.status();
	if status.is_success() {
		return Ok(response);
	}

	let message = response.text().unwrap_or_default();
	Err(status_error(status, message))
}

/// A token without the needed scope answers 403; both that and a rejected
/// token are credential problems.
fn status_error(status: StatusCode, message: String) -> RemoteError {
	match status {
		StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Authentication,
		_ => RemoteError::Http { status: status.as_u16(), message },
	}
}

impl ContentStore for GitHubStore {
	#[instrument(skip(self), fields(user = %self.username))]
	fn authenticate(&mut self) -> Result<(), RemoteError> {
		let response = self.request(Method::GET, self.endpoint(&["user"])?).send()?;
		let user: User = check(response)?.json()?;

		let full_name = if self.repository.contains('/') {
			self.repository.clone()
		} else {
			format!("{}/{}", user.login, self.repository)
		};
		debug!("Authenticated as {}, target {}", user.login, full_name);
		self.full_name = Some(full_name);
		Ok(())
	}

	#[instrument(skip(self))]
	fn open_repository(&mut self) -> Result<(), RemoteError> {
		let full_name = self.full_name()?.to_string();
		let response = self.request(Method::GET, self.repository_url(&[])?).send()?;
		if response.status() == StatusCode::NOT_FOUND {
			return Err(RemoteError::RepositoryNotFound(full_name));
		}
		check(response)?;
		Ok(())
	}

	#[instrument(skip(self))]
	fn list(&mut self, dir: &str) -> Result<Vec<ContentEntry>, RemoteError> {
		let response = self.request(Method::GET, self.contents_url(dir)?).send()?;
		// An empty repository has no root tree yet
		if response.status() == StatusCode::NOT_FOUND && dir.is_empty() {
			return Ok(Vec::new());
		}

		let entries: Vec<ListedEntry> = check(response)?.json()?;
		Ok(entries
			.into_iter()
			.filter_map(|entry| {
				let kind = match entry.kind.as_str() {
					"file" => ContentKind::File,
					"dir" => ContentKind::Dir,
					_ => return None,
				};
				Some(ContentEntry { path: entry.path, kind })
			})
			.collect())
	}

	#[instrument(skip(self))]
	fn get(&mut self, path: &str) -> Result<RemoteFile, RemoteError> {
		let response = self.request(Method::GET, self.contents_url(path)?).send()?;
		let file: FileContent = check(response)?.json()?;

		let encoded: String = file.content.chars().filter(|c| !c.is_whitespace()).collect();
		let content = STANDARD.decode(encoded).map_err(|e| RemoteError::Decode(e.to_string()))?;
		Ok(RemoteFile { content, sha: file.sha })
	}

	#[instrument(skip(self, content))]
	fn create(&mut self, path: &str, message: &str, content: &[u8], branch: &str) -> Result<(), RemoteError> {
		self.put(path, &PutContent { message, content: STANDARD.encode(content), branch, sha: None })
	}

	#[instrument(skip(self, content))]
	fn update(
		&mut self,
		path: &str,
		message: &str,
		content: &[u8],
		sha: &str,
		branch: &str,
	) -> Result<(), RemoteError> {
		self.put(path, &PutContent { message, content: STANDARD.encode(content), branch, sha: Some(sha) })
	}
}
