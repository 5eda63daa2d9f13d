//! Draft releases on GitHub through the REST API.

use crate::config::EnvConfig;
use crate::error::{ErrorExt, ReleaseError, Result};
use crate::publish::{DraftRelease, HostedRelease, ReleaseHost};
use bytes::Bytes;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use url::Url;

/// REST API root
pub const API_BASE: &str = "https://api.github.com";
/// Release asset upload root
pub const UPLOAD_BASE: &str = "https://uploads.github.com";

const API_VERSION: &str = "2022-11-28";

/// `owner/repo`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubRepo {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
}

impl fmt::Display for GitHubRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl GitHubRepo {
    /// Parse an `owner/repo` slug
    pub fn from_slug(slug: &str) -> Result<Self> {
        match slug.trim().split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(Self {
                    owner: owner.to_string(),
                    repo: repo.trim_end_matches(".git").to_string(),
                })
            }
            _ => Err(ReleaseError::invalid_config(format!(
                "expected owner/repo, got '{slug}'"
            ))),
        }
    }

    /// Parse owner and repository from a GitHub URL
    ///
    /// Accepts `https://github.com/owner/repo(.git)`, `ssh://git@github.com/owner/repo`
    /// and the SCP-like `git@github.com:owner/repo.git`.
    pub fn from_url(url: &str) -> Result<Self> {
        // SCP-like syntax is not a URL
        if let Some((host, path)) = url.split_once(':')
            && !url.contains("://")
            && host.ends_with("github.com")
        {
            return Self::from_slug(path);
        }

        let parsed = Url::parse(url).map_err(|e| {
            ReleaseError::invalid_config(format!("invalid repository URL '{url}': {e}"))
        })?;
        if parsed.host_str() != Some("github.com") {
            return Err(ReleaseError::invalid_config(format!(
                "repository URL '{url}' is not on github.com"
            )));
        }

        let mut segments = parsed
            .path_segments()
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty());
        match (segments.next(), segments.next()) {
            (Some(owner), Some(repo)) => Self::from_slug(&format!("{owner}/{repo}")),
            _ => Err(ReleaseError::invalid_config(format!(
                "Could not parse GitHub owner/repo from URL: '{url}'"
            ))),
        }
    }
}

/// Detect MIME type for release assets
pub fn detect_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("dmg") => "application/x-apple-diskimage",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}

#[derive(Serialize)]
struct CreateReleaseBody<'a> {
    tag_name: &'a str,
    name: &'a str,
    body: &'a str,
    draft: bool,
    prerelease: bool,
}

#[derive(Deserialize)]
struct CreatedRelease {
    id: u64,
    html_url: String,
}

#[derive(Deserialize)]
struct UploadedAsset {
    browser_download_url: String,
}

/// Creates draft releases and uploads assets
#[derive(Debug, Clone)]
pub struct GitHubReleaseHost {
    client: reqwest::Client,
    repo: GitHubRepo,
    token: Option<String>,
    api_base: String,
    upload_base: String,
}

impl GitHubReleaseHost {
    /// Host for `repo`; the token is only required once a call is made
    pub fn new(repo: GitHubRepo, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            repo,
            token,
            api_base: API_BASE.to_string(),
            upload_base: UPLOAD_BASE.to_string(),
        }
    }

    /// Resolve repository and token from the environment.
    ///
    /// The repository comes from `GITHUB_REPOSITORY`, falling back to the
    /// project's repository URL; the token from `GH_TOKEN` or `GITHUB_TOKEN`.
    pub fn from_env(env: &EnvConfig, repository_url: Option<&str>) -> Result<Self> {
        let repo = match (env.get_non_empty("GITHUB_REPOSITORY"), repository_url) {
            (Some(slug), _) => GitHubRepo::from_slug(&slug)?,
            (None, Some(url)) => GitHubRepo::from_url(url)?,
            (None, None) => {
                return Err(ReleaseError::invalid_config(
                    "no GitHub repository: set GITHUB_REPOSITORY or package.repository",
                ));
            }
        };
        let token = env
            .get_non_empty("GH_TOKEN")
            .or_else(|| env.get_non_empty("GITHUB_TOKEN"));
        Ok(Self::new(repo, token))
    }

    /// Point the client at different API and upload roots
    pub fn with_base_urls(mut self, api_base: &str, upload_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self.upload_base = upload_base.trim_end_matches('/').to_string();
        self
    }

    /// Target repository
    pub fn repo(&self) -> &GitHubRepo {
        &self.repo
    }

    fn token(&self) -> Result<&str> {
        self.token.as_deref().ok_or_else(|| {
            ReleaseError::invalid_config(
                "GitHub token not provided. Set GH_TOKEN or GITHUB_TOKEN environment variable",
            )
        })
    }

    fn request(&self, url: Url) -> Result<reqwest::RequestBuilder> {
        Ok(self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token()?))
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, concat!("dmg_release/", env!("CARGO_PKG_VERSION")))
            .header("X-GitHub-Api-Version", API_VERSION))
    }

    async fn send<T: for<'de> Deserialize<'de>>(
        &self,
        what: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ReleaseError::ExternalToolFailure {
                tool: format!("GitHub API {what} ({status})"),
                output: text,
            });
        }
        Ok(serde_json::from_str(&text)?)
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| ReleaseError::invalid_config(format!("invalid URL '{raw}': {e}")))
}

impl ReleaseHost for GitHubReleaseHost {
    async fn create_draft(&self, release: &DraftRelease) -> Result<HostedRelease> {
        let url = parse_url(&format!(
            "{}/repos/{}/{}/releases",
            self.api_base, self.repo.owner, self.repo.repo
        ))?;
        let body = CreateReleaseBody {
            tag_name: &release.tag,
            name: &release.name,
            body: &release.body,
            draft: true,
            prerelease: release.prerelease,
        };

        let created: CreatedRelease = self
            .send("create release", self.request(url)?.json(&body))
            .await?;
        Ok(HostedRelease {
            id: created.id,
            html_url: created.html_url,
        })
    }

    async fn upload_asset(&self, release: &HostedRelease, path: &Path) -> Result<String> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                ReleaseError::invalid_config(format!("Invalid artifact filename: {path:?}"))
            })?;

        let mut url = parse_url(&format!(
            "{}/repos/{}/{}/releases/{}/assets",
            self.upload_base, self.repo.owner, self.repo.repo, release.id
        ))?;
        url.query_pairs_mut().append_pair("name", file_name);

        let content = tokio::fs::read(path)
            .await
            .fs_context("reading release asset", path)?;
        log::info!("Uploading {} ({} bytes)", file_name, content.len());

        let request = self
            .request(url)?
            .header(CONTENT_TYPE, detect_content_type(path))
            .body(Bytes::from(content));
        let asset: UploadedAsset = self.send("upload asset", request).await?;
        Ok(asset.browser_download_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    #[test]
    fn test_repo_from_urls() {
        let expected = GitHubRepo {
            owner: "WeekendSuperhero".to_string(),
            repo: "dj-uploader".to_string(),
        };
        for url in [
            "https://github.com/WeekendSuperhero/dj-uploader",
            "https://github.com/WeekendSuperhero/dj-uploader.git",
            "git@github.com:WeekendSuperhero/dj-uploader.git",
            "ssh://git@github.com/WeekendSuperhero/dj-uploader",
        ] {
            assert_eq!(GitHubRepo::from_url(url).unwrap(), expected, "{url}");
        }
    }

    #[test]
    fn test_repo_rejects_other_hosts() {
        assert!(GitHubRepo::from_url("https://gitlab.com/a/b").is_err());
        assert!(GitHubRepo::from_slug("just-a-name").is_err());
    }

    #[test]
    fn test_from_env_prefers_explicit_repository() {
        let env = EnvConfig::from_pairs([("GITHUB_REPOSITORY", "acme/tool"), ("GITHUB_TOKEN", "t")]);
        let host =
            GitHubReleaseHost::from_env(&env, Some("https://github.com/other/repo")).unwrap();
        assert_eq!(host.repo().to_string(), "acme/tool");
        assert_eq!(host.token().unwrap(), "t");
    }

    #[test]
    fn test_missing_token_fails_on_use() {
        let host = GitHubReleaseHost::new(GitHubRepo::from_slug("a/b").unwrap(), None);
        assert!(host.token().is_err());
    }

    #[test]
    fn test_content_type() {
        assert_eq!(
            detect_content_type(Path::new("App-1.0.0.dmg")),
            "application/x-apple-diskimage"
        );
    }

    struct Captured {
        head: String,
        body: Vec<u8>,
    }

    async fn read_request(stream: &mut TcpStream) -> Captured {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let head_end = loop {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
        let length = head
            .lines()
            .filter_map(|l| l.split_once(':'))
            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < head_end + length {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before body");
            buf.extend_from_slice(&chunk[..n]);
        }
        Captured {
            body: buf[head_end..head_end + length].to_vec(),
            head,
        }
    }

    /// Answer one request per connection with the given JSON bodies
    async fn serve(listener: TcpListener, responses: Vec<&'static str>) -> Vec<Captured> {
        let mut captured = Vec::new();
        for json in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            captured.push(read_request(&mut stream).await);
            let response = format!(
                "HTTP/1.1 201 Created\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{json}",
                json.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        }
        captured
    }

    #[tokio::test]
    async fn test_draft_release_and_asset_upload_requests() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let server = tokio::spawn(serve(
            listener,
            vec![
                r#"{"id":42,"html_url":"https://github.com/acme/tool/releases/tag/untagged-1"}"#,
                r#"{"browser_download_url":"https://github.com/acme/tool/releases/download/v1.2.0/App-1.2.0.dmg"}"#,
            ],
        ));

        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("App-1.2.0.dmg");
        std::fs::write(&image, b"udzo").unwrap();

        let host = GitHubReleaseHost::new(
            GitHubRepo::from_slug("acme/tool").unwrap(),
            Some("secret".to_string()),
        )
        .with_base_urls(&format!("{base}/"), &base);

        let release = host
            .create_draft(&DraftRelease {
                tag: "v1.2.0".to_string(),
                name: "App 1.2.0".to_string(),
                body: "notes".to_string(),
                prerelease: false,
            })
            .await
            .unwrap();
        assert_eq!(release.id, 42);
        let asset = host.upload_asset(&release, &image).await.unwrap();
        assert!(asset.ends_with("/App-1.2.0.dmg"));

        let requests = server.await.unwrap();
        let create = &requests[0];
        assert!(create.head.starts_with("POST /repos/acme/tool/releases HTTP/1.1"));
        assert!(
            create
                .head
                .to_ascii_lowercase()
                .contains("authorization: bearer secret")
        );
        let payload: serde_json::Value = serde_json::from_slice(&create.body).unwrap();
        assert_eq!(payload["draft"], true);
        assert_eq!(payload["tag_name"], "v1.2.0");
        assert_eq!(payload["prerelease"], false);

        let upload = &requests[1];
        assert!(
            upload
                .head
                .starts_with("POST /repos/acme/tool/releases/42/assets?name=App-1.2.0.dmg HTTP/1.1")
        );
        assert!(
            upload
                .head
                .to_ascii_lowercase()
                .contains("content-type: application/x-apple-diskimage")
        );
        assert_eq!(upload.body, b"udzo");
    }

    #[tokio::test]
    async fn test_api_error_is_tool_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_request(&mut stream).await;
            let json = r#"{"message":"Validation Failed"}"#;
            let response = format!(
                "HTTP/1.1 422 Unprocessable Entity\r\ncontent-length: {}\r\n\
                 connection: close\r\n\r\n{json}",
                json.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
        });

        let host = GitHubReleaseHost::new(
            GitHubRepo::from_slug("acme/tool").unwrap(),
            Some("secret".to_string()),
        )
        .with_base_urls(&base, &base);
        let err = host
            .create_draft(&DraftRelease {
                tag: "v1.2.0".to_string(),
                name: "App 1.2.0".to_string(),
                body: String::new(),
                prerelease: false,
            })
            .await
            .unwrap_err();
        server.await.unwrap();

        assert_eq!(err.kind(), crate::error::ErrorKind::ExternalToolFailure);
        assert!(err.to_string().contains("Validation Failed"));
    }
}
