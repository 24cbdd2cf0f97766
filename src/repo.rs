//! Artifact Registry repository URLs and hosts.
//!
//! Repositories are named `<location>-<format>.pkg.dev/<project>/<repo>`.
//! Every validation helper here collects all problems before failing so the
//! operator can fix every bad argument in one go.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Domain suffix every Artifact Registry host carries.
pub const REGISTRY_DOMAIN: &str = ".pkg.dev";

/// Prefix of the repo IDs derived for Maven.
pub const REPO_ID_PREFIX: &str = "artifactregistry";

/// A parsed `*.pkg.dev/<project>/<repo>` repository URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoUrl {
    url: Url,
    project: String,
    repo: String,
}

impl RepoUrl {
    /// Parse a repository URL, with or without the `https://` scheme.
    ///
    /// # Examples
    ///
    /// ```
    /// use ar_cred_helper::RepoUrl;
    ///
    /// let repo = RepoUrl::parse("us-maven.pkg.dev/my-project/my-repo").unwrap();
    /// assert_eq!(repo.host(), "us-maven.pkg.dev");
    /// assert_eq!(repo.default_repo_id(), "artifactregistry-my-project-my-repo");
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        let with_scheme = with_https(raw);
        let url = Url::parse(&with_scheme)
            .map_err(|e| Error::invalid(format!("failed to parse host \"{with_scheme}\": {e}")))?;

        let bad_format = || {
            Error::invalid(format!(
                "repo URL \"{url}\" not in format '*{REGISTRY_DOMAIN}/[project]/[repo]'"
            ))
        };

        if !url.host_str().is_some_and(|h| h.ends_with(REGISTRY_DOMAIN)) {
            return Err(bad_format());
        }

        let segments = {
            let parts: Vec<&str> = url.path().trim_matches('/').split('/').collect();
            match parts.as_slice() {
                [project, repo] if !project.is_empty() && !repo.is_empty() => {
                    Some((project.to_string(), repo.to_string()))
                }
                _ => None,
            }
        };
        let Some((project, repo)) = segments else {
            return Err(bad_format());
        };

        Ok(RepoUrl { url, project, repo })
    }

    /// Registry host, e.g. `us-go.pkg.dev`.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Project segment of the path.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Repository segment of the path.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Repo ID used to match `<server>` entries in Maven `settings.xml`
    /// against repositories declared in `pom.xml`.
    pub fn default_repo_id(&self) -> String {
        format!("{}-{}-{}", REPO_ID_PREFIX, self.project, self.repo)
    }
}

impl FromStr for RepoUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        RepoUrl::parse(s)
    }
}

impl fmt::Display for RepoUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// Parse every raw URL, reporting all failures together.
pub fn parse_repo_urls<S: AsRef<str>>(raws: &[S]) -> Result<Vec<RepoUrl>> {
    let mut urls = Vec::with_capacity(raws.len());
    let mut problems = Vec::new();

    for raw in raws {
        match RepoUrl::parse(raw.as_ref()) {
            Ok(url) => urls.push(url),
            Err(e) => problems.extend(e.into_problems()),
        }
    }

    if problems.is_empty() {
        Ok(urls)
    } else {
        Err(Error::Invalid(problems))
    }
}

/// Distinct hosts of `urls`, in first-seen order.
pub fn repo_hosts(urls: &[RepoUrl]) -> Vec<String> {
    let mut hosts: Vec<String> = Vec::with_capacity(urls.len());
    for url in urls {
        if !hosts.iter().any(|h| h == url.host()) {
            hosts.push(url.host().to_string());
        }
    }
    hosts
}

/// Check that at least one host is given and that all are registry hosts.
pub fn validate_hosts<S: AsRef<str>>(hosts: &[S]) -> Result<()> {
    if hosts.is_empty() {
        return Err(Error::invalid("no host specified"));
    }

    let problems: Vec<String> = hosts
        .iter()
        .map(AsRef::as_ref)
        .filter(|h| !h.ends_with(REGISTRY_DOMAIN))
        .map(|h| format!("host \"{h}\" doesn't have domain '{REGISTRY_DOMAIN}'"))
        .collect();

    if problems.is_empty() {
        Ok(())
    } else {
        Err(Error::Invalid(problems))
    }
}

/// Extract the host from a credential helper request `uri`.
///
/// The value may be a bare host (`us-go.pkg.dev`) or a full URL
/// (`https://us-go.pkg.dev/my-project/repo/pkg`). Unparseable values are
/// returned unchanged so host validation reports them.
pub fn host_from_uri(uri: &str) -> String {
    let uri = uri.trim();
    Url::parse(&with_https(uri))
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| uri.to_string())
}

fn with_https(raw: &str) -> String {
    if raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    }
}
