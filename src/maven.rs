//! Editing `<server>` credentials in a Maven `settings.xml`.
//!
//! Maven matches `<server><id>` against the repository IDs declared in
//! `pom.xml`, so each Artifact Registry repository gets one server entry:
//!
//! ```xml
//! <servers>
//!   <server>
//!     <id>artifactregistry-my-project-my-repo</id>
//!     <username>oauth2accesstoken</username>
//!     <password>ya29.a0Af...</password>
//!   </server>
//! </servers>
//! ```

use crate::auth::{JSON_KEY_LOGIN, TOKEN_LOGIN};
use crate::config::AuthConfig;
use crate::error::{Error, Result};
use crate::store::{read_optional, write_atomic};
use crate::xml::{Document, Element};
use std::path::{Path, PathBuf};

const SETTINGS_NAMESPACE: &str = "http://maven.apache.org/SETTINGS/1.0.0";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const SETTINGS_SCHEMA_LOCATION: &str =
    "http://maven.apache.org/SETTINGS/1.0.0 http://maven.apache.org/xsd/settings-1.0.0.xsd";

/// A Maven settings file loaded in memory.
#[derive(Debug, Clone)]
pub struct MavenSettings {
    path: PathBuf,
    document: Document,
}

impl MavenSettings {
    /// Load the settings file at `path`.
    ///
    /// A missing file starts a fresh `<settings>` document. An existing file
    /// that is not well-formed XML, or whose root is not `<settings>`, is an
    /// error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let document = match read_optional(&path)? {
            Some(content) => Self::parse(&path, &content)?,
            None => Document::new(empty_settings()),
        };
        tracing::debug!(path = %path.display(), "opened Maven settings");
        Ok(MavenSettings { path, document })
    }

    fn parse(path: &Path, content: &str) -> Result<Document> {
        let malformed = |message: String| Error::MalformedXml {
            path: path.to_path_buf(),
            message,
        };
        let document = Document::parse(content).map_err(malformed)?;
        if document.root.name != "settings" {
            return Err(malformed(format!(
                "root element is <{}>, expected <settings>",
                document.root.name
            )));
        }
        Ok(document)
    }

    /// The parsed document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Render the document as it will be saved.
    pub fn content(&self) -> Result<String> {
        self.document
            .to_string_indented(2)
            .map_err(|message| Error::MalformedXml {
                path: self.path.clone(),
                message,
            })
    }

    /// `(username, password)` of the server with the given id.
    pub fn server_credentials(&self, repo_id: &str) -> Option<(String, String)> {
        let server = self.find_server(repo_id)?;
        Some((
            server.child("username").map(Element::text).unwrap_or_default(),
            server.child("password").map(Element::text).unwrap_or_default(),
        ))
    }

    /// Number of `<server>` entries with the given id.
    pub fn server_count(&self, repo_id: &str) -> usize {
        self.document
            .root
            .child("servers")
            .map(|servers| servers.elements().filter(|s| is_server(s, repo_id)).count())
            .unwrap_or(0)
    }

    fn find_server(&self, repo_id: &str) -> Option<&Element> {
        self.document
            .root
            .child("servers")?
            .elements()
            .find(|s| is_server(s, repo_id))
    }

    /// Set `user`/`pwd` on the server entry of every repo ID, adding entries
    /// that don't exist yet.
    pub fn update(&mut self, repo_ids: &[String], user: &str, pwd: &str) {
        let servers = self.document.root.child_or_insert("servers");

        for repo_id in repo_ids {
            if let Some(server) = servers.elements_mut().find(|s| is_server(s, repo_id)) {
                server.child_or_insert("username").set_text(user);
                server.child_or_insert("password").set_text(pwd);
                continue;
            }

            let mut server = Element::new("server");
            server.push(Element::with_text("id", repo_id));
            server.push(Element::with_text("username", user));
            server.push(Element::with_text("password", pwd));
            servers.push(server);
        }
    }
}

fn is_server(element: &Element, repo_id: &str) -> bool {
    element.name == "server"
        && element
            .child("id")
            .is_some_and(|id| id.text().trim() == repo_id)
}

fn empty_settings() -> Element {
    Element::new("settings")
        .with_attribute("xmlns", SETTINGS_NAMESPACE)
        .with_attribute("xmlns:xsi", XSI_NAMESPACE)
        .with_attribute("xsi:schemaLocation", SETTINGS_SCHEMA_LOCATION)
}

impl AuthConfig for MavenSettings {
    fn set_token(&mut self, repo_ids: &[String], token: &str) {
        self.update(repo_ids, TOKEN_LOGIN, token);
    }

    fn set_json_key(&mut self, repo_ids: &[String], key: &str) {
        self.update(repo_ids, JSON_KEY_LOGIN, key);
    }

    fn save(&self) -> Result<()> {
        write_atomic(&self.path, self.content()?.as_bytes())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
