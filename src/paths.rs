//! Path resolution for the config files this tool writes.
//!
//! Each output format has a default location under the user's home
//! directory (or `/etc` for apt), and explicit paths may point either at the
//! file itself or at the directory that should hold it.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Directory apt reads `auth.conf`-style credential files from.
pub const APT_AUTH_CONFIG_DIR: &str = "/etc/apt/auth.conf.d";

/// File name used under [`APT_AUTH_CONFIG_DIR`] when none is given.
pub const DEFAULT_APT_CONFIG_NAME: &str = "artifact-registry.conf";

/// The user's home directory.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(Error::HomeDirUnavailable)
}

/// Resolve the netrc file to edit.
///
/// - `None` -> `~/.netrc`
/// - a path ending in `.netrc` -> used as is
/// - anything else is a directory -> `{dir}/.netrc`
pub fn netrc_path(explicit: Option<&Path>) -> Result<PathBuf> {
    resolve(explicit, ".netrc", |home| home.join(".netrc"))
}

/// Resolve the Maven settings file to edit.
///
/// - `None` -> `~/.m2/settings.xml`
/// - a path ending in `settings.xml` -> used as is
/// - anything else is a directory -> `{dir}/settings.xml`
pub fn maven_settings_path(explicit: Option<&Path>) -> Result<PathBuf> {
    resolve(explicit, "settings.xml", |home| {
        home.join(".m2").join("settings.xml")
    })
}

/// Resolve the npm run-control file to edit (`~/.npmrc` by default).
///
/// Unlike netrc and Maven, an explicit path is always taken literally.
pub fn npmrc_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(expand_tilde(path)),
        None => Ok(home_dir()?.join(".npmrc")),
    }
}

/// Path of an apt auth config file inside `dir`.
pub fn apt_config_path(dir: &Path, name: Option<&str>) -> PathBuf {
    dir.join(name.unwrap_or(DEFAULT_APT_CONFIG_NAME))
}

fn resolve(
    explicit: Option<&Path>,
    file_suffix: &str,
    default: impl FnOnce(&Path) -> PathBuf,
) -> Result<PathBuf> {
    let Some(path) = explicit else {
        return Ok(default(&home_dir()?));
    };
    let path = expand_tilde(path);
    if path.to_string_lossy().ends_with(file_suffix) {
        Ok(path)
    } else {
        Ok(path.join(file_suffix))
    }
}

/// Location of the gcloud Application Default Credentials file.
///
/// - **Unix**: `~/.config/gcloud/application_default_credentials.json`
/// - **Windows**: `%APPDATA%\gcloud\application_default_credentials.json`
pub fn adc_well_known_path() -> Option<PathBuf> {
    #[cfg(windows)]
    let dir = dirs::config_dir()?.join("gcloud");

    #[cfg(not(windows))]
    let dir = dirs::home_dir()?.join(".config").join("gcloud");

    Some(dir.join("application_default_credentials.json"))
}

/// Locate the gcloud executable on `PATH`.
///
/// Returns `None` if gcloud cannot be found.
pub fn find_gcloud() -> Option<PathBuf> {
    let program = if cfg!(windows) { "gcloud.cmd" } else { "gcloud" };
    which::which(program).ok()
}

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_netrc_path_explicit_file() {
        let path = netrc_path(Some(Path::new("/tmp/ci/.netrc"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/ci/.netrc"));
    }

    #[test]
    fn test_netrc_path_directory() {
        let path = netrc_path(Some(Path::new("/tmp/ci"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/ci/.netrc"));
    }

    #[test]
    fn test_netrc_path_default() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(netrc_path(None).unwrap(), home.join(".netrc"));
    }

    #[test]
    fn test_maven_settings_path() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(
            maven_settings_path(None).unwrap(),
            home.join(".m2").join("settings.xml")
        );
        assert_eq!(
            maven_settings_path(Some(Path::new("/work/.m2"))).unwrap(),
            PathBuf::from("/work/.m2/settings.xml")
        );
        assert_eq!(
            maven_settings_path(Some(Path::new("/work/custom-settings.xml"))).unwrap(),
            PathBuf::from("/work/custom-settings.xml")
        );
    }

    #[test]
    fn test_npmrc_path_is_literal() {
        assert_eq!(
            npmrc_path(Some(Path::new("/work/project/.npmrc"))).unwrap(),
            PathBuf::from("/work/project/.npmrc")
        );
        assert_eq!(
            npmrc_path(Some(Path::new("/work/custom"))).unwrap(),
            PathBuf::from("/work/custom")
        );
    }

    #[test]
    fn test_apt_config_path() {
        let dir = Path::new(APT_AUTH_CONFIG_DIR);
        assert_eq!(
            apt_config_path(dir, None),
            PathBuf::from("/etc/apt/auth.conf.d/artifact-registry.conf")
        );
        assert_eq!(
            apt_config_path(dir, Some("my-repo.conf")),
            PathBuf::from("/etc/apt/auth.conf.d/my-repo.conf")
        );
    }

    #[test]
    fn test_expand_tilde() {
        let home = dirs::home_dir().unwrap();

        assert_eq!(expand_tilde(Path::new("~/foo/bar")), home.join("foo/bar"));
        assert_eq!(expand_tilde(Path::new("~")), home);
        assert_eq!(
            expand_tilde(Path::new("/absolute/path")),
            PathBuf::from("/absolute/path")
        );
        assert_eq!(
            expand_tilde(Path::new("relative/path")),
            PathBuf::from("relative/path")
        );
    }
}
