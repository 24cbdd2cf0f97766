//! npm registry keys for Artifact Registry repositories.
//!
//! npm scopes credentials to a registry with "nerf-darted" keys: the registry
//! URL without its scheme, e.g. `//us-npm.pkg.dev/my-project/repo1/:_authToken`.

/// Normalize a repository URL into an npm registry URL.
///
/// Prepends `https://` when missing and ensures a trailing slash.
///
/// # Examples
///
/// ```
/// use ar_cred_helper::registry::normalize_registry_url;
///
/// assert_eq!(
///     normalize_registry_url("us-npm.pkg.dev/my-project/repo1"),
///     "https://us-npm.pkg.dev/my-project/repo1/"
/// );
/// ```
pub fn normalize_registry_url(repo: &str) -> String {
    let mut url = if repo.starts_with("https://") {
        repo.to_string()
    } else {
        format!("https://{}", repo)
    };
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

/// Convert a normalized registry URL to the nerf-dart form used as the
/// prefix of per-registry keys.
///
/// # Examples
///
/// ```
/// use ar_cred_helper::registry::nerf_dart;
///
/// assert_eq!(
///     nerf_dart("https://us-npm.pkg.dev/my-project/repo1/"),
///     "//us-npm.pkg.dev/my-project/repo1/"
/// );
/// ```
pub fn nerf_dart(registry_url: &str) -> &str {
    registry_url
        .strip_prefix("https:")
        .unwrap_or(registry_url)
}

/// Build the config key naming the registry, optionally for a scope.
///
/// The scope may be given with or without its leading `@`.
///
/// # Examples
///
/// ```
/// use ar_cred_helper::registry::scope_registry_key;
///
/// assert_eq!(scope_registry_key(None), "registry");
/// assert_eq!(scope_registry_key(Some("myorg")), "@myorg:registry");
/// assert_eq!(scope_registry_key(Some("@myorg")), "@myorg:registry");
/// ```
pub fn scope_registry_key(scope: Option<&str>) -> String {
    match scope.map(|s| s.trim_start_matches('@')) {
        Some(scope) if !scope.is_empty() => format!("@{}:registry", scope),
        _ => "registry".to_string(),
    }
}
