//! End-to-end tests of the command line surface, with stubbed token sources.

use ar_cred_helper::commands::{Cli, Command, CommandContext, GetCmd};
use ar_cred_helper::{encode_json_key, Error, Result, TokenSource};
use async_trait::async_trait;
use clap::Parser;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

struct StaticToken(&'static str);

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<String> {
        Ok(self.0.to_string())
    }
}

struct NoToken;

#[async_trait]
impl TokenSource for NoToken {
    async fn token(&self) -> Result<String> {
        Err(Error::Adc("no credentials".to_string()))
    }
}

fn parse(args: &[&str]) -> Command {
    let argv = std::iter::once("ar-cred-helper").chain(args.iter().copied());
    Cli::try_parse_from(argv).unwrap().command
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

// =============================================================================
// get
// =============================================================================

#[tokio::test]
async fn test_get_from_stdin_request() {
    let ctx = CommandContext::with_token_source(StaticToken("tok"));
    let mut out = Vec::new();

    GetCmd::default()
        .run(&ctx, &br#"{"uri":"us-go.pkg.dev"}"#[..], &mut out)
        .await
        .unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        r#"{"headers":{"Authorization":["Bearer tok"]}}"#
    );
}

#[tokio::test]
async fn test_get_rejects_foreign_host() {
    let ctx = CommandContext::with_token_source(StaticToken("tok"));
    let mut out = Vec::new();

    let err = GetCmd::default()
        .run(&ctx, &br#"{"uri":"https://proxy.golang.org/x"}"#[..], &mut out)
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "host \"proxy.golang.org\" doesn't have domain '.pkg.dev'"
    );
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_get_with_hosts_flag() {
    let Command::Get(cmd) = parse(&["get", "--hosts", "us-go.pkg.dev,europe-go.pkg.dev"]) else {
        panic!("expected get");
    };
    let ctx = CommandContext::with_token_source(StaticToken("tok"));
    let mut out = Vec::new();

    cmd.run(&ctx, std::io::empty(), &mut out).await.unwrap();
    assert!(String::from_utf8(out).unwrap().contains("Bearer tok"));
}

#[tokio::test]
async fn test_get_token_from_env() {
    std::env::set_var("AR_CRED_HELPER_TEST_GET_TOKEN", "env-tok");
    let Command::Get(cmd) = parse(&[
        "get",
        "--hosts",
        "us-go.pkg.dev",
        "--access-token-from-env",
        "AR_CRED_HELPER_TEST_GET_TOKEN",
    ]) else {
        panic!("expected get");
    };
    let ctx = CommandContext::with_token_source(NoToken);
    let mut out = Vec::new();

    cmd.run(&ctx, std::io::empty(), &mut out).await.unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        r#"{"headers":{"Authorization":["Bearer env-tok"]}}"#
    );
    std::env::remove_var("AR_CRED_HELPER_TEST_GET_TOKEN");
}

// =============================================================================
// set-netrc
// =============================================================================

#[tokio::test]
async fn test_set_netrc_writes_each_host_once() {
    let temp = TempDir::new().unwrap();
    let cmd = parse(&[
        "set-netrc",
        "--repo-urls",
        "us-go.pkg.dev/p/r1,us-go.pkg.dev/p/r2,europe-go.pkg.dev/p/r3",
        "--netrc",
        path_arg(temp.path()),
    ]);

    cmd.execute(&CommandContext::with_token_source(StaticToken("tok")))
        .await
        .unwrap();

    assert_eq!(
        fs::read_to_string(temp.path().join(".netrc")).unwrap(),
        "\nmachine us-go.pkg.dev\nlogin oauth2accesstoken\npassword tok\n\
         \nmachine europe-go.pkg.dev\nlogin oauth2accesstoken\npassword tok\n"
    );
}

#[tokio::test]
async fn test_set_netrc_json_key() {
    let temp = TempDir::new().unwrap();
    let key = temp.path().join("key.json");
    fs::write(&key, r#"{"type":"service_account"}"#).unwrap();
    let netrc = temp.path().join(".netrc");

    let cmd = parse(&[
        "set-netrc",
        "--repo-urls",
        "us-go.pkg.dev/p/r",
        "--netrc",
        path_arg(&netrc),
        "--json-key",
        path_arg(&key),
    ]);
    cmd.execute(&CommandContext::with_token_source(NoToken))
        .await
        .unwrap();

    let encoded = encode_json_key(&key).unwrap();
    assert_eq!(
        fs::read_to_string(&netrc).unwrap(),
        format!("\nmachine us-go.pkg.dev\nlogin _json_key_base64\npassword {encoded}\n")
    );
}

#[tokio::test]
async fn test_set_netrc_refresh_needs_no_urls() {
    let temp = TempDir::new().unwrap();
    let netrc = temp.path().join(".netrc");
    fs::write(
        &netrc,
        "\nmachine us-go.pkg.dev\nlogin oauth2accesstoken\npassword old\n",
    )
    .unwrap();

    let cmd = parse(&["set-netrc", "--refresh", "--netrc", path_arg(&netrc)]);
    cmd.execute(&CommandContext::with_token_source(StaticToken("new")))
        .await
        .unwrap();

    assert_eq!(
        fs::read_to_string(&netrc).unwrap(),
        "\nmachine us-go.pkg.dev\nlogin oauth2accesstoken\npassword new\n"
    );
}

#[tokio::test]
async fn test_set_netrc_refresh_rejects_json_key() {
    let temp = TempDir::new().unwrap();
    let cmd = parse(&[
        "set-netrc",
        "--refresh",
        "--netrc",
        path_arg(temp.path()),
        "--json-key",
        "key.json",
    ]);

    let err = cmd
        .execute(&CommandContext::with_token_source(StaticToken("tok")))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "--refresh cannot be used with --json-key");
}

#[test]
fn test_append_conflicts_with_refresh() {
    let result = Cli::try_parse_from(["ar-cred-helper", "set-netrc", "--append", "--refresh"]);
    assert!(result.is_err());
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_validation_reports_everything_before_writing() {
    let temp = TempDir::new().unwrap();
    let cmd = parse(&[
        "set-npm",
        "--repo-urls",
        "registry.npmjs.org/a/b,us-npm.pkg.dev/only-project",
        "--npmrc",
        path_arg(&temp.path().join(".npmrc")),
        "--background-refresh-interval",
        "30s",
    ]);

    let err = cmd
        .execute(&CommandContext::with_token_source(StaticToken("tok")))
        .await
        .unwrap_err();

    let Error::Invalid(problems) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(problems.len(), 3);
    assert!(!temp.path().join(".npmrc").exists());
}

#[tokio::test]
async fn test_missing_repo_urls() {
    let temp = TempDir::new().unwrap();
    let cmd = parse(&["set-npm", "--npmrc", path_arg(&temp.path().join(".npmrc"))]);

    let err = cmd
        .execute(&CommandContext::with_token_source(StaticToken("tok")))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "no host specified");
}

#[tokio::test]
async fn test_token_failure_leaves_file_untouched() {
    let temp = TempDir::new().unwrap();
    let netrc = temp.path().join(".netrc");
    let cmd = parse(&[
        "set-netrc",
        "--repo-urls",
        "us-go.pkg.dev/p/r",
        "--netrc",
        path_arg(&netrc),
    ]);

    let err = cmd
        .execute(&CommandContext::with_token_source(NoToken))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Adc(_)));
    assert!(!netrc.exists());
}

#[tokio::test]
async fn test_huge_refresh_interval_is_rejected() {
    let temp = TempDir::new().unwrap();
    let netrc = temp.path().join(".netrc");
    let cmd = parse(&[
        "set-netrc",
        "--repo-urls",
        "us-go.pkg.dev/p/r",
        "--netrc",
        path_arg(&netrc),
        "--background-refresh-interval",
        "10000000000000000000s",
    ]);

    let err = cmd
        .execute(&CommandContext::with_token_source(StaticToken("tok")))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "background refresh interval must be at most 365d");
    assert!(!netrc.exists());
}

#[test]
fn test_invalid_duration_is_a_parse_error() {
    let result = Cli::try_parse_from([
        "ar-cred-helper",
        "set-npm",
        "--background-refresh-interval",
        "soon",
    ]);
    assert!(result.is_err());
}

// =============================================================================
// set-maven, set-npm, set-apt
// =============================================================================

#[tokio::test]
async fn test_set_maven_derives_repo_ids() {
    let temp = TempDir::new().unwrap();
    let cmd = parse(&[
        "set-maven",
        "--repo-urls",
        "us-maven.pkg.dev/my-project/my-repo",
        "--maven-settings",
        path_arg(temp.path()),
    ]);
    cmd.execute(&CommandContext::with_token_source(StaticToken("tok")))
        .await
        .unwrap();

    let content = fs::read_to_string(temp.path().join("settings.xml")).unwrap();
    assert!(content.contains("<id>artifactregistry-my-project-my-repo</id>"));
    assert!(content.contains("<password>tok</password>"));
}

#[tokio::test]
async fn test_set_maven_repo_ids_override_without_urls() {
    let temp = TempDir::new().unwrap();
    let settings = temp.path().join("settings.xml");
    let cmd = parse(&[
        "set-maven",
        "--repo-ids-override",
        "central,snapshots",
        "--maven-settings",
        path_arg(&settings),
    ]);
    cmd.execute(&CommandContext::with_token_source(StaticToken("tok")))
        .await
        .unwrap();

    let content = fs::read_to_string(&settings).unwrap();
    assert!(content.contains("<id>central</id>"));
    assert!(content.contains("<id>snapshots</id>"));
}

#[tokio::test]
async fn test_set_npm_with_scope() {
    let temp = TempDir::new().unwrap();
    let npmrc = temp.path().join("project.npmrc");
    let cmd = parse(&[
        "set-npm",
        "--repo-urls",
        "us-npm.pkg.dev/p/r",
        "--npmrc",
        path_arg(&npmrc),
        "--scope",
        "@myorg",
    ]);
    cmd.execute(&CommandContext::with_token_source(StaticToken("t")))
        .await
        .unwrap();

    assert_eq!(
        fs::read_to_string(&npmrc).unwrap(),
        "@myorg:registry=https://us-npm.pkg.dev/p/r/\n\
         //us-npm.pkg.dev/p/r/:always-auth=true\n\
         //us-npm.pkg.dev/p/r/:email=not.valid@email.com\n\
         //us-npm.pkg.dev/p/r/:_authToken=b2F1dGgyYWNjZXNzdG9rZW46dA==\n"
    );
}

#[tokio::test]
async fn test_set_apt_in_custom_dir() {
    let temp = TempDir::new().unwrap();
    let cmd = parse(&[
        "set-apt",
        "--repo-urls",
        "us-apt.pkg.dev/p/r",
        "--config-dir",
        path_arg(temp.path()),
        "--config-name",
        "ar.conf",
    ]);
    cmd.execute(&CommandContext::with_token_source(StaticToken("tok")))
        .await
        .unwrap();

    assert_eq!(
        fs::read_to_string(temp.path().join("ar.conf")).unwrap(),
        "\nmachine us-apt.pkg.dev\nlogin oauth2accesstoken\npassword tok\n"
    );
}
