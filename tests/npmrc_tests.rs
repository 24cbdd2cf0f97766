//! .npmrc update tests.

use ar_cred_helper::{basic_auth_token, AuthConfig, Npmrc};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

fn repos(list: &[&str]) -> Vec<String> {
    list.iter().map(|r| r.to_string()).collect()
}

// =============================================================================
// Fresh files
// =============================================================================

#[test]
fn test_token_into_empty_file() {
    let mut npmrc = Npmrc::from_content("/unused/.npmrc", None, "");
    npmrc.set_token(&repos(&["us-npm.pkg.dev/p/r"]), "t");

    assert_eq!(
        npmrc.content(),
        "registry=https://us-npm.pkg.dev/p/r/\n\
         //us-npm.pkg.dev/p/r/:always-auth=true\n\
         //us-npm.pkg.dev/p/r/:email=not.valid@email.com\n\
         //us-npm.pkg.dev/p/r/:_authToken=b2F1dGgyYWNjZXNzdG9rZW46dA==\n"
    );
}

#[test]
fn test_json_key_login() {
    let mut npmrc = Npmrc::from_content("/unused/.npmrc", None, "");
    npmrc.set_json_key(&repos(&["us-npm.pkg.dev/p/r"]), "a2V5");

    let expected = format!(
        "//us-npm.pkg.dev/p/r/:_authToken={}",
        basic_auth_token("_json_key_base64", "a2V5")
    );
    assert!(npmrc.content().lines().any(|l| l == expected));
}

#[test]
fn test_scoped_registry() {
    for scope in ["@myorg", "myorg"] {
        let mut npmrc = Npmrc::from_content("/unused/.npmrc", Some(scope), "");
        npmrc.set_token(&repos(&["us-npm.pkg.dev/p/r"]), "t");
        assert_eq!(
            npmrc.content().lines().next(),
            Some("@myorg:registry=https://us-npm.pkg.dev/p/r/")
        );
    }
}

// =============================================================================
// Existing files
// =============================================================================

#[test]
fn test_reapplying_is_stable() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(".npmrc");
    let targets = repos(&["us-npm.pkg.dev/p/r", "https://europe-npm.pkg.dev/p/other/"]);

    let mut npmrc = Npmrc::open(&path, None).unwrap();
    npmrc.set_token(&targets, "t");
    npmrc.save().unwrap();
    let first = fs::read_to_string(&path).unwrap();

    let mut npmrc = Npmrc::open(&path, None).unwrap();
    npmrc.set_token(&targets, "t");
    npmrc.save().unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), first);
}

#[test]
fn test_existing_lines_are_rewritten_in_place() {
    let content = "# managed by hand\n\
                   registry=https://us-npm.pkg.dev/p/r\n\
                   //us-npm.pkg.dev/p/r/:always-auth=false\n\
                   //us-npm.pkg.dev/p/r/:_authToken=stale\n\
                   //registry.npmjs.org/:_authToken=keep-me\n";
    let mut npmrc = Npmrc::from_content("/unused/.npmrc", None, content);
    npmrc.set_token(&repos(&["us-npm.pkg.dev/p/r"]), "t");

    assert_eq!(
        npmrc.content(),
        "# managed by hand\n\
         registry=https://us-npm.pkg.dev/p/r\n\
         //us-npm.pkg.dev/p/r/:always-auth=true\n\
         //us-npm.pkg.dev/p/r/:_authToken=b2F1dGgyYWNjZXNzdG9rZW46dA==\n\
         //registry.npmjs.org/:_authToken=keep-me\n\
         //us-npm.pkg.dev/p/r/:email=not.valid@email.com\n"
    );
}

#[test]
fn test_duplicate_repos_are_written_once() {
    let mut npmrc = Npmrc::from_content("/unused/.npmrc", None, "");
    npmrc.set_token(
        &repos(&["us-npm.pkg.dev/p/r", "https://us-npm.pkg.dev/p/r/"]),
        "t",
    );
    assert_eq!(npmrc.content().lines().count(), 4);
}
