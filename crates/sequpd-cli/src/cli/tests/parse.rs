//! Argument parsing for every subcommand.

use super::{parse, Cli, CliCommand};
use clap::Parser;
use std::path::Path;

#[test]
fn cli_parse_check_defaults() {
    let cli = parse(&["sequpd", "check"]);
    assert!(!cli.verbose);
    assert!(cli.config.is_none());
    match cli.command {
        CliCommand::Check {
            ids,
            manifest,
            disable_updates,
            attrs,
        } => {
            assert!(ids.is_empty());
            assert!(attrs.is_empty());
            assert!(manifest.is_none());
            assert!(!disable_updates);
        }
        _ => panic!("expected Check"),
    }
}

#[test]
fn cli_parse_check_ids_and_flags() {
    let cli = parse(&[
        "sequpd",
        "check",
        "brave-component",
        "widevine",
        "--manifest",
        "/tmp/m.json",
        "--disable-updates",
        "--attr",
        "channel=beta",
        "--attr",
        "arch=x64",
    ]);
    match cli.command {
        CliCommand::Check {
            ids,
            manifest,
            disable_updates,
            attrs,
        } => {
            assert_eq!(attrs, vec!["channel=beta", "arch=x64"]);
            assert_eq!(ids, vec!["brave-component", "widevine"]);
            assert_eq!(manifest.as_deref(), Some(Path::new("/tmp/m.json")));
            assert!(disable_updates);
        }
        _ => panic!("expected Check"),
    }
}

#[test]
fn cli_parse_update_with_global_flags() {
    let cli = parse(&["sequpd", "update", "-v", "--config", "/etc/sequpd.toml"]);
    assert!(cli.verbose);
    assert_eq!(cli.config.as_deref(), Some(Path::new("/etc/sequpd.toml")));
    match cli.command {
        CliCommand::Update { manifest } => assert!(manifest.is_none()),
        _ => panic!("expected Update"),
    }
}

#[test]
fn cli_parse_components_and_status() {
    assert!(matches!(
        parse(&["sequpd", "components"]).command,
        CliCommand::Components
    ));
    assert!(matches!(
        parse(&["sequpd", "status"]).command,
        CliCommand::Status
    ));
}

#[test]
fn cli_rejects_unknown_subcommand() {
    assert!(Cli::try_parse_from(["sequpd", "install"]).is_err());
}
