//! Tests for servers, variants and completions.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use clap_complete::Shell;
use std::path::Path;

#[test]
fn cli_parse_servers() {
    match parse(&["mtprobe", "servers"]) {
        CliCommand::Servers { registry_file } => assert!(registry_file.is_none()),
        _ => panic!("expected Servers"),
    }
}

#[test]
fn cli_parse_servers_registry_file() {
    match parse(&["mtprobe", "servers", "--registry-file", "dns.json"]) {
        CliCommand::Servers { registry_file } => {
            assert_eq!(registry_file.as_deref(), Some(Path::new("dns.json")));
        }
        _ => panic!("expected Servers with --registry-file"),
    }
}

#[test]
fn cli_parse_variants() {
    match parse(&["mtprobe", "variants"]) {
        CliCommand::Variants => {}
        _ => panic!("expected Variants"),
    }
}

#[test]
fn cli_parse_completions() {
    match parse(&["mtprobe", "completions", "bash"]) {
        CliCommand::Completions { shell } => assert_eq!(shell, Shell::Bash),
        _ => panic!("expected Completions"),
    }
}

#[test]
fn cli_rejects_unknown_subcommand() {
    assert!(Cli::try_parse_from(["mtprobe", "download"]).is_err());
    assert!(Cli::try_parse_from(["mtprobe"]).is_err());
}

#[test]
fn cli_definition_is_consistent() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}
