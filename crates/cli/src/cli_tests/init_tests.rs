// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! CLI argument parsing tests for the `init` command.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use clap::Parser;
use yare::parameterized;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(args)
}

#[parameterized(
    bare = { &["tether", "init"], None, None, BackendArg::Sqlite },
    remote = { &["tether", "init", "--remote", "ws://host:7890"], None, Some("ws://host:7890"), BackendArg::Sqlite },
    journal = { &["tether", "init", "--backend", "journal"], None, None, BackendArg::Journal },
    path = { &["tether", "init", "--path", "/srv/app"], Some("/srv/app"), None, BackendArg::Sqlite },
)]
fn parse_init(
    args: &[&str],
    path: Option<&str>,
    remote: Option<&str>,
    backend: BackendArg,
) {
    let cli = parse(args).unwrap();
    match cli.command {
        Command::Init {
            path: p,
            remote: r,
            backend: b,
        } => {
            assert_eq!(p.as_deref(), path);
            assert_eq!(r.as_deref(), remote);
            assert_eq!(b, backend);
        }
        _ => panic!("expected Init"),
    }
}

#[test]
fn unknown_backend_is_rejected() {
    assert!(parse(&["tether", "init", "--backend", "redis"]).is_err());
}

#[test]
fn backend_arg_maps_to_storage_backend() {
    assert_eq!(StorageBackend::from(BackendArg::Sqlite), StorageBackend::Sqlite);
    assert_eq!(
        StorageBackend::from(BackendArg::Journal),
        StorageBackend::Journal
    );
}
