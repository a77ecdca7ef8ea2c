// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Galatea CLI entrypoint.
//!
//! Runs the sync dev server: watches the document root for HTML changes and pushes
//! notifications to connected editing sessions over `ws://127.0.0.1:<port>/sync`, while serving
//! documents for the fetch contract.

use std::error::Error;

use tracing_subscriber::EnvFilter;

use galatea::server::{RunningServer, ServerConfig, SyncMode, DEFAULT_PORT};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [<root-dir>] [--port <port>] [--full-reload] [--poll-interval-ms <ms>]\n\nWatches <root-dir> (default: current directory) for changes to .html documents and pushes\nsync messages to connected sessions at `ws://127.0.0.1:<port>/sync`.\n--port selects the port (0 = ephemeral; default {DEFAULT_PORT}).\n\nBy default changed files are announced individually (partial sync). --full-reload switches\nthe deployment to whole-page reload pushes instead; the two modes are mutually exclusive\nby construction.\n\n--poll-interval-ms tunes the content-compare polling interval (default 100)."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    root: Option<String>,
    port: Option<u16>,
    full_reload: bool,
    poll_interval_ms: Option<u64>,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--port" => {
                if options.port.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let port: u16 = raw.parse().map_err(|_| ())?;
                options.port = Some(port);
            }
            "--full-reload" => {
                if options.full_reload {
                    return Err(());
                }
                options.full_reload = true;
            }
            "--poll-interval-ms" => {
                if options.poll_interval_ms.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let ms: u64 = raw.parse().map_err(|_| ())?;
                if ms == 0 {
                    return Err(());
                }
                options.poll_interval_ms = Some(ms);
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => {
                if options.root.is_some() {
                    return Err(());
                }
                options.root = Some(arg);
            }
        }
    }

    Ok(options)
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "galatea".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("galatea=info"));
        tracing_subscriber::fmt().with_env_filter(filter).init();

        let mut config = ServerConfig::new(options.root.unwrap_or_else(|| ".".to_owned()));
        if let Some(port) = options.port {
            config = config.with_port(port);
        }
        if options.full_reload {
            config = config.with_mode(SyncMode::FullReload);
        }
        if let Some(ms) = options.poll_interval_ms {
            config = config.with_poll_interval(std::time::Duration::from_millis(ms));
        }

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

        runtime.block_on(async move {
            let server = RunningServer::bind(config).await?;
            tokio::signal::ctrl_c().await?;
            tracing::info!("shutting down");
            server.shutdown();
            Ok::<(), Box<dyn Error>>(())
        })?;

        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("galatea: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_options, CliOptions};

    #[test]
    fn parses_empty_args() {
        let options = parse_options(std::iter::empty()).expect("parse options");
        assert_eq!(options, CliOptions::default());
    }

    #[test]
    fn parses_positional_root() {
        let options = parse_options(["designs".to_owned()].into_iter()).expect("parse options");
        assert_eq!(options.root.as_deref(), Some("designs"));
        assert!(!options.full_reload);
        assert_eq!(options.port, None);
    }

    #[test]
    fn parses_port() {
        let options = parse_options(["--port".to_owned(), "0".to_owned()].into_iter())
            .expect("parse options");
        assert_eq!(options.port, Some(0));
    }

    #[test]
    fn parses_full_reload_with_root_in_any_order() {
        let options =
            parse_options(["--full-reload".to_owned(), "designs".to_owned()].into_iter())
                .expect("parse options");
        assert!(options.full_reload);
        assert_eq!(options.root.as_deref(), Some("designs"));

        let options =
            parse_options(["designs".to_owned(), "--full-reload".to_owned()].into_iter())
                .expect("parse options");
        assert!(options.full_reload);
        assert_eq!(options.root.as_deref(), Some("designs"));
    }

    #[test]
    fn parses_poll_interval() {
        let options =
            parse_options(["--poll-interval-ms".to_owned(), "250".to_owned()].into_iter())
                .expect("parse options");
        assert_eq!(options.poll_interval_ms, Some(250));
    }

    #[test]
    fn rejects_a_zero_poll_interval() {
        parse_options(["--poll-interval-ms".to_owned(), "0".to_owned()].into_iter())
            .unwrap_err();
    }

    #[test]
    fn rejects_unknown_args() {
        parse_options(["--nope".to_owned()].into_iter()).unwrap_err();
    }

    #[test]
    fn rejects_duplicate_flags() {
        parse_options(["--full-reload".to_owned(), "--full-reload".to_owned()].into_iter())
            .unwrap_err();

        parse_options(
            ["--port".to_owned(), "1".to_owned(), "--port".to_owned(), "2".to_owned()]
                .into_iter(),
        )
        .unwrap_err();
    }

    #[test]
    fn rejects_multiple_positional_roots() {
        parse_options(["one".to_owned(), "two".to_owned()].into_iter()).unwrap_err();
    }

    #[test]
    fn rejects_missing_values() {
        parse_options(["--port".to_owned()].into_iter()).unwrap_err();
        parse_options(["--poll-interval-ms".to_owned()].into_iter()).unwrap_err();
        parse_options(["--port".to_owned(), "nope".to_owned()].into_iter()).unwrap_err();
    }
}
