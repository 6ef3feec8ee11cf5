#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::struct_excessive_bools)]

mod commands;
mod logging;

use clap::Parser;
use commands::mdjs::MdjsAction;
use commands::resolve::ResolveAction;
use esdev_core::Config;
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "esdev")]
#[command(author, version, about = "Resolve browser imports and compile mdjs documents", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Resolve a bare import the way the dev server rewrites it
    Resolve {
        /// Import specifier, e.g. `lit-element` or `pkg/sub?x=1`
        specifier: String,

        /// Browser path of the importing file
        #[arg(long, default_value = "/index.js", value_name = "BROWSER_PATH")]
        importer: String,

        /// Config file to load instead of searching the working directory
        #[arg(long, short = 'c', value_name = "PATH")]
        config: Option<PathBuf>,

        /// Directory served as `/`, overriding the config
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,

        /// Use the `browser` field and export condition
        #[arg(long)]
        browser: bool,

        /// Keep symlinked paths instead of following them
        #[arg(long)]
        preserve_symlinks: bool,
    },

    /// Compile a markdown document with embedded stories
    Mdjs {
        /// Markdown file to compile
        file: PathBuf,

        /// Expression the story registration code queries for its root node
        #[arg(long, value_name = "CODE")]
        root_node_query_code: Option<String>,

        /// Write the HTML to this file
        #[arg(long, short = 'o', value_name = "PATH")]
        out: Option<PathBuf>,

        /// Write the generated JavaScript to this file
        #[arg(long, value_name = "PATH")]
        js_out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Determine working directory
    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    let cwd = match std::env::current_dir() {
        Ok(current) if cwd.is_relative() => esdev_util::path::normalize(&current.join(&cwd)),
        _ => cwd,
    };

    let config = Config::new(cwd)
        .with_verbosity(cli.verbose)
        .with_json_logs(cli.json);

    logging::init(config.verbosity, config.json_logs);

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(cli.json),
        Some(Commands::Resolve {
            specifier,
            importer,
            config: config_path,
            root,
            browser,
            preserve_symlinks,
        }) => {
            let action = ResolveAction {
                specifier,
                importer,
                config: config_path,
                root,
                browser,
                preserve_symlinks,
            };
            commands::resolve::run(&config.cwd, &action, cli.json)
        }
        Some(Commands::Mdjs {
            file,
            root_node_query_code,
            out,
            js_out,
        }) => {
            let action = MdjsAction {
                file,
                root_node_query_code,
                out,
                js_out,
            };
            commands::mdjs::run(&config.cwd, &action, cli.json)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_resolve() {
        let cli = Cli::try_parse_from([
            "esdev",
            "-vv",
            "resolve",
            "lit-element",
            "--importer",
            "/src/app.js",
            "--preserve-symlinks",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Commands::Resolve {
                specifier,
                importer,
                preserve_symlinks,
                browser,
                ..
            }) => {
                assert_eq!(specifier, "lit-element");
                assert_eq!(importer, "/src/app.js");
                assert!(preserve_symlinks);
                assert!(!browser);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["esdev", "mdjs", "README.md", "--json", "--cwd", "/tmp"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.cwd, Some(PathBuf::from("/tmp")));
        assert!(matches!(cli.command, Some(Commands::Mdjs { .. })));
    }

    #[test]
    fn test_cli_resolve_default_importer() {
        let cli = Cli::try_parse_from(["esdev", "resolve", "pkg"]).unwrap();
        match cli.command {
            Some(Commands::Resolve { importer, .. }) => assert_eq!(importer, "/index.js"),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
