//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Lander landing-site builder CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Output directory path (relative to project root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Config file name (default: lander.toml)
    #[arg(short = 'C', long, default_value = "lander.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Deletes the output directory if there is one and rebuilds the site
    Build {
        /// Minify the assembled html
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        minify: Option<bool>,
    },

    /// Install the cache controller against the built output and report
    /// precache entries the deployed site cannot serve
    Check,

    /// Serve the built output with a local contact endpoint
    Serve {
        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// The port you should provide
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build_with_minify() {
        let cli = Cli::try_parse_from(["lander", "build", "--minify"]).unwrap();
        assert!(matches!(cli.command, Commands::Build { minify: Some(true) }));
        assert_eq!(cli.config, PathBuf::from("lander.toml"));
    }

    #[test]
    fn test_parse_global_root_and_output() {
        let cli =
            Cli::try_parse_from(["lander", "--root", "site", "-o", "public", "check"]).unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("site")));
        assert_eq!(cli.output, Some(PathBuf::from("public")));
        assert!(matches!(cli.command, Commands::Check));
    }

    #[test]
    fn test_parse_serve_port() {
        let cli = Cli::try_parse_from(["lander", "serve", "-p", "8080"]).unwrap();
        match cli.command {
            Commands::Serve { port, interface } => {
                assert_eq!(port, Some(8080));
                assert!(interface.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
