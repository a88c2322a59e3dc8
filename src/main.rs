use anyhow::Result;
use clap::Parser;
use lander::{
    build::build_site,
    check::check_site,
    cli::{Cli, Commands},
    config::SiteConfig,
    log,
    serve::serve_site,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SiteConfig::load(&cli)?;

    let result = match &cli.command {
        Commands::Build { .. } => build_site(&config).map(|_| ()),
        Commands::Check => check_site(&config).map(|_| ()),
        Commands::Serve { .. } => {
            build_site(&config)?;
            serve_site(&config)
        }
    };

    if let Err(err) = &result {
        log!("error"; "{err:#}");
    }
    result
}
