//! qrstyle - styled QR code generator with a live-preview web form.

mod adapters;
mod cli;
mod config;
mod context;
mod error;
mod generator;
mod logo;
mod output;
mod ports;
mod style;
mod web;

use std::process;
use std::sync::Arc;

use clap::Parser;

use crate::cli::{Cli, Command, GenerateArgs, ServeArgs};
use crate::config::Config;
use crate::context::ServiceContext;
use crate::error::QrError;
use crate::generator::LogoAsset;
use crate::output::save_png;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), QrError> {
    let config_path = config::discover_config_path(cli.config.as_deref());
    let config = Config::load(&config_path).map_err(QrError::Config)?;
    log::debug!("Config: {}", config_path.display());

    let ctx = ServiceContext::live(&config)?;

    match cli.command {
        Command::Generate(args) => generate(&ctx, &args),
        Command::Serve(args) => serve(ctx, &config, args).await,
    }
}

fn generate(ctx: &ServiceContext, args: &GenerateArgs) -> Result<(), QrError> {
    let options = args.style(&ctx.defaults)?;
    log::debug!("Style: {options:?}");

    // Unlike the web form, a logo named on the command line must be usable.
    let logo = match args.logo.as_deref() {
        Some(path) => {
            let meta = std::fs::metadata(path).map_err(|e| {
                QrError::Io(std::io::Error::new(
                    e.kind(),
                    format!("cannot read logo {}: {e}", path.display()),
                ))
            })?;
            if !meta.is_file() {
                return Err(QrError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("cannot read logo {}: not a file", path.display()),
                )));
            }
            Some(LogoAsset::new(path))
        }
        None => None,
    };

    let img = ctx.generator.generate(&args.data, &options, logo.as_ref())?;
    save_png(&img, &args.output)?;
    eprintln!("Saved: {}", args.output.display());
    Ok(())
}

async fn serve(ctx: ServiceContext, config: &Config, args: ServeArgs) -> Result<(), QrError> {
    let ctx = match args.upload_dir {
        Some(dir) => ctx.with_upload_dir(dir),
        None => ctx,
    };
    let addr = args.addr.unwrap_or_else(|| config.server_addr());
    let server = web::bind(&addr)?;
    let shown = web::local_addr(&server).map_or(addr, |a| a.to_string());
    eprintln!("Serving on http://{shown}/");
    web::serve(server, Arc::new(ctx)).await
}
