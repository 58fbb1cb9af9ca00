use anyhow::Result;
use clap::Parser;
use hk_config::{HomeConfig, LogConfig};

mod app;
mod cli;
mod config_cmd;
mod list_cmd;
mod logging;
mod pool_cmd;
mod serve_cmd;

use app::AppContext;
use cli::{Cli, Commands, ConfigCommands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output_format = cli.format.clone();
    let config_path = cli.config.as_deref();

    // `config init` must work before a config file exists.
    if let Commands::Config {
        cmd: ConfigCommands::Init,
    } = cli.command
    {
        let _log_guard = logging::init(&LogConfig::default())?;
        return config_cmd::handle_config_init(config_path);
    }

    let config = HomeConfig::load(config_path)?;
    let _log_guard = logging::init(&config.log)?;

    if let Commands::Config {
        cmd: ConfigCommands::Show,
    } = cli.command
    {
        return config_cmd::handle_config_show(&config, output_format);
    }

    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Serve {
            bind,
            port,
            no_poller,
        } => serve_cmd::handle_serve(&ctx, bind, port, no_poller).await,
        Commands::Add { text, source } => {
            list_cmd::handle_add(&ctx.list, &text, &source, output_format)
        }
        Commands::List => list_cmd::handle_list(&ctx.list, output_format),
        Commands::Delete { id } => list_cmd::handle_delete(&ctx.list, &id, output_format),
        Commands::Clear => list_cmd::handle_clear(&ctx.list, output_format),
        Commands::PoolLog { limit } => {
            pool_cmd::handle_pool_log(&ctx.pool_log, limit, output_format)
        }
        Commands::PollOnce => pool_cmd::handle_poll_once(&ctx, output_format).await,
        Commands::Config { .. } => Ok(()),
    }
}
