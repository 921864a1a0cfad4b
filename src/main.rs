mod audio;
mod cli;
mod config;
mod error;
mod model;
mod repl;
mod session;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use cli::Cli;
use config::Config;
use session::Session;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect speakerid.toml / global config
    let config_path = cli.config.clone().or_else(|| {
        let local = PathBuf::from("speakerid.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("speakerid").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("speakerid").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    });

    let mut cfg = match config_path {
        Some(ref path) => match config::load_config(path) {
            Ok(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            Err(err) if cli.config.is_some() => return Err(err),
            Err(err) => {
                log::warn!("{:#}, using defaults", err);
                Config::default()
            }
        },
        None => Config::default(),
    };

    // CLI flags take precedence over the config file
    if let Some(k) = cli.k {
        cfg.model.k = k;
    }
    if let Some(metric) = cli.metric {
        cfg.model.metric = metric;
    }

    let mut session = Session::new(&cfg.analysis, &cfg.model)?;
    if let Some(path) = cli.training_data {
        session = session.with_training_data(path)?;
    }

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    repl::run(&mut session, stdin.lock(), stdout.lock())
}
