use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use digifarm::{
    catalog::Catalog,
    console::{is_affirmative, Command, HELP},
    engine::{Action, Engine, EngineBuilder, EngineError},
    persistence::{FileStore, StateStore},
    render::{render_catalog, render_farm},
    web::{self, WebServerConfig},
    Config,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "DigiFarm: grow creatures on a tiny grid")]
struct Cli {
    /// Path to the YAML config (defaults are used when the file is missing)
    #[arg(long, default_value = "config/digifarm.yaml")]
    config: PathBuf,

    /// Override the catalog JSON path
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Override the directory holding save slots
    #[arg(long)]
    save_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Play in the terminal (default)
    Play,
    /// Serve the browser UI
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the saved farm and exit
    Show,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if cli.config.exists() {
        Config::from_yaml(&cli.config)
            .with_context(|| format!("Failed to load config {}", cli.config.display()))?
    } else {
        Config::default()
    };
    if let Some(path) = &cli.catalog {
        config.catalog.path = path.clone();
    }
    if let Some(dir) = &cli.save_dir {
        config.storage.dir = dir.clone();
    }
    Ok(config)
}

fn build_engine(config: &Config) -> Result<Engine> {
    let catalog = Catalog::load(&config.catalog.path)
        .with_context(|| format!("Failed to load catalog {}", config.catalog.path.display()))?;
    info!("loaded {} creatures", catalog.len());
    let store = StateStore::new(FileStore::new(&config.storage.dir), &config.storage.key);
    Ok(EngineBuilder::new(config.rules, catalog, store).build())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    let engine = build_engine(&config)?;
    match cli.command.unwrap_or(Mode::Play) {
        Mode::Play => play(engine),
        Mode::Show => {
            print!("{}", render_farm(engine.state(), engine.rules()));
            Ok(())
        }
        Mode::Serve { host, port } => {
            let server = WebServerConfig {
                host: host.unwrap_or(config.web.host),
                port: port.unwrap_or(config.web.port),
            };
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(web::run(engine, server))
        }
    }
}

fn play(mut engine: Engine) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    print!("{}", render_farm(engine.state(), engine.rules()));
    println!("type 'help' for commands");

    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => println!("{HELP}"),
            Command::Show => print!("{}", render_farm(engine.state(), engine.rules())),
            Command::Catalog => print!("{}", render_catalog(engine.catalog())),
            Command::Act(Action::Reset { confirmed: false }) => {
                print!("Reset farm? [y/N] ");
                io::stdout().flush()?;
                let answer = lines.next().transpose()?.unwrap_or_default();
                if is_affirmative(&answer) {
                    report(&mut engine, Action::Reset { confirmed: true });
                }
            }
            Command::Act(action) => report(&mut engine, action),
        }
    }
    Ok(())
}

fn report(engine: &mut Engine, action: Action) {
    match engine.apply(action) {
        Ok(outcome) => {
            println!("{outcome}");
            if outcome.mutates_state() {
                print!("{}", render_farm(engine.state(), engine.rules()));
            }
        }
        Err(EngineError::Persistence(err)) => println!("Save failed: {err}"),
        Err(err) => println!("{err}"),
    }
}
