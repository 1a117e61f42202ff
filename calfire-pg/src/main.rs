//! Point d'entrée CLI pour calfire-pg

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;
mod config;
mod loader;
mod normalize;
mod pipeline;
mod report;
mod reproject;
mod sink;
mod wkt;

use cli::{Commands, LoadArgs};

/// Charger des shapefiles gouvernementaux dans PostgreSQL/PostGIS
#[derive(Parser)]
#[command(name = "calfire-pg")]
#[command(author, version)]
#[command(about = "Charger des shapefiles (zones de risque CAL FIRE) dans PostgreSQL")]
#[command(
    long_about = "Pipeline de chargement: lecture en flux des shapefiles, reprojection \
vers WGS84, sérialisation WKT, normalisation des attributs puis insertion par lots \
dans PostgreSQL/PostGIS.\n\nPar défaut, lance le chargement. Utilisez 'inspect' pour \
examiner un shapefile ou 'check' pour tester la connexion."
)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Sous-commande (défaut: chargement)
    #[command(subcommand)]
    command: Option<Commands>,

    /// Arguments du chargement (commande par défaut)
    #[command(flatten)]
    load: Option<LoadArgs>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Some(Commands::Inspect { path }) => {
            cli::cmd_inspect(&path)?;
        }
        Some(Commands::Check { database }) => {
            cli::cmd_check(&database).await?;
        }
        None => {
            // Commande par défaut: chargement
            let args = cli.load.expect("Load arguments required (--path)");
            let start_from = args.start_from;
            info!(path = %args.path.display(), start_from = start_from, "Load");
            if let Err(e) = cli::cmd_load(args).await {
                eprintln!("Fatal: {:#}", e);
                eprintln!(
                    "To resume a partially completed run: calfire-pg --path <root> --start-from <folder index>"
                );
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
