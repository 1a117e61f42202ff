//! Définition et implémentation des commandes CLI
//!
//! CLI simplifiée:
//! - commande par défaut: chargement d'une arborescence de shapefiles
//! - `inspect`: structure d'un shapefile, sans base de données
//! - `check`: test de connexion à la base

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use geo::Geometry;
use tracing::info;

use crate::config::PipelineConfig;
use crate::pipeline;
use crate::sink::{self, DatabaseConfig, PostgresSink};
use crate::wkt::geometry_type_name;

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect a shapefile: geometry type, attributes, first record
    Inspect {
        /// Path to a .shp file
        #[arg(short, long)]
        path: PathBuf,
    },

    /// Test the database connection and exit
    Check {
        #[command(flatten)]
        database: DatabaseArgs,
    },
}

/// Arguments du chargement (commande par défaut)
#[derive(Args)]
pub struct LoadArgs {
    /// Root directory, one sub-folder per decompressed archive
    #[arg(short, long)]
    pub path: PathBuf,

    /// Config preset name (calfire/passthrough) or path to a JSON config
    #[arg(long, default_value = "calfire")]
    pub config: String,

    /// Index of the first folder to process (resume after a crash)
    #[arg(long, default_value_t = 0)]
    pub start_from: usize,

    /// Target table (overrides the config)
    #[arg(long)]
    pub table: Option<String>,

    /// Rows per insert statement (overrides the config)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Accumulation buffer size triggering a flush (overrides the config)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Pause between chunks in milliseconds (overrides the config)
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Write the final report as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    #[command(flatten)]
    pub database: DatabaseArgs,
}

/// Surcharges de connexion PostgreSQL
#[derive(Args)]
pub struct DatabaseArgs {
    /// PostgreSQL host (défaut : env PGHOST / localhost)
    #[arg(long)]
    pub host: Option<String>,

    /// PostgreSQL database name (défaut : env PGDATABASE / gisdata)
    #[arg(long)]
    pub database: Option<String>,

    /// PostgreSQL user (défaut : env PGUSER / postgres)
    #[arg(long)]
    pub user: Option<String>,

    /// PostgreSQL password (défaut : env PGPASSWORD)
    #[arg(long)]
    pub password: Option<String>,

    /// PostgreSQL port (défaut : env PGPORT / 5432)
    #[arg(long)]
    pub port: Option<u16>,

    /// SSL mode: disable, prefer, require (défaut : env PGSSLMODE / require)
    #[arg(long)]
    pub ssl: Option<String>,
}

impl DatabaseArgs {
    /// Applique les surcharges CLI sur la config issue de l'environnement
    fn apply(&self, config: &mut DatabaseConfig) -> Result<()> {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(database) = &self.database {
            config.dbname = database.clone();
        }
        if let Some(user) = &self.user {
            config.user = user.clone();
        }
        if let Some(password) = &self.password {
            config.password = Some(password.clone());
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(ssl) = &self.ssl {
            config.ssl_mode = ssl.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        }
        Ok(())
    }
}

/// Exécute le chargement (commande par défaut)
pub async fn cmd_load(args: LoadArgs) -> Result<()> {
    let mut config = PipelineConfig::resolve(&args.config)?;
    if let Some(table) = &args.table {
        config.table = table.clone();
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_threshold = batch_size;
    }
    if let Some(delay_ms) = args.delay_ms {
        config.pacing_ms = delay_ms;
    }
    config.validate()?;

    if !args.path.is_dir() {
        bail!("Input directory {} not found", args.path.display());
    }

    println!("=== Load {} ===", config.table);
    println!("Path: {}", args.path.display());
    println!("Config: {}", args.config);
    println!("Chunk size: {}", config.chunk_size);
    println!("Batch threshold: {}", config.batch_threshold);
    println!("Delay between chunks: {}ms", config.pacing_ms);
    println!("Start from folder: {}", args.start_from);
    println!(
        "Columns: {}",
        match &config.columns {
            Some(columns) => format!("{} mapped", columns.len()),
            None => "passthrough".to_string(),
        }
    );

    let mut db_config = DatabaseConfig::from_env();
    args.database.apply(&mut db_config)?;
    println!("Database: {}", db_config.display());

    let pool = sink::create_pool(&db_config).await?;
    sink::test_connection(&pool).await?;
    println!("Connected to PostgreSQL");

    let sink = PostgresSink::new(pool);
    let report = pipeline::run(&args.path, &config, &sink, args.start_from).await?;

    report.display();
    if let Some(path) = &args.report {
        report.save_to_file(path)?;
        info!(path = %path.display(), "Report saved");
    }
    Ok(())
}

/// Exécute la commande inspect
pub fn cmd_inspect(path: &Path) -> Result<()> {
    println!("=== Inspect {} ===", path.display());

    match shpstream::read_projection(path)? {
        Some(definition) => {
            let transform = crate::reproject::resolve(Some(&definition));
            println!("Projection: {}", transform.name());
        }
        None => println!("Projection: none (.prj absent), coordinates pass through"),
    }

    let mut reader =
        shpstream::open(path).with_context(|| format!("Cannot open {}", path.display()))?;

    let first = reader.features().next();
    match first {
        None => {
            println!("Shapefile is empty");
            return Ok(());
        }
        Some(Err(e)) => bail!("Cannot read first record: {}", e),
        Some(Ok(feature)) => {
            match &feature.geometry {
                Some(geometry) => {
                    println!("Geometry: {}", geometry_type_name(geometry));
                    if let Some((x, y)) = first_coordinate(geometry) {
                        println!("First coordinate: ({}, {})", x, y);
                    }
                }
                None => println!("Geometry: none"),
            }
            println!("Attributes ({}):", feature.properties.len());
            for (name, value) in &feature.properties {
                println!("  {} = {:?}", name, value);
            }
        }
    }

    // Compter le reste du flux (le premier est déjà consommé)
    let mut remaining = 0usize;
    for (offset, item) in reader.features().enumerate() {
        item.with_context(|| format!("Record {} is unreadable", offset + 2))?;
        remaining = offset + 1;
    }
    println!("Records: {}", remaining + 1);

    Ok(())
}

/// Première coordonnée d'une géométrie (diagnostic)
fn first_coordinate(geometry: &Geometry<f64>) -> Option<(f64, f64)> {
    match geometry {
        Geometry::Point(p) => Some((p.x(), p.y())),
        Geometry::LineString(ls) => ls.0.first().map(|c| (c.x, c.y)),
        Geometry::Polygon(p) => p.exterior().0.first().map(|c| (c.x, c.y)),
        Geometry::MultiPoint(mp) => mp.0.first().map(|p| (p.x(), p.y())),
        Geometry::MultiLineString(mls) => {
            mls.0.first().and_then(|ls| ls.0.first()).map(|c| (c.x, c.y))
        }
        Geometry::MultiPolygon(mp) => mp
            .0
            .first()
            .and_then(|p| p.exterior().0.first())
            .map(|c| (c.x, c.y)),
        _ => None,
    }
}

/// Exécute la commande check
pub async fn cmd_check(args: &DatabaseArgs) -> Result<()> {
    let mut db_config = DatabaseConfig::from_env();
    args.apply(&mut db_config)?;
    println!("Database: {}", db_config.display());

    let pool = sink::create_pool(&db_config).await?;
    sink::test_connection(&pool).await?;
    println!("Connection OK");
    Ok(())
}
