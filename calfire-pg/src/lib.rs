//! # calfire-pg
//!
//! Chargement de shapefiles gouvernementaux (zones de risque incendie
//! CAL FIRE) dans PostgreSQL/PostGIS.
//!
//! ## Features
//!
//! - Lecture en flux des shapefiles (via `shpstream`)
//! - Reprojection pur-Rust vers WGS84 depuis le sidecar `.prj`
//! - Sérialisation WKT avec filtrage des géométries dégénérées
//! - Normalisation des attributs (passthrough ou mapping figé)
//! - Insertion par lots avec pacing et reprise par dossier
//!
//! ## Usage CLI
//!
//! ```bash
//! # Charger toutes les archives décompressées sous ./data/
//! calfire-pg --path ./data/
//!
//! # Reprendre un run interrompu au dossier 12
//! calfire-pg --path ./data/ --start-from 12
//!
//! # Examiner un shapefile sans base de données
//! calfire-pg inspect --path ./data/fhszs_06001/zones.shp
//! ```

pub mod config;
pub mod loader;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod reproject;
pub mod sink;
pub mod wkt;

pub use config::PipelineConfig;
pub use report::{RunReport, RunStatus};
pub use sink::{BulkSink, SinkError};
