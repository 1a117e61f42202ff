//! # shpstream
//!
//! Lecture en flux des shapefiles ESRI (.shp + .dbf + .prj).
//!
//! ## Features
//!
//! - Décodage binaire délégué au crate `shapefile`
//! - Flux paresseux de [`RawFeature`] (géométrie `geo` + attributs scalaires)
//! - Lecture du sidecar `.prj` (définition de projection en texte brut)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::path::Path;
//!
//! let mut reader = shpstream::open(Path::new("zones.shp"))?;
//! let projection = shpstream::read_projection(Path::new("zones.shp"))?;
//!
//! for feature in reader.features() {
//!     let feature = feature?;
//!     println!("{} attributes", feature.properties.len());
//! }
//! ```

pub mod convert;
pub mod error;
pub mod reader;
pub mod types;

pub use error::ShpError;
pub use reader::FeatureReader;
pub use types::{PropertyValue, RawFeature};

use std::path::Path;

/// Ouvre un shapefile pour lecture en flux
///
/// # Errors
///
/// Retourne `ShpError` si le .shp ou le .dbf est absent ou corrompu.
pub fn open(path: &Path) -> Result<FeatureReader, ShpError> {
    FeatureReader::open(path)
}

/// Lit la définition de projection du sidecar `.prj` s'il existe
///
/// Le contenu est retourné tel quel (texte brut, espaces en bord retirés);
/// `None` si le fichier est absent ou vide. L'interprétation de la
/// définition est laissée à l'appelant.
///
/// # Errors
///
/// Retourne `ShpError::Io` si le fichier existe mais est illisible.
pub fn read_projection(shp_path: &Path) -> Result<Option<String>, ShpError> {
    let prj_path = shp_path.with_extension("prj");
    if !prj_path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&prj_path)?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}
