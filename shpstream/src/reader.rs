//! Lecture en flux d'un shapefile (.shp + .dbf)

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::convert::shape_to_geometry;
use crate::types::{PropertyValue, RawFeature};
use crate::ShpError;

/// Lecteur d'un shapefile ouvert
///
/// Produit une séquence paresseuse, finie et non redémarrable de
/// [`RawFeature`]: rouvrir le même chemin relit depuis le début. Le nombre
/// d'enregistrements déjà lus est exposé via [`records_read`].
///
/// [`records_read`]: FeatureReader::records_read
pub struct FeatureReader {
    inner: shapefile::Reader<BufReader<File>, BufReader<File>>,
    path: PathBuf,
    records_read: usize,
}

impl FeatureReader {
    /// Ouvre le couple .shp/.dbf au chemin donné
    ///
    /// # Errors
    ///
    /// Retourne `ShpError::Format` si l'un des deux fichiers est absent,
    /// illisible ou si son en-tête est invalide.
    pub fn open(path: &Path) -> Result<Self, ShpError> {
        let inner = shapefile::Reader::from_path(path)
            .map_err(|e| ShpError::format(path.display().to_string(), e))?;

        Ok(Self {
            inner,
            path: path.to_path_buf(),
            records_read: 0,
        })
    }

    /// Chemin du fichier .shp ouvert
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Nombre d'enregistrements lus jusqu'ici (diagnostic)
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// Itère sur les enregistrements restants du fichier
    ///
    /// Chaque élément est lu à la demande depuis le disque; une erreur de
    /// décodage au milieu du flux est rapportée avec l'index (1-based) de
    /// l'enregistrement fautif.
    pub fn features(&mut self) -> impl Iterator<Item = Result<RawFeature, ShpError>> + '_ {
        let Self {
            inner,
            records_read,
            ..
        } = self;

        inner.iter_shapes_and_records().map(move |item| {
            *records_read += 1;
            let index = *records_read;

            let (shape, record) = item.map_err(|e| ShpError::record(index, e))?;

            let mut properties: Vec<(String, PropertyValue)> = record
                .into_iter()
                .map(|(name, value)| (name, PropertyValue::from(value)))
                .collect();
            // Ordre stable: le DBF ne garantit pas l'ordre d'itération
            properties.sort_by(|(a, _), (b, _)| a.cmp(b));

            Ok(RawFeature {
                geometry: shape_to_geometry(shape),
                properties,
            })
        })
    }
}
