//! Types d'erreurs pour le crate shpstream

use thiserror::Error;

/// Erreurs pouvant survenir lors de la lecture d'un shapefile
#[derive(Debug, Error)]
pub enum ShpError {
    /// Erreur d'I/O lors de la lecture des fichiers
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fichier .shp ou .dbf corrompu ou format invalide
    #[error("Invalid shapefile {file}: {reason}")]
    Format { file: String, reason: String },

    /// Enregistrement illisible au milieu du flux
    #[error("Unreadable record {index}: {reason}")]
    Record { index: usize, reason: String },
}

impl ShpError {
    /// Crée une erreur de format avec le chemin du fichier en contexte
    pub fn format(file: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Format {
            file: file.into(),
            reason: reason.to_string(),
        }
    }

    /// Crée une erreur d'enregistrement (index 1-based)
    pub fn record(index: usize, reason: impl std::fmt::Display) -> Self {
        Self::Record {
            index,
            reason: reason.to_string(),
        }
    }
}
