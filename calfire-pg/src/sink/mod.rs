//! Écriture vers le magasin externe
//!
//! Le pipeline ne connaît que le trait [`BulkSink`]: l'implémentation
//! PostgreSQL est la seule fournie, les tests en injectent une factice.

pub mod pool;
pub mod postgres;

pub use pool::{create_pool, test_connection, DatabaseConfig, SslMode};
pub use postgres::PostgresSink;

use async_trait::async_trait;
use thiserror::Error;

use crate::normalize::NormalizedRecord;

/// Erreur d'insertion en masse
#[derive(Debug, Error)]
pub enum SinkError {
    /// Le serveur a rejeté le lot (contrainte, type, table absente)
    #[error("Bulk insert rejected: {0}")]
    Rejected(String),

    /// Impossible d'obtenir ou d'utiliser une connexion
    #[error("Connection failure: {0}")]
    Connection(String),
}

/// Unique chemin d'écriture du pipeline vers le magasin externe
///
/// Une implémentation reçoit au plus `chunk_size` lignes par appel.
/// Aucune atomicité n'est garantie entre appels: un lot rejeté laisse
/// les lots précédents en place.
#[async_trait]
pub trait BulkSink: Send + Sync {
    /// Insère `rows` dans `table`, retourne le nombre de lignes insérées
    async fn insert(&self, table: &str, rows: &[NormalizedRecord]) -> Result<u64, SinkError>;
}
