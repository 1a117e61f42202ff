//! Chargement par lots vers le sink
//!
//! Découpe une séquence d'enregistrements en chunks, un ordre d'insertion
//! par chunk. Un chunk rejeté est compté en échec dans son intégralité et
//! n'est jamais retenté; le chargement continue avec le chunk suivant.
//! Une pause fixe sépare deux chunks consécutifs pour borner le débit
//! vers la base hébergée.

use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::normalize::NormalizedRecord;
use crate::sink::BulkSink;

/// Comptes agrégés d'un chargement
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LoadResult {
    /// Lignes soumises au sink
    pub attempted: usize,
    /// Lignes confirmées insérées
    pub inserted: usize,
    /// Lignes des chunks rejetés
    pub failed: usize,
}

impl LoadResult {
    pub fn merge(&mut self, other: LoadResult) {
        self.attempted += other.attempted;
        self.inserted += other.inserted;
        self.failed += other.failed;
    }

    /// Taux de réussite en pourcentage (100 si rien n'a été soumis)
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            100.0
        } else {
            self.inserted as f64 / self.attempted as f64 * 100.0
        }
    }
}

/// Charge `records` dans `table` par chunks d'au plus `chunk_size` lignes
pub async fn load(
    sink: &dyn BulkSink,
    table: &str,
    records: Vec<NormalizedRecord>,
    chunk_size: usize,
    pacing: Duration,
) -> LoadResult {
    let chunk_size = chunk_size.max(1);
    let total = records.len();
    let chunk_count = total.div_ceil(chunk_size);
    let mut result = LoadResult::default();

    info!(records = total, chunks = chunk_count, table = table, "Loading batch");

    for (index, chunk) in records.chunks(chunk_size).enumerate() {
        result.attempted += chunk.len();

        match sink.insert(table, chunk).await {
            Ok(inserted) => {
                let inserted = inserted as usize;
                result.inserted += inserted;
                // Un sink peut confirmer moins de lignes que soumises
                if inserted < chunk.len() {
                    result.failed += chunk.len() - inserted;
                }
                info!(
                    chunk = index + 1,
                    of = chunk_count,
                    rows = chunk.len(),
                    "Chunk inserted"
                );
            }
            Err(e) => {
                result.failed += chunk.len();
                warn!(
                    chunk = index + 1,
                    of = chunk_count,
                    rows = chunk.len(),
                    error = %e,
                    "Chunk rejected, continuing with next chunk"
                );
            }
        }

        // Pas de pause après le dernier chunk
        if index + 1 < chunk_count && !pacing.is_zero() {
            tokio::time::sleep(pacing).await;
        }
    }

    info!(
        inserted = result.inserted,
        failed = result.failed,
        "Batch finished"
    );
    result
}
