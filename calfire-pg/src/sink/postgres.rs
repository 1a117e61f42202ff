//! Sink PostgreSQL
//!
//! Un lot part en un seul ordre SQL: les lignes sont sérialisées en
//! tableau JSONB et dépliées côté serveur par `jsonb_populate_recordset`
//! sur le type ligne de la table cible. PostGIS convertit la colonne
//! `geometry` depuis le WKT à l'insertion; les colonnes absentes du JSON
//! (id séquentiel, timestamps) gardent leur défaut.

use async_trait::async_trait;
use deadpool_postgres::Pool;
use serde_json::Value;
use tracing::debug;

use super::{BulkSink, SinkError};
use crate::config::is_safe_identifier;
use crate::normalize::NormalizedRecord;

pub struct PostgresSink {
    pool: Pool,
}

impl PostgresSink {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BulkSink for PostgresSink {
    async fn insert(&self, table: &str, rows: &[NormalizedRecord]) -> Result<u64, SinkError> {
        if rows.is_empty() {
            return Ok(0);
        }
        if !is_safe_identifier(table) {
            return Err(SinkError::Rejected(format!("Invalid table name '{}'", table)));
        }

        // La liste de colonnes vient des clés de la première ligne; le
        // normaliseur garantit un jeu de clés identique sur tout le run
        let first = rows[0].to_row();
        let columns: Vec<String> = match &first {
            Value::Object(map) => map.keys().cloned().collect(),
            _ => return Err(SinkError::Rejected("Row is not a JSON object".to_string())),
        };
        for column in &columns {
            if !is_safe_identifier(column) {
                return Err(SinkError::Rejected(format!("Invalid column name '{}'", column)));
            }
        }
        let column_list = columns.join(", ");

        let payload = Value::Array(rows.iter().map(|r| r.to_row()).collect());

        let sql = format!(
            "INSERT INTO {table} ({column_list}) \
             SELECT {column_list} FROM jsonb_populate_recordset(NULL::{table}, $1)"
        );
        debug!(table = table, rows = rows.len(), "Sending bulk insert");

        let client = self
            .pool
            .get()
            .await
            .map_err(|e| SinkError::Connection(e.to_string()))?;
        let inserted = client
            .execute(sql.as_str(), &[&payload])
            .await
            .map_err(|e| SinkError::Rejected(e.to_string()))?;

        Ok(inserted)
    }
}
