//! Configuration du pipeline
//!
//! Une config se charge depuis un preset embarqué (`calfire`,
//! `passthrough`) ou un fichier JSON fourni par l'utilisateur; les
//! options CLI la surchargent ensuite champ par champ.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Preset CAL FIRE: mapping figé des zones de risque incendie
const PRESET_CALFIRE: &str = include_str!("presets/calfire.json");

/// Preset générique: toutes les colonnes, noms assainis
const PRESET_PASSTHROUGH: &str = include_str!("presets/passthrough.json");

/// Configuration d'un run du pipeline
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Table cible
    pub table: String,

    /// Nombre maximal de lignes par appel au sink
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Taille du buffer d'accumulation déclenchant un flush
    #[serde(default = "default_batch_threshold")]
    pub batch_threshold: usize,

    /// Pause entre deux chunks consécutifs (millisecondes)
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,

    /// Mapping de colonnes figé; absent = passthrough
    #[serde(default)]
    pub columns: Option<Vec<FieldMapping>>,
}

/// Correspondance attribut source vers colonne cible
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FieldMapping {
    /// Nom de l'attribut dans le DBF (sensible à la casse)
    pub source: String,

    /// Nom de la colonne cible
    pub target: String,

    /// "auto" (type natif) ou "text" (coercition en texte)
    #[serde(default = "default_data_type")]
    pub data_type: String,
}

impl FieldMapping {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            data_type: default_data_type(),
        }
    }
}

fn default_chunk_size() -> usize {
    500
}

fn default_batch_threshold() -> usize {
    1000
}

fn default_pacing_ms() -> u64 {
    250
}

fn default_data_type() -> String {
    "auto".to_string()
}

impl PipelineConfig {
    /// Charge un preset embarqué par nom
    pub fn from_preset(name: &str) -> Result<Self> {
        let json = match name {
            "calfire" => PRESET_CALFIRE,
            "passthrough" => PRESET_PASSTHROUGH,
            _ => bail!("Unknown preset '{}'. Available: calfire, passthrough", name),
        };
        serde_json::from_str(json).with_context(|| format!("Invalid embedded preset '{}'", name))
    }

    /// Charge une config depuis un fichier JSON
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Résout un nom de preset ou un chemin de fichier
    pub fn resolve(name_or_path: &str) -> Result<Self> {
        if name_or_path.ends_with(".json") {
            Self::from_file(Path::new(name_or_path))
        } else {
            Self::from_preset(name_or_path)
        }
    }

    /// Pause entre chunks
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    /// Vérifie la cohérence avant de lancer un run
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            bail!("chunk_size must be at least 1");
        }
        if self.batch_threshold == 0 {
            bail!("batch_threshold must be at least 1");
        }
        if !is_safe_identifier(&self.table) {
            bail!("Invalid table name '{}'", self.table);
        }
        if let Some(columns) = &self.columns {
            for field in columns {
                if !is_safe_identifier(&field.target) {
                    bail!("Invalid target column name '{}'", field.target);
                }
                if field.data_type != "auto" && field.data_type != "text" {
                    bail!(
                        "Unknown data_type '{}' for column '{}' (expected auto or text)",
                        field.data_type,
                        field.target
                    );
                }
            }
        }
        Ok(())
    }
}

/// Identifiant SQL sûr: lettres, chiffres, `_`, un `.` optionnel pour le
/// schéma, sans quoting nécessaire
pub fn is_safe_identifier(name: &str) -> bool {
    if name.is_empty() || name.split('.').count() > 2 {
        return false;
    }
    name.split('.').all(|part| {
        !part.is_empty()
            && part.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}
