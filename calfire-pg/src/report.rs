//! Rapport de fin de run
//!
//! Collecte les compteurs du pipeline (dossiers, fichiers,
//! enregistrements, insertions) et les affiche ou les sauvegarde en JSON.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

use crate::loader::LoadResult;

/// Statut global du run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    /// Tout a été inséré
    Success,
    /// Des enregistrements ou des chunks ont été perdus en route
    PartialSuccess,
    /// Rien n'a été inséré
    Failed,
}

/// Rapport complet d'un run du pipeline
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Table cible
    pub table: String,
    /// Durée du run
    pub duration_secs: f64,
    /// Statut global
    pub status: RunStatus,

    // Compteurs dossiers/fichiers
    /// Dossiers présents sous la racine
    pub folders_seen: usize,
    /// Dossiers traités (reprise comprise)
    pub folders_processed: usize,
    /// Dossiers sans shapefile
    pub folders_skipped_empty: usize,
    /// Shapefiles lus avec succès
    pub files_processed: usize,
    /// Shapefiles abandonnés sur erreur
    pub files_failed: usize,

    // Compteurs enregistrements
    /// Enregistrements lus dans les shapefiles
    pub records_read: usize,
    /// Enregistrements sans géométrie exploitable
    pub records_skipped: usize,

    /// Comptes d'insertion agrégés
    pub load: LoadResult,
}

impl Default for RunReport {
    fn default() -> Self {
        Self {
            table: String::new(),
            duration_secs: 0.0,
            status: RunStatus::Success,
            folders_seen: 0,
            folders_processed: 0,
            folders_skipped_empty: 0,
            files_processed: 0,
            files_failed: 0,
            records_read: 0,
            records_skipped: 0,
            load: LoadResult::default(),
        }
    }
}

impl RunReport {
    /// Crée un rapport pour une table cible
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            ..Default::default()
        }
    }

    /// Définit la durée du run
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Détermine le statut final d'après les compteurs
    pub fn finalize(&mut self) {
        let lost = self.load.failed > 0 || self.records_skipped > 0 || self.files_failed > 0;

        self.status = if self.load.inserted > 0 && !lost {
            RunStatus::Success
        } else if self.load.inserted > 0 {
            RunStatus::PartialSuccess
        } else if self.load.attempted == 0 && !lost {
            // Rien à charger n'est pas un échec (dossiers vides, reprise
            // au-delà du dernier dossier)
            RunStatus::Success
        } else {
            RunStatus::Failed
        };
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("LOAD REPORT - table {}", self.table);
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);

        println!("\n--- FOLDERS ---");
        println!(
            "{} seen, {} processed, {} without shapefile",
            self.folders_seen, self.folders_processed, self.folders_skipped_empty
        );

        println!("\n--- FILES ---");
        println!("{} processed, {} failed", self.files_processed, self.files_failed);

        println!("\n--- RECORDS ---");
        println!(
            "{} read, {} skipped (no usable geometry)",
            self.records_read, self.records_skipped
        );

        println!("\n--- INSERTS ---");
        println!(
            "{} attempted, {} inserted, {} failed ({:.1}% success)",
            self.load.attempted,
            self.load.inserted,
            self.load.failed,
            self.load.success_rate()
        );

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour les logs
    pub fn summary(&self) -> String {
        format!(
            "{}: {} read, {} inserted, {} failed, {} skipped",
            self.table,
            self.records_read,
            self.load.inserted,
            self.load.failed,
            self.records_skipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status() {
        let report = RunReport::default();
        assert_eq!(report.status, RunStatus::Success);
        assert_eq!(report.records_read, 0);
    }

    #[test]
    fn test_finalize_success() {
        let mut report = RunReport::new("calfire_zone_risk");
        report.records_read = 100;
        report.load = LoadResult {
            attempted: 100,
            inserted: 100,
            failed: 0,
        };
        report.finalize();
        assert_eq!(report.status, RunStatus::Success);
    }

    #[test]
    fn test_finalize_partial() {
        let mut report = RunReport::new("calfire_zone_risk");
        report.load = LoadResult {
            attempted: 100,
            inserted: 80,
            failed: 20,
        };
        report.finalize();
        assert_eq!(report.status, RunStatus::PartialSuccess);
    }

    #[test]
    fn test_finalize_failed() {
        let mut report = RunReport::new("calfire_zone_risk");
        report.load = LoadResult {
            attempted: 100,
            inserted: 0,
            failed: 100,
        };
        report.finalize();
        assert_eq!(report.status, RunStatus::Failed);
    }

    #[test]
    fn test_finalize_nothing_to_do_is_success() {
        let mut report = RunReport::new("calfire_zone_risk");
        report.folders_seen = 3;
        report.folders_skipped_empty = 3;
        report.folders_processed = 3;
        report.finalize();
        assert_eq!(report.status, RunStatus::Success);
    }

    #[test]
    fn test_summary() {
        let mut report = RunReport::new("calfire_zone_risk");
        report.records_read = 120;
        report.load.inserted = 118;
        let summary = report.summary();
        assert!(summary.contains("calfire_zone_risk"));
        assert!(summary.contains("118 inserted"));
    }
}
