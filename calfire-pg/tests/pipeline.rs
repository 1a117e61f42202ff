//! Tests d'intégration du pipeline complet: arborescence de shapefiles
//! générée sur disque, sink factice en mémoire

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use calfire_pg::config::PipelineConfig;
use calfire_pg::normalize::NormalizedRecord;
use calfire_pg::pipeline;
use calfire_pg::report::RunStatus;
use calfire_pg::sink::{BulkSink, SinkError};
use shapefile::dbase::{FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, Polygon, PolygonRing};

/// Sink factice: enregistre chaque appel, peut simuler des rejets
struct MockSink {
    calls: Mutex<Vec<Vec<NormalizedRecord>>>,
    fail: bool,
}

impl MockSink {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn chunk_sizes(&self) -> Vec<usize> {
        self.calls.lock().unwrap().iter().map(|c| c.len()).collect()
    }

    fn rows(&self) -> Vec<NormalizedRecord> {
        self.calls.lock().unwrap().iter().flatten().cloned().collect()
    }
}

#[async_trait]
impl BulkSink for MockSink {
    async fn insert(&self, _table: &str, rows: &[NormalizedRecord]) -> Result<u64, SinkError> {
        self.calls.lock().unwrap().push(rows.to_vec());
        if self.fail {
            Err(SinkError::Rejected("simulated rejection".to_string()))
        } else {
            Ok(rows.len() as u64)
        }
    }
}

fn square(offset: f64) -> Vec<Point> {
    vec![
        Point::new(offset, offset),
        Point::new(offset, offset + 1.0),
        Point::new(offset + 1.0, offset + 1.0),
        Point::new(offset + 1.0, offset),
        Point::new(offset, offset),
    ]
}

/// Écrit un shapefile de `count` polygones avec un attribut HAZ_CODE
fn write_shapefile(path: &Path, count: usize) {
    let table = TableWriterBuilder::new()
        .add_character_field("HAZ_CLASS".try_into().unwrap(), 50)
        .add_numeric_field("HAZ_CODE".try_into().unwrap(), 10, 0);
    let mut writer = shapefile::Writer::from_path(path, table).unwrap();

    for i in 0..count {
        let polygon = Polygon::with_rings(vec![PolygonRing::Outer(square(i as f64))]);
        let mut record = Record::default();
        record.insert(
            "HAZ_CLASS".to_string(),
            FieldValue::Character(Some("High".to_string())),
        );
        record.insert("HAZ_CODE".to_string(), FieldValue::Numeric(Some(i as f64)));
        writer.write_shape_and_record(&polygon, &record).unwrap();
    }
}

fn passthrough_config(chunk_size: usize, batch_threshold: usize) -> PipelineConfig {
    let mut config = PipelineConfig::from_preset("passthrough").unwrap();
    config.chunk_size = chunk_size;
    config.batch_threshold = batch_threshold;
    config.pacing_ms = 0;
    config
}

#[tokio::test]
async fn test_full_run_counts_and_provenance() {
    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir(root.path().join("fhszs_06001")).unwrap();
    std::fs::create_dir(root.path().join("fhszs_06003")).unwrap();
    std::fs::create_dir(root.path().join("fhszs_06005")).unwrap();
    write_shapefile(&root.path().join("fhszs_06001/zones.shp"), 3);
    write_shapefile(&root.path().join("fhszs_06003/zones.shp"), 2);
    // fhszs_06005 reste vide

    let sink = MockSink::new();
    let config = passthrough_config(10, 10);
    let report = pipeline::run(root.path(), &config, &sink, 0).await.unwrap();

    assert_eq!(report.folders_seen, 3);
    assert_eq!(report.folders_processed, 3);
    assert_eq!(report.folders_skipped_empty, 1);
    assert_eq!(report.files_processed, 2);
    assert_eq!(report.files_failed, 0);
    assert_eq!(report.records_read, 5);
    assert_eq!(report.records_skipped, 0);
    assert_eq!(report.load.inserted, 5);
    assert_eq!(report.status, RunStatus::Success);

    let rows = sink.rows();
    assert_eq!(rows.len(), 5);
    // Provenance et colonnes normalisées
    assert_eq!(rows[0].source_folder, "fhszs_06001");
    assert_eq!(rows[0].source_file, "zones.shp");
    assert!(rows[0].columns.contains_key("haz_class"));
    assert!(rows[0].geometry.starts_with("POLYGON(("));
    // Les dossiers sont traités par ordre de nom
    assert_eq!(rows[4].source_folder, "fhszs_06003");
}

#[tokio::test]
async fn test_buffer_flushes_at_threshold() {
    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir(root.path().join("zone_a")).unwrap();
    write_shapefile(&root.path().join("zone_a/zones.shp"), 2500);

    let sink = MockSink::new();
    let config = passthrough_config(1000, 1000);
    let report = pipeline::run(root.path(), &config, &sink, 0).await.unwrap();

    // Deux flushs pleins pendant la lecture, le reliquat à la fin
    assert_eq!(sink.chunk_sizes(), vec![1000, 1000, 500]);
    assert_eq!(report.load.attempted, 2500);
    assert_eq!(report.load.inserted, 2500);
}

#[tokio::test]
async fn test_chunks_never_exceed_chunk_size() {
    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir(root.path().join("zone_a")).unwrap();
    write_shapefile(&root.path().join("zone_a/zones.shp"), 25);

    let sink = MockSink::new();
    let config = passthrough_config(4, 10);
    pipeline::run(root.path(), &config, &sink, 0).await.unwrap();

    let sizes = sink.chunk_sizes();
    assert!(!sizes.is_empty());
    assert!(sizes.iter().all(|&s| s <= 4), "sizes={:?}", sizes);
    assert_eq!(sizes.iter().sum::<usize>(), 25);
}

#[tokio::test]
async fn test_resume_skips_processed_folders() {
    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir(root.path().join("a_zone")).unwrap();
    std::fs::create_dir(root.path().join("b_zone")).unwrap();
    write_shapefile(&root.path().join("a_zone/zones.shp"), 3);
    write_shapefile(&root.path().join("b_zone/zones.shp"), 2);

    let sink = MockSink::new();
    let config = passthrough_config(10, 10);
    let report = pipeline::run(root.path(), &config, &sink, 1).await.unwrap();

    assert_eq!(report.folders_seen, 2);
    assert_eq!(report.folders_processed, 1);
    assert_eq!(report.records_read, 2);

    let rows = sink.rows();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.source_folder == "b_zone"));
}

#[tokio::test]
async fn test_start_from_past_the_end_does_nothing() {
    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir(root.path().join("a_zone")).unwrap();
    write_shapefile(&root.path().join("a_zone/zones.shp"), 3);

    let sink = MockSink::new();
    let config = passthrough_config(10, 10);
    let report = pipeline::run(root.path(), &config, &sink, 5).await.unwrap();

    assert_eq!(report.records_read, 0);
    assert!(sink.chunk_sizes().is_empty());
    assert_eq!(report.status, RunStatus::Success);
}

#[tokio::test]
async fn test_rejected_chunks_do_not_abort_run() {
    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir(root.path().join("a_zone")).unwrap();
    write_shapefile(&root.path().join("a_zone/zones.shp"), 7);

    let sink = MockSink::failing();
    let config = passthrough_config(3, 10);
    let report = pipeline::run(root.path(), &config, &sink, 0).await.unwrap();

    // Tous les chunks tentés une seule fois, tous en échec
    assert_eq!(sink.chunk_sizes(), vec![3, 3, 1]);
    assert_eq!(report.load.attempted, 7);
    assert_eq!(report.load.inserted, 0);
    assert_eq!(report.load.failed, 7);
    assert_eq!(report.status, RunStatus::Failed);
}

#[tokio::test]
async fn test_unreadable_shapefile_does_not_abort_run() {
    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir(root.path().join("a_zone")).unwrap();
    std::fs::create_dir(root.path().join("b_zone")).unwrap();
    // Un .shp tronqué qui ne peut pas s'ouvrir
    std::fs::write(root.path().join("a_zone/broken.shp"), b"not a shapefile").unwrap();
    write_shapefile(&root.path().join("b_zone/zones.shp"), 2);

    let sink = MockSink::new();
    let config = passthrough_config(10, 10);
    let report = pipeline::run(root.path(), &config, &sink, 0).await.unwrap();

    assert_eq!(report.files_failed, 1);
    assert_eq!(report.files_processed, 1);
    assert_eq!(report.load.inserted, 2);
    assert_eq!(report.status, RunStatus::PartialSuccess);
}

#[tokio::test]
async fn test_missing_root_is_fatal() {
    let root = tempfile::tempdir().unwrap();
    let sink = MockSink::new();
    let config = passthrough_config(10, 10);

    let result = pipeline::run(&root.path().join("absent"), &config, &sink, 0).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_mapped_columns_are_stable() {
    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir(root.path().join("a_zone")).unwrap();
    write_shapefile(&root.path().join("a_zone/zones.shp"), 2);

    let sink = MockSink::new();
    let mut config = PipelineConfig::from_preset("calfire").unwrap();
    config.pacing_ms = 0;
    let report = pipeline::run(root.path(), &config, &sink, 0).await.unwrap();

    assert_eq!(report.load.inserted, 2);
    let rows = sink.rows();
    for row in &rows {
        // Le mapping figé produit le même jeu de colonnes partout, les
        // attributs absents du DBF donnent NULL
        assert_eq!(row.columns.len(), 11);
        assert_eq!(row.columns["haz_class"], serde_json::json!("High"));
        assert_eq!(row.columns["sra"], serde_json::Value::Null);
    }
}
