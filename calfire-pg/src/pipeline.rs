//! Orchestration du pipeline
//!
//! Parcourt les dossiers d'archives décompressées, lit chaque shapefile en
//! flux, reprojette et sérialise les géométries, normalise les attributs
//! puis accumule les enregistrements dans un buffer vidé par lots vers le
//! sink. Un fichier illisible ou un lot rejeté n'arrête jamais le run.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::loader;
use crate::normalize::{self, NormalizedRecord};
use crate::report::RunReport;
use crate::reproject;
use crate::sink::BulkSink;
use crate::wkt;

/// Exécute le pipeline complet sur l'arborescence `root`
///
/// Les dossiers sont parcourus par ordre de nom croissant, stable d'un
/// run à l'autre; `start_from` en saute un préfixe pour reprendre un run
/// interrompu. Seules les préconditions (racine absente, config
/// incohérente) sont fatales.
pub async fn run(
    root: &Path,
    config: &PipelineConfig,
    sink: &dyn BulkSink,
    start_from: usize,
) -> Result<RunReport> {
    config.validate()?;
    if !root.is_dir() {
        bail!("Input directory {} not found", root.display());
    }

    let folders = list_folders(root)?;
    let started = Instant::now();
    let mut report = RunReport::new(&config.table);
    report.folders_seen = folders.len();

    info!(
        folders = folders.len(),
        start_from = start_from,
        table = %config.table,
        "Starting load"
    );
    if start_from > 0 {
        info!(skipped = start_from.min(folders.len()), "Resuming, skipping already processed folders");
    }
    if start_from >= folders.len() && !folders.is_empty() {
        warn!(
            folders = folders.len(),
            start_from = start_from,
            "start_from is past the last folder, nothing to process"
        );
    }

    let mut buffer: Vec<NormalizedRecord> = Vec::new();

    for (index, folder) in folders.iter().enumerate().skip(start_from) {
        let folder_name = folder
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        info!(
            folder = %folder_name,
            index = index + 1,
            total = folders.len(),
            "Processing folder"
        );

        let shapefiles = match list_shapefiles(folder) {
            Ok(files) => files,
            Err(e) => {
                warn!(folder = %folder_name, error = %format!("{:#}", e), "Cannot list folder, skipping");
                report.folders_processed += 1;
                report.files_failed += 1;
                continue;
            }
        };
        if shapefiles.is_empty() {
            info!(folder = %folder_name, "No shapefile in folder, skipping");
            report.folders_skipped_empty += 1;
            report.folders_processed += 1;
            continue;
        }

        for shp in &shapefiles {
            match process_shapefile(shp, &folder_name, config, sink, &mut buffer, &mut report)
                .await
            {
                Ok(produced) => {
                    report.files_processed += 1;
                    info!(
                        file = %shp.display(),
                        records = produced,
                        "Shapefile processed"
                    );
                }
                Err(e) => {
                    report.files_failed += 1;
                    warn!(
                        file = %shp.display(),
                        error = %format!("{:#}", e),
                        "Failed to process shapefile, continuing"
                    );
                }
            }
        }

        report.folders_processed += 1;
        info!(
            folder = %folder_name,
            buffered = buffer.len(),
            inserted = report.load.inserted,
            "Folder done"
        );
    }

    // Reliquat sous le seuil
    flush(&mut buffer, sink, config, &mut report).await;

    report.set_duration(started.elapsed());
    report.finalize();
    Ok(report)
}

/// Lit un shapefile et pousse ses enregistrements dans le buffer
///
/// Le buffer est vidé vers le sink dès qu'il atteint le seuil, y compris
/// au milieu d'un fichier. Retourne le nombre d'enregistrements produits.
async fn process_shapefile(
    shp: &Path,
    folder_name: &str,
    config: &PipelineConfig,
    sink: &dyn BulkSink,
    buffer: &mut Vec<NormalizedRecord>,
    report: &mut RunReport,
) -> Result<usize> {
    let definition = match shpstream::read_projection(shp) {
        Ok(definition) => definition,
        Err(e) => {
            warn!(file = %shp.display(), error = %e, "Cannot read .prj sidecar, assuming WGS84");
            None
        }
    };
    let transform = reproject::resolve(definition.as_deref());
    if !transform.is_identity() {
        info!(file = %shp.display(), projection = transform.name(), "Reprojecting");
    }

    let mut reader = shpstream::open(shp)
        .with_context(|| format!("Cannot open shapefile {}", shp.display()))?;
    let source_file = shp
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut read = 0usize;
    let mut skipped = 0usize;
    let mut produced = 0usize;

    // Lecture par tranches: on relâche l'emprunt du lecteur avant chaque
    // flush pour ne jamais retenir plus de batch_threshold enregistrements
    loop {
        let mut end_of_file = false;
        {
            let mut features = reader.features();
            while buffer.len() < config.batch_threshold {
                let feature = match features.next() {
                    Some(Ok(feature)) => feature,
                    Some(Err(e)) => {
                        // Flux probablement désynchronisé, on garde ce qui
                        // a déjà été lu
                        warn!(file = %shp.display(), error = %e, "Unreadable record, stopping file");
                        end_of_file = true;
                        break;
                    }
                    None => {
                        end_of_file = true;
                        break;
                    }
                };
                read += 1;

                let Some(geometry) = feature.geometry else {
                    warn!(record = read, "Record has no geometry, skipping");
                    skipped += 1;
                    continue;
                };
                let Some(geometry_wkt) = wkt::geometry_to_wkt(&geometry, &transform) else {
                    // Le sérialiseur a déjà loggé la cause
                    skipped += 1;
                    continue;
                };

                let columns = match &config.columns {
                    Some(mapping) => normalize::apply_mapping(&feature.properties, mapping),
                    None => normalize::normalize_properties(&feature.properties),
                };

                buffer.push(NormalizedRecord {
                    columns,
                    geometry: geometry_wkt,
                    source_folder: folder_name.to_string(),
                    source_file: source_file.clone(),
                });
                produced += 1;
            }
        }

        if buffer.len() >= config.batch_threshold {
            flush(buffer, sink, config, report).await;
        }
        if end_of_file {
            break;
        }
    }

    report.records_read += read;
    report.records_skipped += skipped;
    Ok(produced)
}

/// Vide le buffer vers le sink
async fn flush(
    buffer: &mut Vec<NormalizedRecord>,
    sink: &dyn BulkSink,
    config: &PipelineConfig,
    report: &mut RunReport,
) {
    if buffer.is_empty() {
        return;
    }
    let records = std::mem::take(buffer);
    let result = loader::load(
        sink,
        &config.table,
        records,
        config.chunk_size,
        config.pacing(),
    )
    .await;
    report.load.merge(result);
}

/// Sous-dossiers directs de la racine, triés par nom
fn list_folders(root: &Path) -> Result<Vec<PathBuf>> {
    let mut folders: Vec<PathBuf> = std::fs::read_dir(root)
        .with_context(|| format!("Cannot read directory {}", root.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    folders.sort();
    Ok(folders)
}

/// Fichiers .shp directement dans le dossier (pas de récursion), triés
fn list_shapefiles(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(folder)
        .with_context(|| format!("Cannot read directory {}", folder.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("shp"))
        })
        .collect();
    files.sort();
    Ok(files)
}
