//! Tests d'intégration: écriture d'un vrai shapefile puis relecture en flux

use std::path::Path;

use geo::Geometry;
use shapefile::dbase::{FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, Polygon, PolygonRing};
use shpstream::PropertyValue;

fn square(offset: f64, size: f64) -> Vec<Point> {
    vec![
        Point::new(offset, offset),
        Point::new(offset, offset + size),
        Point::new(offset + size, offset + size),
        Point::new(offset + size, offset),
        Point::new(offset, offset),
    ]
}

fn write_fixture(shp_path: &Path, count: usize) {
    let table = TableWriterBuilder::new()
        .add_character_field("HAZ_CLASS".try_into().unwrap(), 50)
        .add_numeric_field("HAZ_CODE".try_into().unwrap(), 10, 0);

    let mut writer = shapefile::Writer::from_path(shp_path, table).unwrap();

    for i in 0..count {
        let polygon = Polygon::with_rings(vec![PolygonRing::Outer(square(i as f64 * 10.0, 1.0))]);

        let mut record = Record::default();
        let class = if i % 2 == 0 {
            FieldValue::Character(Some("Moderate".to_string()))
        } else {
            // Valeur absente: doit ressortir en Null explicite
            FieldValue::Character(None)
        };
        record.insert("HAZ_CLASS".to_string(), class);
        record.insert("HAZ_CODE".to_string(), FieldValue::Numeric(Some(i as f64)));

        writer.write_shape_and_record(&polygon, &record).unwrap();
    }
}

#[test]
fn test_read_written_shapefile() {
    let dir = tempfile::tempdir().unwrap();
    let shp_path = dir.path().join("zones.shp");
    write_fixture(&shp_path, 5);

    let mut reader = shpstream::open(&shp_path).unwrap();
    let features: Vec<_> = reader
        .features()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    assert_eq!(features.len(), 5);
    assert_eq!(reader.records_read(), 5);

    for (i, feature) in features.iter().enumerate() {
        match &feature.geometry {
            Some(Geometry::Polygon(p)) => assert_eq!(p.exterior().0.len(), 5),
            other => panic!("Expected Polygon, got {:?}", other),
        }

        // Clés triées, jeu de clés stable sur tous les enregistrements
        let keys: Vec<&str> = feature.properties.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["HAZ_CLASS", "HAZ_CODE"]);

        assert_eq!(
            feature.property("HAZ_CODE"),
            Some(&PropertyValue::Real(i as f64))
        );
        if i % 2 == 0 {
            assert_eq!(
                feature.property("HAZ_CLASS"),
                Some(&PropertyValue::Text("Moderate".to_string()))
            );
        } else {
            assert_eq!(feature.property("HAZ_CLASS"), Some(&PropertyValue::Null));
        }
    }
}

#[test]
fn test_reopen_reads_from_start() {
    let dir = tempfile::tempdir().unwrap();
    let shp_path = dir.path().join("zones.shp");
    write_fixture(&shp_path, 3);

    let mut first = shpstream::open(&shp_path).unwrap();
    assert_eq!(first.features().count(), 3);

    // Non redémarrable: il faut rouvrir pour relire
    let mut second = shpstream::open(&shp_path).unwrap();
    assert_eq!(second.features().count(), 3);
}

#[test]
fn test_open_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = shpstream::open(&dir.path().join("absent.shp"));
    assert!(result.is_err());
}

#[test]
fn test_read_projection_sidecar() {
    let dir = tempfile::tempdir().unwrap();
    let shp_path = dir.path().join("zones.shp");
    write_fixture(&shp_path, 1);

    // Pas de .prj: None
    assert_eq!(shpstream::read_projection(&shp_path).unwrap(), None);

    std::fs::write(
        dir.path().join("zones.prj"),
        "PROJCS[\"WGS_1984_Web_Mercator_Auxiliary_Sphere\"]\n",
    )
    .unwrap();

    let projection = shpstream::read_projection(&shp_path).unwrap().unwrap();
    assert!(projection.starts_with("PROJCS["));
    // Espaces et fin de ligne retirés
    assert!(!projection.ends_with('\n'));
}
