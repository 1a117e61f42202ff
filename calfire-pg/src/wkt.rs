//! Sérialisation des géométries en WKT (Well-Known Text)
//!
//! Les coordonnées sont reprojetées au fil de l'écriture: chaque sommet
//! passe par la [`Transform`] fournie avant d'être formaté. Une géométrie
//! qui ne peut pas produire un WKT valide (anneau dégénéré, type non
//! supporté, transformation hors domaine) est abandonnée avec un
//! avertissement; l'appelant saute l'enregistrement.

use geo::{Geometry, LineString, Polygon};
use tracing::warn;

use crate::reproject::Transform;

/// Nombre minimal de sommets d'un anneau fermé (triangle + fermeture)
const MIN_RING_POINTS: usize = 4;

/// Sérialise une géométrie en WKT, coordonnées transformées vers WGS84
///
/// Retourne `None` si la géométrie ne peut pas produire un WKT valide.
/// Un WKT retourné est toujours non vide. Un sommet que la transformation
/// rejette abandonne la géométrie entière; un anneau ou un polygone
/// dégénéré n'abandonne que lui-même.
pub fn geometry_to_wkt(geometry: &Geometry<f64>, transform: &Transform) -> Option<String> {
    match geometry {
        Geometry::Point(p) => {
            let (x, y) = transformed(transform, p.x(), p.y()).ok()?;
            Some(format!("POINT({} {})", x, y))
        }
        Geometry::LineString(ls) => {
            if ls.0.len() < 2 {
                warn!("LineString with fewer than 2 points, skipping geometry");
                return None;
            }
            Some(format!("LINESTRING({})", coords_text(ls, transform).ok()?))
        }
        Geometry::Polygon(polygon) => match polygon_text(polygon, transform) {
            Ok(Some(rings)) => Some(format!("POLYGON({})", rings)),
            Ok(None) | Err(TransformFailed) => None,
        },
        Geometry::MultiPolygon(mp) => {
            let mut polygons = Vec::with_capacity(mp.0.len());
            for polygon in &mp.0 {
                match polygon_text(polygon, transform) {
                    Ok(Some(rings)) => polygons.push(format!("({})", rings)),
                    Ok(None) => {}
                    Err(TransformFailed) => return None,
                }
            }
            if polygons.is_empty() {
                warn!("MultiPolygon with no valid polygon, skipping geometry");
                return None;
            }
            Some(format!("MULTIPOLYGON({})", polygons.join(", ")))
        }
        other => {
            warn!(
                "Unsupported geometry type {}, skipping geometry",
                geometry_type_name(other)
            );
            None
        }
    }
}

/// Nom affichable d'un type de géométrie
pub fn geometry_type_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// Échec de reprojection d'un sommet: la géométrie entière est abandonnée
struct TransformFailed;

fn transformed(transform: &Transform, x: f64, y: f64) -> Result<(f64, f64), TransformFailed> {
    match transform.transform_point(x, y) {
        Ok(point) => Ok(point),
        Err(e) => {
            warn!("Coordinate transform failed, skipping geometry: {:#}", e);
            Err(TransformFailed)
        }
    }
}

/// Liste de sommets `x y` séparés par des virgules
fn coords_text(line: &LineString<f64>, transform: &Transform) -> Result<String, TransformFailed> {
    let mut pairs = Vec::with_capacity(line.0.len());
    for coord in &line.0 {
        let (x, y) = transformed(transform, coord.x, coord.y)?;
        pairs.push(format!("{} {}", x, y));
    }
    Ok(pairs.join(", "))
}

/// Anneaux d'un polygone, extérieur d'abord
///
/// `Ok(None)` pour un polygone dégénéré (anneau extérieur trop court); un
/// anneau intérieur trop court est simplement ignoré.
fn polygon_text(
    polygon: &Polygon<f64>,
    transform: &Transform,
) -> Result<Option<String>, TransformFailed> {
    if polygon.exterior().0.len() < MIN_RING_POINTS {
        warn!(
            points = polygon.exterior().0.len(),
            "Degenerate exterior ring, skipping polygon"
        );
        return Ok(None);
    }

    let mut rings = Vec::with_capacity(1 + polygon.interiors().len());
    rings.push(format!("({})", coords_text(polygon.exterior(), transform)?));

    for interior in polygon.interiors() {
        if interior.0.len() < MIN_RING_POINTS {
            warn!(
                points = interior.0.len(),
                "Degenerate interior ring, dropping ring"
            );
            continue;
        }
        rings.push(format!("({})", coords_text(interior, transform)?));
    }

    Ok(Some(rings.join(", ")))
}
