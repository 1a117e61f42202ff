//! Conversion des formes shapefile vers les types `geo`
//!
//! Le crate `shapefile` décode les enregistrements binaires; on reconstruit
//! ici des géométries `geo` en appliquant les conventions du format:
//! - une polyligne mono-partie devient `LineString`, multi-parties
//!   `MultiLineString`
//! - les anneaux d'un POLYGON sont regroupés par anneau extérieur; un seul
//!   polygone donne `Polygon`, plusieurs donnent `MultiPolygon`
//! - un anneau de moins de 4 points bruts est dégénéré et abandonné ici,
//!   avant que `geo::Polygon` ne synthétise la fermeture de l'anneau
//! - les variantes M/Z perdent leurs dimensions supplémentaires

use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use shapefile::{PolygonRing, Shape};
use tracing::warn;

/// Nombre minimal de points bruts d'un anneau (triangle + fermeture)
const MIN_RING_POINTS: usize = 4;

/// Convertit une forme shapefile en géométrie `geo`
///
/// Retourne `None` pour un NullShape (enregistrement sans géométrie) ou un
/// Multipatch (non représentable en 2D).
pub fn shape_to_geometry(shape: Shape) -> Option<Geometry<f64>> {
    match shape {
        Shape::NullShape => None,
        Shape::Point(p) => Some(Geometry::Point(Point::new(p.x, p.y))),
        Shape::PointM(p) => Some(Geometry::Point(Point::new(p.x, p.y))),
        Shape::PointZ(p) => Some(Geometry::Point(Point::new(p.x, p.y))),
        Shape::Polyline(pl) => {
            polyline_to_geometry(pl.into_inner(), |p| (p.x, p.y))
        }
        Shape::PolylineM(pl) => {
            polyline_to_geometry(pl.into_inner(), |p| (p.x, p.y))
        }
        Shape::PolylineZ(pl) => {
            polyline_to_geometry(pl.into_inner(), |p| (p.x, p.y))
        }
        Shape::Polygon(pg) => rings_to_geometry(pg.into_inner(), |p| (p.x, p.y)),
        Shape::PolygonM(pg) => rings_to_geometry(pg.into_inner(), |p| (p.x, p.y)),
        Shape::PolygonZ(pg) => rings_to_geometry(pg.into_inner(), |p| (p.x, p.y)),
        Shape::Multipoint(mp) => Some(Geometry::MultiPoint(MultiPoint::new(
            mp.points().iter().map(|p| Point::new(p.x, p.y)).collect(),
        ))),
        Shape::MultipointM(mp) => Some(Geometry::MultiPoint(MultiPoint::new(
            mp.points().iter().map(|p| Point::new(p.x, p.y)).collect(),
        ))),
        Shape::MultipointZ(mp) => Some(Geometry::MultiPoint(MultiPoint::new(
            mp.points().iter().map(|p| Point::new(p.x, p.y)).collect(),
        ))),
        Shape::Multipatch(_) => {
            warn!("Multipatch shape is not supported, record has no geometry");
            None
        }
    }
}

/// Construit une LineString ou MultiLineString selon le nombre de parties
fn polyline_to_geometry<P>(
    parts: Vec<Vec<P>>,
    xy: impl Fn(&P) -> (f64, f64),
) -> Option<Geometry<f64>> {
    let mut lines: Vec<LineString<f64>> = parts
        .iter()
        .map(|part| part_to_linestring(part, &xy))
        .collect();

    match lines.len() {
        0 => None,
        1 => Some(Geometry::LineString(lines.remove(0))),
        _ => Some(Geometry::MultiLineString(MultiLineString::new(lines))),
    }
}

/// Regroupe les anneaux en polygones (un Outer ouvre un polygone, les Inner
/// suivants lui sont rattachés) puis construit Polygon ou MultiPolygon
///
/// Un anneau extérieur dégénéré abandonne tout son polygone, intérieurs
/// compris; un anneau intérieur dégénéré n'abandonne que lui-même.
fn rings_to_geometry<P>(
    rings: Vec<PolygonRing<P>>,
    xy: impl Fn(&P) -> (f64, f64),
) -> Option<Geometry<f64>> {
    let mut polygons: Vec<Polygon<f64>> = Vec::new();
    let mut outer_dropped = false;

    for ring in rings {
        match ring {
            PolygonRing::Outer(points) => {
                if points.len() < MIN_RING_POINTS {
                    warn!(
                        points = points.len(),
                        "Degenerate outer ring, dropping polygon"
                    );
                    outer_dropped = true;
                    continue;
                }
                outer_dropped = false;
                polygons.push(Polygon::new(part_to_linestring(&points, &xy), vec![]));
            }
            PolygonRing::Inner(points) => {
                if points.len() < MIN_RING_POINTS {
                    warn!(
                        points = points.len(),
                        "Degenerate inner ring, dropping ring"
                    );
                    continue;
                }
                if outer_dropped {
                    // L'anneau appartient au polygone abandonné
                    continue;
                }
                match polygons.last_mut() {
                    Some(polygon) => {
                        polygon.interiors_push(part_to_linestring(&points, &xy));
                    }
                    None => {
                        // Anneau intérieur orphelin: le format l'interdit mais
                        // certains producteurs en émettent, on l'ignore
                        warn!("Inner ring without an outer ring, skipping");
                    }
                }
            }
        }
    }

    match polygons.len() {
        0 => None,
        1 => Some(Geometry::Polygon(polygons.remove(0))),
        _ => Some(Geometry::MultiPolygon(MultiPolygon::new(polygons))),
    }
}

fn part_to_linestring<P>(part: &[P], xy: &impl Fn(&P) -> (f64, f64)) -> LineString<f64> {
    LineString::new(
        part.iter()
            .map(|p| {
                let (x, y) = xy(p);
                Coord { x, y }
            })
            .collect(),
    )
}
