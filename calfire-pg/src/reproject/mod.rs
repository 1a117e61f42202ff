//! Reprojection vers WGS84 en Rust pur (sans dépendances externes)
//!
//! Compile la définition ESRI WKT d'un sidecar `.prj` en transformation
//! inverse vers coordonnées géographiques (EPSG:4326).
//!
//! Projections supportées :
//! - Albers Equal Area Conic (California Teale Albers, EPSG:3310)
//! - Lambert Conformal Conic 2SP (State Plane Californie, EPSG:2225-2229)
//! - Transverse Mercator (UTM 10N/11N, EPSG:26910/26911, 32610/32611)
//! - Web Mercator (EPSG:3857)
//!
//! Une définition absente, déjà géographique ou incompréhensible donne la
//! transformation identité: les coordonnées passent telles quelles, avec
//! un avertissement dans le second cas.

mod albers;
mod ellipsoid;
mod lambert;
mod mercator;
mod prj;
mod tmerc;

pub use ellipsoid::{Ellipsoid, GRS80, WGS84};

use anyhow::{bail, Result};
use tracing::warn;

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Transformation d'un couple (x, y) source vers (lon, lat) en degrés
#[derive(Debug)]
pub enum Transform {
    /// Les coordonnées sont déjà géographiques, aucune conversion
    Identity,
    /// Inversion d'une projection compilée depuis le `.prj`
    Projected(ProjectedCrs),
}

impl Transform {
    /// Transforme un point source vers (longitude, latitude) WGS84
    ///
    /// Note: le décalage NAD83/WGS84 (< 2 m) est ignoré.
    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        match self {
            Transform::Identity => Ok((x, y)),
            Transform::Projected(crs) => crs.transform_point(x, y),
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Transform::Identity)
    }

    /// Nom affichable de la transformation (diagnostic)
    pub fn name(&self) -> &str {
        match self {
            Transform::Identity => "identity",
            Transform::Projected(crs) => &crs.name,
        }
    }
}

/// Système de coordonnées projeté compilé
#[derive(Debug)]
pub struct ProjectedCrs {
    name: String,
    kind: ProjectionKind,
    ellipsoid: Ellipsoid,
    to_meters: f64,
}

#[derive(Debug)]
enum ProjectionKind {
    Albers(albers::AlbersParams),
    Lambert(lambert::LambertParams),
    TransverseMercator(tmerc::TmercParams),
    WebMercator,
}

impl ProjectedCrs {
    fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        // Coordonnées et false origin sont dans l'unité du PROJCS; tout est
        // ramené en mètres (les false origins l'ont été à la compilation)
        let x = x * self.to_meters;
        let y = y * self.to_meters;

        let geo = match &self.kind {
            ProjectionKind::Albers(p) => albers::albers_to_geographic(x, y, p, self.ellipsoid)?,
            ProjectionKind::Lambert(p) => lambert::lambert_to_geographic(x, y, p, self.ellipsoid)?,
            ProjectionKind::TransverseMercator(p) => {
                tmerc::tmerc_to_geographic(x, y, p, self.ellipsoid)?
            }
            ProjectionKind::WebMercator => mercator::web_mercator_to_geographic(x, y)?,
        };

        let (lon, lat) = geo.to_degrees();
        if !lon.is_finite() || !lat.is_finite() {
            bail!("Coordinate ({}, {}) is outside the domain of {}", x, y, self.name);
        }
        Ok((lon, lat))
    }
}

/// Résout une définition de projection en transformation
///
/// `None`, une définition vide ou le littéral `EPSG:4326` donnent
/// l'identité. Une définition présente mais incompréhensible donne aussi
/// l'identité, avec un avertissement: le chargement continue avec les
/// coordonnées source telles quelles plutôt que d'abandonner l'archive.
pub fn resolve(definition: Option<&str>) -> Transform {
    let Some(def) = definition else {
        return Transform::Identity;
    };
    let def = def.trim();
    if def.is_empty() || def.eq_ignore_ascii_case("EPSG:4326") {
        return Transform::Identity;
    }

    match compile(def) {
        Ok(transform) => transform,
        Err(e) => {
            warn!(
                "Cannot compile projection definition, coordinates pass through unchanged: {:#}",
                e
            );
            Transform::Identity
        }
    }
}

fn compile(definition: &str) -> Result<Transform> {
    let parsed = match prj::parse(definition)? {
        prj::Definition::Geographic => return Ok(Transform::Identity),
        prj::Definition::Projected(def) => def,
    };

    let ellipsoid = if parsed.nad83 { GRS80 } else { WGS84 };
    let method = parsed.projection.to_ascii_lowercase();

    let kind = match method.as_str() {
        "albers" | "albers_conic_equal_area" => ProjectionKind::Albers(albers::AlbersParams {
            lon0: parsed.angle("central_meridian")?,
            lat0: parsed.angle("latitude_of_origin")?,
            lat1: parsed.angle("standard_parallel_1")?,
            lat2: parsed.angle("standard_parallel_2")?,
            x0: parsed.length("false_easting")?,
            y0: parsed.length("false_northing")?,
        }),
        "lambert_conformal_conic" | "lambert_conformal_conic_2sp" => {
            ProjectionKind::Lambert(lambert::LambertParams {
                lon0: parsed.angle("central_meridian")?,
                lat0: parsed.angle("latitude_of_origin")?,
                lat1: parsed.angle("standard_parallel_1")?,
                lat2: parsed.angle("standard_parallel_2")?,
                x0: parsed.length("false_easting")?,
                y0: parsed.length("false_northing")?,
            })
        }
        "transverse_mercator" => ProjectionKind::TransverseMercator(tmerc::TmercParams {
            lon0: parsed.angle("central_meridian")?,
            lat0: parsed.angle("latitude_of_origin")?,
            k0: parsed.parameter("scale_factor")?,
            x0: parsed.length("false_easting")?,
            y0: parsed.length("false_northing")?,
        }),
        "mercator_auxiliary_sphere" => ProjectionKind::WebMercator,
        other => bail!("Unsupported projection method: {}", other),
    };

    Ok(Transform::Projected(ProjectedCrs {
        name: parsed.name,
        kind,
        ellipsoid,
        to_meters: parsed.unit_to_meters,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEALE_ALBERS: &str = r#"PROJCS["NAD_1983_California_Teale_Albers",GEOGCS["GCS_North_American_1983",DATUM["D_North_American_1983",SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Albers"],PARAMETER["False_Easting",0.0],PARAMETER["False_Northing",-4000000.0],PARAMETER["Central_Meridian",-120.0],PARAMETER["Standard_Parallel_1",34.0],PARAMETER["Standard_Parallel_2",40.5],PARAMETER["Latitude_Of_Origin",0.0],UNIT["Meter",1.0]]"#;

    const UTM_10N: &str = r#"PROJCS["NAD_1983_UTM_Zone_10N",GEOGCS["GCS_North_American_1983",DATUM["D_North_American_1983",SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["False_Easting",500000.0],PARAMETER["False_Northing",0.0],PARAMETER["Central_Meridian",-123.0],PARAMETER["Scale_Factor",0.9996],PARAMETER["Latitude_Of_Origin",0.0],UNIT["Meter",1.0]]"#;

    const WEB_MERCATOR: &str = r#"PROJCS["WGS_1984_Web_Mercator_Auxiliary_Sphere",GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Mercator_Auxiliary_Sphere"],PARAMETER["False_Easting",0.0],PARAMETER["False_Northing",0.0],PARAMETER["Central_Meridian",0.0],PARAMETER["Standard_Parallel_1",0.0],PARAMETER["Auxiliary_Sphere_Type",0.0],UNIT["Meter",1.0]]"#;

    const GCS_WGS84: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

    #[test]
    fn test_no_definition_is_identity() {
        let t = resolve(None);
        assert!(t.is_identity());
        assert_eq!(t.transform_point(-122.4, 37.7).unwrap(), (-122.4, 37.7));
    }

    #[test]
    fn test_epsg_4326_literal_is_identity() {
        assert!(resolve(Some("EPSG:4326")).is_identity());
        assert!(resolve(Some("epsg:4326")).is_identity());
    }

    #[test]
    fn test_geographic_definition_is_identity() {
        assert!(resolve(Some(GCS_WGS84)).is_identity());
    }

    #[test]
    fn test_unreadable_definition_falls_back_to_identity() {
        let t = resolve(Some("PROJCS[\"mystery\",PROJECTION[\"Cassini\"]]"));
        assert!(t.is_identity());
    }

    #[test]
    fn test_teale_albers_anchor() {
        let t = resolve(Some(TEALE_ALBERS));
        assert!(!t.is_identity());
        assert_eq!(t.name(), "NAD_1983_California_Teale_Albers");

        let (lon, lat) = t.transform_point(0.0, -4_000_000.0).unwrap();
        assert!((lon - (-120.0)).abs() < 1e-7, "lon={}", lon);
        assert!(lat.abs() < 1e-7, "lat={}", lat);
    }

    #[test]
    fn test_utm_10n_san_francisco() {
        let t = resolve(Some(UTM_10N));
        let (lon, lat) = t.transform_point(551730.0, 4182690.0).unwrap();

        assert!((lon - (-122.4194)).abs() < 0.02, "lon={}", lon);
        assert!((lat - 37.7749).abs() < 0.02, "lat={}", lat);
    }

    #[test]
    fn test_web_mercator_origin() {
        let t = resolve(Some(WEB_MERCATOR));
        let (lon, lat) = t.transform_point(0.0, 0.0).unwrap();
        assert!(lon.abs() < 1e-9);
        assert!(lat.abs() < 1e-9);
    }
}
