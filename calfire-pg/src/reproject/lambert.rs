//! Projection Lambert Conformal Conic à 2 parallèles standards (inverse)
//!
//! Utilisée par les zones State Plane de Californie (EPSG:2225 à 2229,
//! coordonnées en pieds US).

use super::ellipsoid::Ellipsoid;
use super::Geographic;
use anyhow::{bail, Result};

/// Paramètres d'une instance Lambert Conformal Conic 2SP
///
/// Angles en radians, false easting/northing en mètres.
#[derive(Debug, Clone, Copy)]
pub struct LambertParams {
    /// Longitude origine (méridien central)
    pub lon0: f64,
    /// Latitude origine
    pub lat0: f64,
    /// Premier parallèle standard
    pub lat1: f64,
    /// Deuxième parallèle standard
    pub lat2: f64,
    /// False easting
    pub x0: f64,
    /// False northing
    pub y0: f64,
}

/// Calcule la latitude isométrique
pub(super) fn isometric_latitude(lat: f64, e: f64) -> f64 {
    let sin_lat = lat.sin();
    let term = ((1.0 - e * sin_lat) / (1.0 + e * sin_lat)).powf(e / 2.0);
    ((std::f64::consts::FRAC_PI_4 + lat / 2.0).tan() * term).ln()
}

/// Calcule la latitude depuis la latitude isométrique (itératif)
pub(super) fn latitude_from_isometric(iso_lat: f64, e: f64) -> f64 {
    let mut lat = 2.0 * iso_lat.exp().atan() - std::f64::consts::FRAC_PI_2;

    for _ in 0..10 {
        let sin_lat = lat.sin();
        let term = ((1.0 + e * sin_lat) / (1.0 - e * sin_lat)).powf(e / 2.0);
        let new_lat = 2.0 * (iso_lat.exp() * term).atan() - std::f64::consts::FRAC_PI_2;

        if (new_lat - lat).abs() < 1e-12 {
            return new_lat;
        }
        lat = new_lat;
    }
    lat
}

/// Calcule la grande normale (rayon de courbure dans le plan vertical)
fn grande_normale(lat: f64, a: f64, e2: f64) -> f64 {
    a / (1.0 - e2 * lat.sin().powi(2)).sqrt()
}

/// Constantes de la projection dérivées des paramètres
fn constants(p: &LambertParams, ell: Ellipsoid) -> Result<(f64, f64, f64)> {
    let n1 = grande_normale(p.lat1, ell.a, ell.e2);
    let n2 = grande_normale(p.lat2, ell.a, ell.e2);

    let iso_lat1 = isometric_latitude(p.lat1, ell.e);
    let iso_lat2 = isometric_latitude(p.lat2, ell.e);
    let iso_lat0 = isometric_latitude(p.lat0, ell.e);

    if (iso_lat2 - iso_lat1).abs() < 1e-12 {
        bail!("Standard parallels must be distinct");
    }

    // Exposant de la projection
    let n = (n1 * p.lat1.cos()).ln() - (n2 * p.lat2.cos()).ln();
    let n = n / (iso_lat2 - iso_lat1);

    // Constante C
    let c = (n1 * p.lat1.cos() / n) * (n * iso_lat1).exp();

    // Rayon à l'origine
    let r0 = c * (-n * iso_lat0).exp();

    Ok((n, c, r0))
}

/// Convertit des coordonnées projetées Lambert vers géographiques
pub fn lambert_to_geographic(x: f64, y: f64, p: &LambertParams, ell: Ellipsoid) -> Result<Geographic> {
    let (n, c, r0) = constants(p, ell)?;

    // Coordonnées centrées
    let dx = x - p.x0;
    let dy = y - p.y0;

    // Rayon et angle
    let r = (dx.powi(2) + (r0 - dy).powi(2)).sqrt();
    let r = if n < 0.0 { -r } else { r };

    if r == 0.0 {
        bail!("Point at projection apex has no defined longitude");
    }

    let gamma = (dx / (r0 - dy)).atan();

    // Latitude isométrique
    let iso_lat = -(r / c).ln() / n;

    // Latitude géographique
    let lat = latitude_from_isometric(iso_lat, ell.e);

    // Longitude
    let lon = p.lon0 + gamma / n;

    Ok(Geographic::new(lon, lat))
}

/// Projection directe, utilisée par les tests aller-retour
#[allow(dead_code)]
pub fn geographic_to_lambert(geo: Geographic, p: &LambertParams, ell: Ellipsoid) -> Result<(f64, f64)> {
    let (n, c, r0) = constants(p, ell)?;

    let iso_lat = isometric_latitude(geo.lat, ell.e);
    let r = c * (-n * iso_lat).exp();
    let gamma = n * (geo.lon - p.lon0);

    let x = p.x0 + r * gamma.sin();
    let y = p.y0 + r0 - r * gamma.cos();

    Ok((x, y))
}
