//! Projection Web Mercator (EPSG:3857)
//!
//! Aussi connue sous le nom de Pseudo-Mercator ou Spherical Mercator.
//! Certaines archives re-exportées depuis des portails cartographiques
//! arrivent dans cette projection.

use super::ellipsoid::WGS84;
use super::Geographic;
use anyhow::Result;

/// Convertit Web Mercator vers coordonnées géographiques
pub fn web_mercator_to_geographic(x: f64, y: f64) -> Result<Geographic> {
    // Modèle sphérique avec le rayon équatorial
    let r = WGS84.a;

    // Longitude = x / R
    let lon = x / r;

    // Latitude = 2 * atan(exp(y/R)) - π/2
    let lat = 2.0 * (y / r).exp().atan() - std::f64::consts::FRAC_PI_2;

    Ok(Geographic::new(lon, lat))
}

/// Projection directe, utilisée par les tests aller-retour
#[allow(dead_code)]
pub fn geographic_to_web_mercator(geo: Geographic) -> Result<(f64, f64)> {
    let r = WGS84.a;

    // Limiter la latitude pour éviter l'infini
    let lat = geo.lat.clamp(-85.0_f64.to_radians(), 85.0_f64.to_radians());

    let x = r * geo.lon;
    let y = r * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln();

    Ok((x, y))
}
