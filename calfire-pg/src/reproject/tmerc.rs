//! Projection Transverse Mercator (inverse)
//!
//! Couvre les zones UTM 10N et 11N (EPSG:26910/26911, 32610/32611) qui
//! encadrent la Californie, ainsi que les variantes à latitude d'origine
//! non nulle.

use super::ellipsoid::Ellipsoid;
use super::Geographic;
use anyhow::Result;

/// Paramètres d'une instance Transverse Mercator
///
/// Angles en radians, false easting/northing en mètres.
#[derive(Debug, Clone, Copy)]
pub struct TmercParams {
    /// Longitude du méridien central
    pub lon0: f64,
    /// Latitude origine
    pub lat0: f64,
    /// Facteur d'échelle au méridien central
    pub k0: f64,
    /// False easting
    pub x0: f64,
    /// False northing
    pub y0: f64,
}

/// Longueur de l'arc de méridien depuis l'équateur
fn meridian_arc(lat: f64, a: f64, e2: f64) -> f64 {
    a * ((1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0) * lat
        - (3.0 * e2 / 8.0 + 3.0 * e2.powi(2) / 32.0 + 45.0 * e2.powi(3) / 1024.0)
            * (2.0 * lat).sin()
        + (15.0 * e2.powi(2) / 256.0 + 45.0 * e2.powi(3) / 1024.0) * (4.0 * lat).sin()
        - (35.0 * e2.powi(3) / 3072.0) * (6.0 * lat).sin())
}

/// Convertit des coordonnées projetées Transverse Mercator vers géographiques
pub fn tmerc_to_geographic(x: f64, y: f64, p: &TmercParams, ell: Ellipsoid) -> Result<Geographic> {
    let a = ell.a;
    let e2 = ell.e2;
    let ep2 = ell.ep2;

    // Coordonnées réduites
    let x = x - p.x0;
    let y = y - p.y0;

    // Calcul du footprint latitude
    let m = meridian_arc(p.lat0, a, e2) + y / p.k0;
    let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));

    // Coefficients pour la série
    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    // Calculs intermédiaires
    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let tan_phi1 = phi1.tan();

    let n1 = a / (1.0 - e2 * sin_phi1.powi(2)).sqrt();
    let t1 = tan_phi1.powi(2);
    let c1 = ep2 * cos_phi1.powi(2);
    let r1 = a * (1.0 - e2) / (1.0 - e2 * sin_phi1.powi(2)).powf(1.5);
    let d = x / (n1 * p.k0);

    // Latitude
    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d.powi(2) / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2) - 252.0 * ep2
                    - 3.0 * c1.powi(2))
                    * d.powi(6)
                    / 720.0);

    // Longitude
    let lon = p.lon0
        + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * ep2 + 24.0 * t1.powi(2))
                * d.powi(5)
                / 120.0)
            / cos_phi1;

    Ok(Geographic::new(lon, lat))
}
