//! Projection Albers Equal Area Conic (inverse)
//!
//! Projection officielle de l'état de Californie (Teale Albers, EPSG:3310)
//! utilisée par la plupart des jeux de données CAL FIRE.

use super::ellipsoid::Ellipsoid;
use super::Geographic;
use anyhow::{bail, Result};

/// Paramètres d'une instance Albers Equal Area
///
/// Angles en radians, false easting/northing en mètres.
#[derive(Debug, Clone, Copy)]
pub struct AlbersParams {
    /// Longitude du méridien central
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

/// Latitude authalique q (Snyder 3-12)
fn q_authalic(lat: f64, e: f64, e2: f64) -> f64 {
    let sin_lat = lat.sin();
    (1.0 - e2)
        * (sin_lat / (1.0 - e2 * sin_lat.powi(2))
            - (1.0 / (2.0 * e)) * ((1.0 - e * sin_lat) / (1.0 + e * sin_lat)).ln())
}

/// Facteur m (Snyder 14-15)
fn m_factor(lat: f64, e2: f64) -> f64 {
    lat.cos() / (1.0 - e2 * lat.sin().powi(2)).sqrt()
}

/// Constantes de la projection dérivées des paramètres
fn constants(p: &AlbersParams, ell: Ellipsoid) -> Result<(f64, f64, f64)> {
    let m1 = m_factor(p.lat1, ell.e2);
    let m2 = m_factor(p.lat2, ell.e2);
    let q0 = q_authalic(p.lat0, ell.e, ell.e2);
    let q1 = q_authalic(p.lat1, ell.e, ell.e2);
    let q2 = q_authalic(p.lat2, ell.e, ell.e2);

    let n = if (p.lat1 - p.lat2).abs() < 1e-12 {
        p.lat1.sin()
    } else {
        (m1.powi(2) - m2.powi(2)) / (q2 - q1)
    };
    if n == 0.0 {
        bail!("Degenerate Albers parameters (n = 0)");
    }

    let c = m1.powi(2) + n * q1;
    let rho0 = ell.a * (c - n * q0).sqrt() / n;

    Ok((n, c, rho0))
}

/// Convertit des coordonnées projetées Albers vers géographiques
pub fn albers_to_geographic(x: f64, y: f64, p: &AlbersParams, ell: Ellipsoid) -> Result<Geographic> {
    let (n, c, rho0) = constants(p, ell)?;
    let e = ell.e;
    let e2 = ell.e2;

    // Coordonnées centrées
    let dx = x - p.x0;
    let dy = y - p.y0;

    let rho = (dx.powi(2) + (rho0 - dy).powi(2)).sqrt();
    if rho == 0.0 {
        // Sommet du cône
        let lat = if n > 0.0 {
            std::f64::consts::FRAC_PI_2
        } else {
            -std::f64::consts::FRAC_PI_2
        };
        return Ok(Geographic::new(p.lon0, lat));
    }

    // Si n < 0, les signes de dx, dy et rho0 s'inversent (Snyder p. 102)
    let sign = if n < 0.0 { -1.0 } else { 1.0 };
    let theta = (sign * dx).atan2(sign * (rho0 - dy));

    let q = (c - rho.powi(2) * n.powi(2) / ell.a.powi(2)) / n;

    // Latitude par itération (Snyder 3-16)
    let mut lat = (q / 2.0).asin().clamp(
        -std::f64::consts::FRAC_PI_2,
        std::f64::consts::FRAC_PI_2,
    );
    for _ in 0..15 {
        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        if cos_lat.abs() < 1e-12 {
            break;
        }
        let correction = (1.0 - e2 * sin_lat.powi(2)).powi(2) / (2.0 * cos_lat)
            * (q / (1.0 - e2) - sin_lat / (1.0 - e2 * sin_lat.powi(2))
                + (1.0 / (2.0 * e)) * ((1.0 - e * sin_lat) / (1.0 + e * sin_lat)).ln());
        lat += correction;
        if correction.abs() < 1e-12 {
            break;
        }
    }

    let lon = p.lon0 + theta / n;

    Ok(Geographic::new(lon, lat))
}

/// Projection directe, utilisée par les tests aller-retour
#[allow(dead_code)]
pub fn geographic_to_albers(geo: Geographic, p: &AlbersParams, ell: Ellipsoid) -> Result<(f64, f64)> {
    let (n, c, rho0) = constants(p, ell)?;

    let q = q_authalic(geo.lat, ell.e, ell.e2);
    let rho = ell.a * (c - n * q).sqrt() / n;
    let theta = n * (geo.lon - p.lon0);

    let x = p.x0 + rho * theta.sin();
    let y = p.y0 + rho0 - rho * theta.cos();

    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reproject::ellipsoid::GRS80;

    /// California Teale Albers (EPSG:3310)
    fn teale_albers() -> AlbersParams {
        AlbersParams {
            lon0: (-120.0_f64).to_radians(),
            lat0: 0.0,
            lat1: 34.0_f64.to_radians(),
            lat2: 40.5_f64.to_radians(),
            x0: 0.0,
            y0: -4_000_000.0,
        }
    }

    #[test]
    fn test_false_origin_maps_to_center() {
        // (0, -4000000) est le point (lon0, lat0) par construction
        let geo = albers_to_geographic(0.0, -4_000_000.0, &teale_albers(), GRS80).unwrap();
        let (lon, lat) = geo.to_degrees();

        assert!((lon - (-120.0)).abs() < 1e-7, "lon={}", lon);
        assert!(lat.abs() < 1e-7, "lat={}", lat);
    }

    #[test]
    fn test_roundtrip_sacramento() {
        let p = teale_albers();
        let geo = Geographic::from_degrees(-121.4944, 38.5816);
        let (x, y) = geographic_to_albers(geo, &p, GRS80).unwrap();
        let back = albers_to_geographic(x, y, &p, GRS80).unwrap();
        let (lon, lat) = back.to_degrees();

        assert!((lon - (-121.4944)).abs() < 1e-7, "lon={}", lon);
        assert!((lat - 38.5816).abs() < 1e-7, "lat={}", lat);
    }

    #[test]
    fn test_roundtrip_san_diego() {
        let p = teale_albers();
        let geo = Geographic::from_degrees(-117.1611, 32.7157);
        let (x, y) = geographic_to_albers(geo, &p, GRS80).unwrap();

        // San Diego est à l'est du méridien central et au nord de la
        // latitude origine (0°): x > 0, northing au-dessus du false
        // northing mais encore négatif
        assert!(x > 0.0, "x={}", x);
        assert!(y > -4_000_000.0 && y < 0.0, "y={}", y);

        let back = albers_to_geographic(x, y, &p, GRS80).unwrap();
        let (lon, lat) = back.to_degrees();
        assert!((lon - (-117.1611)).abs() < 1e-7, "lon={}", lon);
        assert!((lat - 32.7157).abs() < 1e-7, "lat={}", lat);
    }
}
