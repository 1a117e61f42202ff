//! Définitions des ellipsoïdes

/// Paramètres d'un ellipsoïde de référence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Demi-grand axe (rayon équatorial) en mètres
    pub a: f64,

    /// Première excentricité au carré
    pub e2: f64,

    /// Première excentricité
    pub e: f64,

    /// Deuxième excentricité au carré
    pub ep2: f64,
}

const WGS84_F: f64 = 1.0 / 298.257223563;
const WGS84_E2: f64 = 2.0 * WGS84_F - WGS84_F * WGS84_F;

/// Ellipsoïde WGS84 (datums WGS_1984)
pub const WGS84: Ellipsoid = Ellipsoid {
    a: 6378137.0,
    e2: WGS84_E2,
    e: 0.0818191908426215, // sqrt(E2)
    ep2: WGS84_E2 / (1.0 - WGS84_E2),
};

const GRS80_F: f64 = 1.0 / 298.257222101;
const GRS80_E2: f64 = 2.0 * GRS80_F - GRS80_F * GRS80_F;

/// Ellipsoïde GRS80 (datums NAD83)
/// Note: Quasi identique à WGS84, différence < 0.1mm
pub const GRS80: Ellipsoid = Ellipsoid {
    a: 6378137.0,
    e2: GRS80_E2,
    e: 0.0818191910428158, // sqrt(E2)
    ep2: GRS80_E2 / (1.0 - GRS80_E2),
};
