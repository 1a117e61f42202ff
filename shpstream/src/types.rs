//! Types de données pour le crate shpstream

use geo::Geometry;
use shapefile::dbase::FieldValue;

/// Un enregistrement shapefile décodé: géométrie + attributs DBF
#[derive(Debug, Clone)]
pub struct RawFeature {
    /// Géométrie décodée. `None` pour un NullShape ou un type de forme
    /// non représentable (Multipatch).
    pub geometry: Option<Geometry<f64>>,

    /// Attributs (nom de champ -> valeur scalaire), triés par nom de champ
    /// pour un ordre stable quel que soit l'ordre interne du DBF.
    pub properties: Vec<(String, PropertyValue)>,
}

impl RawFeature {
    /// Récupère un attribut par nom de champ
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

/// Valeur scalaire d'un attribut DBF
///
/// Les valeurs absentes du DBF sont conservées explicitement (`Null`),
/// jamais omises: chaque enregistrement d'un même shapefile expose le
/// même jeu de clés.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Null,
    Text(String),
    Integer(i64),
    Real(f64),
    Bool(bool),
}

impl PropertyValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }
}

impl From<FieldValue> for PropertyValue {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Character(Some(s)) => PropertyValue::Text(s),
            FieldValue::Character(None) => PropertyValue::Null,
            FieldValue::Numeric(Some(n)) => PropertyValue::Real(n),
            FieldValue::Numeric(None) => PropertyValue::Null,
            FieldValue::Float(Some(f)) => PropertyValue::Real(f64::from(f)),
            FieldValue::Float(None) => PropertyValue::Null,
            FieldValue::Double(d) => PropertyValue::Real(d),
            FieldValue::Currency(c) => PropertyValue::Real(c),
            FieldValue::Integer(i) => PropertyValue::Integer(i64::from(i)),
            FieldValue::Logical(Some(b)) => PropertyValue::Bool(b),
            FieldValue::Logical(None) => PropertyValue::Null,
            FieldValue::Date(Some(d)) => PropertyValue::Text(format!(
                "{:04}-{:02}-{:02}",
                d.year(),
                d.month(),
                d.day()
            )),
            FieldValue::Date(None) => PropertyValue::Null,
            FieldValue::DateTime(dt) => {
                let d = dt.date();
                let t = dt.time();
                PropertyValue::Text(format!(
                    "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
                    d.year(),
                    d.month(),
                    d.day(),
                    t.hours(),
                    t.minutes(),
                    t.seconds()
                ))
            }
            FieldValue::Memo(s) => PropertyValue::Text(s),
        }
    }
}
