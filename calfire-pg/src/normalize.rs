//! Normalisation des attributs en colonnes de destination
//!
//! Deux modes, selon la configuration:
//! - passthrough: chaque attribut devient une colonne au nom assaini
//! - mapping figé: seules les colonnes listées sont produites, avec
//!   coercition de type optionnelle

use serde_json::{Map, Value};
use shpstream::PropertyValue;

use crate::config::FieldMapping;

/// Enregistrement prêt pour l'insertion
///
/// `geometry` est un WKT non vide, garanti à la construction par le
/// pipeline: un enregistrement sans géométrie valide n'arrive jamais ici.
#[derive(Debug, Clone)]
pub struct NormalizedRecord {
    /// Colonnes attributaires (ordre d'insertion préservé)
    pub columns: Map<String, Value>,
    /// Géométrie en WKT (WGS84)
    pub geometry: String,
    /// Dossier d'origine (provenance)
    pub source_folder: String,
    /// Fichier .shp d'origine (provenance)
    pub source_file: String,
}

impl NormalizedRecord {
    /// Objet JSON plat pour le sink: colonnes + géométrie + provenance
    ///
    /// Les clés `geometry`, `source_folder` et `source_file` écrasent
    /// toute colonne attributaire homonyme.
    pub fn to_row(&self) -> Value {
        let mut row = self.columns.clone();
        row.insert("geometry".to_string(), Value::String(self.geometry.clone()));
        row.insert(
            "source_folder".to_string(),
            Value::String(self.source_folder.clone()),
        );
        row.insert(
            "source_file".to_string(),
            Value::String(self.source_file.clone()),
        );
        Value::Object(row)
    }
}

/// Assainit un nom d'attribut en nom de colonne
///
/// Minuscules ASCII, tout caractère hors `[a-z0-9_]` remplacé par `_`.
pub fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Valeur d'attribut en JSON, sans coercition
fn property_to_json(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Null => Value::Null,
        PropertyValue::Text(s) => Value::String(s.clone()),
        PropertyValue::Integer(i) => Value::from(*i),
        PropertyValue::Real(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        PropertyValue::Bool(b) => Value::Bool(*b),
    }
}

/// Valeur d'attribut forcée en texte (NULL reste NULL)
fn property_to_text(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Null => Value::Null,
        PropertyValue::Text(s) => Value::String(s.clone()),
        PropertyValue::Integer(i) => Value::String(i.to_string()),
        PropertyValue::Real(f) => Value::String(f.to_string()),
        PropertyValue::Bool(b) => Value::String(b.to_string()),
    }
}

/// Mode passthrough: toutes les colonnes, noms assainis
///
/// Les attributs arrivent triés par nom; deux noms distincts qui
/// s'assainissent en la même colonne se recouvrent, le dernier gagne.
pub fn normalize_properties(properties: &[(String, PropertyValue)]) -> Map<String, Value> {
    let mut columns = Map::new();
    for (key, value) in properties {
        columns.insert(sanitize_key(key), property_to_json(value));
    }
    columns
}

/// Mode mapping figé: colonnes listées uniquement
///
/// Un attribut source absent donne une colonne NULL: le jeu de colonnes
/// est identique pour tous les enregistrements du run.
pub fn apply_mapping(
    properties: &[(String, PropertyValue)],
    mapping: &[FieldMapping],
) -> Map<String, Value> {
    let mut columns = Map::new();
    for field in mapping {
        let value = properties
            .iter()
            .find(|(name, _)| name == &field.source)
            .map(|(_, value)| {
                if field.data_type == "text" {
                    property_to_text(value)
                } else {
                    property_to_json(value)
                }
            })
            .unwrap_or(Value::Null);
        columns.insert(field.target.clone(), value);
    }
    columns
}
