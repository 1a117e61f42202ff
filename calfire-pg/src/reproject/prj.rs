//! Analyse des définitions ESRI WKT des sidecars `.prj`
//!
//! Extraction tolérante par expressions régulières: on ne valide pas la
//! grammaire WKT complète, on récupère le nom de la projection, ses
//! paramètres numériques, l'unité linéaire et le datum. Tout ce qui ne
//! rentre pas dans ce cadre est signalé en erreur et l'appelant retombe
//! sur la transformation identité.

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use regex::Regex;

/// Définition de système de coordonnées reconnue
#[derive(Debug)]
pub(super) enum Definition {
    /// GEOGCS seul: les coordonnées sont déjà en degrés
    Geographic,
    /// PROJCS: coordonnées projetées à inverser
    Projected(ProjectedDef),
}

/// Contenu extrait d'une clause PROJCS
#[derive(Debug)]
pub(super) struct ProjectedDef {
    /// Nom affichable du système (premier littéral du PROJCS)
    pub name: String,
    /// Nom de la méthode de projection (clause PROJECTION)
    pub projection: String,
    /// Paramètres numériques, clés en minuscules
    pub parameters: HashMap<String, f64>,
    /// Facteur de conversion de l'unité linéaire vers le mètre
    pub unit_to_meters: f64,
    /// Datum NAD83 (ellipsoïde GRS80) plutôt que WGS84
    pub nad83: bool,
}

impl ProjectedDef {
    /// Paramètre angulaire en radians
    pub fn angle(&self, key: &str) -> Result<f64> {
        Ok(self.parameter(key)?.to_radians())
    }

    /// Paramètre de longueur converti en mètres
    pub fn length(&self, key: &str) -> Result<f64> {
        Ok(self.parameter(key)? * self.unit_to_meters)
    }

    /// Paramètre numérique brut
    pub fn parameter(&self, key: &str) -> Result<f64> {
        self.parameters
            .get(key)
            .copied()
            .with_context(|| format!("Missing PARAMETER \"{}\" in {}", key, self.name))
    }
}

/// Analyse une définition `.prj` (texte ESRI WKT)
pub(super) fn parse(definition: &str) -> Result<Definition> {
    let def = definition.trim();
    let upper = def.to_ascii_uppercase();

    if upper.starts_with("GEOGCS") {
        return Ok(Definition::Geographic);
    }
    if !upper.starts_with("PROJCS") {
        bail!("Unrecognized coordinate system definition: {}", excerpt(def));
    }

    let name = Regex::new(r#"(?i)PROJCS\["([^"]+)""#)
        .ok()
        .and_then(|re| re.captures(def))
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| "unnamed".to_string());

    let projection = Regex::new(r#"(?i)PROJECTION\["([^"]+)"\]"#)
        .ok()
        .and_then(|re| re.captures(def))
        .map(|c| c[1].to_string())
        .with_context(|| format!("No PROJECTION clause in {}", name))?;

    let mut parameters = HashMap::new();
    let param_re = Regex::new(r#"(?i)PARAMETER\["([^"]+)"\s*,\s*([-+0-9.eE]+)\]"#)
        .context("Invalid PARAMETER pattern")?;
    for capture in param_re.captures_iter(def) {
        let key = capture[1].to_ascii_lowercase();
        let value: f64 = capture[2]
            .parse()
            .with_context(|| format!("Unparseable PARAMETER \"{}\" in {}", &capture[1], name))?;
        parameters.insert(key, value);
    }

    // L'unité linéaire d'un PROJCS est la dernière clause UNIT du texte
    // (celle du GEOGCS interne, en degrés, apparaît avant)
    let unit_re = Regex::new(r#"(?i)UNIT\["([^"]+)"\s*,\s*([-+0-9.eE]+)\]"#)
        .context("Invalid UNIT pattern")?;
    let unit_to_meters = unit_re
        .captures_iter(def)
        .last()
        .map(|c| c[2].parse::<f64>().unwrap_or(1.0))
        .unwrap_or(1.0);
    if unit_to_meters <= 0.0 {
        bail!("Non-positive linear unit factor in {}", name);
    }

    let nad83 = upper.contains("NORTH_AMERICAN") || upper.contains("NAD");

    Ok(Definition::Projected(ProjectedDef {
        name,
        projection,
        parameters,
        unit_to_meters,
        nad83,
    }))
}

/// Tronque une définition pour les messages d'erreur
fn excerpt(definition: &str) -> String {
    const MAX: usize = 60;
    if definition.len() <= MAX {
        definition.to_string()
    } else {
        let cut = definition
            .char_indices()
            .take_while(|(i, _)| *i < MAX)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &definition[..cut])
    }
}
