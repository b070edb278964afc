//! Damage category catalog
//!
//! Read-only prototype data describing hidden injury categories: how
//! likely they are to occur, which external damage types trigger them,
//! which body parts they refuse, and how severely they aggravate. The
//! catalog is validated once at startup; the rest of the engine only ever
//! sees opaque `DamageId`s resolved through it.

use std::path::Path;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::body::PartType;
use crate::core::{DamageId, DamageTypeId, Result, SurgeryError};

/// Aggravation handler selector for a damage category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageCategory {
    PhysicalTrauma,
    Burns,
    Fractures,
    InternalBleeding,
    CriticalBurns,
    ForeignObjects,
}

/// One hidden-injury category definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternalDamageSpec {
    pub id: DamageId,
    /// Weight multiplied into aggravation severity
    pub severity: f32,
    pub category: DamageCategory,
    /// Occurrence chance rolled per matching external damage event
    pub chance: f32,
    /// Part types this injury never attaches to
    #[serde(default)]
    pub blacklist: Vec<PartType>,
    /// External damage type ids that can trigger this category
    pub supported_types: Vec<DamageTypeId>,
    /// Short examine-description line shown to close observers
    #[serde(default)]
    pub examine_hint: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    category: Vec<InternalDamageSpec>,
}

/// Validated, immutable collection of damage category specs
#[derive(Debug, Clone, Default)]
pub struct DamageCatalog {
    specs: AHashMap<DamageId, InternalDamageSpec>,
}

impl DamageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in category set used when no data files are supplied.
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        let defaults = [
            InternalDamageSpec {
                id: DamageId::from("ArterialBleeding"),
                severity: 1.2,
                category: DamageCategory::InternalBleeding,
                chance: 0.25,
                blacklist: vec![],
                supported_types: vec![DamageTypeId::from("Slash"), DamageTypeId::from("Piercing")],
                examine_hint: Some("Their skin looks unnaturally pale.".into()),
            },
            InternalDamageSpec {
                id: DamageId::from("BoneFracture"),
                severity: 1.0,
                category: DamageCategory::Fractures,
                chance: 0.3,
                blacklist: vec![PartType::Torso],
                supported_types: vec![DamageTypeId::from("Blunt")],
                examine_hint: Some("A limb rests at an odd angle.".into()),
            },
            InternalDamageSpec {
                id: DamageId::from("InternalHemorrhage"),
                severity: 1.5,
                category: DamageCategory::InternalBleeding,
                chance: 0.15,
                blacklist: vec![PartType::Hand, PartType::Foot],
                supported_types: vec![DamageTypeId::from("Blunt"), DamageTypeId::from("Piercing")],
                examine_hint: Some("Deep bruising spreads under the skin.".into()),
            },
            InternalDamageSpec {
                id: DamageId::from("TornMuscle"),
                severity: 0.8,
                category: DamageCategory::PhysicalTrauma,
                chance: 0.35,
                blacklist: vec![PartType::Head],
                supported_types: vec![DamageTypeId::from("Slash"), DamageTypeId::from("Blunt")],
                examine_hint: None,
            },
            InternalDamageSpec {
                id: DamageId::from("SevereBurn"),
                severity: 1.0,
                category: DamageCategory::Burns,
                chance: 0.4,
                blacklist: vec![],
                supported_types: vec![DamageTypeId::from("Heat")],
                examine_hint: Some("Blistered skin shows through their clothing.".into()),
            },
            InternalDamageSpec {
                id: DamageId::from("CharredFlesh"),
                severity: 1.8,
                category: DamageCategory::CriticalBurns,
                chance: 0.1,
                blacklist: vec![],
                supported_types: vec![DamageTypeId::from("Heat")],
                examine_hint: Some("The smell of burnt flesh hangs around them.".into()),
            },
            InternalDamageSpec {
                id: DamageId::from("ShrapnelLodged"),
                severity: 1.1,
                category: DamageCategory::ForeignObjects,
                chance: 0.2,
                blacklist: vec![PartType::Head],
                supported_types: vec![DamageTypeId::from("Piercing")],
                examine_hint: None,
            },
        ];
        for spec in defaults {
            catalog
                .register(spec)
                .expect("built-in catalog specs must validate");
        }
        catalog
    }

    /// Register a spec, validating it first.
    pub fn register(&mut self, spec: InternalDamageSpec) -> Result<()> {
        validate_spec(&spec)?;
        if self.specs.contains_key(&spec.id) {
            return Err(SurgeryError::Catalog(format!(
                "duplicate damage category '{}'",
                spec.id
            )));
        }
        self.specs.insert(spec.id.clone(), spec);
        Ok(())
    }

    /// Load categories from a TOML file holding `[[category]]` tables.
    pub fn load_file(&mut self, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path)?;
        let file: CatalogFile = toml::from_str(&content)
            .map_err(|e| SurgeryError::Catalog(format!("{}: {e}", path.display())))?;
        let count = file.category.len();
        for spec in file.category {
            self.register(spec)?;
        }
        Ok(count)
    }

    /// Load all `.toml` files from a directory.
    pub fn load_directory(&mut self, path: &Path) -> Result<usize> {
        let mut loaded = 0;
        for entry in std::fs::read_dir(path)? {
            let entry_path = entry?.path();
            if entry_path.extension().is_some_and(|ext| ext == "toml") {
                loaded += self.load_file(&entry_path)?;
            }
        }
        Ok(loaded)
    }

    pub fn get(&self, id: &DamageId) -> Option<&InternalDamageSpec> {
        self.specs.get(id)
    }

    pub fn contains(&self, id: &DamageId) -> bool {
        self.specs.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InternalDamageSpec> {
        self.specs.values()
    }

    /// All categories that can be triggered by the given external damage
    /// type, in stable id order so callers consume randomness
    /// deterministically.
    pub fn matching_type(&self, damage_type: &DamageTypeId) -> Vec<&InternalDamageSpec> {
        let mut matches: Vec<&InternalDamageSpec> = self
            .specs
            .values()
            .filter(|s| s.supported_types.contains(damage_type))
            .collect();
        matches.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        matches
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

fn validate_spec(spec: &InternalDamageSpec) -> Result<()> {
    if spec.id.as_str().is_empty() {
        return Err(SurgeryError::Catalog("empty category id".into()));
    }
    if !(spec.chance > 0.0 && spec.chance <= 1.0) {
        return Err(SurgeryError::Catalog(format!(
            "category '{}': chance {} must be in (0, 1]",
            spec.id, spec.chance
        )));
    }
    if spec.severity <= 0.0 {
        return Err(SurgeryError::Catalog(format!(
            "category '{}': severity must be positive",
            spec.id
        )));
    }
    if spec.supported_types.is_empty() {
        return Err(SurgeryError::Catalog(format!(
            "category '{}': no supported damage types",
            spec.id
        )));
    }
    Ok(())
}
