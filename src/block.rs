use crate::Coordinates;

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    hash::{Hash, Hasher},
};

/// The block found on top of one column.
///
/// Equality and hashing only look at the ground position: two samples of the same column at
/// different heights are the same sample as far as any index is concerned.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SurfaceSample {
    pub name: String,
    pub coordinates: Coordinates,
    pub properties: BTreeMap<String, String>,
}

impl SurfaceSample {
    pub fn new(name: impl Into<String>, coordinates: Coordinates) -> Self {
        SurfaceSample {
            name: name.into(),
            coordinates,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn column(&self) -> Coordinates {
        self.coordinates.ground()
    }

    pub fn name_matches_any(&self, patterns: &[&str]) -> bool {
        patterns.iter().any(|p| self.name.contains(p))
    }

    /// The full block state, e.g. `minecraft:oak_slab[type=top]`.
    pub fn full_name(&self) -> String {
        if self.properties.is_empty() {
            return self.name.clone();
        }

        let props: Vec<_> = self
            .properties
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();

        format!("{}[{}]", self.name, props.join(","))
    }
}

impl PartialEq for SurfaceSample {
    fn eq(&self, other: &Self) -> bool {
        self.column() == other.column()
    }
}

impl Eq for SurfaceSample {}

impl Hash for SurfaceSample {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.column().hash(state);
    }
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝
