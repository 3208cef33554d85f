use crate::error::{PlanError, Result};

use serde::{Deserialize, Serialize};

/// Block names used when rendering each road band.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct RoadPalette {
    pub inner: String,
    pub inner_slab: String,
    pub middle: String,
    pub middle_slab: String,
    pub outer: String,
    pub outer_slab: String,
}

impl Default for RoadPalette {
    fn default() -> Self {
        RoadPalette {
            inner: "minecraft:stone_bricks".into(),
            inner_slab: "minecraft:stone_brick_slab".into(),
            middle: "minecraft:cobblestone".into(),
            middle_slab: "minecraft:cobblestone_slab".into(),
            outer: "minecraft:gravel".into(),
            outer_slab: "minecraft:andesite_slab".into(),
        }
    }
}

/// Tuning knobs for terrain scoring, placement and road building.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub seed: [u32; 4],
    /// Neighbourhood radius of the roughness score.
    pub roughness_span: i32,
    /// Share of scored cells kept as priority candidates.
    pub priority_fraction: f32,
    /// Share of free dry surface cells added to the candidate pool at random.
    pub random_sample_fraction: f32,
    pub centering_weight: f32,
    pub raise_weight: f32,
    pub lower_weight: f32,
    pub affinity_weight: f32,
    pub road_base_weight: u64,
    pub road_slope_weight: u64,
    pub road_reinforced_weight: u64,
    pub blocked_weight: u64,
    pub smoothing_radius: i32,
    pub palette: RoadPalette,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            seed: [0x5eed, 0xb10c, 0x9107, 0x7a1d],
            roughness_span: 2,
            priority_fraction: 0.1,
            random_sample_fraction: 0.1,
            centering_weight: 0.1,
            raise_weight: 0.8,
            lower_weight: 3.0,
            affinity_weight: 0.5,
            road_base_weight: 100,
            road_slope_weight: 10,
            road_reinforced_weight: 10,
            blocked_weight: 1_000_000,
            smoothing_radius: 1,
            palette: RoadPalette::default(),
        }
    }
}

impl PlannerConfig {
    /// Parses a RON document; missing fields take their defaults.
    pub fn from_ron_str(s: &str) -> Result<Self> {
        let config: PlannerConfig =
            ron::de::from_str(s).map_err(|e| PlanError::Config(e.to_string()))?;
        config.validate()?;

        Ok(config)
    }

    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| PlanError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        let fraction_ok = |f: f32| f > 0.0 && f <= 1.0;
        if !fraction_ok(self.priority_fraction) {
            return Err(PlanError::Config(format!(
                "priority_fraction {} not in (0, 1]",
                self.priority_fraction
            )));
        }
        if !fraction_ok(self.random_sample_fraction) {
            return Err(PlanError::Config(format!(
                "random_sample_fraction {} not in (0, 1]",
                self.random_sample_fraction
            )));
        }
        if self.roughness_span < 0 || self.smoothing_radius < 0 {
            return Err(PlanError::Config("radii must be non-negative".into()));
        }
        let weights = [
            self.centering_weight,
            self.raise_weight,
            self.lower_weight,
            self.affinity_weight,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(PlanError::Config(
                "scoring weights must be finite and non-negative".into(),
            ));
        }
        if self.road_reinforced_weight >= self.road_base_weight {
            // Reinforced roads must stay cheaper than untouched terrain.
            return Err(PlanError::Config(
                "road_reinforced_weight must be below road_base_weight".into(),
            ));
        }
        if self.blocked_weight <= self.road_base_weight {
            return Err(PlanError::Config(
                "blocked_weight must exceed road_base_weight".into(),
            ));
        }

        Ok(())
    }
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(PlannerConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = PlannerConfig::from_ron_str("(roughness_span: 3, lower_weight: 4.5)").unwrap();
        assert_eq!(config.roughness_span, 3);
        assert_eq!(config.lower_weight, 4.5);
        assert_eq!(config.raise_weight, 0.8);
        assert_eq!(config.palette, RoadPalette::default());
    }

    #[test]
    fn test_ron_round_trip() {
        let mut config = PlannerConfig::default();
        config.palette.inner = "minecraft:dirt_path".into();
        let text = config.to_ron_string().unwrap();
        assert_eq!(PlannerConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_fraction() {
        match PlannerConfig::from_ron_str("(priority_fraction: 0.0)") {
            Err(PlanError::Config(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_rejects_malformed_document() {
        assert!(matches!(
            PlannerConfig::from_ron_str("(roughness_span: \"wide\")"),
            Err(PlanError::Config(_))
        ));
    }
}
