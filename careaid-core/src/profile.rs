//! Engine profiles
//!
//! Profiles are TOML engine configurations. A handful ship embedded in the
//! crate; more can be loaded from disk.

use std::collections::BTreeMap;
use std::path::Path;

use crate::{CoreError, EngineConfig};

/// Parse and validate a profile from TOML text
pub fn parse_profile(toml_str: &str) -> Result<EngineConfig, CoreError> {
    let config: EngineConfig = toml::from_str(toml_str)?;
    config.validate()?;
    Ok(config)
}

/// Registry of named engine profiles
#[derive(Debug, Default)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, EngineConfig>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the profiles compiled into the crate
    pub fn load_embedded() -> Self {
        let mut registry = Self::new();

        let embedded = [
            include_str!("../profiles/acoustic.toml"),
            include_str!("../profiles/micro_signals.toml"),
            include_str!("../profiles/companion.toml"),
        ];

        for toml_str in embedded {
            if let Ok(profile) = parse_profile(toml_str) {
                registry.register(profile);
            }
        }

        registry
    }

    /// Load one profile file and register it, replacing any profile of the same name
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<&EngineConfig, CoreError> {
        let content = std::fs::read_to_string(path)?;
        let profile = parse_profile(&content)?;
        let name = profile.name.clone();
        self.register(profile);
        self.require(&name)
    }

    pub fn register(&mut self, profile: EngineConfig) {
        self.profiles.insert(profile.name.clone(), profile);
    }

    pub fn get(&self, name: &str) -> Option<&EngineConfig> {
        self.profiles.get(name)
    }

    /// Like [`get`](Self::get), but unknown names are an error
    pub fn require(&self, name: &str) -> Result<&EngineConfig, CoreError> {
        self.get(name)
            .ok_or_else(|| CoreError::UnknownProfile(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &EngineConfig> {
        self.profiles.values()
    }

    pub fn names(&self) -> Vec<&str> {
        self.profiles.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CombinationPolicy, ScoringEngine, Tier, TierThresholds};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_load_embedded_profiles() {
        let registry = ProfileRegistry::load_embedded();
        assert_eq!(registry.len(), 3, "all embedded profiles should parse");
        assert!(registry.get("acoustic").is_some());
        assert!(registry.get("micro-signals").is_some());
        assert!(registry.get("companion").is_some());
    }

    #[test]
    fn test_acoustic_profile() {
        let registry = ProfileRegistry::load_embedded();
        let acoustic = registry.require("acoustic").unwrap();
        assert_eq!(acoustic.policy, CombinationPolicy::PriorityMax);
        assert_eq!(acoustic.thresholds.resolve().unwrap(), TierThresholds::sensitive());

        let engine = ScoringEngine::new(acoustic).unwrap();
        assert_eq!(engine.channel("impulse").unwrap().weight(), 1.0);
        assert!(engine.channel("vocal").unwrap().matcher().unwrap().matches("Screaming"));
    }

    #[test]
    fn test_weighted_profiles() {
        let registry = ProfileRegistry::load_embedded();
        for name in ["micro-signals", "companion"] {
            let profile = registry.require(name).unwrap();
            assert_eq!(profile.policy, CombinationPolicy::WeightedSum);
            assert!(ScoringEngine::new(profile).is_ok());
        }
    }

    #[test]
    fn test_idle_drift_stays_calm() {
        let registry = ProfileRegistry::load_embedded();
        for profile in registry.iter() {
            let mut engine = ScoringEngine::new(profile).unwrap();
            let mut rng = StdRng::seed_from_u64(1);

            for tick in 0..10_000 {
                let snapshot = engine.passive_drift(&mut rng).snapshot;
                assert_eq!(
                    snapshot.tier,
                    Tier::Calm,
                    "{} left calm at tick {} with score {}",
                    profile.name,
                    tick,
                    snapshot.aggregate_score
                );
            }
        }
    }

    #[test]
    fn test_unknown_profile() {
        let registry = ProfileRegistry::load_embedded();
        assert!(matches!(
            registry.require("nope"),
            Err(CoreError::UnknownProfile(_))
        ));
    }

    #[test]
    fn test_parse_profile_validates() {
        let bad = r#"
            name = "bad"
            policy = "weighted_sum"
            [[channels]]
            id = "a"
            weight = 2.0
        "#;
        assert!(matches!(parse_profile(bad), Err(CoreError::InvalidConfig(_))));
        assert!(matches!(
            parse_profile("name = "),
            Err(CoreError::ProfileParse(_))
        ));
    }
}
