//! Engine configuration
//!
//! Every tunable parameter is a `ValueInRange`. The region angle is always
//! derived from the region count, never stored.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::consts::MAX_REGIONS;
use crate::error::ConfigError;
use crate::range::ValueInRange;

/// Default interval between state-update notifications (60 Hz)
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_nanos(16_666_667);

/// Validated engine configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Configuration {
    num_regions: ValueInRange<u32>,
    num_items_per_region: ValueInRange<u32>,
    item_size: ValueInRange<f32>,
    item_elasticity: ValueInRange<f32>,
    update_interval: Duration,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            num_regions: ValueInRange::new_unchecked(1, 16, 3, Some(1)),
            num_items_per_region: ValueInRange::new_unchecked(1, 40, 5, Some(1)),
            item_size: ValueInRange::new_unchecked(2.0, 40.0, 5.0, None),
            item_elasticity: ValueInRange::new_unchecked(0.0, 1.2, 1.0, None),
            update_interval: DEFAULT_UPDATE_INTERVAL,
        }
    }
}

impl Configuration {
    /// Build a configuration, rejecting anything that could produce an
    /// empty world or a degenerate clock.
    pub fn new(
        num_regions: ValueInRange<u32>,
        num_items_per_region: ValueInRange<u32>,
        item_size: ValueInRange<f32>,
        item_elasticity: ValueInRange<f32>,
        update_interval: Duration,
    ) -> Result<Self, ConfigError> {
        if num_regions.minimum() < 1 {
            return Err(ConfigError::TooFewRegions(num_regions.minimum()));
        }
        if num_regions.maximum() > MAX_REGIONS {
            return Err(ConfigError::TooManyRegions {
                maximum: num_regions.maximum(),
                limit: MAX_REGIONS,
            });
        }
        if num_items_per_region.minimum() < 1 {
            return Err(ConfigError::TooFewItems(num_items_per_region.minimum()));
        }
        if item_size.minimum() <= 0.0 {
            return Err(ConfigError::NonPositiveSize(item_size.minimum()));
        }
        if item_elasticity.minimum() < 0.0 {
            return Err(ConfigError::NegativeElasticity(item_elasticity.minimum()));
        }
        if update_interval.is_zero() {
            return Err(ConfigError::ZeroUpdateInterval);
        }

        Ok(Self {
            num_regions,
            num_items_per_region,
            item_size,
            item_elasticity,
            update_interval,
        })
    }

    pub fn num_regions(&self) -> &ValueInRange<u32> {
        &self.num_regions
    }

    pub fn num_items_per_region(&self) -> &ValueInRange<u32> {
        &self.num_items_per_region
    }

    pub fn item_size(&self) -> &ValueInRange<f32> {
        &self.item_size
    }

    pub fn item_elasticity(&self) -> &ValueInRange<f32> {
        &self.item_elasticity
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    /// Angle of one region: 2π / number of regions
    #[inline]
    pub fn region_angle(&self) -> f32 {
        std::f32::consts::TAU / self.num_regions.current() as f32
    }

    pub fn set_num_regions(&mut self, value: u32) -> Result<(), ConfigError> {
        self.num_regions.set_current(value)
    }

    pub fn set_num_items_per_region(&mut self, value: u32) -> Result<(), ConfigError> {
        self.num_items_per_region.set_current(value)
    }

    pub fn set_item_size(&mut self, value: f32) -> Result<(), ConfigError> {
        self.item_size.set_current(value)
    }

    pub fn set_item_elasticity(&mut self, value: f32) -> Result<(), ConfigError> {
        self.item_elasticity.set_current(value)
    }

    pub fn set_update_interval(&mut self, interval: Duration) -> Result<(), ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::ZeroUpdateInterval);
        }
        self.update_interval = interval;
        Ok(())
    }

    /// Work out which side effects moving from `self` to `next` requires
    pub fn diff(&self, next: &Configuration) -> ConfigChange {
        let regenerate = self.num_regions.current() != next.num_regions.current()
            || self.num_items_per_region.current() != next.num_items_per_region.current();

        let elasticity = (self.item_elasticity.current() != next.item_elasticity.current())
            .then(|| next.item_elasticity.current());
        let item_size =
            (self.item_size.current() != next.item_size.current()).then(|| next.item_size.current());
        let update_interval =
            (self.update_interval != next.update_interval).then_some(next.update_interval);

        ConfigChange {
            regenerate,
            elasticity,
            item_size,
            update_interval,
        }
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Side effects needed to apply a configuration change
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConfigChange {
    /// Region count or items per region changed: rebuild all particles
    pub regenerate: bool,
    /// New elasticity to forward to the running world
    pub elasticity: Option<f32>,
    /// New item size, picked up by the next frame
    pub item_size: Option<f32>,
    /// New notification interval
    pub update_interval: Option<Duration>,
}

impl ConfigChange {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Deserialize)]
struct RawConfiguration {
    num_regions: ValueInRange<u32>,
    num_items_per_region: ValueInRange<u32>,
    item_size: ValueInRange<f32>,
    item_elasticity: ValueInRange<f32>,
    #[serde(default = "default_update_interval")]
    update_interval: Duration,
}

fn default_update_interval() -> Duration {
    DEFAULT_UPDATE_INTERVAL
}

impl<'de> Deserialize<'de> for Configuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawConfiguration::deserialize(deserializer)?;
        Self::new(
            raw.num_regions,
            raw.num_items_per_region,
            raw.item_size,
            raw.item_elasticity,
            raw.update_interval,
        )
        .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    #[test]
    fn test_defaults() {
        let config = Configuration::default();
        assert_eq!(config.num_regions().current(), 3);
        assert_eq!(config.num_items_per_region().current(), 5);
        assert_eq!(config.item_size().current(), 5.0);
        assert_eq!(config.item_elasticity().current(), 1.0);
        assert_eq!(config.update_interval(), DEFAULT_UPDATE_INTERVAL);
    }

    #[test]
    fn test_region_angle_follows_region_count() {
        let mut config = Configuration::default();
        assert_eq!(config.region_angle(), TAU / 3.0);

        config.set_num_regions(1).unwrap();
        assert_eq!(config.region_angle(), TAU);

        config.set_num_regions(4).unwrap();
        assert_eq!(config.region_angle(), TAU / 4.0);
    }

    #[test]
    fn test_zero_region_minimum_rejected() {
        let result = Configuration::new(
            ValueInRange::new(0, 8, 0).unwrap(),
            ValueInRange::new(1, 8, 1).unwrap(),
            ValueInRange::new(1.0, 10.0, 5.0).unwrap(),
            ValueInRange::new(0.0, 1.2, 1.0).unwrap(),
            DEFAULT_UPDATE_INTERVAL,
        );
        assert!(matches!(result, Err(ConfigError::TooFewRegions(0))));
    }

    #[test]
    fn test_region_maximum_capped() {
        let result = Configuration::new(
            ValueInRange::new(1, u32::MAX, 3).unwrap(),
            ValueInRange::new(1, 8, 1).unwrap(),
            ValueInRange::new(1.0, 10.0, 5.0).unwrap(),
            ValueInRange::new(0.0, 1.2, 1.0).unwrap(),
            DEFAULT_UPDATE_INTERVAL,
        );
        assert!(matches!(
            result,
            Err(ConfigError::TooManyRegions { maximum: u32::MAX, limit: MAX_REGIONS })
        ));
    }

    #[test]
    fn test_zero_items_and_interval_rejected() {
        let items = Configuration::new(
            ValueInRange::new(1, 8, 1).unwrap(),
            ValueInRange::new(0, 8, 2).unwrap(),
            ValueInRange::new(1.0, 10.0, 5.0).unwrap(),
            ValueInRange::new(0.0, 1.2, 1.0).unwrap(),
            DEFAULT_UPDATE_INTERVAL,
        );
        assert!(matches!(items, Err(ConfigError::TooFewItems(0))));

        let mut config = Configuration::default();
        assert!(config.set_update_interval(Duration::ZERO).is_err());
    }

    #[test]
    fn test_setters_reject_out_of_range() {
        let mut config = Configuration::default();
        assert!(config.set_num_regions(0).is_err());
        assert!(config.set_item_elasticity(1.5).is_err());
        assert_eq!(config, Configuration::default());
    }

    #[test]
    fn test_diff_topology_change_regenerates() {
        let old = Configuration::default();
        let mut new = old.clone();
        new.set_num_items_per_region(10).unwrap();

        let change = old.diff(&new);
        assert!(change.regenerate);
        assert_eq!(change.elasticity, None);
    }

    #[test]
    fn test_diff_elasticity_is_live() {
        let old = Configuration::default();
        let mut new = old.clone();
        new.set_item_elasticity(0.5).unwrap();

        let change = old.diff(&new);
        assert!(!change.regenerate);
        assert_eq!(change.elasticity, Some(0.5));
        assert_eq!(change.item_size, None);
    }

    #[test]
    fn test_diff_identical_is_empty() {
        let config = Configuration::default();
        assert!(config.diff(&config.clone()).is_empty());
    }

    #[test]
    fn test_json_round_trip_and_validation() {
        let mut config = Configuration::default();
        config.set_num_regions(6).unwrap();
        let json = config.to_json().unwrap();
        let parsed = Configuration::from_json(&json).unwrap();
        assert_eq!(parsed, config);

        let bad = json.replace("\"minimum\": 1,", "\"minimum\": 0,");
        assert!(Configuration::from_json(&bad).is_err());
    }
}
