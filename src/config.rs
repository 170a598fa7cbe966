use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_ARRIVAL_RADIUS: f32 = 5.0;
pub const DEFAULT_ARRIVAL_DAMPING: f32 = 0.98;
pub const DEFAULT_ACCEL_RAMP_DISTANCE: f32 = 200.0;
pub const DEFAULT_SPACE_GROWTH_DISTANCE: f32 = 1_000.0;
pub const DEFAULT_REPULSION_SCALE: f32 = 0.3;
pub const DEFAULT_WRAP_MARGIN: f32 = 50.0;
pub const DEFAULT_HEADING_SMOOTHING: f32 = 0.1;
pub const DEFAULT_HEADING_MIN_SPEED: f32 = 0.1;
pub const DEFAULT_RETARGET_PERIOD_MS: f64 = 5_000.0;
pub const DEFAULT_POINTER_IDLE_MS: f64 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlockVariant {
    Interactive,
    Ambient,
}

impl FlockVariant {
    pub fn from_u32(value: u32) -> Self {
        match value {
            1 => Self::Ambient,
            _ => Self::Interactive,
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            Self::Interactive => 0,
            Self::Ambient => 1,
        }
    }

    pub fn default_config(self) -> FlockConfig {
        match self {
            Self::Interactive => FlockConfig::interactive(),
            Self::Ambient => FlockConfig::ambient(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
}

impl ParamRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.max > self.min {
            rng.random_range(self.min..self.max)
        } else {
            self.min
        }
    }

    fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(ConfigError::NonFiniteRange {
                name,
                min: self.min,
                max: self.max,
            });
        }
        if self.min > self.max {
            return Err(ConfigError::InvertedRange {
                name,
                min: self.min,
                max: self.max,
            });
        }
        if self.min < 0.0 {
            return Err(ConfigError::NegativeValue {
                name,
                value: self.min,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlockConfig {
    pub speed: ParamRange,
    pub max_speed: ParamRange,
    pub acceleration: ParamRange,
    pub personal_space: ParamRange,
    /// Drawn per fish but not read by the repulsion term.
    pub avoid_factor: ParamRange,

    /// Below this distance to its target a fish coasts instead of steering.
    pub arrival_radius: f32,
    pub arrival_damping: f32,
    pub accel_ramp_distance: f32,
    pub space_growth_distance: f32,
    pub repulsion_scale: f32,
    pub wrap_margin: f32,
    pub heading_smoothing: f32,
    pub heading_min_speed: f32,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self::interactive()
    }
}

impl FlockConfig {
    pub fn interactive() -> Self {
        Self {
            speed: ParamRange::new(0.5, 0.8),
            max_speed: ParamRange::new(2.0, 3.0),
            acceleration: ParamRange::new(0.05, 0.10),
            personal_space: ParamRange::new(30.0, 80.0),
            avoid_factor: ParamRange::new(0.2, 0.5),
            ..Self::shared_constants()
        }
    }

    pub fn ambient() -> Self {
        Self {
            speed: ParamRange::new(0.2, 0.4),
            max_speed: ParamRange::new(1.0, 1.5),
            acceleration: ParamRange::new(0.02, 0.04),
            personal_space: ParamRange::new(100.0, 200.0),
            avoid_factor: ParamRange::new(0.2, 0.5),
            ..Self::shared_constants()
        }
    }

    fn shared_constants() -> Self {
        Self {
            speed: ParamRange::new(0.0, 0.0),
            max_speed: ParamRange::new(0.0, 0.0),
            acceleration: ParamRange::new(0.0, 0.0),
            personal_space: ParamRange::new(0.0, 0.0),
            avoid_factor: ParamRange::new(0.0, 0.0),
            arrival_radius: DEFAULT_ARRIVAL_RADIUS,
            arrival_damping: DEFAULT_ARRIVAL_DAMPING,
            accel_ramp_distance: DEFAULT_ACCEL_RAMP_DISTANCE,
            space_growth_distance: DEFAULT_SPACE_GROWTH_DISTANCE,
            repulsion_scale: DEFAULT_REPULSION_SCALE,
            wrap_margin: DEFAULT_WRAP_MARGIN,
            heading_smoothing: DEFAULT_HEADING_SMOOTHING,
            heading_min_speed: DEFAULT_HEADING_MIN_SPEED,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.speed.validate("speed")?;
        self.max_speed.validate("maxSpeed")?;
        self.acceleration.validate("acceleration")?;
        self.personal_space.validate("personalSpace")?;
        self.avoid_factor.validate("avoidFactor")?;

        non_negative("arrivalRadius", self.arrival_radius)?;
        non_negative("repulsionScale", self.repulsion_scale)?;
        non_negative("wrapMargin", self.wrap_margin)?;
        non_negative("headingMinSpeed", self.heading_min_speed)?;
        within("arrivalDamping", self.arrival_damping, 0.0, 1.0)?;
        within("headingSmoothing", self.heading_smoothing, MIN_POSITIVE, 1.0)?;
        within(
            "accelRampDistance",
            self.accel_ramp_distance,
            MIN_POSITIVE,
            f32::MAX,
        )?;
        within(
            "spaceGrowthDistance",
            self.space_growth_distance,
            MIN_POSITIVE,
            f32::MAX,
        )?;
        Ok(())
    }
}

const MIN_POSITIVE: f32 = 1.0e-6;

fn non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::NegativeValue { name, value });
    }
    Ok(())
}

fn within(name: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if !value.is_finite() || value < min || value > max {
        return Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        });
    }
    Ok(())
}
