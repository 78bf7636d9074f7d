use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::core::{ScoringParams, DEFAULT_THRESHOLD};
use crate::error::MatchError;
use crate::models::{ScoringWeights, WeightProfile};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_max_distance_km")]
    pub max_distance_km: f64,
    #[serde(default = "default_max_salary_diff_percent")]
    pub max_salary_diff_percent: f64,
    /// Scoring threads per batch; defaults to the available parallelism
    pub max_workers: Option<usize>,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            max_distance_km: default_max_distance_km(),
            max_salary_diff_percent: default_max_salary_diff_percent(),
            max_workers: None,
        }
    }
}

impl MatchingSettings {
    pub fn scoring_params(&self) -> ScoringParams {
        ScoringParams {
            max_distance_km: self.max_distance_km,
            max_salary_diff_percent: self.max_salary_diff_percent,
        }
    }
}

fn default_threshold() -> f64 { DEFAULT_THRESHOLD }
fn default_max_distance_km() -> f64 { 50.0 }
fn default_max_salary_diff_percent() -> f64 { 20.0 }

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSettings {
    /// "with_availability", "four_dimension" or "custom"
    #[serde(default = "default_profile")]
    pub profile: String,
    /// Only read for the "custom" profile
    #[serde(default)]
    pub weights: WeightsConfig,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            weights: WeightsConfig::default(),
        }
    }
}

impl ScoringSettings {
    /// Resolve and validate the configured weight profile
    pub fn weight_profile(&self) -> Result<WeightProfile, MatchError> {
        let profile = match self.profile.trim().to_ascii_lowercase().as_str() {
            "with_availability" => WeightProfile::WithAvailability,
            "four_dimension" => WeightProfile::FourDimension,
            "custom" => WeightProfile::Custom(ScoringWeights {
                skill: self.weights.skill,
                experience: self.weights.experience,
                location: self.weights.location,
                salary: self.weights.salary,
                availability: self.weights.availability,
            }),
            other => {
                return Err(MatchError::InvalidWeightConfiguration(format!(
                    "unknown scoring profile '{}'",
                    other
                )))
            }
        };

        profile.weights().validate()?;
        Ok(profile)
    }
}

fn default_profile() -> String { "with_availability".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_skill_weight")]
    pub skill: f64,
    #[serde(default = "default_experience_weight")]
    pub experience: f64,
    #[serde(default = "default_location_weight")]
    pub location: f64,
    #[serde(default = "default_salary_weight")]
    pub salary: f64,
    #[serde(default = "default_availability_weight")]
    pub availability: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            skill: default_skill_weight(),
            experience: default_experience_weight(),
            location: default_location_weight(),
            salary: default_salary_weight(),
            availability: default_availability_weight(),
        }
    }
}

fn default_skill_weight() -> f64 { 0.30 }
fn default_experience_weight() -> f64 { 0.20 }
fn default_location_weight() -> f64 { 0.20 }
fn default_salary_weight() -> f64 { 0.15 }
fn default_availability_weight() -> f64 { 0.15 }

/// Where match notifications go; without a webhook they are only logged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationSettings {
    pub webhook_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with STAFFMATCH__)
    /// 4. DATABASE_URL, when set
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            // Local overrides for development
            .add_source(File::with_name("config/local").required(false))
            // e.g., STAFFMATCH__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?;

        with_database_override(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        with_database_override(settings)?.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("STAFFMATCH")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

fn with_database_override(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => Config::builder()
            .add_source(settings)
            .set_override("database.url", url)?
            .build(),
        Err(_) => Ok(settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_match_default_profile() {
        let weights = WeightsConfig::default();
        let expected = ScoringWeights::default();
        assert_eq!(weights.skill, expected.skill);
        assert_eq!(weights.experience, expected.experience);
        assert_eq!(weights.location, expected.location);
        assert_eq!(weights.salary, expected.salary);
        assert_eq!(weights.availability, expected.availability);
    }

    #[test]
    fn test_default_matching() {
        let matching = MatchingSettings::default();
        assert_eq!(matching.threshold, 0.7);
        assert_eq!(matching.scoring_params().max_distance_km, 50.0);
        assert_eq!(matching.scoring_params().max_salary_diff_percent, 20.0);
    }

    #[test]
    fn test_profile_resolution() {
        let mut scoring = ScoringSettings::default();
        assert_eq!(scoring.weight_profile().unwrap(), WeightProfile::WithAvailability);

        scoring.profile = "Four_Dimension".to_string();
        assert_eq!(scoring.weight_profile().unwrap(), WeightProfile::FourDimension);

        scoring.profile = "fancy".to_string();
        assert!(matches!(
            scoring.weight_profile(),
            Err(MatchError::InvalidWeightConfiguration(_))
        ));
    }

    #[test]
    fn test_custom_weights_are_validated() {
        let scoring = ScoringSettings {
            profile: "custom".to_string(),
            weights: WeightsConfig {
                skill: 0.5,
                experience: 0.5,
                location: 0.5,
                salary: 0.0,
                availability: 0.0,
            },
        };
        assert!(matches!(
            scoring.weight_profile(),
            Err(MatchError::InvalidWeightConfiguration(_))
        ));
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
    }
}
