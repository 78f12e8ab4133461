use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::act::DialogRole;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub policy: PolicyConfig,
    pub simulation: SimulationConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct PolicyConfig {
    /// Role flag selecting the policy side: `"sys"` or `"usr"`.
    pub role: String,
    /// Most agenda items a simulated user surfaces in one turn.
    pub max_initiative: usize,
}

#[derive(Clone, Debug)]
pub struct SimulationConfig {
    pub sessions: u32,
    pub max_turns: u32,
    pub seed: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub role: Option<String>,
    pub max_initiative: Option<usize>,
    pub sessions: Option<u32>,
    pub max_turns: Option<u32>,
    pub seed: Option<u64>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            policy: PolicyConfig { role: "sys".to_string(), max_initiative: 4 },
            simulation: SimulationConfig { sessions: 10, max_turns: 40, seed: None },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    /// Layered precedence: defaults, then the TOML file, then `PARLEY_*`
    /// environment variables, then explicit overrides.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("parley.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(policy) = patch.policy {
            if let Some(role) = policy.role {
                self.policy.role = role;
            }
            if let Some(max_initiative) = policy.max_initiative {
                self.policy.max_initiative = max_initiative;
            }
        }

        if let Some(simulation) = patch.simulation {
            if let Some(sessions) = simulation.sessions {
                self.simulation.sessions = sessions;
            }
            if let Some(max_turns) = simulation.max_turns {
                self.simulation.max_turns = max_turns;
            }
            if let Some(seed) = simulation.seed {
                self.simulation.seed = Some(seed);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("PARLEY_POLICY_ROLE") {
            self.policy.role = value;
        }
        if let Some(value) = read_env("PARLEY_POLICY_MAX_INITIATIVE") {
            self.policy.max_initiative =
                parse_usize("PARLEY_POLICY_MAX_INITIATIVE", &value)?;
        }

        if let Some(value) = read_env("PARLEY_SIMULATION_SESSIONS") {
            self.simulation.sessions = parse_u32("PARLEY_SIMULATION_SESSIONS", &value)?;
        }
        if let Some(value) = read_env("PARLEY_SIMULATION_MAX_TURNS") {
            self.simulation.max_turns = parse_u32("PARLEY_SIMULATION_MAX_TURNS", &value)?;
        }
        if let Some(value) = read_env("PARLEY_SIMULATION_SEED") {
            self.simulation.seed = Some(parse_u64("PARLEY_SIMULATION_SEED", &value)?);
        }

        let log_level = read_env("PARLEY_LOGGING_LEVEL").or_else(|| read_env("PARLEY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("PARLEY_LOGGING_FORMAT")
            .map(|value| ("PARLEY_LOGGING_FORMAT", value))
            .or_else(|| read_env("PARLEY_LOG_FORMAT").map(|value| ("PARLEY_LOG_FORMAT", value)));
        if let Some((key, value)) = log_format {
            self.logging.format =
                value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                    key: key.to_string(),
                    value: value.clone(),
                })?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(role) = overrides.role {
            self.policy.role = role;
        }
        if let Some(max_initiative) = overrides.max_initiative {
            self.policy.max_initiative = max_initiative;
        }
        if let Some(sessions) = overrides.sessions {
            self.simulation.sessions = sessions;
        }
        if let Some(max_turns) = overrides.max_turns {
            self.simulation.max_turns = max_turns;
        }
        if let Some(seed) = overrides.seed {
            self.simulation.seed = Some(seed);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_policy(&self.policy)?;
        validate_simulation(&self.simulation)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("parley.toml"), PathBuf::from("config/parley.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_policy(policy: &PolicyConfig) -> Result<(), ConfigError> {
    policy.role.parse::<DialogRole>().map_err(|error| {
        ConfigError::Validation(format!("policy.role is invalid: {error}"))
    })?;

    if policy.max_initiative == 0 || policy.max_initiative > 8 {
        return Err(ConfigError::Validation(
            "policy.max_initiative must be in range 1..=8".to_string(),
        ));
    }

    Ok(())
}

fn validate_simulation(simulation: &SimulationConfig) -> Result<(), ConfigError> {
    if simulation.sessions == 0 {
        return Err(ConfigError::Validation(
            "simulation.sessions must be greater than zero".to_string(),
        ));
    }

    if simulation.max_turns < 2 || simulation.max_turns > 200 {
        return Err(ConfigError::Validation(
            "simulation.max_turns must be in range 2..=200".to_string(),
        ));
    }

    if simulation.max_turns % 2 != 0 {
        return Err(ConfigError::Validation(
            "simulation.max_turns must be even (turns alternate between roles)".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    policy: Option<PolicyPatch>,
    simulation: Option<SimulationPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct PolicyPatch {
    role: Option<String>,
    max_initiative: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct SimulationPatch {
    sessions: Option<u32>,
    max_turns: Option<u32>,
    seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
