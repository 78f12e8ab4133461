use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use parley_core::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "policy.role",
        &config.policy.role,
        field_source(
            "policy.role",
            Some("PARLEY_POLICY_ROLE"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "policy.max_initiative",
        &config.policy.max_initiative.to_string(),
        field_source(
            "policy.max_initiative",
            Some("PARLEY_POLICY_MAX_INITIATIVE"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "simulation.sessions",
        &config.simulation.sessions.to_string(),
        field_source(
            "simulation.sessions",
            Some("PARLEY_SIMULATION_SESSIONS"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "simulation.max_turns",
        &config.simulation.max_turns.to_string(),
        field_source(
            "simulation.max_turns",
            Some("PARLEY_SIMULATION_MAX_TURNS"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    let seed = config
        .simulation
        .seed
        .map(|seed| seed.to_string())
        .unwrap_or_else(|| "<unset>".to_string());
    lines.push(render_line(
        "simulation.seed",
        &seed,
        field_source(
            "simulation.seed",
            Some("PARLEY_SIMULATION_SEED"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        field_source(
            "logging.level",
            Some("PARLEY_LOGGING_LEVEL"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        field_source(
            "logging.format",
            Some("PARLEY_LOGGING_FORMAT"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("parley.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/parley.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    // Blank env values are ignored by the config loader, so they are not a
    // source either.
    if let Some(env_key) = env_key {
        let set = env::var(env_key).map(|value| !value.trim().is_empty()).unwrap_or(false);
        if set {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
