use std::sync::Arc;

use serde::Serialize;

use parley_core::{AppConfig, LoadOptions, Ontology, VenueDirectory};
use parley_policy::{RulePolicy, SessionRunner};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_ontology_integrity());
            checks.push(check_role_flag_contract(&config));
            checks.push(check_session_smoke(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["ontology_integrity", "role_flag_contract", "session_smoke"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

/// Every venue domain must be populated, and every informable slot must
/// have at least one concrete value to sample goals from.
fn check_ontology_integrity() -> DoctorCheck {
    let directory = VenueDirectory::builtin();

    for &domain in Ontology::venue_domains() {
        if directory.venues_in(domain).is_empty() {
            return DoctorCheck {
                name: "ontology_integrity",
                status: CheckStatus::Fail,
                details: format!("directory has no {domain} venues"),
            };
        }
        for &slot in Ontology::informable_slots(domain) {
            if directory.value_pool(domain, slot).is_empty() {
                return DoctorCheck {
                    name: "ontology_integrity",
                    status: CheckStatus::Fail,
                    details: format!("no {domain} venue carries the {slot} slot"),
                };
            }
        }
    }

    DoctorCheck {
        name: "ontology_integrity",
        status: CheckStatus::Pass,
        details: format!("{} venues cover every informable slot", directory.len()),
    }
}

/// Both documented role flags must construct a policy, and an unknown flag
/// must be rejected.
fn check_role_flag_contract(config: &AppConfig) -> DoctorCheck {
    let directory = Arc::new(VenueDirectory::builtin());

    for role in ["sys", "usr"] {
        let mut policy_config = config.policy.clone();
        policy_config.role = role.to_string();
        if let Err(error) =
            RulePolicy::from_config(&policy_config, &config.simulation, Arc::clone(&directory))
        {
            return DoctorCheck {
                name: "role_flag_contract",
                status: CheckStatus::Fail,
                details: format!("flag `{role}` failed to construct a policy: {error}"),
            };
        }
    }

    let mut bad_config = config.policy.clone();
    bad_config.role = "agent".to_string();
    if RulePolicy::from_config(&bad_config, &config.simulation, directory).is_ok() {
        return DoctorCheck {
            name: "role_flag_contract",
            status: CheckStatus::Fail,
            details: "unknown flag `agent` was accepted".to_string(),
        };
    }

    DoctorCheck {
        name: "role_flag_contract",
        status: CheckStatus::Pass,
        details: "sys and usr construct, unknown flags are rejected".to_string(),
    }
}

fn check_session_smoke(config: &AppConfig) -> DoctorCheck {
    let mut simulation = config.simulation.clone();
    simulation.seed = simulation.seed.or(Some(0));

    let runner =
        SessionRunner::new(config.policy.clone(), simulation, Arc::new(VenueDirectory::builtin()));

    match runner.run_session(0) {
        Ok(outcome) => DoctorCheck {
            name: "session_smoke",
            status: CheckStatus::Pass,
            details: format!(
                "one session completed in {} turns with reward {:.1}",
                outcome.turns, outcome.reward
            ),
        },
        Err(error) => DoctorCheck {
            name: "session_smoke",
            status: CheckStatus::Fail,
            details: format!("smoke session failed: {error}"),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
