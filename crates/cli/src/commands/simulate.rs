use std::sync::Arc;

use parley_core::{AppConfig, ConfigOverrides, LoadOptions, VenueDirectory};
use parley_policy::{SessionRunner, SimulationReport};

use super::CommandResult;

#[derive(Debug)]
pub struct SimulateArgs {
    pub sessions: Option<u32>,
    pub seed: Option<u64>,
    pub max_turns: Option<u32>,
    pub transcript: bool,
    pub json: bool,
}

pub fn run(args: SimulateArgs) -> CommandResult {
    let overrides = ConfigOverrides {
        sessions: args.sessions,
        seed: args.seed,
        max_turns: args.max_turns,
        ..ConfigOverrides::default()
    };

    let config = match AppConfig::load(LoadOptions { overrides, ..LoadOptions::default() }) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("simulate", "config_validation", error.to_string(), 2)
        }
    };

    let runner = SessionRunner::new(
        config.policy.clone(),
        config.simulation.clone(),
        Arc::new(VenueDirectory::builtin()),
    );

    let mut report = match runner.run_many() {
        Ok(report) => report,
        Err(error) => return CommandResult::failure("simulate", "simulation", error.to_string(), 3),
    };

    if !args.transcript {
        for outcome in &mut report.outcomes {
            outcome.transcript.clear();
        }
    }

    let output = if args.json {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"command\":\"simulate\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
                error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
            )
        })
    } else {
        render_human(&report, args.transcript)
    };

    CommandResult { exit_code: 0, output }
}

fn render_human(report: &SimulationReport, transcript: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "simulate: {}/{} sessions successful ({:.0}%), avg {:.1} turns, avg reward {:.1}",
        report.successes,
        report.sessions,
        report.success_rate * 100.0,
        report.avg_turns,
        report.avg_reward,
    ));

    for outcome in &report.outcomes {
        let verdict = if outcome.success { "success" } else { "failure" };
        lines.push(format!(
            "- session {} [{verdict}] {} turns, reward {:.1}",
            outcome.index, outcome.turns, outcome.reward,
        ));
        if transcript {
            for turn in &outcome.transcript {
                lines.push(format!("    {turn}"));
            }
        }
    }

    lines.join("\n")
}
