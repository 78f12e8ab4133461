use std::sync::Arc;

use parley_core::{
    DialogAct, DialogRole, DialogState, GoalGenerator, GoalGeneratorConfig, PolicyConfig,
    SimulationConfig, VenueDirectory,
};

use crate::agenda::AgendaUserPolicy;
use crate::policy::{DialogPolicy, PolicyError};
use crate::system::RuleSystemPolicy;

/// Role-selected rule policy. The `"sys"` flag picks the hand-written
/// system policy, `"usr"` picks the agenda user simulator; every other
/// flag fails construction. All four policy calls forward to the selected
/// side unchanged.
pub struct RulePolicy {
    role: DialogRole,
    inner: Box<dyn DialogPolicy>,
}

impl RulePolicy {
    /// Build the policy named by `policy.role`. The simulation settings
    /// only matter for the user side, which needs a seed and the turn
    /// budget.
    pub fn from_config(
        policy: &PolicyConfig,
        simulation: &SimulationConfig,
        directory: Arc<VenueDirectory>,
    ) -> Result<Self, PolicyError> {
        let role: DialogRole = policy.role.parse().map_err(PolicyError::from)?;
        let inner: Box<dyn DialogPolicy> = match role {
            DialogRole::System => Box::new(RuleSystemPolicy::new(directory)),
            DialogRole::User => {
                let generator = GoalGenerator::new(directory, GoalGeneratorConfig::default())?;
                Box::new(AgendaUserPolicy::new(
                    generator,
                    simulation.seed.unwrap_or_default(),
                    simulation.max_turns,
                    policy.max_initiative,
                ))
            }
        };
        Ok(Self { role, inner })
    }

    /// Wrap an already-built policy under a known role. Used by the session
    /// runner, which constructs both sides itself.
    pub fn new(role: DialogRole, inner: Box<dyn DialogPolicy>) -> Self {
        Self { role, inner }
    }

    pub fn role(&self) -> DialogRole {
        self.role
    }
}

impl DialogPolicy for RulePolicy {
    fn predict(&mut self, state: &DialogState) -> Result<Vec<DialogAct>, PolicyError> {
        self.inner.predict(state)
    }

    fn init_session(&mut self) {
        self.inner.init_session();
    }

    fn is_terminal(&self) -> Option<bool> {
        self.inner.is_terminal()
    }

    fn get_reward(&self) -> Option<f64> {
        self.inner.get_reward()
    }
}
