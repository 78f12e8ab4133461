use thiserror::Error;

use parley_core::{DialogAct, DialogState, DomainError};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("venue `{name}` is no longer present in the {domain} directory")]
    MissingVenue { domain: parley_core::Domain, name: String },
}

/// The four-call surface every dialog policy exposes.
///
/// The defaults encode the system side's behavior: a hand-written system
/// policy has no termination or reward notion, so both queries answer
/// `None`. The user simulator overrides both.
pub trait DialogPolicy: Send {
    /// Select the next action given the shared dialog state.
    fn predict(&mut self, state: &DialogState) -> Result<Vec<DialogAct>, PolicyError>;

    /// Restore after one session.
    fn init_session(&mut self);

    fn is_terminal(&self) -> Option<bool> {
        None
    }

    fn get_reward(&self) -> Option<f64> {
        None
    }
}
