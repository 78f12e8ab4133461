use thiserror::Error;

use crate::domain::act::Domain;
use crate::ontology::Slot;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("unsupported dialog role flag `{0}` (expected sys|usr)")]
    UnsupportedRole(String),
    #[error("slot {slot} is not defined for the {domain} domain")]
    UnknownSlot { domain: Domain, slot: Slot },
    #[error("venue directory has no venues in any dialog domain")]
    EmptyDirectory,
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}
