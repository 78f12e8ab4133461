pub mod agenda;
pub mod policy;
pub mod rule;
pub mod session;
pub mod system;

pub use agenda::AgendaUserPolicy;
pub use policy::{DialogPolicy, PolicyError};
pub use rule::RulePolicy;
pub use session::{SessionOutcome, SessionRunner, SimulationReport};
pub use system::RuleSystemPolicy;
