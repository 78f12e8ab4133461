pub mod config;
pub mod directory;
pub mod domain;
pub mod errors;
pub mod generator;
pub mod ontology;

pub use config::{
    AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, LoggingConfig, PolicyConfig,
    SimulationConfig,
};
pub use directory::{Venue, VenueDirectory, VenueId, DONTCARE};
pub use domain::act::{ActType, DialogAct, DialogRole, Domain, SlotValue};
pub use domain::goal::{DomainGoal, UserGoal};
pub use domain::state::{BeliefState, DialogState, DomainBelief, RequestState, Turn};
pub use errors::DomainError;
pub use generator::{GoalGenerator, GoalGeneratorConfig};
pub use ontology::{Ontology, Slot};
