use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::act::Domain;
use crate::ontology::Slot;

/// One domain's share of a user goal: constraints to impose (`info`), slots
/// to ask for (`reqt`), and booking details (`book`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainGoal {
    pub domain: Domain,
    pub info: BTreeMap<Slot, String>,
    pub reqt: BTreeSet<Slot>,
    pub book: BTreeMap<Slot, String>,
}

impl DomainGoal {
    pub fn new(domain: Domain) -> Self {
        Self { domain, ..Self::default() }
    }

    pub fn wants_booking(&self) -> bool {
        !self.book.is_empty()
    }
}

/// A full user goal, ordered with one entry per distinct domain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGoal {
    pub domains: Vec<DomainGoal>,
}

impl UserGoal {
    pub fn domain_goal(&self, domain: Domain) -> Option<&DomainGoal> {
        self.domains.iter().find(|goal| goal.domain == domain)
    }

    pub fn domain_goal_mut(&mut self, domain: Domain) -> Option<&mut DomainGoal> {
        self.domains.iter_mut().find(|goal| goal.domain == domain)
    }
}
