use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::act::{ActType, DialogAct, DialogRole, Domain};
use crate::ontology::{Ontology, Slot};

static EMPTY_CONSTRAINTS: BTreeMap<Slot, String> = BTreeMap::new();
static EMPTY_REQUESTS: BTreeSet<Slot> = BTreeSet::new();

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainBelief {
    pub constraints: BTreeMap<Slot, String>,
    pub booking: BTreeMap<Slot, String>,
}

/// Per-domain record of what the user has asserted so far. Re-informing a
/// slot overwrites the previous value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeliefState {
    domains: BTreeMap<Domain, DomainBelief>,
}

impl BeliefState {
    pub fn constraints_for(&self, domain: Domain) -> &BTreeMap<Slot, String> {
        self.domains.get(&domain).map(|belief| &belief.constraints).unwrap_or(&EMPTY_CONSTRAINTS)
    }

    pub fn booking_for(&self, domain: Domain) -> &BTreeMap<Slot, String> {
        self.domains.get(&domain).map(|belief| &belief.booking).unwrap_or(&EMPTY_CONSTRAINTS)
    }

    pub fn touched_domains(&self) -> impl Iterator<Item = Domain> + '_ {
        self.domains.keys().copied()
    }

    fn record(&mut self, domain: Domain, slot: Slot, value: String) {
        let belief = self.domains.entry(domain).or_default();
        if Ontology::book_slots(domain).contains(&slot) {
            belief.booking.insert(slot, value);
        } else {
            belief.constraints.insert(slot, value);
        }
    }
}

/// Slots the user has asked for and the system has not yet answered.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestState {
    domains: BTreeMap<Domain, BTreeSet<Slot>>,
}

impl RequestState {
    pub fn pending_for(&self, domain: Domain) -> &BTreeSet<Slot> {
        self.domains.get(&domain).unwrap_or(&EMPTY_REQUESTS)
    }

    pub fn is_empty(&self) -> bool {
        self.domains.values().all(BTreeSet::is_empty)
    }

    fn add(&mut self, domain: Domain, slot: Slot) {
        self.domains.entry(domain).or_default().insert(slot);
    }

    fn resolve(&mut self, domain: Domain, slot: Slot) {
        if let Some(pending) = self.domains.get_mut(&domain) {
            pending.remove(&slot);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: DialogRole,
    pub acts: Vec<DialogAct>,
}

/// The shared dialog state both policies predict against. `user_action` and
/// `system_action` always hold the most recent turn for that role; `history`
/// interleaves the full session in arrival order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogState {
    pub user_action: Vec<DialogAct>,
    pub system_action: Vec<DialogAct>,
    pub belief: BeliefState,
    pub requests: RequestState,
    pub terminated: bool,
    pub history: Vec<Turn>,
}

impl DialogState {
    pub fn apply_user_acts(&mut self, acts: &[DialogAct]) {
        self.user_action = acts.to_vec();
        self.history.push(Turn { role: DialogRole::User, acts: acts.to_vec() });

        for act in acts {
            match act.act_type {
                ActType::Inform => {
                    for entry in &act.slots {
                        self.belief.record(act.domain, entry.slot, entry.value.clone());
                    }
                }
                ActType::Request => {
                    for slot in act.slot_names() {
                        self.requests.add(act.domain, slot);
                    }
                }
                ActType::Bye => self.terminated = true,
                _ => {}
            }
        }
    }

    pub fn apply_system_acts(&mut self, acts: &[DialogAct]) {
        self.system_action = acts.to_vec();
        self.history.push(Turn { role: DialogRole::System, acts: acts.to_vec() });

        for act in acts {
            match act.act_type {
                ActType::Inform | ActType::Book => {
                    for slot in act.slot_names() {
                        self.requests.resolve(act.domain, slot);
                    }
                }
                ActType::Bye => self.terminated = true,
                _ => {}
            }
        }
    }

    pub fn turn_count(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::act::{ActType, DialogAct, DialogRole, Domain};
    use crate::ontology::Slot;

    use super::DialogState;

    #[test]
    fn user_informs_split_between_constraints_and_booking() {
        let mut state = DialogState::default();
        state.apply_user_acts(&[DialogAct::inform(
            Domain::Restaurant,
            vec![
                (Slot::Food, "chinese".to_string()),
                (Slot::Day, "tuesday".to_string()),
                (Slot::People, "4".to_string()),
            ],
        )]);

        let constraints = state.belief.constraints_for(Domain::Restaurant);
        assert_eq!(constraints.get(&Slot::Food).map(String::as_str), Some("chinese"));
        assert!(!constraints.contains_key(&Slot::Day));

        let booking = state.belief.booking_for(Domain::Restaurant);
        assert_eq!(booking.get(&Slot::Day).map(String::as_str), Some("tuesday"));
        assert_eq!(booking.get(&Slot::People).map(String::as_str), Some("4"));
    }

    #[test]
    fn reinforming_a_slot_overwrites_the_value() {
        let mut state = DialogState::default();
        state.apply_user_acts(&[DialogAct::inform(
            Domain::Hotel,
            vec![(Slot::Area, "north".to_string())],
        )]);
        state.apply_user_acts(&[DialogAct::inform(
            Domain::Hotel,
            vec![(Slot::Area, "centre".to_string())],
        )]);

        assert_eq!(
            state.belief.constraints_for(Domain::Hotel).get(&Slot::Area).map(String::as_str),
            Some("centre")
        );
    }

    #[test]
    fn system_inform_resolves_pending_requests() {
        let mut state = DialogState::default();
        state.apply_user_acts(&[DialogAct::request(
            Domain::Attraction,
            vec![Slot::Phone, Slot::Address],
        )]);
        assert_eq!(state.requests.pending_for(Domain::Attraction).len(), 2);

        state.apply_system_acts(&[DialogAct::inform(
            Domain::Attraction,
            vec![(Slot::Phone, "01223-336540".to_string())],
        )]);

        let pending = state.requests.pending_for(Domain::Attraction);
        assert!(!pending.contains(&Slot::Phone));
        assert!(pending.contains(&Slot::Address));
    }

    #[test]
    fn bye_from_either_role_terminates() {
        let mut state = DialogState::default();
        state.apply_system_acts(&[DialogAct::general(ActType::Bye)]);
        assert!(state.terminated);

        let mut state = DialogState::default();
        state.apply_user_acts(&[DialogAct::general(ActType::Bye)]);
        assert!(state.terminated);
    }

    #[test]
    fn history_interleaves_roles_in_arrival_order() {
        let mut state = DialogState::default();
        state.apply_user_acts(&[DialogAct::general(ActType::Greet)]);
        state.apply_system_acts(&[DialogAct::general(ActType::Welcome)]);
        state.apply_user_acts(&[DialogAct::request(Domain::Hotel, vec![Slot::Phone])]);

        let roles: Vec<DialogRole> = state.history.iter().map(|turn| turn.role).collect();
        assert_eq!(roles, vec![DialogRole::User, DialogRole::System, DialogRole::User]);
        assert_eq!(state.user_action.len(), 1);
        assert_eq!(state.user_action[0].act_type, ActType::Request);
    }

    #[test]
    fn untouched_domains_expose_empty_views() {
        let state = DialogState::default();
        assert!(state.belief.constraints_for(Domain::Restaurant).is_empty());
        assert!(state.belief.booking_for(Domain::Hotel).is_empty());
        assert!(state.requests.pending_for(Domain::Attraction).is_empty());
    }
}
