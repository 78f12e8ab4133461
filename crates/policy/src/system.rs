use std::collections::BTreeMap;
use std::sync::Arc;

use uuid::Uuid;

use parley_core::{
    ActType, DialogAct, DialogState, Domain, Ontology, Slot, SlotValue, Venue, VenueDirectory,
    VenueId,
};

use crate::policy::{DialogPolicy, PolicyError};

/// Deterministic rule-based system policy. Per-session memory is limited to
/// the venue recommended per domain and any booking references issued.
pub struct RuleSystemPolicy {
    directory: Arc<VenueDirectory>,
    recommended: BTreeMap<Domain, VenueId>,
    issued_refs: BTreeMap<Domain, String>,
}

impl RuleSystemPolicy {
    pub fn new(directory: Arc<VenueDirectory>) -> Self {
        Self { directory, recommended: BTreeMap::new(), issued_refs: BTreeMap::new() }
    }

    fn respond_for_domain(
        &mut self,
        domain: Domain,
        state: &DialogState,
        acts: &mut Vec<DialogAct>,
    ) -> Result<(), PolicyError> {
        let constraints_map = state.belief.constraints_for(domain);
        let constraints: Vec<(Slot, &str)> =
            constraints_map.iter().map(|(slot, value)| (*slot, value.as_str())).collect();
        let candidates = self.directory.query(domain, &constraints);
        let booking = state.belief.booking_for(domain);

        let remembered = self.recommended.get(&domain).cloned();
        let mut recommendation_stands = false;
        let selected: Option<&Venue> = match remembered {
            Some(id) => {
                let venue = self
                    .directory
                    .get(&id)
                    .ok_or_else(|| PolicyError::MissingVenue { domain, name: id.0.clone() })?;
                if candidates.iter().any(|candidate| candidate.id == id) {
                    recommendation_stands = true;
                    Some(venue)
                } else {
                    self.recommended.remove(&domain);
                    candidates.first().copied()
                }
            }
            None => candidates.first().copied(),
        };

        // Answer pending requests from the selected venue. Ref is only ever
        // answered by an actual booking.
        if let Some(venue) = selected {
            let informs: Vec<(Slot, String)> = state
                .requests
                .pending_for(domain)
                .iter()
                .copied()
                .filter(|&slot| slot != Slot::Ref)
                .map(|slot| (slot, venue.attr(slot).unwrap_or("unknown").to_string()))
                .collect();
            if !informs.is_empty() {
                acts.push(DialogAct::inform(domain, informs));
            }
        }

        if candidates.is_empty() && !constraints.is_empty() {
            let echo = constraints_map
                .iter()
                .map(|(slot, value)| SlotValue { slot: *slot, value: value.clone() })
                .collect();
            acts.push(DialogAct::new(ActType::NoOffer, domain, echo));
            if Ontology::is_bookable(domain) && !booking.is_empty() {
                acts.push(DialogAct::new(ActType::NoBook, domain, Vec::new()));
            }
            return Ok(());
        }

        if Ontology::is_bookable(domain) && !booking.is_empty() {
            if let Some(venue) = selected {
                let missing: Vec<Slot> = Ontology::book_slots(domain)
                    .iter()
                    .copied()
                    .filter(|slot| !booking.contains_key(slot))
                    .collect();
                if missing.is_empty() {
                    let venue_name = venue.name().to_string();
                    let reference = self
                        .issued_refs
                        .entry(domain)
                        .or_insert_with(fresh_reference)
                        .clone();
                    acts.push(DialogAct::new(
                        ActType::Book,
                        domain,
                        vec![
                            SlotValue { slot: Slot::Name, value: venue_name },
                            SlotValue { slot: Slot::Ref, value: reference },
                        ],
                    ));
                } else {
                    acts.push(DialogAct::request(domain, missing));
                }
            } else {
                acts.push(DialogAct::new(ActType::NoBook, domain, Vec::new()));
            }
        }

        let informed_constraints = state.user_action.iter().any(|act| {
            act.act_type == ActType::Inform
                && act.domain == domain
                && act.slots.iter().any(|entry| {
                    !Ontology::book_slots(domain).contains(&entry.slot)
                })
        });

        if !recommendation_stands && informed_constraints {
            let open_slot = Ontology::informable_slots(domain)
                .iter()
                .copied()
                .find(|&slot| slot != Slot::Name && !constraints_map.contains_key(&slot));
            match (candidates.len(), open_slot) {
                (2.., Some(slot)) => acts.push(DialogAct::request(domain, vec![slot])),
                (1.., _) => {
                    let venue = candidates[0];
                    acts.push(DialogAct::new(
                        ActType::Recommend,
                        domain,
                        vec![SlotValue { slot: Slot::Name, value: venue.name().to_string() }],
                    ));
                    self.recommended.insert(domain, venue.id.clone());
                }
                _ => {}
            }
        }

        Ok(())
    }
}

fn fresh_reference() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn user_domains(state: &DialogState) -> Vec<Domain> {
    let mut domains = Vec::new();
    for act in &state.user_action {
        if act.domain != Domain::General && !domains.contains(&act.domain) {
            domains.push(act.domain);
        }
    }
    domains
}

impl DialogPolicy for RuleSystemPolicy {
    fn predict(&mut self, state: &DialogState) -> Result<Vec<DialogAct>, PolicyError> {
        if state.user_action.iter().any(|act| act.act_type == ActType::Bye) {
            return Ok(vec![DialogAct::general(ActType::Bye)]);
        }

        let mut acts = Vec::new();
        if state
            .user_action
            .iter()
            .any(|act| matches!(act.act_type, ActType::Greet | ActType::Thank))
        {
            acts.push(DialogAct::general(ActType::Welcome));
        }

        for domain in user_domains(state) {
            self.respond_for_domain(domain, state, &mut acts)?;
        }

        if acts.is_empty() {
            acts.push(DialogAct::general(ActType::Reqmore));
        }

        Ok(acts)
    }

    fn init_session(&mut self) {
        self.recommended.clear();
        self.issued_refs.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parley_core::{ActType, DialogAct, DialogState, Domain, Slot, VenueDirectory};

    use crate::policy::DialogPolicy;

    use super::RuleSystemPolicy;

    fn policy() -> RuleSystemPolicy {
        RuleSystemPolicy::new(Arc::new(VenueDirectory::builtin()))
    }

    fn act_of<'a>(acts: &'a [DialogAct], act_type: ActType) -> Option<&'a DialogAct> {
        acts.iter().find(|act| act.act_type == act_type)
    }

    #[test]
    fn greet_is_answered_with_welcome() {
        let mut policy = policy();
        let mut state = DialogState::default();
        state.apply_user_acts(&[DialogAct::general(ActType::Greet)]);

        let acts = policy.predict(&state).expect("predict");
        assert_eq!(acts.len(), 1);
        assert_eq!(acts[0].act_type, ActType::Welcome);
    }

    #[test]
    fn bye_is_answered_with_bye_and_nothing_else() {
        let mut policy = policy();
        let mut state = DialogState::default();
        state.apply_user_acts(&[
            DialogAct::general(ActType::Bye),
            DialogAct::request(Domain::Hotel, vec![Slot::Phone]),
        ]);

        let acts = policy.predict(&state).expect("predict");
        assert_eq!(acts, vec![DialogAct::general(ActType::Bye)]);
    }

    #[test]
    fn narrowing_question_when_many_candidates_remain() {
        let mut policy = policy();
        let mut state = DialogState::default();
        state.apply_user_acts(&[DialogAct::inform(
            Domain::Restaurant,
            vec![(Slot::Area, "centre".to_string())],
        )]);

        let acts = policy.predict(&state).expect("predict");
        let request = act_of(&acts, ActType::Request).expect("narrowing request");
        assert_eq!(request.domain, Domain::Restaurant);
        // First unconstrained informable slot after area.
        assert_eq!(request.slots[0].slot, Slot::Food);
    }

    #[test]
    fn unique_match_is_recommended_and_remembered() {
        let mut policy = policy();
        let mut state = DialogState::default();
        state.apply_user_acts(&[DialogAct::inform(
            Domain::Restaurant,
            vec![(Slot::Food, "indian".to_string())],
        )]);

        let acts = policy.predict(&state).expect("predict");
        let recommend = act_of(&acts, ActType::Recommend).expect("recommend");
        assert_eq!(recommend.slot_value(Slot::Name), Some("curry prince"));

        // A second pass with an unchanged belief keeps the recommendation
        // standing instead of repeating it.
        state.apply_system_acts(&acts);
        state.apply_user_acts(&[DialogAct::request(Domain::Restaurant, vec![Slot::Phone])]);
        let followup = policy.predict(&state).expect("predict followup");
        assert!(act_of(&followup, ActType::Recommend).is_none());
        let inform = act_of(&followup, ActType::Inform).expect("phone answer");
        assert_eq!(inform.slot_value(Slot::Phone), Some("01223-566388"));
    }

    #[test]
    fn unsatisfiable_constraints_get_nooffer_with_echo() {
        let mut policy = policy();
        let mut state = DialogState::default();
        state.apply_user_acts(&[DialogAct::inform(
            Domain::Restaurant,
            vec![(Slot::Area, "north".to_string()), (Slot::Food, "chinese".to_string())],
        )]);

        let acts = policy.predict(&state).expect("predict");
        let nooffer = act_of(&acts, ActType::NoOffer).expect("nooffer");
        assert_eq!(nooffer.slot_value(Slot::Area), Some("north"));
        assert_eq!(nooffer.slot_value(Slot::Food), Some("chinese"));
    }

    #[test]
    fn pending_request_for_missing_attribute_answers_unknown() {
        let mut policy = policy();
        let mut state = DialogState::default();
        state.apply_user_acts(&[
            DialogAct::inform(Domain::Attraction, vec![(Slot::Kind, "museum".to_string())]),
            DialogAct::request(Domain::Attraction, vec![Slot::Stars]),
        ]);

        let acts = policy.predict(&state).expect("predict");
        let inform = act_of(&acts, ActType::Inform).expect("inform");
        assert_eq!(inform.slot_value(Slot::Stars), Some("unknown"));
    }

    #[test]
    fn incomplete_booking_requests_missing_slots() {
        let mut policy = policy();
        let mut state = DialogState::default();
        state.apply_user_acts(&[DialogAct::inform(
            Domain::Restaurant,
            vec![
                (Slot::Food, "indian".to_string()),
                (Slot::Day, "friday".to_string()),
            ],
        )]);

        let acts = policy.predict(&state).expect("predict");
        let request = act_of(&acts, ActType::Request).expect("missing book slots");
        let slots: Vec<Slot> = request.slot_names().collect();
        assert_eq!(slots, vec![Slot::Time, Slot::People]);
    }

    #[test]
    fn complete_booking_issues_reference() {
        let mut policy = policy();
        let mut state = DialogState::default();
        state.apply_user_acts(&[DialogAct::inform(
            Domain::Restaurant,
            vec![
                (Slot::Food, "indian".to_string()),
                (Slot::Day, "friday".to_string()),
                (Slot::Time, "18:30".to_string()),
                (Slot::People, "2".to_string()),
            ],
        )]);

        let acts = policy.predict(&state).expect("predict");
        let book = act_of(&acts, ActType::Book).expect("book");
        assert_eq!(book.slot_value(Slot::Name), Some("curry prince"));
        let reference = book.slot_value(Slot::Ref).expect("reference");
        assert_eq!(reference.len(), 8);
        assert!(reference.chars().all(|ch| ch.is_ascii_hexdigit()));

        // A repeated booking turn reuses the remembered reference.
        state.apply_system_acts(&acts);
        state.apply_user_acts(&[DialogAct::inform(
            Domain::Restaurant,
            vec![(Slot::People, "2".to_string())],
        )]);
        let again = policy.predict(&state).expect("predict again");
        let book_again = act_of(&again, ActType::Book).expect("book again");
        assert_eq!(book_again.slot_value(Slot::Ref), Some(reference));
    }

    #[test]
    fn booking_against_empty_candidate_set_is_nobook() {
        let mut policy = policy();
        let mut state = DialogState::default();
        state.apply_user_acts(&[DialogAct::inform(
            Domain::Hotel,
            vec![
                (Slot::Area, "south".to_string()),
                (Slot::Day, "monday".to_string()),
                (Slot::Nights, "2".to_string()),
                (Slot::People, "2".to_string()),
            ],
        )]);

        let acts = policy.predict(&state).expect("predict");
        assert!(act_of(&acts, ActType::NoBook).is_some());
        assert!(act_of(&acts, ActType::Book).is_none());
    }

    #[test]
    fn nothing_actionable_falls_back_to_reqmore() {
        let mut policy = policy();
        let state = DialogState::default();

        let acts = policy.predict(&state).expect("predict");
        assert_eq!(acts, vec![DialogAct::general(ActType::Reqmore)]);
    }

    #[test]
    fn init_session_clears_recommendation_memory() {
        let mut policy = policy();
        let mut state = DialogState::default();
        state.apply_user_acts(&[DialogAct::inform(
            Domain::Restaurant,
            vec![(Slot::Food, "indian".to_string())],
        )]);
        let first = policy.predict(&state).expect("predict");
        assert!(act_of(&first, ActType::Recommend).is_some());

        policy.init_session();
        let second = policy.predict(&state).expect("predict after reset");
        assert!(act_of(&second, ActType::Recommend).is_some());
    }
}
