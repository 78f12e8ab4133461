use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::directory::{VenueDirectory, DONTCARE};
use crate::domain::act::Domain;
use crate::domain::goal::{DomainGoal, UserGoal};
use crate::errors::DomainError;
use crate::ontology::{Ontology, Slot};

const BOOK_DAYS: &[&str] =
    &["monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday"];
const BOOK_TIMES: &[&str] = &["11:00", "12:30", "17:45", "18:30", "19:15"];
const BOOK_PEOPLE: &[&str] = &["1", "2", "3", "4", "5", "6", "7", "8"];
const BOOK_NIGHTS: &[&str] = &["1", "2", "3", "4", "5"];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GoalGeneratorConfig {
    pub max_domains: usize,
    pub max_constraints: usize,
    pub max_requests: usize,
    pub book_probability: f64,
    pub dontcare_probability: f64,
}

impl Default for GoalGeneratorConfig {
    fn default() -> Self {
        Self {
            max_domains: 2,
            max_constraints: 3,
            max_requests: 2,
            book_probability: 0.5,
            dontcare_probability: 0.15,
        }
    }
}

/// Samples user goals against a venue directory. Constraint values are drawn
/// from the directory's value pools, so single constraints are always
/// satisfiable; sampled combinations may still match nothing, which
/// exercises the nooffer path.
pub struct GoalGenerator {
    directory: Arc<VenueDirectory>,
    config: GoalGeneratorConfig,
}

impl GoalGenerator {
    pub fn new(
        directory: Arc<VenueDirectory>,
        config: GoalGeneratorConfig,
    ) -> Result<Self, DomainError> {
        let populated = Ontology::venue_domains()
            .iter()
            .any(|&domain| !directory.venues_in(domain).is_empty());
        if !populated {
            return Err(DomainError::EmptyDirectory);
        }
        if sampleable_domains(&directory).is_empty() {
            return Err(DomainError::InvariantViolation(
                "no venue domain carries a sampleable constraint attribute".to_string(),
            ));
        }
        Ok(Self { directory, config })
    }

    pub fn directory(&self) -> &Arc<VenueDirectory> {
        &self.directory
    }

    pub fn generate(&self, rng: &mut StdRng) -> UserGoal {
        let mut available = sampleable_domains(&self.directory);
        available.shuffle(rng);

        let count = rng.gen_range(1..=self.config.max_domains.max(1).min(available.len()));
        let mut goal = UserGoal::default();
        for domain in available.into_iter().take(count) {
            goal.domains.push(self.generate_domain_goal(domain, rng));
        }
        goal
    }

    fn generate_domain_goal(&self, domain: Domain, rng: &mut StdRng) -> DomainGoal {
        let mut goal = DomainGoal::new(domain);

        // Name is informable but makes a poor sampled constraint: it pins
        // the search to one venue before the dialog starts.
        let mut constraint_pool: Vec<Slot> = Ontology::informable_slots(domain)
            .iter()
            .copied()
            .filter(|&slot| slot != Slot::Name)
            .filter(|&slot| !self.directory.value_pool(domain, slot).is_empty())
            .collect();
        constraint_pool.shuffle(rng);

        let constraint_count =
            rng.gen_range(1..=self.config.max_constraints.max(1).min(constraint_pool.len()));
        for &slot in constraint_pool.iter().take(constraint_count) {
            let pool = self.directory.value_pool(domain, slot);
            let mut value = pool[rng.gen_range(0..pool.len())].clone();
            if rng.gen_bool(self.config.dontcare_probability) {
                value = DONTCARE.to_string();
            }
            goal.info.insert(slot, value);
        }

        let mut request_pool: Vec<Slot> = Ontology::requestable_slots(domain)
            .iter()
            .copied()
            .filter(|&slot| slot != Slot::Ref && !goal.info.contains_key(&slot))
            .collect();
        request_pool.shuffle(rng);

        if !request_pool.is_empty() {
            let request_count =
                rng.gen_range(1..=self.config.max_requests.max(1).min(request_pool.len()));
            for &slot in request_pool.iter().take(request_count) {
                goal.reqt.insert(slot);
            }
        }

        if Ontology::is_bookable(domain) && rng.gen_bool(self.config.book_probability) {
            for &slot in Ontology::book_slots(domain) {
                goal.book.insert(slot, booking_value(slot, rng));
            }
            goal.reqt.insert(Slot::Ref);
        }

        goal
    }
}

/// Domains a goal may land in: populated, with at least one non-Name
/// informable attribute present to sample constraints from.
fn sampleable_domains(directory: &VenueDirectory) -> Vec<Domain> {
    Ontology::venue_domains()
        .iter()
        .copied()
        .filter(|&domain| !directory.venues_in(domain).is_empty())
        .filter(|&domain| {
            Ontology::informable_slots(domain)
                .iter()
                .any(|&slot| slot != Slot::Name && !directory.value_pool(domain, slot).is_empty())
        })
        .collect()
}

fn booking_value(slot: Slot, rng: &mut StdRng) -> String {
    let pool: &[&str] = match slot {
        Slot::Day => BOOK_DAYS,
        Slot::Time => BOOK_TIMES,
        Slot::People => BOOK_PEOPLE,
        Slot::Nights => BOOK_NIGHTS,
        _ => &["1"],
    };
    pool[rng.gen_range(0..pool.len())].to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::directory::{Venue, VenueDirectory, VenueId};
    use crate::domain::act::Domain;
    use crate::errors::DomainError;
    use crate::ontology::{Ontology, Slot};

    use super::{GoalGenerator, GoalGeneratorConfig};

    fn generator() -> GoalGenerator {
        GoalGenerator::new(Arc::new(VenueDirectory::builtin()), GoalGeneratorConfig::default())
            .expect("builtin directory is populated")
    }

    #[test]
    fn empty_directory_is_rejected() {
        let error =
            GoalGenerator::new(Arc::new(VenueDirectory::default()), GoalGeneratorConfig::default())
                .err()
                .expect("empty directory must fail");
        assert_eq!(error, DomainError::EmptyDirectory);
    }

    fn name_only_venue(id: &str, domain: Domain, name: &str) -> Venue {
        Venue {
            id: VenueId(id.to_string()),
            domain,
            attrs: [(Slot::Name, name.to_string())].into(),
        }
    }

    #[test]
    fn directory_without_sampleable_constraints_is_rejected() {
        // Populated, but the only attribute is Name, which is never sampled
        // as a constraint.
        let directory = VenueDirectory::new(vec![name_only_venue(
            "restaurant-nameless",
            Domain::Restaurant,
            "the nameless",
        )]);
        let error = GoalGenerator::new(Arc::new(directory), GoalGeneratorConfig::default())
            .err()
            .expect("constraint-free directory must fail");
        assert!(matches!(error, DomainError::InvariantViolation(_)), "got {error:?}");
    }

    #[test]
    fn generation_skips_domains_without_sampleable_constraints() {
        let mut venues: Vec<Venue> = VenueDirectory::builtin()
            .venues_in(Domain::Restaurant)
            .into_iter()
            .cloned()
            .collect();
        venues.push(name_only_venue("hotel-bare", Domain::Hotel, "bare rooms"));

        let generator =
            GoalGenerator::new(Arc::new(VenueDirectory::new(venues)), GoalGeneratorConfig::default())
                .expect("restaurants remain sampleable");
        for seed in 0..30 {
            let goal = generator.generate(&mut StdRng::seed_from_u64(seed));
            assert!(!goal.domains.is_empty());
            assert!(
                goal.domains.iter().all(|domain_goal| domain_goal.domain == Domain::Restaurant),
                "seed {seed} sampled the constraint-free hotel domain"
            );
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let generator = generator();
        let first = generator.generate(&mut StdRng::seed_from_u64(7));
        let second = generator.generate(&mut StdRng::seed_from_u64(7));
        assert_eq!(first, second);
    }

    #[test]
    fn every_domain_goal_has_constraints_and_requests() {
        let generator = generator();
        for seed in 0..50 {
            let goal = generator.generate(&mut StdRng::seed_from_u64(seed));
            assert!(!goal.domains.is_empty());
            for domain_goal in &goal.domains {
                assert!(!domain_goal.info.is_empty(), "seed {seed} produced empty constraints");
                assert!(!domain_goal.reqt.is_empty(), "seed {seed} produced empty requests");
                for slot in &domain_goal.reqt {
                    assert!(
                        !domain_goal.info.contains_key(slot),
                        "seed {seed} requested a constrained slot"
                    );
                }
            }
        }
    }

    #[test]
    fn booking_goals_fill_every_book_slot_and_request_ref() {
        let generator = generator();
        let mut saw_booking = false;
        for seed in 0..50 {
            let goal = generator.generate(&mut StdRng::seed_from_u64(seed));
            for domain_goal in &goal.domains {
                if !domain_goal.wants_booking() {
                    continue;
                }
                saw_booking = true;
                for &slot in Ontology::book_slots(domain_goal.domain) {
                    assert!(domain_goal.book.contains_key(&slot));
                }
                assert!(domain_goal.reqt.contains(&Slot::Ref));
            }
        }
        assert!(saw_booking, "expected at least one booking goal across 50 seeds");
    }

    #[test]
    fn domains_are_distinct_within_a_goal() {
        let generator = generator();
        for seed in 0..20 {
            let goal = generator.generate(&mut StdRng::seed_from_u64(seed));
            let mut domains: Vec<_> = goal.domains.iter().map(|g| g.domain).collect();
            domains.sort();
            domains.dedup();
            assert_eq!(domains.len(), goal.domains.len());
        }
    }
}
