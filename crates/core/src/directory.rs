use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::act::Domain;
use crate::ontology::Slot;

pub const DONTCARE: &str = "dontcare";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VenueId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    pub id: VenueId,
    pub domain: Domain,
    pub attrs: BTreeMap<Slot, String>,
}

impl Venue {
    pub fn attr(&self, slot: Slot) -> Option<&str> {
        self.attrs.get(&slot).map(String::as_str)
    }

    pub fn name(&self) -> &str {
        self.attr(Slot::Name).unwrap_or("")
    }
}

/// In-memory venue catalog backing inform/recommend/book decisions.
/// Query results keep the directory's insertion order, so selection is
/// deterministic.
#[derive(Clone, Debug, Default)]
pub struct VenueDirectory {
    venues: Vec<Venue>,
}

/// Seed row for the builtin directory. Attribute values are lowercase.
struct VenueSeed {
    id: &'static str,
    domain: Domain,
    attrs: &'static [(Slot, &'static str)],
}

const VENUE_SEEDS: &[VenueSeed] = &[
    VenueSeed {
        id: "restaurant-golden-wok",
        domain: Domain::Restaurant,
        attrs: &[
            (Slot::Name, "golden wok"),
            (Slot::Area, "centre"),
            (Slot::Food, "chinese"),
            (Slot::PriceRange, "moderate"),
            (Slot::Address, "191 histon road"),
            (Slot::Phone, "01223-350688"),
            (Slot::Postcode, "cb43hl"),
        ],
    },
    VenueSeed {
        id: "restaurant-la-tasca",
        domain: Domain::Restaurant,
        attrs: &[
            (Slot::Name, "la tasca"),
            (Slot::Area, "centre"),
            (Slot::Food, "spanish"),
            (Slot::PriceRange, "expensive"),
            (Slot::Address, "14 bridge street"),
            (Slot::Phone, "01223-464630"),
            (Slot::Postcode, "cb21uf"),
        ],
    },
    VenueSeed {
        id: "restaurant-curry-prince",
        domain: Domain::Restaurant,
        attrs: &[
            (Slot::Name, "curry prince"),
            (Slot::Area, "east"),
            (Slot::Food, "indian"),
            (Slot::PriceRange, "moderate"),
            (Slot::Address, "451 newmarket road"),
            (Slot::Phone, "01223-566388"),
            (Slot::Postcode, "cb58jj"),
        ],
    },
    VenueSeed {
        id: "restaurant-pizza-hut-cherry-hinton",
        domain: Domain::Restaurant,
        attrs: &[
            (Slot::Name, "pizza hut cherry hinton"),
            (Slot::Area, "south"),
            (Slot::Food, "italian"),
            (Slot::PriceRange, "cheap"),
            (Slot::Address, "g4 cambridge leisure park"),
            (Slot::Phone, "01223-323737"),
            (Slot::Postcode, "cb17dy"),
        ],
    },
    VenueSeed {
        id: "restaurant-the-gardenia",
        domain: Domain::Restaurant,
        attrs: &[
            (Slot::Name, "the gardenia"),
            (Slot::Area, "centre"),
            (Slot::Food, "mediterranean"),
            (Slot::PriceRange, "cheap"),
            (Slot::Address, "2 rose crescent"),
            (Slot::Phone, "01223-356354"),
            (Slot::Postcode, "cb23ll"),
        ],
    },
    VenueSeed {
        id: "hotel-acorn-guest-house",
        domain: Domain::Hotel,
        attrs: &[
            (Slot::Name, "acorn guest house"),
            (Slot::Area, "north"),
            (Slot::PriceRange, "moderate"),
            (Slot::Stars, "4"),
            (Slot::Parking, "yes"),
            (Slot::Address, "154 chesterton road"),
            (Slot::Phone, "01223-353888"),
            (Slot::Postcode, "cb41da"),
        ],
    },
    VenueSeed {
        id: "hotel-gonville",
        domain: Domain::Hotel,
        attrs: &[
            (Slot::Name, "gonville hotel"),
            (Slot::Area, "centre"),
            (Slot::PriceRange, "expensive"),
            (Slot::Stars, "3"),
            (Slot::Parking, "yes"),
            (Slot::Address, "gonville place"),
            (Slot::Phone, "01223-366611"),
            (Slot::Postcode, "cb11ly"),
        ],
    },
    VenueSeed {
        id: "hotel-cityroomz",
        domain: Domain::Hotel,
        attrs: &[
            (Slot::Name, "cityroomz"),
            (Slot::Area, "centre"),
            (Slot::PriceRange, "moderate"),
            (Slot::Stars, "0"),
            (Slot::Parking, "no"),
            (Slot::Address, "sleeperz hotel, station road"),
            (Slot::Phone, "01223-304050"),
            (Slot::Postcode, "cb12tz"),
        ],
    },
    VenueSeed {
        id: "hotel-worth-house",
        domain: Domain::Hotel,
        attrs: &[
            (Slot::Name, "worth house"),
            (Slot::Area, "north"),
            (Slot::PriceRange, "cheap"),
            (Slot::Stars, "4"),
            (Slot::Parking, "yes"),
            (Slot::Address, "152 chesterton road"),
            (Slot::Phone, "01223-316074"),
            (Slot::Postcode, "cb41da"),
        ],
    },
    VenueSeed {
        id: "attraction-scott-polar-museum",
        domain: Domain::Attraction,
        attrs: &[
            (Slot::Name, "scott polar museum"),
            (Slot::Area, "centre"),
            (Slot::Kind, "museum"),
            (Slot::Address, "lensfield road"),
            (Slot::Phone, "01223-336540"),
            (Slot::Postcode, "cb21er"),
        ],
    },
    VenueSeed {
        id: "attraction-cineworld",
        domain: Domain::Attraction,
        attrs: &[
            (Slot::Name, "cineworld cinema"),
            (Slot::Area, "south"),
            (Slot::Kind, "cinema"),
            (Slot::Address, "cambridge leisure park, clifton way"),
            (Slot::Phone, "00871-200-2000"),
            (Slot::Postcode, "cb17dy"),
        ],
    },
    VenueSeed {
        id: "attraction-botanic-gardens",
        domain: Domain::Attraction,
        attrs: &[
            (Slot::Name, "cambridge university botanic gardens"),
            (Slot::Area, "centre"),
            (Slot::Kind, "park"),
            (Slot::Address, "bateman street"),
            (Slot::Phone, "01223-336265"),
            (Slot::Postcode, "cb21jf"),
        ],
    },
    VenueSeed {
        id: "attraction-funky-fun-house",
        domain: Domain::Attraction,
        attrs: &[
            (Slot::Name, "funky fun house"),
            (Slot::Area, "east"),
            (Slot::Kind, "entertainment"),
            (Slot::Address, "8 mercers row"),
            (Slot::Phone, "01223-304705"),
            (Slot::Postcode, "cb58hy"),
        ],
    },
];

impl VenueDirectory {
    pub fn new(venues: Vec<Venue>) -> Self {
        Self { venues }
    }

    /// Compact builtin catalog covering every code path: inform, recommend,
    /// narrowing questions, booking, and empty result sets.
    pub fn builtin() -> Self {
        let venues = VENUE_SEEDS
            .iter()
            .map(|seed| Venue {
                id: VenueId(seed.id.to_string()),
                domain: seed.domain,
                attrs: seed
                    .attrs
                    .iter()
                    .map(|&(slot, value)| (slot, value.to_string()))
                    .collect(),
            })
            .collect();
        Self { venues }
    }

    /// Equality match on each constraint. The value `"dontcare"` matches any
    /// venue; a constraint on a slot a venue lacks rejects that venue.
    pub fn query(&self, domain: Domain, constraints: &[(Slot, &str)]) -> Vec<&Venue> {
        self.venues
            .iter()
            .filter(|venue| venue.domain == domain)
            .filter(|venue| {
                constraints.iter().all(|&(slot, value)| {
                    if value == DONTCARE {
                        return true;
                    }
                    venue.attr(slot).map(|attr| attr.eq_ignore_ascii_case(value)).unwrap_or(false)
                })
            })
            .collect()
    }

    pub fn find_by_name(&self, domain: Domain, name: &str) -> Option<&Venue> {
        self.venues
            .iter()
            .find(|venue| venue.domain == domain && venue.name().eq_ignore_ascii_case(name))
    }

    pub fn get(&self, id: &VenueId) -> Option<&Venue> {
        self.venues.iter().find(|venue| &venue.id == id)
    }

    pub fn venues_in(&self, domain: Domain) -> Vec<&Venue> {
        self.venues.iter().filter(|venue| venue.domain == domain).collect()
    }

    pub fn len(&self) -> usize {
        self.venues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }

    /// Distinct values present for a slot in a domain, sorted. Used by goal
    /// sampling and the doctor integrity check.
    pub fn value_pool(&self, domain: Domain, slot: Slot) -> Vec<String> {
        let values: BTreeSet<String> = self
            .venues
            .iter()
            .filter(|venue| venue.domain == domain)
            .filter_map(|venue| venue.attr(slot))
            .map(str::to_string)
            .collect();
        values.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::act::Domain;
    use crate::ontology::{Ontology, Slot};

    use super::{VenueDirectory, VenueId, DONTCARE};

    #[test]
    fn builtin_venues_carry_core_and_informable_attributes() {
        let directory = VenueDirectory::builtin();
        for &domain in Ontology::venue_domains() {
            let venues = directory.venues_in(domain);
            assert!(venues.len() >= 4, "{domain} needs at least four venues");
            for venue in venues {
                for slot in [Slot::Name, Slot::Area, Slot::Address, Slot::Phone, Slot::Postcode] {
                    assert!(venue.attr(slot).is_some(), "{} is missing {slot}", venue.id.0);
                }
                for &slot in Ontology::informable_slots(domain) {
                    assert!(venue.attr(slot).is_some(), "{} is missing {slot}", venue.id.0);
                }
            }
        }
    }

    #[test]
    fn query_without_constraints_returns_whole_domain() {
        let directory = VenueDirectory::builtin();
        assert_eq!(
            directory.query(Domain::Restaurant, &[]).len(),
            directory.venues_in(Domain::Restaurant).len()
        );
    }

    #[test]
    fn query_matches_constraints_in_insertion_order() {
        let directory = VenueDirectory::builtin();
        let matches = directory.query(Domain::Restaurant, &[(Slot::Area, "centre")]);
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].name(), "golden wok");
    }

    #[test]
    fn dontcare_matches_any_venue() {
        let directory = VenueDirectory::builtin();
        let all = directory.query(Domain::Hotel, &[(Slot::Area, DONTCARE)]);
        assert_eq!(all.len(), directory.venues_in(Domain::Hotel).len());
    }

    #[test]
    fn constraint_on_missing_slot_rejects_venue() {
        let directory = VenueDirectory::builtin();
        // Attractions carry no stars attribute.
        assert!(directory.query(Domain::Attraction, &[(Slot::Stars, "4")]).is_empty());
    }

    #[test]
    fn unsatisfiable_combination_returns_empty() {
        let directory = VenueDirectory::builtin();
        let matches = directory
            .query(Domain::Restaurant, &[(Slot::Area, "north"), (Slot::Food, "chinese")]);
        assert!(matches.is_empty());
    }

    #[test]
    fn find_by_name_is_case_insensitive() {
        let directory = VenueDirectory::builtin();
        let venue =
            directory.find_by_name(Domain::Hotel, "Gonville Hotel").expect("gonville exists");
        assert_eq!(venue.id, VenueId("hotel-gonville".to_string()));
    }

    #[test]
    fn value_pool_is_sorted_and_distinct() {
        let directory = VenueDirectory::builtin();
        let pool = directory.value_pool(Domain::Restaurant, Slot::PriceRange);
        assert_eq!(pool, vec!["cheap", "expensive", "moderate"]);
    }
}
