use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::act::Domain;

/// The closed slot registry shared by every venue domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Area,
    Food,
    PriceRange,
    Stars,
    Parking,
    Kind,
    Name,
    Address,
    Phone,
    Postcode,
    Day,
    Time,
    People,
    Nights,
    Ref,
}

impl Slot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Area => "area",
            Self::Food => "food",
            Self::PriceRange => "pricerange",
            Self::Stars => "stars",
            Self::Parking => "parking",
            Self::Kind => "kind",
            Self::Name => "name",
            Self::Address => "address",
            Self::Phone => "phone",
            Self::Postcode => "postcode",
            Self::Day => "day",
            Self::Time => "time",
            Self::People => "people",
            Self::Nights => "nights",
            Self::Ref => "ref",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Namespace for the per-domain slot tables.
pub struct Ontology;

impl Ontology {
    /// Constraint slots the user may impose when searching a domain.
    pub fn informable_slots(domain: Domain) -> &'static [Slot] {
        match domain {
            Domain::Restaurant => &[Slot::Area, Slot::Food, Slot::PriceRange, Slot::Name],
            Domain::Hotel => {
                &[Slot::Area, Slot::PriceRange, Slot::Stars, Slot::Parking, Slot::Name]
            }
            Domain::Attraction => &[Slot::Area, Slot::Kind, Slot::Name],
            Domain::General => &[],
        }
    }

    /// Slots the user may ask the system for.
    pub fn requestable_slots(domain: Domain) -> &'static [Slot] {
        match domain {
            Domain::Restaurant => &[
                Slot::Address,
                Slot::Phone,
                Slot::Postcode,
                Slot::Food,
                Slot::PriceRange,
                Slot::Ref,
            ],
            Domain::Hotel => &[
                Slot::Address,
                Slot::Phone,
                Slot::Postcode,
                Slot::Stars,
                Slot::Parking,
                Slot::PriceRange,
                Slot::Ref,
            ],
            Domain::Attraction => &[Slot::Address, Slot::Phone, Slot::Postcode, Slot::Kind],
            Domain::General => &[],
        }
    }

    /// Slots a booking needs before the system can issue a reference.
    pub fn book_slots(domain: Domain) -> &'static [Slot] {
        match domain {
            Domain::Restaurant => &[Slot::Day, Slot::Time, Slot::People],
            Domain::Hotel => &[Slot::Day, Slot::Nights, Slot::People],
            Domain::Attraction | Domain::General => &[],
        }
    }

    pub fn is_bookable(domain: Domain) -> bool {
        !Self::book_slots(domain).is_empty()
    }

    pub fn venue_domains() -> &'static [Domain] {
        &[Domain::Restaurant, Domain::Hotel, Domain::Attraction]
    }
}
