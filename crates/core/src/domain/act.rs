use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::ontology::Slot;

/// Dialog domains. `General` carries the courtesy acts that are not tied to
/// a venue domain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Restaurant,
    Hotel,
    Attraction,
    #[default]
    General,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Restaurant => "restaurant",
            Self::Hotel => "hotel",
            Self::Attraction => "attraction",
            Self::General => "general",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActType {
    Inform,
    Request,
    Recommend,
    Select,
    Book,
    NoOffer,
    NoBook,
    Greet,
    Welcome,
    Thank,
    Bye,
    Reqmore,
}

impl ActType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inform => "inform",
            Self::Request => "request",
            Self::Recommend => "recommend",
            Self::Select => "select",
            Self::Book => "book",
            Self::NoOffer => "nooffer",
            Self::NoBook => "nobook",
            Self::Greet => "greet",
            Self::Welcome => "welcome",
            Self::Thank => "thank",
            Self::Bye => "bye",
            Self::Reqmore => "reqmore",
        }
    }

    /// Courtesy acts that always live in the `General` domain and carry no
    /// slots.
    pub fn is_general(&self) -> bool {
        matches!(self, Self::Greet | Self::Welcome | Self::Thank | Self::Bye | Self::Reqmore)
    }
}

impl fmt::Display for ActType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotValue {
    pub slot: Slot,
    pub value: String,
}

/// A single typed dialog act. `Request` acts carry slots with empty values;
/// value-bearing acts carry filled values. The constructors enforce the
/// shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogAct {
    pub act_type: ActType,
    pub domain: Domain,
    pub slots: Vec<SlotValue>,
}

impl DialogAct {
    pub fn new(act_type: ActType, domain: Domain, slots: Vec<SlotValue>) -> Self {
        Self { act_type, domain, slots }
    }

    pub fn inform(domain: Domain, slots: Vec<(Slot, String)>) -> Self {
        Self {
            act_type: ActType::Inform,
            domain,
            slots: slots.into_iter().map(|(slot, value)| SlotValue { slot, value }).collect(),
        }
    }

    pub fn request(domain: Domain, slots: Vec<Slot>) -> Self {
        Self {
            act_type: ActType::Request,
            domain,
            slots: slots
                .into_iter()
                .map(|slot| SlotValue { slot, value: String::new() })
                .collect(),
        }
    }

    pub fn general(act_type: ActType) -> Self {
        debug_assert!(act_type.is_general());
        Self { act_type, domain: Domain::General, slots: Vec::new() }
    }

    pub fn slot_value(&self, slot: Slot) -> Option<&str> {
        self.slots.iter().find(|entry| entry.slot == slot).map(|entry| entry.value.as_str())
    }

    pub fn slot_names(&self) -> impl Iterator<Item = Slot> + '_ {
        self.slots.iter().map(|entry| entry.slot)
    }
}

impl fmt::Display for DialogAct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}(", self.domain, self.act_type)?;
        for (index, entry) in self.slots.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            if entry.value.is_empty() {
                write!(f, "{}", entry.slot)?;
            } else {
                write!(f, "{}={}", entry.slot, entry.value)?;
            }
        }
        f.write_str(")")
    }
}

/// The two sides of a dialog. The wire flags are exactly `"sys"` and
/// `"usr"`; anything else is rejected at parse time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogRole {
    System,
    User,
}

impl DialogRole {
    pub fn as_flag(&self) -> &'static str {
        match self {
            Self::System => "sys",
            Self::User => "usr",
        }
    }
}

impl std::str::FromStr for DialogRole {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "sys" => Ok(Self::System),
            "usr" => Ok(Self::User),
            other => Err(DomainError::UnsupportedRole(other.to_string())),
        }
    }
}

impl fmt::Display for DialogRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_flag())
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::DomainError;
    use crate::ontology::Slot;

    use super::{ActType, DialogAct, DialogRole, Domain};

    #[test]
    fn role_flag_parses_sys_and_usr() {
        assert_eq!("sys".parse::<DialogRole>().expect("sys"), DialogRole::System);
        assert_eq!("usr".parse::<DialogRole>().expect("usr"), DialogRole::User);
        assert_eq!(DialogRole::System.as_flag(), "sys");
        assert_eq!(DialogRole::User.as_flag(), "usr");
    }

    #[test]
    fn role_flag_rejects_unknown_value() {
        let error = "agent".parse::<DialogRole>().expect_err("must reject unknown flag");
        assert_eq!(error, DomainError::UnsupportedRole("agent".to_string()));
        assert!(error.to_string().contains("agent"));
        assert!(error.to_string().contains("sys|usr"));
    }

    #[test]
    fn request_slots_carry_empty_values() {
        let act = DialogAct::request(Domain::Restaurant, vec![Slot::Phone, Slot::Address]);
        assert_eq!(act.act_type, ActType::Request);
        assert!(act.slots.iter().all(|entry| entry.value.is_empty()));
        assert_eq!(act.slot_value(Slot::Phone), Some(""));
    }

    #[test]
    fn general_acts_carry_no_slots() {
        let act = DialogAct::general(ActType::Welcome);
        assert_eq!(act.domain, Domain::General);
        assert!(act.slots.is_empty());
    }

    #[test]
    fn display_renders_act_with_slot_values() {
        let act = DialogAct::inform(
            Domain::Hotel,
            vec![(Slot::Area, "north".to_string()), (Slot::Stars, "4".to_string())],
        );
        assert_eq!(act.to_string(), "hotel-inform(area=north, stars=4)");
    }
}
