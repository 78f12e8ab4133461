use std::collections::{BTreeMap, BTreeSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use parley_core::{
    ActType, DialogAct, DialogState, Domain, GoalGenerator, Slot, SlotValue, UserGoal, DONTCARE,
};

use crate::policy::{DialogPolicy, PolicyError};

/// Relaxation order when the system reports no matching venue.
const RELAX_ORDER: &[Slot] = &[Slot::PriceRange, Slot::Area];

#[derive(Clone, Debug, PartialEq, Eq)]
enum AgendaItem {
    Inform { domain: Domain, slot: Slot, value: String },
    Request { domain: Domain, slot: Slot },
    Bye,
}

/// Stack-based user simulator. The agenda holds the user's remaining moves,
/// constraint informs on top, a `Bye` always at the bottom. Each turn first
/// reacts to the system's last action, then surfaces a sampled batch of
/// agenda items as the user action.
pub struct AgendaUserPolicy {
    generator: GoalGenerator,
    rng: StdRng,
    goal: UserGoal,
    agenda: Vec<AgendaItem>,
    fulfilled: BTreeMap<Domain, BTreeSet<Slot>>,
    booked: BTreeSet<Domain>,
    booking_failed: bool,
    goal_failed: bool,
    terminated: bool,
    user_turns: u32,
    max_turns: u32,
    max_initiative: usize,
}

impl AgendaUserPolicy {
    pub fn new(
        generator: GoalGenerator,
        seed: u64,
        max_turns: u32,
        max_initiative: usize,
    ) -> Self {
        let mut policy = Self {
            generator,
            rng: StdRng::seed_from_u64(seed),
            goal: UserGoal::default(),
            agenda: Vec::new(),
            fulfilled: BTreeMap::new(),
            booked: BTreeSet::new(),
            booking_failed: false,
            goal_failed: false,
            terminated: false,
            user_turns: 0,
            max_turns,
            max_initiative: max_initiative.max(1),
        };
        policy.init_session();
        policy
    }

    pub fn goal(&self) -> &UserGoal {
        &self.goal
    }

    /// Success means every requested slot was answered, every booking goal
    /// was booked, and no failure was recorded along the way.
    pub fn goal_satisfied(&self) -> bool {
        if self.goal_failed || self.booking_failed {
            return false;
        }
        self.goal.domains.iter().all(|domain_goal| {
            let answered = self.fulfilled.get(&domain_goal.domain);
            let all_answered = domain_goal
                .reqt
                .iter()
                .all(|slot| answered.map(|set| set.contains(slot)).unwrap_or(false));
            let booked = !domain_goal.wants_booking() || self.booked.contains(&domain_goal.domain);
            all_answered && booked
        })
    }

    fn build_agenda(&mut self) {
        self.agenda.clear();
        self.agenda.push(AgendaItem::Bye);
        for domain_goal in self.goal.domains.iter().rev() {
            let domain = domain_goal.domain;
            for &slot in &domain_goal.reqt {
                self.agenda.push(AgendaItem::Request { domain, slot });
            }
            for (&slot, value) in &domain_goal.book {
                self.agenda.push(AgendaItem::Inform { domain, slot, value: value.clone() });
            }
            for (&slot, value) in &domain_goal.info {
                self.agenda.push(AgendaItem::Inform { domain, slot, value: value.clone() });
            }
        }
    }

    fn push_inform(&mut self, domain: Domain, slot: Slot, value: String) {
        self.agenda.retain(|item| {
            !matches!(item, AgendaItem::Inform { domain: d, slot: s, .. } if *d == domain && *s == slot)
        });
        self.agenda.push(AgendaItem::Inform { domain, slot, value });
    }

    fn drop_pending_request(&mut self, domain: Domain, slot: Slot) {
        self.agenda.retain(|item| {
            !matches!(item, AgendaItem::Request { domain: d, slot: s } if *d == domain && *s == slot)
        });
    }

    fn mark_fulfilled(&mut self, domain: Domain, slot: Slot) {
        self.fulfilled.entry(domain).or_default().insert(slot);
        self.drop_pending_request(domain, slot);
    }

    fn goal_value(&self, domain: Domain, slot: Slot) -> Option<String> {
        let domain_goal = self.goal.domain_goal(domain)?;
        domain_goal.info.get(&slot).or_else(|| domain_goal.book.get(&slot)).cloned()
    }

    fn handle_system_act(&mut self, act: &DialogAct) {
        let domain = act.domain;
        match act.act_type {
            ActType::Request => {
                for slot in act.slot_names().collect::<Vec<_>>() {
                    let value =
                        self.goal_value(domain, slot).unwrap_or_else(|| DONTCARE.to_string());
                    self.push_inform(domain, slot, value);
                }
            }
            ActType::Inform => {
                for entry in act.slots.clone() {
                    let requested = self
                        .goal
                        .domain_goal(domain)
                        .map(|goal| goal.reqt.contains(&entry.slot))
                        .unwrap_or(false);
                    if requested {
                        self.mark_fulfilled(domain, entry.slot);
                    }
                    if let Some(wanted) = self
                        .goal
                        .domain_goal(domain)
                        .and_then(|goal| goal.info.get(&entry.slot).cloned())
                    {
                        if wanted != DONTCARE && wanted != entry.value {
                            self.push_inform(domain, entry.slot, wanted);
                        }
                    }
                }
            }
            ActType::Recommend | ActType::Select => {
                let offered = act.slot_value(Slot::Name).unwrap_or_default().to_string();
                if let Some(wanted) = self
                    .goal
                    .domain_goal(domain)
                    .and_then(|goal| goal.info.get(&Slot::Name).cloned())
                {
                    if wanted != DONTCARE && !wanted.eq_ignore_ascii_case(&offered) {
                        self.push_inform(domain, Slot::Name, wanted);
                    }
                }
            }
            ActType::NoOffer => self.relax_constraint(domain),
            ActType::Book => {
                self.booked.insert(domain);
                let wanted_ref = self
                    .goal
                    .domain_goal(domain)
                    .map(|goal| goal.reqt.contains(&Slot::Ref))
                    .unwrap_or(false);
                if wanted_ref {
                    self.mark_fulfilled(domain, Slot::Ref);
                }
            }
            ActType::NoBook => {
                self.booking_failed = true;
                self.abandon_domain(domain);
            }
            ActType::Bye => self.terminated = true,
            _ => {}
        }
    }

    /// Rewrite one remaining constraint to `dontcare` and re-inform it.
    /// With nothing left to relax the goal has failed and the agenda
    /// collapses to the farewell.
    fn relax_constraint(&mut self, domain: Domain) {
        let Some(domain_goal) = self.goal.domain_goal_mut(domain) else {
            return;
        };

        let candidate = RELAX_ORDER
            .iter()
            .copied()
            .find(|slot| {
                domain_goal.info.get(slot).map(|value| value != DONTCARE).unwrap_or(false)
            })
            .or_else(|| {
                domain_goal
                    .info
                    .iter()
                    .find(|(_, value)| value.as_str() != DONTCARE)
                    .map(|(&slot, _)| slot)
            });

        match candidate {
            Some(slot) => {
                domain_goal.info.insert(slot, DONTCARE.to_string());
                self.push_inform(domain, slot, DONTCARE.to_string());
            }
            None => {
                self.goal_failed = true;
                self.agenda = vec![AgendaItem::Bye];
            }
        }
    }

    fn abandon_domain(&mut self, domain: Domain) {
        self.agenda.retain(|item| match item {
            AgendaItem::Inform { domain: d, .. } | AgendaItem::Request { domain: d, .. } => {
                *d != domain
            }
            AgendaItem::Bye => true,
        });
    }

    /// Pop a sampled batch off the agenda. `Bye` is only popped when it is
    /// the first item of the batch; it never rides along mid-batch.
    fn pop_batch(&mut self) -> Vec<AgendaItem> {
        let batch_size = self.rng.gen_range(1..=self.max_initiative);
        let mut items = Vec::new();
        for _ in 0..batch_size {
            match self.agenda.last() {
                Some(AgendaItem::Bye) => {
                    if items.is_empty() {
                        self.agenda.pop();
                        self.terminated = true;
                        items.push(AgendaItem::Bye);
                    }
                    break;
                }
                Some(_) => {
                    if let Some(item) = self.agenda.pop() {
                        items.push(item);
                    }
                }
                None => break,
            }
        }
        items
    }
}

fn items_to_acts(items: Vec<AgendaItem>) -> Vec<DialogAct> {
    let mut acts: Vec<DialogAct> = Vec::new();
    for item in items {
        match item {
            AgendaItem::Inform { domain, slot, value } => {
                match acts.last_mut() {
                    Some(act) if act.act_type == ActType::Inform && act.domain == domain => {
                        act.slots.push(SlotValue { slot, value });
                    }
                    _ => acts.push(DialogAct::inform(domain, vec![(slot, value)])),
                }
            }
            AgendaItem::Request { domain, slot } => match acts.last_mut() {
                Some(act) if act.act_type == ActType::Request && act.domain == domain => {
                    act.slots.push(SlotValue { slot, value: String::new() });
                }
                _ => acts.push(DialogAct::request(domain, vec![slot])),
            },
            AgendaItem::Bye => acts.push(DialogAct::general(ActType::Bye)),
        }
    }
    acts
}

impl DialogPolicy for AgendaUserPolicy {
    fn predict(&mut self, state: &DialogState) -> Result<Vec<DialogAct>, PolicyError> {
        if self.terminated {
            return Ok(Vec::new());
        }

        self.user_turns += 1;
        if self.user_turns > self.max_turns / 2 {
            self.goal_failed = true;
            self.terminated = true;
            return Ok(vec![DialogAct::general(ActType::Bye)]);
        }

        for act in state.system_action.clone() {
            self.handle_system_act(&act);
            if self.terminated {
                return Ok(Vec::new());
            }
        }

        let items = self.pop_batch();
        Ok(items_to_acts(items))
    }

    fn init_session(&mut self) {
        self.goal = self.generator.generate(&mut self.rng);
        self.fulfilled.clear();
        self.booked.clear();
        self.booking_failed = false;
        self.goal_failed = false;
        self.terminated = false;
        self.user_turns = 0;
        self.build_agenda();
    }

    fn is_terminal(&self) -> Option<bool> {
        Some(self.terminated)
    }

    fn get_reward(&self) -> Option<f64> {
        let reward = if self.terminated {
            if self.goal_satisfied() {
                2.0 * f64::from(self.max_turns)
            } else {
                -f64::from(self.max_turns)
            }
        } else {
            -1.0
        };
        Some(reward)
    }
}
