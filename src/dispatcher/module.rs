use super::ledger::ActivitySlot;
use crate::entity::EntityId;
use crate::hand::Hand;
use crate::interaction::{CallArgs, EntityMethod, InteractionError, InteractionService};
use crate::situation::{Situation, SituationData};
use anyhow::Result;
use smallvec::{smallvec, SmallVec};
use std::any::Any;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

pub type TargetList = SmallVec<[EntityId; 2]>;
pub type SlotSet = SmallVec<[ActivitySlot; 2]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviorKind {
    FarTrigger,
    NearTrigger,
    NearGrab,
    Custom,
}

impl BehaviorKind {
    pub fn label(self) -> &'static str {
        match self {
            BehaviorKind::FarTrigger => "far_trigger",
            BehaviorKind::NearTrigger => "near_trigger",
            BehaviorKind::NearGrab => "near_grab",
            BehaviorKind::Custom => "custom",
        }
    }
}

impl fmt::Display for BehaviorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleParameters {
    /// Lower values are asked first.
    pub priority: i32,
    pub activity_slots: SlotSet,
    pub required_data: SituationData,
    pub sleep_ms_between_runs: u64,
}

impl ModuleParameters {
    pub fn new(priority: i32, activity_slots: impl IntoIterator<Item = ActivitySlot>) -> Self {
        Self {
            priority,
            activity_slots: activity_slots.into_iter().collect(),
            required_data: SituationData::empty(),
            sleep_ms_between_runs: 0,
        }
    }

    pub fn for_hand(priority: i32, hand: Hand) -> Self {
        Self::new(priority, [hand.activity_slot()])
    }

    pub fn with_required_data(mut self, required: SituationData) -> Self {
        self.required_data = required;
        self
    }

    pub fn with_sleep_ms(mut self, sleep_ms: u64) -> Self {
        self.sleep_ms_between_runs = sleep_ms;
        self
    }

    pub fn is_exclusive(&self) -> bool {
        !self.activity_slots.is_empty()
    }

    pub fn claims_slot(&self, slot: &ActivitySlot) -> bool {
        self.activity_slots.contains(slot)
    }

    pub fn sleep_between_runs(&self) -> Duration {
        Duration::from_millis(self.sleep_ms_between_runs)
    }
}

/// What a module reports from `is_ready` / `run`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunningValues {
    pub active: bool,
    pub targets: TargetList,
    pub deprioritize: TargetList,
}

impl RunningValues {
    pub fn inactive() -> Self {
        Self::default()
    }

    pub fn active() -> Self {
        Self { active: true, ..Self::default() }
    }

    pub fn targeting(target: EntityId) -> Self {
        Self { active: true, targets: smallvec![target], deprioritize: TargetList::new() }
    }

    pub fn with_deprioritized(mut self, ids: impl IntoIterator<Item = EntityId>) -> Self {
        self.deprioritize.extend(ids);
        self
    }

    pub fn claimed(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.targets.iter().chain(self.deprioritize.iter()).copied()
    }
}

/// Entities claimed this tick, tagged with the sort position of the claiming module.
#[derive(Debug, Default)]
pub struct ClaimSet {
    entries: Vec<(usize, EntityId)>,
}

impl ClaimSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, position: usize, values: &RunningValues) {
        self.clear_position(position);
        self.entries.extend(values.claimed().map(|id| (position, id)));
    }

    pub fn clear_position(&mut self, position: usize) {
        self.entries.retain(|(owner, _)| *owner != position);
    }

    /// True when a module sorted before `position` claims `id`.
    pub fn claimed_before(&self, position: usize, id: EntityId) -> bool {
        self.entries.iter().any(|(owner, claimed)| *owner < position && *claimed == id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct ModuleContext<'a> {
    pub situation: &'a Situation,
    pub now: Duration,
    pub actor: Uuid,
    pub services: &'a mut dyn InteractionService,
    claims: &'a ClaimSet,
    position: usize,
}

impl<'a> ModuleContext<'a> {
    pub fn new(
        situation: &'a Situation,
        now: Duration,
        actor: Uuid,
        services: &'a mut dyn InteractionService,
        claims: &'a ClaimSet,
        position: usize,
    ) -> Self {
        Self { situation, now, actor, services, claims, position }
    }

    /// Whether a higher-priority module already targets or excludes `id` this tick.
    pub fn is_claimed(&self, id: EntityId) -> bool {
        self.claims.claimed_before(self.position, id)
    }

    pub fn notify(&mut self, entity: EntityId, method: EntityMethod, hand: Hand) -> Result<(), InteractionError> {
        let args = CallArgs { hand, actor: self.actor };
        self.services.call_entity_method(entity, method, args)
    }
}

/// A behaviour competing for activity slots.
///
/// `is_ready` is asked while the module is idle; once it reports `active` the module holds its
/// slots and gets `run` on later ticks until it reports inactive. Errors count as inactive.
pub trait DispatcherModule: Any {
    fn kind(&self) -> BehaviorKind;

    fn parameters(&self) -> ModuleParameters;

    fn is_ready(&mut self, ctx: &mut ModuleContext<'_>) -> Result<RunningValues>;

    fn run(&mut self, ctx: &mut ModuleContext<'_>) -> Result<RunningValues>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_only_hide_entities_from_later_modules() {
        let id = EntityId::from_u128(5);
        let mut claims = ClaimSet::new();
        claims.set(2, &RunningValues::targeting(id));
        assert!(!claims.claimed_before(2, id), "own claim is not a conflict");
        assert!(!claims.claimed_before(1, id));
        assert!(claims.claimed_before(3, id));

        claims.set(2, &RunningValues::inactive());
        assert!(claims.is_empty());
    }

    #[test]
    fn deprioritized_ids_count_as_claims() {
        let held = EntityId::from_u128(8);
        let values = RunningValues::active().with_deprioritized([held]);
        let mut claims = ClaimSet::new();
        claims.set(0, &values);
        assert!(claims.claimed_before(1, held));
    }

    #[test]
    fn parameters_report_exclusivity() {
        let params = ModuleParameters::for_hand(10, Hand::Right).with_sleep_ms(50);
        assert!(params.is_exclusive());
        assert!(params.claims_slot(&ActivitySlot::RIGHT_HAND));
        assert!(!params.claims_slot(&ActivitySlot::LEFT_HAND));
        assert_eq!(params.sleep_between_runs(), Duration::from_millis(50));
        assert!(!ModuleParameters::new(0, []).is_exclusive());
    }
}
