use super::HandState;
use crate::dispatcher::{BehaviorKind, DispatcherModule, ModuleContext, ModuleParameters, RunningValues};
use crate::entity::{entity_wants_trigger, EntityId};
use crate::hand::Hand;
use crate::interaction::EntityMethod;
use crate::situation::SituationData;
use anyhow::Result;
use std::any::Any;

pub const NEAR_TRIGGER_PRIORITY: i32 = 510;

pub struct NearTriggerEntity {
    hand: Hand,
    state: HandState,
}

impl NearTriggerEntity {
    pub fn new(hand: Hand) -> Self {
        Self { hand, state: HandState::Idle }
    }

    pub fn hand(&self) -> Hand {
        self.hand
    }

    pub fn state(&self) -> HandState {
        self.state
    }

    /// Nearest entity within reach that wants trigger events and nobody ahead of us claimed.
    fn candidate(&self, ctx: &ModuleContext<'_>) -> Option<EntityId> {
        if !ctx.situation.trigger_clicked(self.hand) {
            return None;
        }
        ctx.situation.nearby(self.hand).iter().map(|nearby| nearby.id).find(|&id| {
            !ctx.is_claimed(id)
                && ctx.services.entity_properties(id).is_some_and(|props| entity_wants_trigger(&props))
        })
    }

    fn in_reach(&self, ctx: &ModuleContext<'_>, target: EntityId) -> bool {
        ctx.situation.nearby(self.hand).iter().any(|nearby| nearby.id == target)
    }
}

impl DispatcherModule for NearTriggerEntity {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::NearTrigger
    }

    fn parameters(&self) -> ModuleParameters {
        ModuleParameters::for_hand(NEAR_TRIGGER_PRIORITY, self.hand)
            .with_required_data(SituationData::NEARBY_ENTITIES)
    }

    fn is_ready(&mut self, ctx: &mut ModuleContext<'_>) -> Result<RunningValues> {
        self.state = HandState::Idle;
        let Some(target) = self.candidate(ctx) else {
            return Ok(RunningValues::inactive());
        };
        ctx.notify(target, EntityMethod::StartNearTrigger, self.hand)?;
        self.state = HandState::Engaged { target };
        Ok(RunningValues::targeting(target))
    }

    fn run(&mut self, ctx: &mut ModuleContext<'_>) -> Result<RunningValues> {
        let HandState::Engaged { target } = self.state else {
            return Ok(RunningValues::inactive());
        };
        if ctx.situation.trigger_clicked(self.hand) && self.in_reach(ctx, target) {
            ctx.notify(target, EntityMethod::ContinueNearTrigger, self.hand)?;
            return Ok(RunningValues::targeting(target));
        }
        self.state = HandState::Idle;
        ctx.notify(target, EntityMethod::StopNearTrigger, self.hand)?;
        Ok(RunningValues::inactive())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
