use super::HandState;
use crate::dispatcher::{BehaviorKind, DispatcherModule, ModuleContext, ModuleParameters, RunningValues};
use crate::entity::{entity_wants_trigger, EntityId};
use crate::hand::Hand;
use crate::interaction::EntityMethod;
use anyhow::Result;
use std::any::Any;

pub const FAR_TRIGGER_PRIORITY: i32 = 520;

/// Triggers whatever entity the hand's ray points at, as long as the trigger stays clicked and the
/// ray stays on that entity.
pub struct FarTriggerEntity {
    hand: Hand,
    state: HandState,
}

impl FarTriggerEntity {
    pub fn new(hand: Hand) -> Self {
        Self { hand, state: HandState::Idle }
    }

    pub fn hand(&self) -> Hand {
        self.hand
    }

    pub fn state(&self) -> HandState {
        self.state
    }

    fn candidate(&self, ctx: &ModuleContext<'_>) -> Option<EntityId> {
        if !ctx.situation.trigger_clicked(self.hand) {
            return None;
        }
        let target = ctx.situation.ray_target(self.hand)?;
        if ctx.is_claimed(target) {
            return None;
        }
        let props = ctx.services.entity_properties(target)?;
        entity_wants_trigger(&props).then_some(target)
    }
}

impl DispatcherModule for FarTriggerEntity {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::FarTrigger
    }

    fn parameters(&self) -> ModuleParameters {
        ModuleParameters::for_hand(FAR_TRIGGER_PRIORITY, self.hand)
    }

    fn is_ready(&mut self, ctx: &mut ModuleContext<'_>) -> Result<RunningValues> {
        self.state = HandState::Idle;
        let Some(target) = self.candidate(ctx) else {
            return Ok(RunningValues::inactive());
        };
        ctx.notify(target, EntityMethod::StartFarTrigger, self.hand)?;
        self.state = HandState::Engaged { target };
        Ok(RunningValues::targeting(target))
    }

    fn run(&mut self, ctx: &mut ModuleContext<'_>) -> Result<RunningValues> {
        let HandState::Engaged { target } = self.state else {
            return Ok(RunningValues::inactive());
        };
        let still_on_target =
            ctx.situation.trigger_clicked(self.hand) && ctx.situation.ray_target(self.hand) == Some(target);
        if still_on_target {
            ctx.notify(target, EntityMethod::ContinueFarTrigger, self.hand)?;
            return Ok(RunningValues::targeting(target));
        }
        self.state = HandState::Idle;
        ctx.notify(target, EntityMethod::StopFarTrigger, self.hand)?;
        Ok(RunningValues::inactive())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
