use super::HandState;
use crate::dispatcher::{BehaviorKind, DispatcherModule, ModuleContext, ModuleParameters, RunningValues};
use crate::entity::{entity_is_grabbable, EntityId};
use crate::hand::Hand;
use crate::interaction::{EntityMethod, HAPTIC_PULSE_DURATION_MS, HAPTIC_PULSE_STRENGTH};
use crate::situation::SituationData;
use anyhow::Result;
use std::any::Any;

pub const NEAR_GRAB_PRIORITY: i32 = 500;
/// Metres from the hand within which an entity can be picked up.
pub const NEAR_GRAB_RADIUS: f32 = 0.25;

/// Holds the nearest grabbable entity while the grip is squeezed.
pub struct NearGrabEntity {
    hand: Hand,
    state: HandState,
}

impl NearGrabEntity {
    pub fn new(hand: Hand) -> Self {
        Self { hand, state: HandState::Idle }
    }

    pub fn hand(&self) -> Hand {
        self.hand
    }

    pub fn state(&self) -> HandState {
        self.state
    }

    pub fn held(&self) -> Option<EntityId> {
        self.state.target()
    }

    fn candidate(&self, ctx: &ModuleContext<'_>) -> Option<EntityId> {
        if !ctx.situation.grip_clicked(self.hand) {
            return None;
        }
        ctx.situation
            .nearby(self.hand)
            .iter()
            .take_while(|nearby| nearby.distance <= NEAR_GRAB_RADIUS)
            .map(|nearby| nearby.id)
            .find(|&id| {
                !ctx.is_claimed(id)
                    && ctx.services.entity_properties(id).is_some_and(|props| entity_is_grabbable(&props))
            })
    }

    fn holding(target: EntityId) -> RunningValues {
        RunningValues::targeting(target).with_deprioritized([target])
    }
}

impl DispatcherModule for NearGrabEntity {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::NearGrab
    }

    fn parameters(&self) -> ModuleParameters {
        ModuleParameters::for_hand(NEAR_GRAB_PRIORITY, self.hand)
            .with_required_data(SituationData::NEARBY_ENTITIES | SituationData::GRIP_CLICKS)
    }

    fn is_ready(&mut self, ctx: &mut ModuleContext<'_>) -> Result<RunningValues> {
        self.state = HandState::Idle;
        let Some(target) = self.candidate(ctx) else {
            return Ok(RunningValues::inactive());
        };
        ctx.notify(target, EntityMethod::StartNearGrab, self.hand)?;
        ctx.services.haptic_pulse(self.hand, HAPTIC_PULSE_STRENGTH, HAPTIC_PULSE_DURATION_MS);
        self.state = HandState::Engaged { target };
        Ok(Self::holding(target))
    }

    fn run(&mut self, ctx: &mut ModuleContext<'_>) -> Result<RunningValues> {
        let HandState::Engaged { target } = self.state else {
            return Ok(RunningValues::inactive());
        };
        if ctx.situation.grip_clicked(self.hand) {
            ctx.notify(target, EntityMethod::ContinueNearGrab, self.hand)?;
            return Ok(Self::holding(target));
        }
        self.state = HandState::Idle;
        ctx.notify(target, EntityMethod::ReleaseGrab, self.hand)?;
        Ok(RunningValues::inactive())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
