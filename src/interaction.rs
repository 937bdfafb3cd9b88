use crate::entity::{EntityId, EntityProperties};
use crate::hand::Hand;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

pub const HAPTIC_PULSE_STRENGTH: f32 = 1.0;
pub const HAPTIC_PULSE_DURATION_MS: f32 = 13.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityMethod {
    StartFarTrigger,
    ContinueFarTrigger,
    StopFarTrigger,
    StartNearTrigger,
    ContinueNearTrigger,
    StopNearTrigger,
    StartNearGrab,
    ContinueNearGrab,
    ReleaseGrab,
}

impl EntityMethod {
    /// Method name the entity's script receives.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityMethod::StartFarTrigger => "startFarTrigger",
            EntityMethod::ContinueFarTrigger => "continueFarTrigger",
            EntityMethod::StopFarTrigger => "stopFarTrigger",
            EntityMethod::StartNearTrigger => "startNearTrigger",
            EntityMethod::ContinueNearTrigger => "continueNearTrigger",
            EntityMethod::StopNearTrigger => "stopNearTrigger",
            EntityMethod::StartNearGrab => "startNearGrab",
            EntityMethod::ContinueNearGrab => "continueNearGrab",
            EntityMethod::ReleaseGrab => "releaseGrab",
        }
    }
}

impl fmt::Display for EntityMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallArgs {
    pub hand: Hand,
    pub actor: Uuid,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InteractionError {
    #[error("entity {0} no longer exists")]
    UnknownEntity(EntityId),
}

/// Host services the behaviour modules talk to: entity lookup, entity method calls and haptics.
pub trait InteractionService {
    fn entity_properties(&self, id: EntityId) -> Option<EntityProperties>;

    fn call_entity_method(
        &mut self,
        id: EntityId,
        method: EntityMethod,
        args: CallArgs,
    ) -> Result<(), InteractionError>;

    fn haptic_pulse(&mut self, _hand: Hand, _strength: f32, _duration_ms: f32) {}
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityCall {
    pub entity: EntityId,
    pub method: EntityMethod,
    pub args: CallArgs,
}

impl fmt::Display for EntityCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} entity={} hand={}", self.method, self.entity, self.args.hand)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HapticPulse {
    pub hand: Hand,
    pub strength: f32,
    pub duration_ms: f32,
}

/// In-memory entity table that records every call made against it.
#[derive(Debug, Default)]
pub struct EntityStore {
    entities: HashMap<EntityId, EntityProperties>,
    calls: Vec<EntityCall>,
    pulses: Vec<HapticPulse>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, props: EntityProperties) {
        self.entities.insert(props.id, props);
    }

    pub fn remove(&mut self, id: EntityId) -> Option<EntityProperties> {
        self.entities.remove(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut EntityProperties> {
        self.entities.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn calls(&self) -> &[EntityCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<EntityCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn take_pulses(&mut self) -> Vec<HapticPulse> {
        std::mem::take(&mut self.pulses)
    }
}

impl InteractionService for EntityStore {
    fn entity_properties(&self, id: EntityId) -> Option<EntityProperties> {
        self.entities.get(&id).cloned()
    }

    fn call_entity_method(
        &mut self,
        id: EntityId,
        method: EntityMethod,
        args: CallArgs,
    ) -> Result<(), InteractionError> {
        if !self.entities.contains_key(&id) {
            return Err(InteractionError::UnknownEntity(id));
        }
        self.calls.push(EntityCall { entity: id, method, args });
        Ok(())
    }

    fn haptic_pulse(&mut self, hand: Hand, strength: f32, duration_ms: f32) {
        self.pulses.push(HapticPulse { hand, strength, duration_ms });
    }
}
