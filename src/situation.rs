use crate::entity::EntityId;
use crate::hand::{Hand, Sided};
use crate::input::ControllerInput;
use bitflags::bitflags;
use glam::{Quat, Vec3};

bitflags! {
    /// Parts of a [`Situation`] a module can depend on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SituationData: u32 {
        const RAY_PICKS = 1 << 0;
        const TRIGGER_VALUES = 1 << 1;
        const TRIGGER_CLICKS = 1 << 2;
        const GRIP_CLICKS = 1 << 3;
        const CONTROLLER_POSES = 1 << 4;
        const NEARBY_ENTITIES = 1 << 5;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayPick {
    pub target: Option<EntityId>,
    pub intersection: Vec3,
    pub distance: f32,
}

impl RayPick {
    pub fn miss() -> Self {
        Self { target: None, intersection: Vec3::ZERO, distance: 0.0 }
    }

    pub fn hit(target: EntityId, intersection: Vec3, distance: f32) -> Self {
        Self { target: Some(target), intersection, distance }
    }
}

impl Default for RayPick {
    fn default() -> Self {
        Self::miss()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandPose {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl HandPose {
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self { translation, rotation }
    }
}

impl Default for HandPose {
    fn default() -> Self {
        Self { translation: Vec3::ZERO, rotation: Quat::IDENTITY }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyEntity {
    pub id: EntityId,
    pub distance: f32,
}

/// Read-only controller snapshot for one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Situation {
    ray_picks: Option<Sided<RayPick>>,
    trigger_values: Option<Sided<f32>>,
    trigger_clicks: Option<Sided<bool>>,
    grip_clicks: Option<Sided<bool>>,
    poses: Option<Sided<HandPose>>,
    nearby: Option<Sided<Vec<NearbyEntity>>>,
}

impl Situation {
    pub fn builder() -> SituationBuilder {
        SituationBuilder::default()
    }

    pub fn available(&self) -> SituationData {
        let mut data = SituationData::empty();
        data.set(SituationData::RAY_PICKS, self.ray_picks.is_some());
        data.set(SituationData::TRIGGER_VALUES, self.trigger_values.is_some());
        data.set(SituationData::TRIGGER_CLICKS, self.trigger_clicks.is_some());
        data.set(SituationData::GRIP_CLICKS, self.grip_clicks.is_some());
        data.set(SituationData::CONTROLLER_POSES, self.poses.is_some());
        data.set(SituationData::NEARBY_ENTITIES, self.nearby.is_some());
        data
    }

    pub fn has(&self, required: SituationData) -> bool {
        self.available().contains(required)
    }

    pub fn ray_pick(&self, hand: Hand) -> Option<&RayPick> {
        self.ray_picks.as_ref().map(|picks| &picks[hand])
    }

    pub fn ray_target(&self, hand: Hand) -> Option<EntityId> {
        self.ray_pick(hand).and_then(|pick| pick.target)
    }

    pub fn trigger_value(&self, hand: Hand) -> f32 {
        self.trigger_values.map_or(0.0, |values| values[hand])
    }

    /// Debounced trigger state; absent click data reads as released.
    pub fn trigger_clicked(&self, hand: Hand) -> bool {
        self.trigger_clicks.is_some_and(|clicks| clicks[hand])
    }

    pub fn grip_clicked(&self, hand: Hand) -> bool {
        self.grip_clicks.is_some_and(|clicks| clicks[hand])
    }

    pub fn pose(&self, hand: Hand) -> Option<HandPose> {
        self.poses.map(|poses| poses[hand])
    }

    /// Entities near `hand`, nearest first.
    pub fn nearby(&self, hand: Hand) -> &[NearbyEntity] {
        match &self.nearby {
            Some(nearby) => nearby[hand].as_slice(),
            None => &[],
        }
    }
}

#[derive(Debug, Default)]
pub struct SituationBuilder {
    situation: Situation,
}

impl SituationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_input(input: &ControllerInput) -> Self {
        let mut builder = Self::new()
            .trigger_values(input.trigger_values())
            .trigger_clicks(input.trigger_clicks())
            .grip_clicks(input.grip_clicks());
        if let Some(poses) = input.poses() {
            builder = builder.poses(poses);
        }
        builder
    }

    pub fn ray_picks(mut self, picks: Sided<RayPick>) -> Self {
        self.situation.ray_picks = Some(picks);
        self
    }

    pub fn trigger_values(mut self, values: Sided<f32>) -> Self {
        self.situation.trigger_values = Some(values);
        self
    }

    pub fn trigger_clicks(mut self, clicks: Sided<bool>) -> Self {
        self.situation.trigger_clicks = Some(clicks);
        self
    }

    pub fn grip_clicks(mut self, clicks: Sided<bool>) -> Self {
        self.situation.grip_clicks = Some(clicks);
        self
    }

    pub fn poses(mut self, poses: Sided<HandPose>) -> Self {
        self.situation.poses = Some(poses);
        self
    }

    /// Nearby entities per hand; each list is sorted nearest first.
    pub fn nearby(mut self, mut nearby: Sided<Vec<NearbyEntity>>) -> Self {
        for hand in Hand::ALL {
            nearby[hand].sort_by(|a, b| a.distance.total_cmp(&b.distance));
        }
        self.situation.nearby = Some(nearby);
        self
    }

    pub fn build(self) -> Situation {
        self.situation
    }
}
