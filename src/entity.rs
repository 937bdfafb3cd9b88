use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

pub const NULL_ID: EntityId = EntityId(Uuid::nil());
pub const AVATAR_SELF_ID: Uuid = Uuid::from_u128(1);

pub const FORBIDDEN_GRAB_TYPES: [EntityType; 4] =
    [EntityType::Unknown, EntityType::Light, EntityType::PolyLine, EntityType::Zone];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    pub fn is_null(&self) -> bool {
        self.0.is_nil()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EntityType {
    Box,
    Sphere,
    Shape,
    Model,
    Text,
    Image,
    Web,
    Light,
    Line,
    PolyLine,
    PolyVox,
    ParticleEffect,
    Zone,
    Material,
    Grid,
    Gizmo,
    #[default]
    #[serde(other)]
    Unknown,
}

impl EntityType {
    pub fn label(self) -> &'static str {
        match self {
            EntityType::Unknown => "Unknown",
            EntityType::Box => "Box",
            EntityType::Sphere => "Sphere",
            EntityType::Shape => "Shape",
            EntityType::Model => "Model",
            EntityType::Text => "Text",
            EntityType::Image => "Image",
            EntityType::Web => "Web",
            EntityType::Light => "Light",
            EntityType::Line => "Line",
            EntityType::PolyLine => "PolyLine",
            EntityType::PolyVox => "PolyVox",
            EntityType::ParticleEffect => "ParticleEffect",
            EntityType::Zone => "Zone",
            EntityType::Material => "Material",
            EntityType::Grid => "Grid",
            EntityType::Gizmo => "Gizmo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityProperties {
    pub id: EntityId,
    #[serde(rename = "type", default)]
    pub entity_type: EntityType,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub dynamic: bool,
    #[serde(default)]
    pub shape_type: Option<String>,
    #[serde(default)]
    pub user_data: String,
}

impl EntityProperties {
    pub fn new(id: EntityId, entity_type: EntityType) -> Self {
        Self { id, entity_type, locked: false, dynamic: false, shape_type: None, user_data: String::new() }
    }

    pub fn with_user_data(mut self, user_data: impl Into<String>) -> Self {
        self.user_data = user_data.into();
        self
    }

    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }
}

/// Grab-related view of an entity's `user_data`, with defaults applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrabbableData {
    pub grabbable: bool,
    pub ignore_ik: bool,
    pub kinematic_grab: bool,
    pub triggerable: Option<bool>,
    pub wants_trigger: Option<bool>,
}

impl GrabbableData {
    pub fn wants_trigger_events(&self) -> bool {
        self.triggerable.unwrap_or(false) || self.wants_trigger.unwrap_or(false)
    }
}

impl Default for GrabbableData {
    fn default() -> Self {
        Self { grabbable: true, ignore_ik: true, kinematic_grab: false, triggerable: None, wants_trigger: None }
    }
}

/// Reads the `grabbable` object out of `user_data`. Each key is checked on its own: a missing or
/// mistyped key takes its default without disturbing the others.
pub fn get_grabbable_data(props: &EntityProperties) -> GrabbableData {
    let user_data = serde_json::from_str::<Value>(&props.user_data).unwrap_or(Value::Null);
    let block = user_data.get("grabbable").filter(|block| block.is_object());
    let flag = |key: &str| block.and_then(|block| block.get(key)).and_then(Value::as_bool);
    GrabbableData {
        grabbable: flag("grabbable").unwrap_or(true),
        ignore_ik: flag("ignoreIK").unwrap_or(true),
        kinematic_grab: flag("kinematicGrab").unwrap_or(false),
        triggerable: flag("triggerable"),
        wants_trigger: flag("wantsTrigger"),
    }
}

pub fn entity_is_grabbable(props: &EntityProperties) -> bool {
    get_grabbable_data(props).grabbable
        && !props.locked
        && !FORBIDDEN_GRAB_TYPES.contains(&props.entity_type)
}

pub fn entity_wants_trigger(props: &EntityProperties) -> bool {
    get_grabbable_data(props).wants_trigger_events()
}

pub fn props_are_physical(props: &EntityProperties) -> bool {
    props.dynamic && props.shape_type.as_deref().is_some_and(|shape| !shape.is_empty() && shape != "none")
}
