use crate::config::{DispatcherConfig, ThresholdConfig};
use crate::hand::{Hand, Sided};
use crate::situation::HandPose;

/// Hysteresis between an "on" and an "off" threshold on an analog axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerDebounce {
    on_threshold: f32,
    off_threshold: f32,
    pressed: bool,
}

impl TriggerDebounce {
    pub fn new(thresholds: ThresholdConfig) -> Self {
        let thresholds = thresholds.validated("debounce");
        Self { on_threshold: thresholds.on_threshold, off_threshold: thresholds.off_threshold, pressed: false }
    }

    pub fn update(&mut self, value: f32) -> bool {
        if self.pressed {
            if value < self.off_threshold {
                self.pressed = false;
            }
        } else if value >= self.on_threshold {
            self.pressed = true;
        }
        self.pressed
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn reset(&mut self) {
        self.pressed = false;
    }
}

impl Default for TriggerDebounce {
    fn default() -> Self {
        Self::new(ThresholdConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Trigger { hand: Hand, value: f32 },
    Grip { hand: Hand, value: f32 },
    Pose { hand: Hand, pose: HandPose },
    PoseLost { hand: Hand },
}

/// Controller state accumulated from host input events.
pub struct ControllerInput {
    trigger_values: Sided<f32>,
    grip_values: Sided<f32>,
    triggers: Sided<TriggerDebounce>,
    grips: Sided<TriggerDebounce>,
    poses: Sided<Option<HandPose>>,
    pub events: Vec<InputEvent>,
}

impl ControllerInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &DispatcherConfig) -> Self {
        Self::with_thresholds(config.trigger, config.grip)
    }

    fn with_thresholds(trigger: ThresholdConfig, grip: ThresholdConfig) -> Self {
        Self {
            trigger_values: Sided::splat(0.0),
            grip_values: Sided::splat(0.0),
            triggers: Sided::splat(TriggerDebounce::new(trigger)),
            grips: Sided::splat(TriggerDebounce::new(grip)),
            poses: Sided::splat(None),
            events: Vec::new(),
        }
    }

    pub fn push(&mut self, ev: InputEvent) {
        match ev {
            InputEvent::Trigger { hand, value } => {
                let value = sanitize_axis(value);
                self.trigger_values[hand] = value;
                self.triggers[hand].update(value);
            }
            InputEvent::Grip { hand, value } => {
                let value = sanitize_axis(value);
                self.grip_values[hand] = value;
                self.grips[hand].update(value);
            }
            InputEvent::Pose { hand, pose } => {
                self.poses[hand] = Some(pose);
            }
            InputEvent::PoseLost { hand } => {
                self.poses[hand] = None;
            }
        }
        self.events.push(ev);
    }

    pub fn clear_frame(&mut self) {
        self.events.clear();
    }

    pub fn trigger_value(&self, hand: Hand) -> f32 {
        self.trigger_values[hand]
    }

    pub fn trigger_clicked(&self, hand: Hand) -> bool {
        self.triggers[hand].is_pressed()
    }

    pub fn grip_value(&self, hand: Hand) -> f32 {
        self.grip_values[hand]
    }

    pub fn grip_clicked(&self, hand: Hand) -> bool {
        self.grips[hand].is_pressed()
    }

    pub fn pose(&self, hand: Hand) -> Option<HandPose> {
        self.poses[hand]
    }

    pub fn trigger_values(&self) -> Sided<f32> {
        self.trigger_values
    }

    pub fn trigger_clicks(&self) -> Sided<bool> {
        Sided::from_fn(|hand| self.trigger_clicked(hand))
    }

    pub fn grip_clicks(&self) -> Sided<bool> {
        Sided::from_fn(|hand| self.grip_clicked(hand))
    }

    /// Poses for both hands, if both are tracked.
    pub fn poses(&self) -> Option<Sided<HandPose>> {
        match (self.poses.left, self.poses.right) {
            (Some(left), Some(right)) => Some(Sided::new(left, right)),
            _ => None,
        }
    }
}

impl Default for ControllerInput {
    fn default() -> Self {
        Self::with_thresholds(ThresholdConfig::default(), ThresholdConfig::default())
    }
}

fn sanitize_axis(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
