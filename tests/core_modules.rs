use std::time::Duration;

use glam::Vec3;
use hand_dispatch::config::DispatcherConfig;
use hand_dispatch::dispatcher::{ActivitySlot, ControllerDispatcher};
use hand_dispatch::entity::{EntityId, EntityProperties, EntityType};
use hand_dispatch::events::{DispatchEvent, ModulePhase, ReleaseReason};
use hand_dispatch::hand::{Hand, Sided};
use hand_dispatch::interaction::{
    CallArgs, EntityMethod, EntityStore, InteractionError, InteractionService, HAPTIC_PULSE_DURATION_MS,
};
use hand_dispatch::modules::{FarTriggerEntity, HandState, NearGrabEntity};
use hand_dispatch::situation::{NearbyEntity, RayPick, Situation};

const BUTTON: EntityId = EntityId::from_u128(0xb0);
const LAMP: EntityId = EntityId::from_u128(0xb1);
const CUP: EntityId = EntityId::from_u128(0xc0);

fn store() -> EntityStore {
    let mut store = EntityStore::new();
    let button = EntityProperties::new(BUTTON, EntityType::Box);
    store.insert(button.with_user_data(r#"{"grabbable":{"triggerable":true}}"#));
    let lamp = EntityProperties::new(LAMP, EntityType::Model);
    store.insert(lamp.with_user_data(r#"{"grabbable":{"wantsTrigger":true}}"#));
    store.insert(EntityProperties::new(CUP, EntityType::Model));
    store
}

#[derive(Default, Clone)]
struct Frame {
    trigger: Sided<bool>,
    grip: Sided<bool>,
    ray: Sided<Option<EntityId>>,
    nearby: Sided<Vec<NearbyEntity>>,
}

impl Frame {
    fn situation(&self) -> Situation {
        Situation::builder()
            .trigger_clicks(self.trigger)
            .grip_clicks(self.grip)
            .ray_picks(self.ray.map(|target| match target {
                Some(id) => RayPick::hit(id, Vec3::new(0.0, 1.0, -2.0), 2.0),
                None => RayPick::miss(),
            }))
            .nearby(self.nearby.clone())
            .build()
    }
}

struct Session {
    dispatcher: ControllerDispatcher,
    store: EntityStore,
    now: Duration,
}

impl Session {
    fn new() -> Self {
        Self {
            dispatcher: ControllerDispatcher::with_core_modules(&DispatcherConfig::default()),
            store: store(),
            now: Duration::ZERO,
        }
    }

    fn step(&mut self, frame: &Frame) -> Vec<(EntityMethod, EntityId, Hand)> {
        self.dispatcher.update_at(&frame.situation(), self.now, &mut self.store);
        self.now += Duration::from_millis(11);
        self.store.take_calls().into_iter().map(|call| (call.method, call.entity, call.args.hand)).collect()
    }
}

fn right_trigger_at(target: Option<EntityId>) -> Frame {
    let mut frame = Frame::default();
    frame.trigger.right = true;
    frame.ray.right = target;
    frame
}

#[test]
fn far_trigger_starts_continues_and_stops_once() {
    let mut session = Session::new();
    let calls = session.step(&right_trigger_at(Some(BUTTON)));
    assert_eq!(calls, vec![(EntityMethod::StartFarTrigger, BUTTON, Hand::Right)]);
    assert_eq!(session.dispatcher.holder(&ActivitySlot::RIGHT_HAND), Some("RightFarTriggerEntity"));

    let calls = session.step(&right_trigger_at(Some(BUTTON)));
    assert_eq!(calls, vec![(EntityMethod::ContinueFarTrigger, BUTTON, Hand::Right)]);

    let released = Frame { ray: Sided::new(None, Some(BUTTON)), ..Frame::default() };
    let calls = session.step(&released);
    assert_eq!(calls, vec![(EntityMethod::StopFarTrigger, BUTTON, Hand::Right)]);
    assert_eq!(session.dispatcher.holder(&ActivitySlot::RIGHT_HAND), None);

    assert!(session.step(&released).is_empty(), "no second stop");
    let module = session.dispatcher.registry().get::<FarTriggerEntity>("RightFarTriggerEntity").expect("module");
    assert_eq!(module.state(), HandState::Idle);
}

#[test]
fn far_trigger_stops_when_the_ray_moves_off_target() {
    let mut session = Session::new();
    session.step(&right_trigger_at(Some(BUTTON)));

    let calls = session.step(&right_trigger_at(Some(LAMP)));
    assert_eq!(calls, vec![(EntityMethod::StopFarTrigger, BUTTON, Hand::Right)], "no retarget within a run");

    let calls = session.step(&right_trigger_at(Some(LAMP)));
    assert_eq!(calls, vec![(EntityMethod::StartFarTrigger, LAMP, Hand::Right)]);
    let module = session.dispatcher.registry().get::<FarTriggerEntity>("RightFarTriggerEntity").expect("module");
    assert_eq!(module.state(), HandState::Engaged { target: LAMP });
}

#[test]
fn far_trigger_ignores_entities_without_trigger_metadata() {
    let mut session = Session::new();
    assert!(session.step(&right_trigger_at(Some(CUP))).is_empty());
    assert!(session.step(&right_trigger_at(None)).is_empty());
    assert!(session.dispatcher.ledger().is_empty());
}

#[test]
fn deleted_target_faults_the_far_trigger_without_a_stop() {
    let mut session = Session::new();
    session.step(&right_trigger_at(Some(BUTTON)));
    session.dispatcher.drain_events();
    session.store.remove(BUTTON);

    assert!(session.step(&right_trigger_at(Some(BUTTON))).is_empty());
    assert_eq!(session.dispatcher.holder(&ActivitySlot::RIGHT_HAND), None);
    let events = session.dispatcher.drain_events();
    assert!(matches!(
        &events[0],
        DispatchEvent::ModuleFault { module, phase: ModulePhase::Run, .. } if module == "RightFarTriggerEntity"
    ));
    assert!(events.contains(&DispatchEvent::ModuleStopped {
        module: "RightFarTriggerEntity".into(),
        reason: ReleaseReason::Fault,
    }));
}

#[test]
fn near_grab_pulses_holds_and_releases() {
    let mut session = Session::new();
    let mut frame = Frame::default();
    frame.grip.left = true;
    frame.nearby.left = vec![NearbyEntity { id: CUP, distance: 0.12 }];

    let calls = session.step(&frame);
    assert_eq!(calls, vec![(EntityMethod::StartNearGrab, CUP, Hand::Left)]);
    let pulses = session.store.take_pulses();
    assert_eq!(pulses.len(), 1);
    assert_eq!(pulses[0].hand, Hand::Left);
    assert_eq!(pulses[0].duration_ms, HAPTIC_PULSE_DURATION_MS);
    let grab = session.dispatcher.registry().get::<NearGrabEntity>("LeftNearGrabEntity").expect("module");
    assert_eq!(grab.held(), Some(CUP));
    let values = session.dispatcher.running_values("LeftNearGrabEntity").expect("running");
    assert_eq!(values.deprioritize.as_slice(), &[CUP]);

    let calls = session.step(&frame);
    assert_eq!(calls, vec![(EntityMethod::ContinueNearGrab, CUP, Hand::Left)]);

    frame.grip.left = false;
    let calls = session.step(&frame);
    assert_eq!(calls, vec![(EntityMethod::ReleaseGrab, CUP, Hand::Left)]);
    assert!(session.store.take_pulses().is_empty());
}

/// Knows every entity in the store but refuses all method calls.
struct RefusingHost(EntityStore);

impl InteractionService for RefusingHost {
    fn entity_properties(&self, id: EntityId) -> Option<EntityProperties> {
        self.0.entity_properties(id)
    }

    fn call_entity_method(&mut self, id: EntityId, _: EntityMethod, _: CallArgs) -> Result<(), InteractionError> {
        Err(InteractionError::UnknownEntity(id))
    }

    fn haptic_pulse(&mut self, hand: Hand, strength: f32, duration_ms: f32) {
        self.0.haptic_pulse(hand, strength, duration_ms);
    }
}

#[test]
fn failed_grab_start_sends_no_haptic_pulse() {
    let mut dispatcher = ControllerDispatcher::with_core_modules(&DispatcherConfig::default());
    let mut host = RefusingHost(store());
    let mut frame = Frame::default();
    frame.grip.left = true;
    frame.nearby.left = vec![NearbyEntity { id: CUP, distance: 0.1 }];

    dispatcher.update_at(&frame.situation(), Duration::ZERO, &mut host);
    assert!(host.0.take_pulses().is_empty());
    assert_eq!(dispatcher.holder(&ActivitySlot::LEFT_HAND), None);
    assert_eq!(dispatcher.last_report().faults, vec!["LeftNearGrabEntity".to_string()]);
}

#[test]
fn near_grab_ignores_entities_out_of_reach_or_forbidden() {
    let mut session = Session::new();
    let zone = EntityId::from_u128(0xd0);
    session.store.insert(EntityProperties::new(zone, EntityType::Zone));
    let mut frame = Frame::default();
    frame.grip.right = true;
    frame.nearby.right =
        vec![NearbyEntity { id: zone, distance: 0.05 }, NearbyEntity { id: CUP, distance: 0.4 }];

    assert!(session.step(&frame).is_empty());
    assert_eq!(session.dispatcher.holder(&ActivitySlot::RIGHT_HAND), None);
}

#[test]
fn held_entity_cannot_be_far_triggered_by_the_other_hand() {
    let mut session = Session::new();
    let mut frame = Frame::default();
    frame.grip.left = true;
    frame.nearby.left = vec![NearbyEntity { id: BUTTON, distance: 0.1 }];
    frame.trigger.right = true;
    frame.ray.right = Some(BUTTON);

    let calls = session.step(&frame);
    assert_eq!(calls, vec![(EntityMethod::StartNearGrab, BUTTON, Hand::Left)]);
    let calls = session.step(&frame);
    assert_eq!(calls, vec![(EntityMethod::ContinueNearGrab, BUTTON, Hand::Left)]);
    assert_eq!(session.dispatcher.holder(&ActivitySlot::RIGHT_HAND), None);
}

#[test]
fn grab_on_the_right_hand_wins_over_a_left_far_trigger_in_the_same_tick() {
    let mut session = Session::new();
    let mut frame = Frame::default();
    frame.trigger.left = true;
    frame.ray.left = Some(BUTTON);
    frame.grip.right = true;
    frame.nearby.right = vec![NearbyEntity { id: BUTTON, distance: 0.1 }];

    let calls = session.step(&frame);
    assert_eq!(calls, vec![(EntityMethod::StartNearGrab, BUTTON, Hand::Right)], "one module per entity");
    assert_eq!(session.dispatcher.holder(&ActivitySlot::RIGHT_HAND), Some("RightNearGrabEntity"));
    assert_eq!(session.dispatcher.holder(&ActivitySlot::LEFT_HAND), None);

    let calls = session.step(&frame);
    assert_eq!(calls, vec![(EntityMethod::ContinueNearGrab, BUTTON, Hand::Right)]);
    assert_eq!(session.dispatcher.holder(&ActivitySlot::LEFT_HAND), None);
}

#[test]
fn near_trigger_beats_far_trigger_on_the_same_hand() {
    let mut session = Session::new();
    let mut frame = right_trigger_at(Some(BUTTON));
    frame.nearby.right = vec![NearbyEntity { id: LAMP, distance: 0.2 }];

    let calls = session.step(&frame);
    assert_eq!(calls, vec![(EntityMethod::StartNearTrigger, LAMP, Hand::Right)]);
    assert_eq!(session.dispatcher.holder(&ActivitySlot::RIGHT_HAND), Some("RightNearTriggerEntity"));

    frame.nearby.right.clear();
    let calls = session.step(&frame);
    assert_eq!(calls, vec![(EntityMethod::StopNearTrigger, LAMP, Hand::Right)], "left reach");

    let calls = session.step(&frame);
    assert_eq!(calls, vec![(EntityMethod::StartFarTrigger, BUTTON, Hand::Right)]);
}

#[test]
fn notifications_carry_the_configured_actor() {
    let mut config = DispatcherConfig::default();
    config.actor_id = uuid::Uuid::from_u128(0xfeed);
    let mut session = Session::new();
    session.dispatcher = ControllerDispatcher::with_core_modules(&config);

    let situation = right_trigger_at(Some(BUTTON)).situation();
    session.dispatcher.update_at(&situation, Duration::ZERO, &mut session.store);
    let calls = session.store.take_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].args.actor, config.actor_id);
}
