use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::DispatcherConfig;
use crate::dispatcher::ControllerDispatcher;
use crate::entity::{EntityId, EntityProperties};
use crate::hand::{Hand, Sided};
use crate::input::{ControllerInput, InputEvent};
use crate::interaction::EntityStore;
use crate::situation::{NearbyEntity, RayPick, SituationBuilder};
use crate::time::Time;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarnessFixture {
    #[serde(default)]
    pub config: DispatcherConfig,
    #[serde(default = "default_step_ms")]
    pub step_ms: u64,
    #[serde(default)]
    pub entities: Vec<EntityProperties>,
    pub ticks: Vec<FixtureTick>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FixtureTick {
    /// Timestamp of the tick; defaults to `index * step_ms`.
    #[serde(default)]
    pub at_ms: Option<u64>,
    #[serde(default)]
    pub left: FixtureHand,
    #[serde(default)]
    pub right: FixtureHand,
    /// Entities deleted before the tick runs.
    #[serde(default)]
    pub remove_entities: Vec<EntityId>,
    #[serde(default)]
    pub unregister: Vec<String>,
}

impl FixtureTick {
    fn hand(&self, hand: Hand) -> &FixtureHand {
        match hand {
            Hand::Left => &self.left,
            Hand::Right => &self.right,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FixtureHand {
    #[serde(default)]
    pub trigger: f32,
    #[serde(default)]
    pub grip: f32,
    #[serde(default)]
    pub ray_target: Option<EntityId>,
    #[serde(default)]
    pub nearby: Vec<FixtureNearby>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FixtureNearby {
    pub id: EntityId,
    pub distance: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HarnessOutput {
    pub modules: Vec<String>,
    pub ticks: Vec<TickResult>,
    pub shutdown: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TickResult {
    pub tick: usize,
    pub at_ms: u64,
    pub holders: BTreeMap<String, String>,
    pub calls: Vec<String>,
    pub haptics: Vec<String>,
    pub events: Vec<String>,
}

fn default_step_ms() -> u64 {
    11
}

pub fn load_fixture(path: impl AsRef<Path>) -> Result<HarnessFixture> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening fixture '{}'", path.display()))?;
    serde_json::from_reader(file).with_context(|| format!("parsing fixture '{}'", path.display()))
}

/// Replays every tick of `fixture` through a dispatcher with the core modules registered.
pub fn run_fixture(fixture: &HarnessFixture) -> Result<HarnessOutput> {
    let config = fixture.config.clone().validated();
    let mut dispatcher = ControllerDispatcher::with_core_modules(&config);
    let mut store = EntityStore::new();
    for props in &fixture.entities {
        store.insert(props.clone());
    }
    let mut input = ControllerInput::from_config(&config);
    let mut time = Time::manual();
    let modules = dispatcher.execution_order().into_iter().map(str::to_string).collect();

    let mut ticks = Vec::with_capacity(fixture.ticks.len());
    for (index, tick) in fixture.ticks.iter().enumerate() {
        let at_ms = tick.at_ms.unwrap_or(index as u64 * fixture.step_ms);
        time.advance_to(Duration::from_millis(at_ms));
        for id in &tick.remove_entities {
            store.remove(*id);
        }
        for name in &tick.unregister {
            dispatcher.unregister(name);
        }
        for hand in Hand::ALL {
            let state = tick.hand(hand);
            input.push(InputEvent::Trigger { hand, value: state.trigger });
            input.push(InputEvent::Grip { hand, value: state.grip });
        }
        let picks = Sided::from_fn(|hand| match tick.hand(hand).ray_target {
            Some(target) => RayPick::hit(target, Vec3::ZERO, 0.0),
            None => RayPick::miss(),
        });
        let nearby = Sided::from_fn(|hand| {
            tick.hand(hand)
                .nearby
                .iter()
                .map(|entry| NearbyEntity { id: entry.id, distance: entry.distance })
                .collect::<Vec<_>>()
        });
        let situation = SituationBuilder::from_input(&input).ray_picks(picks).nearby(nearby).build();
        input.clear_frame();

        dispatcher.update(&situation, &time, &mut store);

        let holders =
            dispatcher.ledger().iter().map(|(slot, module)| (slot.to_string(), module.to_string())).collect();
        let calls = store.take_calls().iter().map(ToString::to_string).collect();
        let haptics = store.take_pulses().iter().map(|pulse| pulse.hand.to_string()).collect();
        let events = dispatcher.drain_events().iter().map(ToString::to_string).collect();
        ticks.push(TickResult { tick: index, at_ms, holders, calls, haptics, events });
    }

    dispatcher.shutdown();
    let shutdown = dispatcher.drain_events().iter().map(ToString::to_string).collect();
    Ok(HarnessOutput { modules, ticks, shutdown })
}
