pub mod ledger;
pub mod module;
pub mod registry;
pub mod scheduler;

pub use ledger::{ActivitySlot, ActivitySlotLedger};
pub use module::{
    BehaviorKind, ClaimSet, DispatcherModule, ModuleContext, ModuleParameters, RunningValues, SlotSet, TargetList,
};
pub use registry::{ModuleEntry, ModuleRegistry};
pub use scheduler::{ModuleFault, Scheduler, TickInput, TickReport};

use crate::config::DispatcherConfig;
use crate::events::{DispatchEvent, EventBus, EVENT_BUS_CAPACITY};
use crate::interaction::InteractionService;
use crate::modules::register_core_modules;
use crate::situation::Situation;
use crate::time::Time;
use std::time::Duration;
use uuid::Uuid;

/// Owns the module registry and slot ledger and drives one scheduler pass per host frame.
pub struct ControllerDispatcher {
    registry: ModuleRegistry,
    ledger: ActivitySlotLedger,
    scheduler: Scheduler,
    events: EventBus,
    actor: Uuid,
    last_report: TickReport,
}

impl ControllerDispatcher {
    pub fn new(config: &DispatcherConfig) -> Self {
        Self {
            registry: ModuleRegistry::new(),
            ledger: ActivitySlotLedger::new(),
            scheduler: Scheduler::new(),
            events: EventBus::default(),
            actor: config.actor_id,
            last_report: TickReport::default(),
        }
    }

    pub fn with_core_modules(config: &DispatcherConfig) -> Self {
        let mut dispatcher = Self::new(config);
        register_core_modules(&mut dispatcher.registry, config);
        tracing::debug!(modules = dispatcher.registry.len(), "dispatcher started");
        dispatcher
    }

    pub fn actor(&self) -> Uuid {
        self.actor
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ModuleRegistry {
        &mut self.registry
    }

    pub fn register(&mut self, name: impl Into<String>, module: Box<dyn DispatcherModule>) {
        self.registry.register(name, module);
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.registry.unregister(name)
    }

    pub fn ledger(&self) -> &ActivitySlotLedger {
        &self.ledger
    }

    pub fn holder(&self, slot: &ActivitySlot) -> Option<&str> {
        self.ledger.holder(slot)
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.registry.entry(name).is_some_and(|entry| self.scheduler.is_running(entry))
    }

    pub fn running_values(&self, name: &str) -> Option<&RunningValues> {
        self.registry.entry(name).and_then(|entry| self.scheduler.running_values(entry))
    }

    pub fn execution_order(&self) -> Vec<&str> {
        self.scheduler.execution_order(&self.registry)
    }

    pub fn tick_count(&self) -> u64 {
        self.scheduler.tick_count()
    }

    pub fn last_report(&self) -> &TickReport {
        &self.last_report
    }

    /// Runs one tick. Events accumulate until [`Self::drain_events`]; hosts should drain once per
    /// frame, past [`EVENT_BUS_CAPACITY`] the oldest events are dropped.
    pub fn update(
        &mut self,
        situation: &Situation,
        time: &Time,
        services: &mut dyn InteractionService,
    ) -> &TickReport {
        self.update_at(situation, time.now(), services)
    }

    pub fn update_at(
        &mut self,
        situation: &Situation,
        now: Duration,
        services: &mut dyn InteractionService,
    ) -> &TickReport {
        let input = TickInput { situation, now, actor: self.actor, services };
        self.last_report = self.scheduler.tick(&mut self.registry, &mut self.ledger, &mut self.events, input);
        &self.last_report
    }

    pub fn events(&self) -> &[DispatchEvent] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<DispatchEvent> {
        self.events.drain()
    }

    pub fn dropped_events(&self) -> u64 {
        self.events.dropped()
    }

    /// Unregisters every module and releases every slot.
    pub fn shutdown(&mut self) {
        self.registry.clear();
        self.last_report = self.scheduler.retire_all(&mut self.ledger, &mut self.events);
        self.ledger.clear();
        tracing::debug!(stopped = self.last_report.stopped.len(), "dispatcher shut down");
    }
}
