use super::ledger::ActivitySlotLedger;
use super::module::{ClaimSet, ModuleContext, RunningValues, SlotSet};
use super::registry::{ModuleEntry, ModuleRegistry};
use crate::events::{DispatchEvent, EventBus, ModulePhase, ReleaseReason};
use crate::interaction::InteractionService;
use crate::situation::Situation;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ModuleFault {
    #[error("{0:#}")]
    Failed(anyhow::Error),
    #[error("panicked: {0}")]
    Panicked(String),
}

pub struct TickInput<'a> {
    pub situation: &'a Situation,
    pub now: Duration,
    pub actor: Uuid,
    pub services: &'a mut dyn InteractionService,
}

/// Which modules were touched during one tick, in call order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub asked: Vec<String>,
    pub ran: Vec<String>,
    pub throttled: Vec<String>,
    pub started: Vec<String>,
    pub stopped: Vec<String>,
    pub faults: Vec<String>,
}

#[derive(Debug, Clone)]
struct ModuleRuntime {
    name: String,
    running: bool,
    last_invoked: Option<Duration>,
    values: RunningValues,
    held: SlotSet,
}

impl ModuleRuntime {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            running: false,
            last_invoked: None,
            values: RunningValues::inactive(),
            held: SlotSet::new(),
        }
    }
}

#[derive(Default)]
pub struct Scheduler {
    order: Vec<usize>,
    runtime: HashMap<u64, ModuleRuntime>,
    tick: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn is_running(&self, entry: &ModuleEntry) -> bool {
        self.runtime.get(&entry.seq()).is_some_and(|rt| rt.running)
    }

    pub fn running_values(&self, entry: &ModuleEntry) -> Option<&RunningValues> {
        self.runtime.get(&entry.seq()).filter(|rt| rt.running).map(|rt| &rt.values)
    }

    /// Registry names in the order the next tick will consider them.
    pub fn execution_order<'r>(&self, registry: &'r ModuleRegistry) -> Vec<&'r str> {
        sorted_indices(registry).into_iter().map(|index| registry.entry_at(index).name()).collect()
    }

    /// Stops every running module and forgets all runtime state.
    pub fn retire_all(&mut self, ledger: &mut ActivitySlotLedger, events: &mut EventBus) -> TickReport {
        let mut report = TickReport { tick: self.tick, ..TickReport::default() };
        let mut retired: Vec<ModuleRuntime> = self.runtime.drain().map(|(_, rt)| rt).collect();
        retired.sort_by(|a, b| a.name.cmp(&b.name));
        for rt in retired.iter_mut().filter(|rt| rt.running) {
            stop(rt, ReleaseReason::Unregistered, ledger, events, &mut report);
        }
        self.order.clear();
        report
    }

    pub fn tick(
        &mut self,
        registry: &mut ModuleRegistry,
        ledger: &mut ActivitySlotLedger,
        events: &mut EventBus,
        input: TickInput<'_>,
    ) -> TickReport {
        self.tick += 1;
        let mut report = TickReport { tick: self.tick, ..TickReport::default() };
        if registry.take_dirty() {
            self.resort(registry);
            self.prune(registry, ledger, events, &mut report);
        }
        for entry in registry.entries() {
            self.runtime.entry(entry.seq()).or_insert_with(|| ModuleRuntime::new(entry.name()));
        }

        let mut claims = ClaimSet::new();
        let mut running_at_start = Vec::new();
        for (position, &index) in self.order.iter().enumerate() {
            let rt = &self.runtime[&registry.entry_at(index).seq()];
            if rt.running {
                claims.set(position, &rt.values);
                running_at_start.push(position);
            }
        }

        let TickInput { situation, now, actor, services } = input;

        // One walk in priority order, so every module sees what higher priorities claimed this tick.
        for position in 0..self.order.len() {
            let index = self.order[position];
            let entry = registry.entry_at(index);
            let seq = entry.seq();
            let params = entry.parameters();
            if self.runtime[&seq].running
                || !situation.has(params.required_data)
                || !ledger.all_free(&params.activity_slots)
            {
                continue;
            }
            let mut ctx = ModuleContext::new(situation, now, actor, &mut *services, &claims, position);
            let values = self.ask(registry.entry_at_mut(index), &mut ctx, events, &mut report);
            if values.active {
                let entry = registry.entry_at(index);
                self.start(entry, position, values, ledger, &mut claims, events, &mut report);
            }
        }

        for position in running_at_start {
            let index = self.order[position];
            let entry = registry.entry_at_mut(index);
            let seq = entry.seq();
            let sleep = entry.parameters().sleep_between_runs();
            let name = entry.name().to_string();
            let Some(rt) = self.runtime.get_mut(&seq) else { continue };
            if let Some(last) = rt.last_invoked {
                if now.saturating_sub(last) < sleep {
                    report.throttled.push(name);
                    continue;
                }
            }
            let mut ctx = ModuleContext::new(situation, now, actor, &mut *services, &claims, position);
            let outcome = invoke(entry, ModulePhase::Run, &mut ctx);
            rt.last_invoked = Some(now);
            report.ran.push(name.clone());
            match outcome {
                Ok(values) if values.active => {
                    claims.set(position, &values);
                    rt.values = values;
                }
                Ok(_) => {
                    claims.clear_position(position);
                    stop(rt, ReleaseReason::Relinquished, ledger, events, &mut report);
                }
                Err(fault) => {
                    record_fault(&name, ModulePhase::Run, &fault, events, &mut report);
                    claims.clear_position(position);
                    stop(rt, ReleaseReason::Fault, ledger, events, &mut report);
                }
            }
        }

        report
    }

    fn ask(
        &mut self,
        entry: &mut ModuleEntry,
        ctx: &mut ModuleContext<'_>,
        events: &mut EventBus,
        report: &mut TickReport,
    ) -> RunningValues {
        let name = entry.name().to_string();
        let outcome = invoke(entry, ModulePhase::IsReady, ctx);
        if let Some(rt) = self.runtime.get_mut(&entry.seq()) {
            rt.last_invoked = Some(ctx.now);
        }
        report.asked.push(name.clone());
        match outcome {
            Ok(values) => values,
            Err(fault) => {
                record_fault(&name, ModulePhase::IsReady, &fault, events, report);
                RunningValues::inactive()
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn start(
        &mut self,
        entry: &ModuleEntry,
        position: usize,
        values: RunningValues,
        ledger: &mut ActivitySlotLedger,
        claims: &mut ClaimSet,
        events: &mut EventBus,
        report: &mut TickReport,
    ) {
        let slots = entry.parameters().activity_slots.clone();
        if !ledger.try_acquire_all(&slots, entry.name()) {
            return;
        }
        for slot in &slots {
            tracing::debug!(slot = %slot, module = entry.name(), "slot acquired");
            events.push(DispatchEvent::SlotAcquired { slot: slot.clone(), module: entry.name().to_string() });
        }
        events.push(DispatchEvent::ModuleStarted { module: entry.name().to_string() });
        report.started.push(entry.name().to_string());
        claims.set(position, &values);
        if let Some(rt) = self.runtime.get_mut(&entry.seq()) {
            rt.running = true;
            rt.values = values;
            rt.held = slots;
        }
    }

    fn resort(&mut self, registry: &ModuleRegistry) {
        self.order = sorted_indices(registry);
    }

    /// Drops runtime state of modules that were removed or replaced, releasing what they held.
    fn prune(
        &mut self,
        registry: &ModuleRegistry,
        ledger: &mut ActivitySlotLedger,
        events: &mut EventBus,
        report: &mut TickReport,
    ) {
        let live: HashSet<u64> = registry.iter().map(ModuleEntry::seq).collect();
        let stale: Vec<u64> = self.runtime.keys().filter(|seq| !live.contains(seq)).copied().collect();
        for seq in stale {
            if let Some(mut rt) = self.runtime.remove(&seq) {
                if rt.running {
                    stop(&mut rt, ReleaseReason::Unregistered, ledger, events, report);
                }
            }
        }
    }
}

fn sorted_indices(registry: &ModuleRegistry) -> Vec<usize> {
    let mut order: Vec<usize> = (0..registry.len()).collect();
    order.sort_by_key(|&index| {
        let entry = registry.entry_at(index);
        (entry.parameters().priority, entry.seq())
    });
    order
}

fn invoke(
    entry: &mut ModuleEntry,
    phase: ModulePhase,
    ctx: &mut ModuleContext<'_>,
) -> Result<RunningValues, ModuleFault> {
    let module = entry.module_mut();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| match phase {
        ModulePhase::IsReady => module.is_ready(ctx),
        ModulePhase::Run => module.run(ctx),
    }));
    match outcome {
        Ok(Ok(values)) => Ok(values),
        Ok(Err(err)) => Err(ModuleFault::Failed(err)),
        Err(payload) => Err(ModuleFault::Panicked(panic_message(payload))),
    }
}

fn stop(
    rt: &mut ModuleRuntime,
    reason: ReleaseReason,
    ledger: &mut ActivitySlotLedger,
    events: &mut EventBus,
    report: &mut TickReport,
) {
    for slot in rt.held.drain(..) {
        if ledger.release(&slot, &rt.name) {
            tracing::debug!(slot = %slot, module = rt.name.as_str(), reason = reason.label(), "slot released");
            events.push(DispatchEvent::SlotReleased { slot, module: rt.name.clone(), reason });
        }
    }
    rt.running = false;
    rt.values = RunningValues::inactive();
    events.push(DispatchEvent::ModuleStopped { module: rt.name.clone(), reason });
    report.stopped.push(rt.name.clone());
}

fn record_fault(
    module: &str,
    phase: ModulePhase,
    fault: &ModuleFault,
    events: &mut EventBus,
    report: &mut TickReport,
) {
    tracing::warn!(module, phase = phase.label(), "module fault: {fault}");
    events.push(DispatchEvent::ModuleFault { module: module.to_string(), phase, reason: fault.to_string() });
    report.faults.push(module.to_string());
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
