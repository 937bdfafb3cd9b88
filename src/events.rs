use crate::dispatcher::ActivitySlot;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModulePhase {
    IsReady,
    Run,
}

impl ModulePhase {
    pub fn label(self) -> &'static str {
        match self {
            ModulePhase::IsReady => "is_ready",
            ModulePhase::Run => "run",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseReason {
    Relinquished,
    Fault,
    Unregistered,
}

impl ReleaseReason {
    pub fn label(self) -> &'static str {
        match self {
            ReleaseReason::Relinquished => "relinquished",
            ReleaseReason::Fault => "fault",
            ReleaseReason::Unregistered => "unregistered",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchEvent {
    ModuleStarted { module: String },
    ModuleStopped { module: String, reason: ReleaseReason },
    SlotAcquired { slot: ActivitySlot, module: String },
    SlotReleased { slot: ActivitySlot, module: String, reason: ReleaseReason },
    ModuleFault { module: String, phase: ModulePhase, reason: String },
}

impl DispatchEvent {
    pub fn module(&self) -> &str {
        match self {
            DispatchEvent::ModuleStarted { module }
            | DispatchEvent::ModuleStopped { module, .. }
            | DispatchEvent::SlotAcquired { module, .. }
            | DispatchEvent::SlotReleased { module, .. }
            | DispatchEvent::ModuleFault { module, .. } => module,
        }
    }
}

impl fmt::Display for DispatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchEvent::ModuleStarted { module } => write!(f, "ModuleStarted module={module}"),
            DispatchEvent::ModuleStopped { module, reason } => {
                write!(f, "ModuleStopped module={module} reason={}", reason.label())
            }
            DispatchEvent::SlotAcquired { slot, module } => {
                write!(f, "SlotAcquired slot={slot} module={module}")
            }
            DispatchEvent::SlotReleased { slot, module, reason } => {
                write!(f, "SlotReleased slot={slot} module={module} reason={}", reason.label())
            }
            DispatchEvent::ModuleFault { module, phase, reason } => {
                write!(f, "ModuleFault module={module} phase={} reason={reason}", phase.label())
            }
        }
    }
}

/// Events kept before the oldest ones are dropped, for hosts that never drain.
pub const EVENT_BUS_CAPACITY: usize = 4096;

#[derive(Debug)]
pub struct EventBus {
    events: Vec<DispatchEvent>,
    capacity: usize,
    dropped: u64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_capacity(EVENT_BUS_CAPACITY)
    }
}

impl EventBus {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { events: Vec::new(), capacity: capacity.max(1), dropped: 0 }
    }

    pub fn push(&mut self, event: DispatchEvent) {
        if self.events.len() >= self.capacity {
            if self.dropped == 0 {
                tracing::warn!(capacity = self.capacity, "event bus full, dropping oldest events");
            }
            self.events.remove(0);
            self.dropped += 1;
        }
        self.events.push(event);
    }

    pub fn events(&self) -> &[DispatchEvent] {
        &self.events
    }

    /// Number of events discarded since the bus was created.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn drain(&mut self) -> Vec<DispatchEvent> {
        self.events.drain(..).collect()
    }
}
