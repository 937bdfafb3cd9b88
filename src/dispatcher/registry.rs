use super::module::{DispatcherModule, ModuleParameters};

pub struct ModuleEntry {
    name: String,
    module: Box<dyn DispatcherModule>,
    parameters: ModuleParameters,
    seq: u64,
}

impl ModuleEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &ModuleParameters {
        &self.parameters
    }

    pub fn module(&self) -> &dyn DispatcherModule {
        self.module.as_ref()
    }

    pub(crate) fn module_mut(&mut self) -> &mut dyn DispatcherModule {
        self.module.as_mut()
    }

    /// Registration sequence number; replacing an entry issues a new one.
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Name → module table. Any change marks it dirty so the scheduler re-sorts.
#[derive(Default)]
pub struct ModuleRegistry {
    entries: Vec<ModuleEntry>,
    next_seq: u64,
    dirty: bool,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, module: Box<dyn DispatcherModule>) {
        let parameters = module.parameters();
        self.register_with_parameters(name, module, parameters);
    }

    pub fn register_with_priority(
        &mut self,
        name: impl Into<String>,
        module: Box<dyn DispatcherModule>,
        priority: i32,
    ) {
        let mut parameters = module.parameters();
        parameters.priority = priority;
        self.register_with_parameters(name, module, parameters);
    }

    pub fn register_with_parameters(
        &mut self,
        name: impl Into<String>,
        module: Box<dyn DispatcherModule>,
        parameters: ModuleParameters,
    ) {
        let name = name.into();
        let seq = self.next_seq;
        self.next_seq += 1;
        let entry = ModuleEntry { name, module, parameters, seq };
        match self.entries.iter_mut().find(|existing| existing.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        self.dirty = true;
    }

    /// Removes `name`; unknown names leave the registry untouched.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.name != name);
        let removed = self.entries.len() != before;
        if removed {
            self.dirty = true;
        }
        removed
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    pub fn entry(&self, name: &str) -> Option<&ModuleEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn get<T: DispatcherModule + 'static>(&self, name: &str) -> Option<&T> {
        self.entry(name).and_then(|entry| entry.module.as_any().downcast_ref::<T>())
    }

    pub fn get_mut<T: DispatcherModule + 'static>(&mut self, name: &str) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .find(|entry| entry.name == name)
            .and_then(|entry| entry.module.as_any_mut().downcast_mut::<T>())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleEntry> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.dirty = true;
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn entry_at(&self, index: usize) -> &ModuleEntry {
        &self.entries[index]
    }

    pub(crate) fn entry_at_mut(&mut self, index: usize) -> &mut ModuleEntry {
        &mut self.entries[index]
    }

    pub(crate) fn entries(&self) -> &[ModuleEntry] {
        &self.entries
    }
}
