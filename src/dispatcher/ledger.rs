use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// Named exclusive resource, usually one hand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActivitySlot(Cow<'static, str>);

impl ActivitySlot {
    pub const LEFT_HAND: ActivitySlot = ActivitySlot(Cow::Borrowed("leftHand"));
    pub const RIGHT_HAND: ActivitySlot = ActivitySlot(Cow::Borrowed("rightHand"));

    pub fn custom(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_hand(&self) -> bool {
        *self == Self::LEFT_HAND || *self == Self::RIGHT_HAND
    }
}

impl fmt::Display for ActivitySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who holds which slot. Only the scheduler mutates it, one module at a time.
#[derive(Debug, Default)]
pub struct ActivitySlotLedger {
    holders: BTreeMap<ActivitySlot, String>,
}

impl ActivitySlotLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&mut self, slot: &ActivitySlot, module: &str) -> bool {
        if self.holders.contains_key(slot) {
            return false;
        }
        self.holders.insert(slot.clone(), module.to_string());
        true
    }

    /// Acquires every slot or none of them.
    pub fn try_acquire_all<'a>(
        &mut self,
        slots: impl IntoIterator<Item = &'a ActivitySlot> + Clone,
        module: &str,
    ) -> bool {
        if !self.all_free(slots.clone()) {
            return false;
        }
        for slot in slots {
            self.holders.insert(slot.clone(), module.to_string());
        }
        true
    }

    /// Frees `slot` if `module` holds it; returns whether anything changed.
    pub fn release(&mut self, slot: &ActivitySlot, module: &str) -> bool {
        match self.holders.get(slot) {
            Some(holder) if holder == module => {
                self.holders.remove(slot);
                true
            }
            _ => false,
        }
    }

    pub fn release_all(&mut self, module: &str) -> Vec<ActivitySlot> {
        let held: Vec<ActivitySlot> =
            self.holders.iter().filter(|(_, holder)| *holder == module).map(|(slot, _)| slot.clone()).collect();
        for slot in &held {
            self.holders.remove(slot);
        }
        held
    }

    pub fn holder(&self, slot: &ActivitySlot) -> Option<&str> {
        self.holders.get(slot).map(String::as_str)
    }

    pub fn is_free(&self, slot: &ActivitySlot) -> bool {
        !self.holders.contains_key(slot)
    }

    pub fn all_free<'a>(&self, slots: impl IntoIterator<Item = &'a ActivitySlot>) -> bool {
        slots.into_iter().all(|slot| self.is_free(slot))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ActivitySlot, &str)> {
        self.holders.iter().map(|(slot, holder)| (slot, holder.as_str()))
    }

    pub fn len(&self) -> usize {
        self.holders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }

    pub fn clear(&mut self) {
        self.holders.clear();
    }
}
