//! Generational arena for runtime instances.
//!
//! Instances must outlive transient references held by callers (the
//! render layer may hold a handle across detours), so the session owns
//! them here and hands out generation-checked handles. A handle to a
//! removed instance resolves to `None` instead of aliasing whatever
//! reused the slot.

use crate::instance::RuntimeInstance;

/// Stable, generation-checked reference to a registered instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle {
    index: u32,
    generation: u32,
}

struct Slot {
    generation: u32,
    value: Option<RuntimeInstance>,
}

#[derive(Default)]
pub struct InstanceArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl InstanceArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, instance: RuntimeInstance) -> InstanceHandle {
        self.len += 1;
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.value = Some(instance);
                InstanceHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    value: Some(instance),
                });
                InstanceHandle {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        }
    }

    pub fn get(&self, handle: InstanceHandle) -> Option<&RuntimeInstance> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: InstanceHandle) -> Option<&mut RuntimeInstance> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    pub fn contains(&self, handle: InstanceHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Free a slot. The generation is bumped so outstanding handles to
    /// the removed instance go stale instead of dangling.
    pub fn remove(&mut self, handle: InstanceHandle) -> Option<RuntimeInstance> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)?;
        let instance = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        Some(instance)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
