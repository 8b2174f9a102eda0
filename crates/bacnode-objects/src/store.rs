use bacnode_core::types::object_id::{BACNET_MAX_INSTANCE, BACNET_WILDCARD_INSTANCE};
use std::collections::BTreeMap;

/// Instance-keyed collection owning every object of one type.
#[derive(Debug, Clone)]
pub struct ObjectStore<O> {
    objects: BTreeMap<u32, O>,
}

impl<O> Default for ObjectStore<O> {
    fn default() -> Self {
        Self {
            objects: BTreeMap::new(),
        }
    }
}

impl<O> ObjectStore<O> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, instance: u32) -> bool {
        self.objects.contains_key(&instance)
    }

    pub fn get(&self, instance: u32) -> Option<&O> {
        self.objects.get(&instance)
    }

    pub fn get_mut(&mut self, instance: u32) -> Option<&mut O> {
        self.objects.get_mut(&instance)
    }

    /// Lowest instance not yet in use.
    pub fn next_free_instance(&self) -> Option<u32> {
        let mut candidate = 0u32;
        for &instance in self.objects.keys() {
            if instance != candidate {
                break;
            }
            candidate += 1;
        }
        (candidate <= BACNET_MAX_INSTANCE).then_some(candidate)
    }

    /// Resolves a requested instance: `None` or the wildcard picks the next
    /// free one. Returns `None` when the request cannot be honoured.
    pub fn assign_instance(&self, requested: Option<u32>) -> Option<u32> {
        match requested {
            None | Some(BACNET_WILDCARD_INSTANCE) => self.next_free_instance(),
            Some(instance) if instance > BACNET_MAX_INSTANCE => None,
            Some(instance) if self.contains(instance) => None,
            Some(instance) => Some(instance),
        }
    }

    /// Inserts an object, returning the one it replaced.
    pub fn insert(&mut self, instance: u32, object: O) -> Option<O> {
        self.objects.insert(instance, object)
    }

    pub fn remove(&mut self, instance: u32) -> Option<O> {
        self.objects.remove(&instance)
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }

    pub fn instances(&self) -> impl Iterator<Item = u32> + '_ {
        self.objects.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &O)> + '_ {
        self.objects.iter().map(|(k, v)| (*k, v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut O)> + '_ {
        self.objects.iter_mut().map(|(k, v)| (*k, v))
    }

    pub fn values(&self) -> impl Iterator<Item = &O> + '_ {
        self.objects.values()
    }
}
