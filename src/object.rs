//! Object arena: identity, tag, size, validity, and replica placements
//! (§3 "Object").

/// One of the three copies of an object: which disk it lives on and the
/// concrete block address of every object-block within that replica.
#[derive(Debug, Clone, Default)]
pub struct Replica {
    pub disk: usize,
    pub blocks: Vec<usize>,
}

/// A sized, tagged datum replicated to three disks.
///
/// Retained (with `valid = false`) after deletion so that a request
/// referencing it by id can still be looked up historically, even though
/// its storage cells have been freed (§3: "storage cells referenced by
/// replicas are freed at delete time but the Object record is retained").
#[derive(Debug, Clone)]
pub struct Object {
    pub id: u32,
    pub tag: usize,
    pub size: usize,
    pub valid: bool,
    pub replicas: [Replica; 3],
}

impl Object {
    fn new(id: u32, tag: usize, size: usize) -> Self {
        Self {
            id,
            tag,
            size,
            valid: true,
            replicas: Default::default(),
        }
    }
}

/// Arena of every object ever created in this run, indexed by object id.
#[derive(Debug, Clone, Default)]
pub struct ObjectPool {
    objects: Vec<Object>,
}

impl ObjectPool {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
        }
    }

    /// Allocates a new object record and returns its id. Replicas are
    /// filled in afterwards by the caller (the [`crate::placer::Placer`]),
    /// once all three have been placed successfully.
    pub fn insert(&mut self, tag: usize, size: usize) -> u32 {
        let id = self.objects.len() as u32;
        self.objects.push(Object::new(id, tag, size));
        id
    }

    pub fn get(&self, id: u32) -> &Object {
        &self.objects[id as usize]
    }

    pub fn get_mut(&mut self, id: u32) -> &mut Object {
        &mut self.objects[id as usize]
    }

    /// Marks an object invalid. Caller is responsible for freeing its
    /// storage cells and cancelling outstanding tasks.
    pub fn invalidate(&mut self, id: u32) {
        self.objects[id as usize].valid = false;
    }

    pub fn is_valid(&self, id: u32) -> bool {
        self.objects
            .get(id as usize)
            .map(|o| o.valid)
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests;
