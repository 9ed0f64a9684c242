use std::collections::BTreeMap;

use crate::store::CheckpointStore;
use crate::structs::checkpoint::Checkpoint;
use crate::utils::errors::StoreError;

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    checkpoints: BTreeMap<i64, Checkpoint>,
}

impl MemoryStore {
    /// Adds a checkpoint, returning the one it replaced.
    pub fn insert(&mut self, checkpoint: Checkpoint) -> Option<Checkpoint> {
        self.checkpoints.insert(checkpoint.id, checkpoint)
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }
}

impl FromIterator<Checkpoint> for MemoryStore {
    fn from_iter<T: IntoIterator<Item = Checkpoint>>(iter: T) -> Self {
        Self {
            checkpoints: iter.into_iter().map(|c| (c.id, c)).collect(),
        }
    }
}

impl CheckpointStore for MemoryStore {
    fn get(&self, id: i64) -> Result<Option<Checkpoint>, StoreError> {
        Ok(self.checkpoints.get(&id).cloned())
    }

    fn ids(&self) -> Result<Vec<i64>, StoreError> {
        Ok(self.checkpoints.keys().copied().collect())
    }
}

#[test]
fn test_memory_store() {
    let mut store: MemoryStore = [
        Checkpoint::new(5, 10, 1, b"a".to_vec(), 16, 2),
        Checkpoint::new(2, 0, 0, Vec::new(), 80, 9),
    ]
    .into_iter()
    .collect();

    assert_eq!(store.len(), 2);
    assert_eq!(store.ids().unwrap(), vec![2, 5]);
    assert_eq!(store.get(5).unwrap().unwrap().from_byte, 10);
    assert!(store.get(3).unwrap().is_none());

    let replaced = store.insert(Checkpoint::new(5, 11, 2, b"b".to_vec(), 16, 2));
    assert_eq!(replaced.unwrap().from_byte, 10);
    assert_eq!(store.get(5).unwrap().unwrap().from_byte, 11);
}
