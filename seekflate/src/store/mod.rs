use crate::structs::checkpoint::Checkpoint;
use crate::utils::errors::StoreError;

/// In-memory checkpoint table.
pub mod memory;

/// SQLite checkpoint table as written by the checkpoint producer.
pub mod sqlite;

/// Read access to recorded checkpoints.
pub trait CheckpointStore {
    /// Looks up a checkpoint, `Ok(None)` when `id` is not recorded.
    fn get(&self, id: i64) -> Result<Option<Checkpoint>, StoreError>;

    /// All recorded ids in ascending order.
    fn ids(&self) -> Result<Vec<i64>, StoreError>;
}
