use std::sync::Mutex;

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::datatype::{Shoe, ShoeId, ShoePatch};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("shoe {0} not found")]
    NotFound(ShoeId),

    #[error("rejected by store: {0}")]
    Rejected(String),

    #[error("not signed in or session expired")]
    Unauthorized,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Document store holding one record per shoe.
///
/// The ledger never calls a store itself; the UI shell computes the next value
/// first and only adopts it once the matching write has been acknowledged.
#[allow(async_fn_in_trait)]
pub trait ShoeStore {
    async fn create_record(&self, shoe: &Shoe) -> Result<ShoeId, StoreError>;
    async fn update_record(&self, id: ShoeId, patch: &ShoePatch) -> Result<(), StoreError>;
    async fn delete_record(&self, id: ShoeId) -> Result<(), StoreError>;
    async fn list_records(&self) -> Result<Vec<Shoe>, StoreError>;
}

/// In-process store, used by the offline tracker and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<Shoe>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store; records without an id get one.
    pub fn with_records(records: Vec<Shoe>) -> Self {
        let records = records
            .into_iter()
            .map(|mut i| {
                i.id.get_or_insert_with(Uuid::new_v4);
                i
            })
            .collect();
        Self {
            records: Mutex::new(records),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Shoe>>, StoreError> {
        self.records
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("poisoned: {e}")))
    }
}

impl ShoeStore for MemoryStore {
    async fn create_record(&self, shoe: &Shoe) -> Result<ShoeId, StoreError> {
        let id = Uuid::new_v4();
        let mut record = shoe.clone();
        record.id = Some(id);
        self.lock()?.push(record);
        debug!(%id, "memory store: created");
        Ok(id)
    }

    async fn update_record(&self, id: ShoeId, patch: &ShoePatch) -> Result<(), StoreError> {
        let mut records = self.lock()?;
        let record = records
            .iter_mut()
            .find(|i| i.id == Some(id))
            .ok_or(StoreError::NotFound(id))?;
        if let Some(miles) = patch.miles {
            record.miles = miles;
        }
        if let Some(logs) = &patch.logs {
            record.logs = logs.clone();
        }
        debug!(%id, "memory store: updated");
        Ok(())
    }

    async fn delete_record(&self, id: ShoeId) -> Result<(), StoreError> {
        let mut records = self.lock()?;
        let before = records.len();
        records.retain(|i| i.id != Some(id));
        if records.len() == before {
            return Err(StoreError::NotFound(id));
        }
        debug!(%id, "memory store: deleted");
        Ok(())
    }

    async fn list_records(&self) -> Result<Vec<Shoe>, StoreError> {
        Ok(self.lock()?.clone())
    }
}
