use super::{apply, CartEvent, CartState};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

/// Namespace key under which the cart is persisted on the client.
pub const CART_STORAGE_KEY: &str = "adire-cart";

#[derive(Debug, Error)]
pub enum CartStorageError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Durable client-side storage for the cart state.
///
/// Implementations wrap whatever the client platform offers (local
/// storage, secure storage, a file). The reducer never sees this trait.
pub trait CartStorage: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<CartState>, CartStorageError>;
    fn save(&self, key: &str, state: &CartState) -> Result<(), CartStorageError>;
    fn clear(&self, key: &str) -> Result<(), CartStorageError>;
}

impl<T: CartStorage + ?Sized> CartStorage for &T {
    fn load(&self, key: &str) -> Result<Option<CartState>, CartStorageError> {
        (**self).load(key)
    }
    fn save(&self, key: &str, state: &CartState) -> Result<(), CartStorageError> {
        (**self).save(key, state)
    }
    fn clear(&self, key: &str) -> Result<(), CartStorageError> {
        (**self).clear(key)
    }
}

/// In-memory storage backend, used in tests and headless flows.
#[derive(Debug, Default)]
pub struct InMemoryCartStorage {
    cells: Mutex<HashMap<String, String>>,
}

impl InMemoryCartStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartStorage for InMemoryCartStorage {
    fn load(&self, key: &str) -> Result<Option<CartState>, CartStorageError> {
        let cells = self
            .cells
            .lock()
            .map_err(|e| CartStorageError::Backend(e.to_string()))?;
        cells
            .get(key)
            .map(|raw| serde_json::from_str(raw).map_err(Into::into))
            .transpose()
    }

    fn save(&self, key: &str, state: &CartState) -> Result<(), CartStorageError> {
        let raw = serde_json::to_string(state)?;
        let mut cells = self
            .cells
            .lock()
            .map_err(|e| CartStorageError::Backend(e.to_string()))?;
        cells.insert(key.to_string(), raw);
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), CartStorageError> {
        let mut cells = self
            .cells
            .lock()
            .map_err(|e| CartStorageError::Backend(e.to_string()))?;
        cells.remove(key);
        Ok(())
    }
}

/// State container binding the pure reducer to a storage adapter.
///
/// Every dispatched event is applied and the resulting state written back
/// under [`CART_STORAGE_KEY`], so the cart survives across sessions.
pub struct CartStore<S: CartStorage> {
    storage: S,
    key: String,
    state: CartState,
}

impl<S: CartStorage> CartStore<S> {
    /// Opens the store, restoring any previously persisted state.
    pub fn open(storage: S) -> Result<Self, CartStorageError> {
        let key = CART_STORAGE_KEY.to_string();
        let state = storage.load(&key)?.unwrap_or_default();
        Ok(Self {
            storage,
            key,
            state,
        })
    }

    pub fn state(&self) -> &CartState {
        &self.state
    }

    /// Applies one event and persists the new state.
    pub fn dispatch(&mut self, event: CartEvent) -> Result<&CartState, CartStorageError> {
        self.state = apply(std::mem::take(&mut self.state), event);
        self.storage.save(&self.key, &self.state)?;
        Ok(&self.state)
    }

    /// Empties the cart and removes the persisted entry.
    pub fn clear(&mut self) -> Result<(), CartStorageError> {
        self.state = CartState::default();
        self.storage.clear(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartLine;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn sample_line() -> CartLine {
        CartLine {
            variant_id: Uuid::from_u128(7),
            product_id: Uuid::from_u128(70),
            product_name: "Aso-oke stole".to_string(),
            size: Some("M".to_string()),
            color: Some("burgundy".to_string()),
            unit_price: dec!(12000),
            quantity: 1,
            image_url: None,
        }
    }

    #[test]
    fn state_survives_reopening_the_store() {
        let storage = InMemoryCartStorage::new();
        {
            let mut store = CartStore::open(&storage).unwrap();
            store
                .dispatch(CartEvent::ItemAdded(sample_line()))
                .unwrap();
        }
        let reopened = CartStore::open(&storage).unwrap();
        assert_eq!(reopened.state().total_items, 1);
        assert_eq!(reopened.state().subtotal, dec!(12000));
    }

    #[test]
    fn clear_removes_the_persisted_entry() {
        let storage = InMemoryCartStorage::new();
        let mut store = CartStore::open(&storage).unwrap();
        store
            .dispatch(CartEvent::ItemAdded(sample_line()))
            .unwrap();
        store.clear().unwrap();
        assert!(storage.load(CART_STORAGE_KEY).unwrap().is_none());

        let reopened = CartStore::open(&storage).unwrap();
        assert_eq!(reopened.state(), &CartState::default());
    }
}
