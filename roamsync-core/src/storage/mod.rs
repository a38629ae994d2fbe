mod memory;

pub use memory::*;

use alloc::string::String;

/// Durable key/value store for persisted tunables and the last-good
/// network. Values are plain strings; typed accessors live in
/// [`crate::settings`].
#[allow(async_fn_in_trait)]
pub trait SettingsStore {
    type Error;

    async fn get(&self, key: &str) -> core::result::Result<Option<String>, Self::Error>;

    async fn put(&mut self, key: &str, value: &str) -> core::result::Result<(), Self::Error>;

    async fn remove(&mut self, key: &str) -> core::result::Result<(), Self::Error>;

    async fn contains(&self, key: &str) -> core::result::Result<bool, Self::Error> {
        Ok(self.get(key).await?.is_some())
    }
}
