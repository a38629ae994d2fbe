use roamsync_core::{MemoryStore, SettingsStore};

/// Settings store whose every operation can be made to fail, for driving
/// the engine's degrade-to-defaults path.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    broken: bool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn broken() -> Self {
        Self {
            inner: MemoryStore::new(),
            broken: true,
        }
    }

    pub fn set_broken(&mut self, broken: bool) {
        self.broken = broken;
    }
}

impl SettingsStore for FlakyStore {
    type Error = ();

    async fn get(&self, key: &str) -> Result<Option<String>, ()> {
        if self.broken {
            return Err(());
        }
        self.inner.get(key).await
    }

    async fn put(&mut self, key: &str, value: &str) -> Result<(), ()> {
        if self.broken {
            return Err(());
        }
        self.inner.put(key, value).await
    }

    async fn remove(&mut self, key: &str) -> Result<(), ()> {
        if self.broken {
            return Err(());
        }
        self.inner.remove(key).await
    }
}
