use crate::{error::SeawatchError, repository::Cache};
use async_trait::async_trait;
use std::{collections::HashMap, sync::Mutex, time::Duration};
use tokio::time::Instant;

/// In-process `Cache` whose entries expire on the tokio clock.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, SeawatchError> {
        let mut entries = self.entries.lock().map_err(|_| SeawatchError::StorePoisoned("cache"))?;
        let expired = match entries.get(key) {
            Some((value, expires_at)) if Instant::now() < *expires_at => return Ok(Some(value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), SeawatchError> {
        let mut entries = self.entries.lock().map_err(|_| SeawatchError::StorePoisoned("cache"))?;
        entries.insert(key.to_string(), (value, Instant::now() + ttl));
        Ok(())
    }
}
