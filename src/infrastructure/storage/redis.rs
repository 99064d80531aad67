//! Redis key-value storage implementation

use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};
use tracing::debug;

use crate::domain::storage::{Storage, StorageEntity, StorageKey};
use crate::domain::DomainError;

/// Configuration for Redis storage
#[derive(Debug, Clone)]
pub struct RedisStorageConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Namespace for every key this storage writes
    pub key_prefix: String,
}

impl Default for RedisStorageConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: "usage-dashboard:credentials".to_string(),
        }
    }
}

impl RedisStorageConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }
}

/// Redis-backed storage
///
/// Each entity is one JSON string at `{prefix}:items:{key}`. A set at
/// `{prefix}:index` records which keys exist so the store can be listed
/// without `KEYS`/`SCAN`.
pub struct RedisStorage<E>
where
    E: StorageEntity,
{
    connection: ConnectionManager,
    config: RedisStorageConfig,
    _phantom: PhantomData<E>,
}

impl<E> fmt::Debug for RedisStorage<E>
where
    E: StorageEntity,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStorage")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl<E> RedisStorage<E>
where
    E: StorageEntity,
{
    pub async fn connect(config: RedisStorageConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::storage(format!("Failed to create Redis client: {}", e)))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self {
            connection,
            config,
            _phantom: PhantomData,
        })
    }

    fn item_key(&self, key: &str) -> String {
        item_key(&self.config.key_prefix, key)
    }

    fn index_key(&self) -> String {
        index_key(&self.config.key_prefix)
    }
}

/// Writes the item and its index entry together, or neither when the key is taken.
/// KEYS: item, index. ARGV: value, key. Returns 1 when created.
const CREATE_SCRIPT: &str = r"
if redis.call('SET', KEYS[1], ARGV[1], 'NX') then
    redis.call('SADD', KEYS[2], ARGV[2])
    return 1
end
return 0
";

fn item_key(prefix: &str, key: &str) -> String {
    format!("{}:items:{}", prefix, key)
}

fn index_key(prefix: &str) -> String {
    format!("{}:index", prefix)
}

fn encode<E: StorageEntity>(entity: &E) -> Result<String, DomainError> {
    serde_json::to_string(entity)
        .map_err(|e| DomainError::storage(format!("Failed to serialize entity: {}", e)))
}

fn decode<E: StorageEntity>(data: &str) -> Result<E, DomainError> {
    serde_json::from_str(data)
        .map_err(|e| DomainError::storage(format!("Failed to deserialize entity: {}", e)))
}

#[async_trait]
impl<E> Storage<E> for RedisStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        let mut conn = self.connection.clone();

        let data: Option<String> = conn.get(self.item_key(key.as_str())).await.map_err(|e| {
            DomainError::storage(format!("Failed to get key '{}': {}", key.as_str(), e))
        })?;

        data.as_deref().map(decode).transpose()
    }

    async fn list(&self) -> Result<Vec<E>, DomainError> {
        let mut conn = self.connection.clone();

        let keys: Vec<String> = conn
            .smembers(self.index_key())
            .await
            .map_err(|e| DomainError::storage(format!("Failed to read index: {}", e)))?;

        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let item_keys: Vec<String> = keys.iter().map(|key| self.item_key(key)).collect();
        let values: Vec<Option<String>> = conn
            .mget(&item_keys)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to read entities: {}", e)))?;

        let mut entities = Vec::with_capacity(values.len());

        for (key, data) in keys.iter().zip(values) {
            match data {
                Some(data) => entities.push(decode(&data)?),
                None => debug!(key = %key, "Skipping index entry without a stored value"),
            }
        }

        Ok(entities)
    }

    async fn create(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let data = encode(&entity)?;
        let mut conn = self.connection.clone();

        let created: i64 = Script::new(CREATE_SCRIPT)
            .key(self.item_key(&key))
            .key(self.index_key())
            .arg(data)
            .arg(&key)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create key '{}': {}", key, e)))?;

        if created == 0 {
            return Err(DomainError::conflict(format!(
                "Entity with key '{}' already exists",
                key
            )));
        }

        Ok(entity)
    }

    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        let (removed, _): (i64, i64) = redis::pipe()
            .atomic()
            .del(self.item_key(key.as_str()))
            .srem(self.index_key(), key.as_str())
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to delete key '{}': {}", key.as_str(), e))
            })?;

        Ok(removed > 0)
    }

    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        conn.exists(self.item_key(key.as_str())).await.map_err(|e| {
            DomainError::storage(format!("Failed to check key '{}': {}", key.as_str(), e))
        })
    }
}
