//! Cache & Bus (C2): write-through cache, pub/sub channels, atomic counters,
//! and the public-hall work queue.
//!
//! Grounded in `database/redis.go` of the original source (a `go-redis`
//! client behind a pool) and `database/product_db.go`'s Lua-scripted stock
//! counter. The Rust client multiplexes commands over one connection
//! (`redis::aio::ConnectionManager`), so there is no explicit pool to size —
//! see DESIGN.md for the Open Question this resolves.

pub mod error;
pub mod keys;

use std::time::Duration;

use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::config::RedisConfig;
pub use error::CacheError;

/// Lua script mirroring `PreReduceSeckillStock`: decrement iff the counter
/// is currently positive, atomically.
const DECR_IF_POSITIVE: &str = r"
local stock = tonumber(redis.call('get', KEYS[1]))
if stock and stock > 0 then
    redis.call('decr', KEYS[1])
    return 1
end
return 0
";

#[derive(Clone)]
pub struct Cache {
    conn: ConnectionManager,
}

impl Cache {
    pub async fn connect(config: &RedisConfig) -> Result<Self, CacheError> {
        let client = redis::Client::open(config.connection_url())?;
        let conn = client.get_connection_manager().await?;
        tracing::info!("Redis connection manager established");
        Ok(Self { conn })
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    pub async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, secs).await?;
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    pub async fn publish(&self, channel: &str, message: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(channel, message).await?;
        Ok(())
    }

    /// Push a serialized payload onto the tail of a list (the public-hall
    /// queue a published delivery order lands on).
    pub async fn lpush(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.lpush::<_, _, ()>(key, value).await?;
        Ok(())
    }

    /// Pop up to `count` items from the head of a list, oldest first.
    pub async fn rpop_many(&self, key: &str, count: usize) -> Result<Vec<String>, CacheError> {
        let mut conn = self.conn.clone();
        let items: Vec<String> = conn
            .rpop(key, std::num::NonZeroUsize::new(count))
            .await?;
        Ok(items)
    }

    pub async fn hset_multiple(&self, key: &str, fields: &[(&str, String)]) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.hset_multiple::<_, _, _, ()>(key, fields).await?;
        Ok(())
    }

    /// Atomically decrement a counter iff it is currently > 0. Returns
    /// whether the reservation succeeded. Grounds C8's cache-side reserve.
    pub async fn decr_if_positive(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        let script = redis::Script::new(DECR_IF_POSITIVE);
        let result: i32 = script.key(key).invoke_async(&mut conn).await?;
        Ok(result == 1)
    }

    /// Compensating rollback for a reservation whose downstream commit
    /// failed (`RollbackSeckillStock`'s counterpart).
    pub async fn incr(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.incr::<_, _, ()>(key, 1).await?;
        Ok(())
    }

    pub async fn set_counter(&self, key: &str, value: i64) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }
}
