/// Read-through caching over [`Cache`](crate::db::Cache).
///
/// Returns the cached value when present. Otherwise awaits `$block`, queues the
/// computed value for storage and returns it. A failed cache read is logged and
/// treated as a miss so an unreachable Redis never fails the caller.
///
/// # Arguments
/// * `$cache`: cache handle with `get_from_cache` and `set_in_background`.
/// * `$key`: the [`CacheKey`](crate::db::CacheKey) to look up.
/// * `$ttl`: time-to-live in seconds for a freshly computed value.
/// * `$block`: future computing the value on a miss; its error is propagated.
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        let hit = match $cache.get_from_cache(&key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Cache read failed, treating as miss");
                None
            }
        };

        match hit {
            Some(cached) => {
                tracing::debug!(key = %key, "Cache hit");
                Ok::<_, $crate::error::AppError>(cached)
            }
            None => {
                let value = $block.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok::<_, $crate::error::AppError>(value)
            }
        }
    }};
}
