/// Read-through caching for an async computation returning `AppResult`.
///
/// Returns the cached value for `$key` when present. Otherwise awaits `$block`, queues the
/// result for a background write with `$ttl` seconds to live, and returns it. Must be used
/// inside a function returning `AppResult`, since cache reads propagate errors with `?`.
///
/// # Example
/// ```rust,ignore
/// let categories: Vec<CategoryRef> = cached!(cache, key, 3600, async move {
///     store.resolve_categories(&names).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        if let Some(cached) = $cache.get_from_cache(&$key).await? {
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&$key, &value, $ttl);
            Ok(value)
        }
    }};
}
