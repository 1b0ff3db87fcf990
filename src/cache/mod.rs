use std::collections::HashMap;
use std::sync::OnceLock;
use tokio::sync::RwLock;
use tracing::debug;

/// In-process page-cache invalidation registry. Mutating services bump the
/// version of every path they affect; readers can use the version as a
/// cheap staleness signal (e.g. for ETag derivation). Invalidation is
/// fire-and-forget: failures are impossible by construction and callers
/// never await a confirmation beyond the bump itself.
pub struct PageCache {
    versions: RwLock<HashMap<String, u64>>,
}

impl PageCache {
    fn instance() -> &'static PageCache {
        static INSTANCE: OnceLock<PageCache> = OnceLock::new();
        INSTANCE.get_or_init(|| PageCache {
            versions: RwLock::new(HashMap::new()),
        })
    }

    /// Mark a rendered path as stale
    pub async fn revalidate_path(path: &str) {
        let cache = Self::instance();
        let mut versions = cache.versions.write().await;
        let version = versions.entry(path.to_string()).or_insert(0);
        *version += 1;
        debug!("Revalidated path {} (v{})", path, version);
    }

    /// Current version of a path; 0 means never invalidated
    pub async fn version(path: &str) -> u64 {
        let cache = Self::instance();
        let versions = cache.versions.read().await;
        versions.get(path).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn revalidation_bumps_version() {
        let before = PageCache::version("/kesekretariatan/doling-test").await;
        PageCache::revalidate_path("/kesekretariatan/doling-test").await;
        PageCache::revalidate_path("/kesekretariatan/doling-test").await;
        let after = PageCache::version("/kesekretariatan/doling-test").await;
        assert_eq!(after, before + 2);
    }

    #[tokio::test]
    async fn unknown_path_is_version_zero() {
        assert_eq!(PageCache::version("/never-touched").await, 0);
    }
}
