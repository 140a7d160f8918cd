//! Process-wide configuration snapshot with atomic replacement

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use super::model::Configuration;

/// Holds the active configuration.
///
/// Readers take an [`Arc`] snapshot and keep using it for the whole event, so
/// a concurrent [`replace`](Self::replace) never changes what they see.
#[derive(Debug)]
pub struct ConfigurationStore {
    current: RwLock<Arc<Configuration>>,
    generation: AtomicU64,
}

impl ConfigurationStore {
    pub fn new(config: Configuration) -> Self {
        Self {
            current: RwLock::new(Arc::new(config)),
            generation: AtomicU64::new(0),
        }
    }

    /// The configuration in effect right now.
    pub fn snapshot(&self) -> Arc<Configuration> {
        let guard = self.current.read().unwrap_or_else(|p| p.into_inner());
        Arc::clone(&guard)
    }

    /// Swap in a new configuration. Returns the new generation number.
    pub fn replace(&self, config: Configuration) -> u64 {
        let mut guard = self.current.write().unwrap_or_else(|p| p.into_inner());
        *guard = Arc::new(config);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(generation, "Configuration replaced");
        generation
    }

    /// Number of replacements since construction.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baker_test_utils::forge::TestForge;

    fn sample(merge: bool) -> Configuration {
        let forge = TestForge::new();
        serde_yaml::from_str(&forge.config_yaml(merge, true, &[("bash", "f39", "f39")])).unwrap()
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let store = ConfigurationStore::new(sample(false));
        let before = store.snapshot();

        let generation = store.replace(sample(true));

        assert_eq!(generation, 1);
        assert!(!before.settings.control.merge);
        assert!(store.snapshot().settings.control.merge);
    }

    #[test]
    fn test_concurrent_readers_see_whole_configs() {
        let store = Arc::new(ConfigurationStore::new(sample(false)));
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let snap = store.snapshot();
                        assert_eq!(snap.components.len(), 1);
                    }
                })
            })
            .collect();
        for _ in 0..10 {
            store.replace(sample(true));
        }
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(store.generation(), 10);
    }
}
