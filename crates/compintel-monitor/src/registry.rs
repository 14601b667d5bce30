//! Platform → monitor dispatch table.

use std::collections::HashMap;
use std::sync::Arc;

use compintel_core::{Platform, PlatformKeys};

use crate::error::MonitorError;
use crate::http::MonitorConfig;
use crate::{FacebookMonitor, InstagramMonitor, LinkedinMonitor, SourceMonitor, TwitterMonitor};

/// Registered monitors keyed by platform.
#[derive(Clone, Default)]
pub struct MonitorRegistry {
    monitors: HashMap<Platform, Arc<dyn SourceMonitor>>,
}

impl MonitorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the production registry with one HTTP monitor per supported platform.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Http`] if an HTTP client cannot be built.
    pub fn with_default_monitors(
        config: &MonitorConfig,
        keys: &PlatformKeys,
    ) -> Result<Self, MonitorError> {
        let mut registry = Self::new();
        registry.register(Arc::new(TwitterMonitor::new(config, keys.twitter.clone())?));
        registry.register(Arc::new(FacebookMonitor::new(config, keys.facebook.clone())?));
        registry.register(Arc::new(InstagramMonitor::new(
            config,
            keys.instagram.clone(),
        )?));
        registry.register(Arc::new(LinkedinMonitor::new(config, keys.linkedin.clone())?));
        Ok(registry)
    }

    /// Adds or replaces the monitor for its platform.
    pub fn register(&mut self, monitor: Arc<dyn SourceMonitor>) {
        self.monitors.insert(monitor.platform(), monitor);
    }

    #[must_use]
    pub fn get(&self, platform: Platform) -> Option<Arc<dyn SourceMonitor>> {
        self.monitors.get(&platform).cloned()
    }

    #[must_use]
    pub fn platforms(&self) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = self.monitors.keys().copied().collect();
        platforms.sort();
        platforms
    }
}

impl std::fmt::Debug for MonitorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorRegistry")
            .field("platforms", &self.platforms())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use compintel_core::Post;

    use super::*;

    struct StaticMonitor(Platform);

    #[async_trait]
    impl SourceMonitor for StaticMonitor {
        fn platform(&self) -> Platform {
            self.0
        }

        async fn fetch(&self, _handle: &str, _api_key: Option<&str>) -> Vec<Post> {
            Vec::new()
        }
    }

    #[test]
    fn default_registry_covers_all_platforms() {
        let registry =
            MonitorRegistry::with_default_monitors(&MonitorConfig::default(), &PlatformKeys::default())
                .expect("registry");
        let mut expected = Platform::DEFAULTS.to_vec();
        expected.sort();
        assert_eq!(registry.platforms(), expected);
    }

    #[test]
    fn register_replaces_existing_platform() {
        let mut registry = MonitorRegistry::new();
        registry.register(Arc::new(StaticMonitor(Platform::Twitter)));
        registry.register(Arc::new(StaticMonitor(Platform::Twitter)));
        assert_eq!(registry.platforms(), vec![Platform::Twitter]);
        assert!(registry.get(Platform::Facebook).is_none());
    }
}
