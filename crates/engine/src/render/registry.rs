use std::sync::Arc;

use indexmap::IndexMap;

use super::{CrackRenderer, NoopRenderer, RenderError};

/// Builds a renderer for one host version. May fail if the version's
/// prerequisites are missing; resolution then falls back to the no-op.
pub type RendererFactory =
    Box<dyn Fn() -> Result<Arc<dyn CrackRenderer>, RenderError> + Send + Sync>;

/// Explicit map from host version identifier to renderer factory.
///
/// Populated once at startup; iteration follows registration order.
#[derive(Default)]
pub struct RendererRegistry {
    factories: IndexMap<String, RendererFactory>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the factory for `version`.
    pub fn register<F>(&mut self, version: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<Arc<dyn CrackRenderer>, RenderError> + Send + Sync + 'static,
    {
        self.factories.insert(version.into(), Box::new(factory));
    }

    pub fn supports(&self, version: &str) -> bool {
        self.factories.contains_key(version)
    }

    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Pick the renderer for `version`.
    ///
    /// Never fails: an unknown version or a failing factory installs
    /// [`NoopRenderer`] and logs at info level.
    pub fn resolve(&self, version: &str) -> Arc<dyn CrackRenderer> {
        let Some(factory) = self.factories.get(version) else {
            tracing::info!("Couldn't find support for {}. Block cracks not activated.", version);
            return Arc::new(NoopRenderer);
        };

        match factory() {
            Ok(renderer) => {
                tracing::info!("Using crack renderer for version {}", version);
                renderer
            }
            Err(e) => {
                tracing::info!(
                    "Crack renderer for {} unavailable ({}). Block cracks not activated.",
                    version,
                    e
                );
                Arc::new(NoopRenderer)
            }
        }
    }
}
