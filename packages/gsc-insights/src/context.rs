//! Explicit per-caller context: client handles plus configuration.

use std::sync::Arc;

use crate::traits::{page_experience::PageExperienceApi, search_console::SearchConsoleApi};
use crate::types::config::InsightsConfig;

/// Everything a report operation needs, passed in by the caller.
///
/// Cheap to clone; the caller owns its lifecycle.
#[derive(Clone)]
pub struct InsightsContext {
    search_console: Arc<dyn SearchConsoleApi>,
    page_experience: Option<Arc<dyn PageExperienceApi>>,
    config: InsightsConfig,
}

impl InsightsContext {
    pub fn new(search_console: impl SearchConsoleApi + 'static, config: InsightsConfig) -> Self {
        Self {
            search_console: Arc::new(search_console),
            page_experience: None,
            config,
        }
    }

    /// Enable the sections that need PageSpeed / CrUX access.
    pub fn with_page_experience(mut self, page_experience: impl PageExperienceApi + 'static) -> Self {
        self.page_experience = Some(Arc::new(page_experience));
        self
    }

    pub fn search_console(&self) -> &dyn SearchConsoleApi {
        self.search_console.as_ref()
    }

    pub fn page_experience(&self) -> Option<&dyn PageExperienceApi> {
        self.page_experience.as_deref()
    }

    pub fn config(&self) -> &InsightsConfig {
        &self.config
    }
}
