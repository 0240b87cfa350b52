//! Optional page experience capability (needs an API key upstream).

use async_trait::async_trait;

use crate::error::Result;
use crate::types::experience::{FieldVitals, FormFactor, LabReport, Strategy};

#[async_trait]
pub trait PageExperienceApi: Send + Sync {
    /// Lighthouse lab run.
    async fn lab_report(&self, url: &str, strategy: Strategy) -> Result<LabReport>;

    /// Chrome UX Report field data.
    async fn field_vitals(&self, url: &str, form_factor: FormFactor) -> Result<FieldVitals>;
}
