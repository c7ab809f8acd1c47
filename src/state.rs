use std::sync::Arc;

use crate::config::AppConfig;
use crate::supabase::{Backend, Supabase};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub backend: Arc<dyn Backend>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let backend = Arc::new(Supabase::new(
            &config.supabase_url,
            &config.supabase_anon_key,
        )?) as Arc<dyn Backend>;
        Ok(Self { config, backend })
    }

    pub fn from_parts(config: Arc<AppConfig>, backend: Arc<dyn Backend>) -> Self {
        Self { config, backend }
    }
}

