use std::sync::Arc;

use sqlx::Pool;

#[derive(Clone)]
pub struct AppState {
    state: Arc<AppStateInner>,
}

impl AppState {
    pub fn new(app_config: AppConfig, pool: Pool<sqlx::Sqlite>) -> Self {
        AppState {
            state: Arc::new(AppStateInner { app_config, pool }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.app_config
    }

    pub fn pool(&self) -> &Pool<sqlx::Sqlite> {
        &self.state.pool
    }
}

// axum-valid's `Garde` extractor requires the garde validation context
// (here `()`) to be extractable from the router state.
impl axum::extract::FromRef<AppState> for () {
    fn from_ref(_: &AppState) {}
}

struct AppStateInner {
    pool: Pool<sqlx::Sqlite>,
    app_config: AppConfig,
}

pub struct AppConfig {
    pub default_page_size: u32,
}
