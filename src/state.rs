use std::sync::Arc;

use campusnest_config::{CorsConfig, ImportConfig, JwtConfig};
use campusnest_import::StudentStore;

use crate::modules::student_imports::service::StudentImportService;

#[derive(Clone, Debug)]
pub struct AppState {
    pub imports: StudentImportService,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub import_config: ImportConfig,
}

impl AppState {
    pub fn new(
        store: Arc<dyn StudentStore>,
        jwt_config: JwtConfig,
        cors_config: CorsConfig,
        import_config: ImportConfig,
    ) -> Self {
        Self {
            imports: StudentImportService::new(store, import_config.clone()),
            jwt_config,
            cors_config,
            import_config,
        }
    }
}
