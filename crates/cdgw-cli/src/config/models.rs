use cdgw::engine::config::GwConfig;
use std::path::PathBuf;

pub struct AppConfig {
    pub input_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub history_path: Option<PathBuf>,
    pub core_config: GwConfig,
}
