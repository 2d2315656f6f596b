use std::sync::Arc;

use crate::app::App;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub app: App,
    pub config: Arc<Config>,
}
