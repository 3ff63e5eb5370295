use std::sync::Arc;

use crate::config::Config;
use crate::recognition::RecognitionBackend;
use crate::services::Dispatcher;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(
        config: Config,
        offline: Arc<dyn RecognitionBackend>,
        cloud: Arc<dyn RecognitionBackend>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher: Dispatcher::new(offline, cloud),
        }
    }
}
