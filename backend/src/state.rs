use std::sync::Arc;

use crate::{
    config::Config,
    repositories::Repositories,
    services::{messaging::MessageDispatcher, robot_api::RobotApi},
};

#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub robot_api: Arc<dyn RobotApi>,
    pub dispatcher: Arc<MessageDispatcher>,
    pub config: Config,
}

impl AppState {
    /// Builds the state with a dispatcher over the given session store and client.
    pub fn new(repos: Repositories, robot_api: Arc<dyn RobotApi>, config: Config) -> Self {
        let dispatcher = Arc::new(MessageDispatcher::new(
            repos.sessions.clone(),
            robot_api.clone(),
            config.message_strategy,
        ));
        Self {
            repos,
            robot_api,
            dispatcher,
            config,
        }
    }
}
