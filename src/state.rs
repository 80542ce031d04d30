use std::sync::Arc;

use crate::config::Config;
use crate::services::users::UserService;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub users: UserService,
}
