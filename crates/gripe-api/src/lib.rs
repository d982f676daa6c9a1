pub mod grievances;
pub mod tokens;

use std::sync::Arc;

use gripe_db::Database;
use gripe_gateway::dispatcher::Dispatcher;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub dispatcher: Dispatcher,
}
