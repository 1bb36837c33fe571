use std::sync::Arc;

use crate::config::Config;
use crate::navigation::RouteTable;
use crate::workspace::WorkspaceRegistry;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub workspaces: WorkspaceRegistry,
    pub routes: RouteTable,
}
