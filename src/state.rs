use crate::save_state::SaveTracker;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub saves: SaveTracker,
}

impl AppState {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            saves: SaveTracker::new(),
        }
    }
}
