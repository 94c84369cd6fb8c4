mod auth;
mod posts;

use axum::Router;
use crate::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(auth::routes())
        .merge(posts::routes(state))
}
