pub mod health;
pub mod horses;
pub mod inbox;
pub mod stables;

use axum::Router;

pub fn router() -> Router {
    Router::new()
        .merge(health::router())
        .merge(stables::router())
        .merge(horses::router())
        .merge(inbox::router())
}
