pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod pagination;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
