pub mod reconcile;
pub mod server;
