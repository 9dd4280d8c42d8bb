mod handlers;
mod server;
mod state;

pub use server::{create_router, serve, start_webhook_server};
pub use state::AppState;
