pub mod http_client;
pub use http_client::HttpClientFactory;

pub mod utils;
pub use utils::{constant_time_eq, MAX_REQUEST_SIZE};
