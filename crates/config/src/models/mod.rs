pub mod api_observability;
pub mod app_config;
pub mod dispatcher;
pub mod endpoints;
pub mod notification;
pub mod wallet;

pub use api_observability::*;
pub use app_config::*;
pub use dispatcher::*;
pub use endpoints::*;
pub use notification::*;
pub use wallet::*;
