pub mod alert_handler;

pub use alert_handler::{AlertHandler, AlertRequest, AlertResponse};
