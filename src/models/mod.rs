pub mod alert;

pub use alert::{Alert, AlertDraft, NewAlert};
