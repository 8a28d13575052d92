pub mod tasks;
pub mod webhooks;
