pub mod dispatcher;
pub mod lifecycle;
pub mod llm;
pub mod relay;
pub mod signature;
pub mod store;
