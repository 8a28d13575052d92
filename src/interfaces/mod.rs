pub mod relay;
pub mod web;
