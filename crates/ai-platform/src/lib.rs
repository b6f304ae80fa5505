//! A single invocation surface over generative AI provider apis
//!
//! Callers describe a [`model::Model`], hand a conversation, text or JSON input to a
//! [`platform::Platform`] and read back a [`result::ModelResult`]. Providers plug in
//! as model clients and result converters; the [`contract::Contract`] turns the
//! provider neutral message model into each provider's wire format.
pub mod agent;
pub mod configuration;
pub mod contract;
pub mod errors;
pub mod model;
pub mod models;
pub mod platform;
pub mod providers;
pub mod result;
pub mod toolbox;
pub mod transport;
