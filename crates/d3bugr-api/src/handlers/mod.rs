//! HTTP request handlers for the gateway API

pub mod call;
pub mod docs;
pub mod status;
