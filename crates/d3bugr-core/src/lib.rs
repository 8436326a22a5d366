//! d3bugr-core - Core types for the d3bugr gateway
//!
//! This crate holds everything the gateway knows before it talks to the
//! network: the typed descriptor documents, the immutable store they are
//! loaded into, the service registry derived from that store, and the error
//! taxonomy shared by the forwarding and HTTP layers.

pub mod descriptor;
pub mod error;
pub mod registry;
pub mod routing;
pub mod store;

pub use descriptor::{EndpointDescriptor, MetaDocument, ParameterDescriptor, ServiceDescriptor};
pub use error::{DescriptorError, GatewayError, GatewayResult};
pub use registry::ServiceRegistry;
pub use store::DescriptorStore;
