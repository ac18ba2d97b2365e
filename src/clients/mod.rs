//! Type-safe wrappers around [`ResourceClient`](crate::framework::ResourceClient)
//! and the store built on top of them.

pub mod actor_client;
pub mod cart_client;
pub mod cart_store;
pub mod lanes;
pub mod server_client;
pub mod service;

pub use actor_client::ActorClient;
pub use cart_client::CartClient;
pub use cart_store::CartStore;
pub use lanes::LineLanes;
pub use server_client::ServerCartClient;
pub use service::{CartService, ServiceError};
