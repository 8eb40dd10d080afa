// Adapters layer: concrete implementations for external systems.

pub mod mal_client;

pub use mal_client::MalClient;
