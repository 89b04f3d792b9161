//! Persistence layer — session storage behind the `SessionStore` trait.

pub mod memory;
pub mod traits;

pub use memory::InMemorySessionStore;
pub use traits::SessionStore;
