pub mod file_session_store;
pub mod memory_session_store;
pub mod session_store;

pub use file_session_store::FileSessionStore;
pub use memory_session_store::MemorySessionStore;
pub use session_store::{SessionStore, StoredToken};
