mod session;

pub use session::ACCESS_TOKEN_KEY;
pub use session::FileSessionStore;
pub use session::MemorySessionStore;
pub use session::SessionStore;
pub use session::VERIFIER_KEY;
