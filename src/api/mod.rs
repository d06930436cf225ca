pub mod events;
pub mod middleware;
pub mod notifications;
pub mod push_tokens;
pub mod router;

pub use middleware::*;
pub use router::build_router;
