mod core;
mod shorthand;
mod tx;

pub use self::core::{ConnectHook, Connection};
