// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Every handler here receives the caller as `Extension<AuthUser>`, inserted
// by the auth middleware layered over these routes.

pub mod chat;
pub mod me;
pub mod navigation;
pub mod recommendations;

pub use chat::delete as chat_delete;
pub use chat::detail as chat_detail;
pub use chat::history as chat_history;
pub use chat::send as chat_send;

pub use me::activity as me_activity;
pub use me::read as me_read;
pub use me::recommendations as me_recommendations;
pub use me::update as me_update;

pub use navigation::create as navigation_create;
pub use navigation::delete as navigation_delete;
pub use navigation::update as navigation_update;

pub use recommendations::create as recommendation_create;
