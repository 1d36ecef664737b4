// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Account creation, token acquisition and the read side of the shared
// navigation directory.

pub mod auth;
pub mod navigation;

pub use auth::login as auth_login;
pub use auth::register as auth_register;
pub use navigation::get as navigation_get;
pub use navigation::list as navigation_list;
