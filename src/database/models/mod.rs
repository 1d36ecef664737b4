pub mod action_log;
pub mod chat_log;
pub mod navigation;
pub mod recommendation;
pub mod user;

pub use action_log::ActionLog;
pub use chat_log::{ChatLog, NewChatLog};
pub use navigation::{Navigation, NavigationChanges, NewNavigation};
pub use recommendation::{Recommendation, RecommendedContent};
pub use user::{NewUser, User, UserChanges, UserResponse, ROLE_ADMIN, ROLE_USER};
