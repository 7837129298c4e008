pub mod camp;
pub mod speaker;
pub mod talk;
pub mod user;

pub use camp::{Camp, Location, NewCamp};
pub use speaker::{NewSpeaker, Speaker};
pub use talk::{NewTalk, Talk};
pub use user::{NewUser, User, SUPER_USER_CLAIM};
