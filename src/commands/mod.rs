pub mod events;
pub mod login;
pub mod logout;
pub mod sync;
