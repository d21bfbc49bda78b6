// Owned and watched positions and the users they belong to
pub mod position;
pub mod user;
