pub(super) mod chat;
pub(super) mod downloads;
pub(super) mod health;
pub(super) mod tools;
