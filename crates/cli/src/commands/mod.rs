pub(crate) mod chat;
pub(crate) mod index;
pub(crate) mod search;
