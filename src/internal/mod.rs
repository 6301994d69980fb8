pub(crate) mod auth_flow;
pub(crate) mod credential_store;
pub(crate) mod token_manager;
