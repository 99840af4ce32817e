pub mod app_state_builder;
pub mod auth_helper;
pub mod in_memory_store;
pub mod port_mocks;
pub mod stubs;
