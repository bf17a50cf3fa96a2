pub mod local_store;
pub mod remote_target;
