pub mod attendance;
pub mod branch;
pub mod role;
