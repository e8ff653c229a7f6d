pub mod cid;
pub mod frame;
pub mod logs;
pub mod macros;
pub mod sim_id;
