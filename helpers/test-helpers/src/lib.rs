pub mod asset;
pub mod definitions;
pub mod math;
pub mod misc;
pub mod packet_queue;
