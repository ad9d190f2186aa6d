pub mod message_strategy;
pub mod messaging;
pub mod robot_api;
