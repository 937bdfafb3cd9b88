pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod entity;
pub mod events;
pub mod hand;
pub mod harness;
pub mod input;
pub mod interaction;
pub mod modules;
pub mod panels;
pub mod situation;
pub mod time;

pub use dispatcher::ControllerDispatcher;
