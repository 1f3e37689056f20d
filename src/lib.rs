#[macro_use]
mod macros;

pub mod cli;
pub mod command;
pub mod commands;
pub mod error;
pub mod handler;
pub mod health;
pub mod key;
pub mod notify;
pub mod query;
pub mod reply;
pub mod scheduler;
pub mod server;
pub mod storage;
pub mod types;

pub mod metadata {
    include!(concat!(env!("OUT_DIR"), "/pkg_info.rs"));
}
