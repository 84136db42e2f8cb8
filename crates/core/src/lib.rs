#![deny(warnings)]

pub mod api;
pub mod config;
pub mod decode;
pub mod emotion;
pub mod features;
pub mod pipeline;
pub mod recommend;
pub mod signal;
pub mod util;
