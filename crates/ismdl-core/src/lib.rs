pub mod config;
pub mod logging;

pub mod checksum;
pub mod context;
pub mod error;
pub mod fetch;
pub mod http;
pub mod manifest;
pub mod mux;
pub mod pipeline;
pub mod plan;
pub mod resolver;
pub mod url_model;
pub mod workdir;
