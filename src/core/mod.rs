pub(crate) mod collector;
pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod export;
pub(crate) mod models;
pub(crate) mod resolver;
pub(crate) mod sleuth;
