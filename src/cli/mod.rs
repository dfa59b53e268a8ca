pub mod app;
pub mod commands;
pub mod demo;
pub mod output;
pub mod run;
pub mod runtime;
pub mod schema;
