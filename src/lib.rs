pub mod cli;
pub mod config;
pub mod dsv;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod pdf;
pub mod pipeline;
pub mod policy;
pub mod postprocess;
pub mod probe;
pub mod records;
pub mod report;
pub mod schema;
pub mod session;
pub mod template;
pub mod util;
