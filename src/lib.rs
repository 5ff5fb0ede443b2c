pub mod credentials;
pub mod format;
pub mod http;
pub mod pagination;
pub mod runtime;
pub mod schemas;
pub mod server;
pub mod tools;
