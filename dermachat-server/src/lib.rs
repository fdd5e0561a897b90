pub mod agents;
pub mod http;
