pub mod fit;
pub mod http;
