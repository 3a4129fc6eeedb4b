pub mod responses;
pub mod server;

pub use server::ApiServer;
