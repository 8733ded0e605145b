pub mod azure;
pub mod remote;
mod transport;
