mod client;
mod encoding;
mod transport;

pub use client::Client;
pub use encoding::{Encoding, EncodingSender};
pub use transport::BindingTransport;
