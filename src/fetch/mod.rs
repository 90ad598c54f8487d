mod attempt;
mod frost_client;

pub use frost_client::FrostClient;
