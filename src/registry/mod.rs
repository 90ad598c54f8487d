mod city_registry;
mod error;

pub use city_registry::CityRegistry;
pub use error::RegistryError;
