// Domain layer: sync models and the ports adapters implement.

pub mod model;
pub mod ports;
