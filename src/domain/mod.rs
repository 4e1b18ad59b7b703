// Domain layer: datasets, run state and the ports the pipeline stages talk through.

pub mod model;
pub mod ports;
