// Domain layer: tracker records, the export request and the ports the pipeline talks through.

pub mod model;
pub mod ports;
