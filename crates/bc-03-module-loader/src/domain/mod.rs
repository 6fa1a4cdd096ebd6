//! Domain layer: descriptors, lifecycle records, contract validation and
//! dependency resolution. Nothing here touches the filesystem or the bus.

pub mod descriptor;
pub mod errors;
pub mod record;
pub mod resolver;
pub mod validation;
