mod compass_error;

pub use compass_error::{CompassError, CompassResult};
