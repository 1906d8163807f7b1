pub mod df;
pub mod distance;
pub mod geofence;
pub mod logging;
