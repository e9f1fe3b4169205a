pub mod logging;
pub mod vitrage;
