pub mod background;
pub mod normalizer_config;
pub mod photo;
pub mod placement;
