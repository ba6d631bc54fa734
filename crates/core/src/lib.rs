pub mod detection;
pub mod normalization;
pub mod pipeline;
pub mod profile;
pub mod shared;
pub mod validation;
pub mod video;
