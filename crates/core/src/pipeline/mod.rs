pub mod capture_session;
pub mod frame_sampler;
pub mod normalize_photo_use_case;
