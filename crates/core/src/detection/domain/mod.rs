pub mod detection_result;
pub mod detector_adapter;
pub mod face_detector;
pub mod face_landmarks;
