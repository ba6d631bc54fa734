use std::io::Cursor;
use std::sync::{Arc, Mutex, PoisonError};

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::detection::domain::detection_result::DetectionSource;
use crate::detection::domain::detector_adapter::DetectorAdapter;
use crate::normalization::domain::background::flatten_background;
use crate::normalization::domain::normalizer_config::{NormalizeError, NormalizerConfig};
use crate::normalization::domain::photo::{CapturedPhoto, FinalPhoto, NormalizationReport};
use crate::normalization::domain::placement::{fit_to_canvas, place_face};
use crate::profile::domain::country_profile::CountryProfile;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::FrameSample;

/// Post-capture pipeline: decode → detect → flatten background → place on
/// the profile canvas → JPEG.
///
/// Never fails. A stage that errors passes its input through; a photo that
/// cannot be decoded or encoded comes back unchanged.
pub struct NormalizePhotoUseCase {
    detector: Arc<Mutex<DetectorAdapter>>,
    config: NormalizerConfig,
}

impl NormalizePhotoUseCase {
    pub fn new(detector: Arc<Mutex<DetectorAdapter>>, config: NormalizerConfig) -> Self {
        Self { detector, config }
    }

    pub fn execute(&self, photo: &CapturedPhoto, profile: &CountryProfile) -> FinalPhoto {
        let mut report = NormalizationReport::default();

        let image = match image::load_from_memory(photo.bytes()) {
            Ok(img) => img.to_rgb8(),
            Err(e) => {
                log::warn!("{}", NormalizeError::Decode(e));
                return FinalPhoto::passthrough(photo, report);
            }
        };
        report.decoded = true;

        let face = self.detect_face(&image);
        report.face_found = face.is_some();

        let flattened = match flatten_background(&image, face.as_ref(), &self.config) {
            Ok(img) => {
                report.background_flattened = true;
                img
            }
            Err(e) => {
                log::warn!("Background flattening skipped: {e}");
                image
            }
        };

        let placed = self.place(&flattened, face.as_ref(), profile, &mut report);
        let placed = match placed {
            Ok(img) => {
                report.resized_to_profile = true;
                img
            }
            Err(e) => {
                log::warn!("Placement skipped: {e}");
                flattened
            }
        };

        match encode_jpeg(&placed, self.config.jpeg_quality) {
            Ok(bytes) => {
                report.encoded = true;
                log::info!(
                    "Normalized photo for {} ({}x{}, face {})",
                    profile.code,
                    placed.width(),
                    placed.height(),
                    if report.face_placed { "placed" } else { "not found" }
                );
                FinalPhoto {
                    bytes,
                    width: placed.width(),
                    height: placed.height(),
                    report,
                }
            }
            Err(e) => {
                log::warn!("{e}; returning captured photo unchanged");
                FinalPhoto::passthrough(photo, report)
            }
        }
    }

    /// Re-detects on the still. Only genuine detections count; canned
    /// fallback boxes select the threshold and fit paths.
    fn detect_face(&self, image: &RgbImage) -> Option<BoundingBox> {
        let frame = FrameSample::from_rgb_image(image.clone(), 0);
        let detection = self
            .detector
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .detect(&frame);
        match (detection.source, detection.face) {
            (DetectionSource::Detector, Some(face)) => Some(face.bbox),
            (source, _) => {
                log::info!("No face on captured still ({source}); using fallbacks");
                None
            }
        }
    }

    fn place(
        &self,
        image: &RgbImage,
        face: Option<&BoundingBox>,
        profile: &CountryProfile,
        report: &mut NormalizationReport,
    ) -> Result<RgbImage, NormalizeError> {
        let canvas = (profile.dimensions.width, profile.dimensions.height);
        let Some(bbox) = face else {
            return fit_to_canvas(image, canvas);
        };

        match place_face(
            image,
            bbox,
            canvas,
            self.config.head_height_fraction,
            self.config.face_center_y,
        ) {
            Ok(placement) => {
                report.face_placed = true;
                report.head_height_px = Some(placement.head_height);
                let ok = profile.head_size.contains(placement.head_height);
                report.head_size_ok = Some(ok);
                if !ok {
                    log::warn!(
                        "Head height {}px outside {} range {}-{}px",
                        placement.head_height,
                        profile.code,
                        profile.head_size.min,
                        profile.head_size.max
                    );
                }
                Ok(placement.image)
            }
            Err(e) => {
                log::warn!("Face placement failed ({e}); fitting to canvas");
                fit_to_canvas(image, canvas)
            }
        }
    }
}

fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, NormalizeError> {
    let mut bytes = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(Cursor::new(&mut bytes), quality);
        encoder.encode_image(image).map_err(NormalizeError::Encode)?;
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detection_result::{DetectionResult, FaceRegion};
    use crate::detection::domain::face_detector::FaceDetector;
    use crate::detection::infrastructure::fallback_detector::FallbackDetector;
    use crate::profile::infrastructure::country_table::CountryProfiles;
    use image::Rgb;

    // --- Stubs ---

    struct StubDetector {
        bbox: Option<BoundingBox>,
    }

    impl FaceDetector for StubDetector {
        fn detect(
            &mut self,
            frame: &FrameSample,
        ) -> Result<DetectionResult, Box<dyn std::error::Error>> {
            Ok(match self.bbox {
                Some(b) => DetectionResult::found(FaceRegion::new(b), frame.width(), frame.height()),
                None => DetectionResult::none(frame.width(), frame.height()),
            })
        }
    }

    struct FailingDetector;

    impl FaceDetector for FailingDetector {
        fn detect(
            &mut self,
            _frame: &FrameSample,
        ) -> Result<DetectionResult, Box<dyn std::error::Error>> {
            Err("inference failed".into())
        }
    }

    fn use_case(detector: Box<dyn FaceDetector>) -> NormalizePhotoUseCase {
        NormalizePhotoUseCase::new(
            Arc::new(Mutex::new(DetectorAdapter::new(detector, "stub"))),
            NormalizerConfig::default(),
        )
    }

    fn us() -> CountryProfile {
        CountryProfiles::bundled().unwrap().get("US").unwrap().clone()
    }

    fn ca() -> CountryProfile {
        CountryProfiles::bundled().unwrap().get("CA").unwrap().clone()
    }

    fn png(image: &RgbImage) -> CapturedPhoto {
        let frame = FrameSample::from_rgb_image(image.clone(), 0);
        CapturedPhoto::from_frame(&frame).unwrap()
    }

    /// Gray backdrop with a dark "face" rectangle.
    fn portrait() -> (RgbImage, BoundingBox) {
        let img = RgbImage::from_fn(800, 600, |x, y| {
            if (300..500).contains(&x) && (150..410).contains(&y) {
                Rgb([40, 30, 30])
            } else {
                Rgb([180, 180, 180])
            }
        });
        (img, BoundingBox::new(300.0, 150.0, 200.0, 260.0))
    }

    fn dark_rows(img: &RgbImage) -> (u32, u32) {
        let rows: Vec<u32> = (0..img.height())
            .filter(|&y| (0..img.width()).any(|x| img.get_pixel(x, y).0[0] < 110))
            .collect();
        (rows[0], rows[rows.len() - 1])
    }

    #[test]
    fn test_face_is_placed_on_profile_canvas() {
        let (img, bbox) = portrait();
        let out = use_case(Box::new(StubDetector { bbox: Some(bbox) })).execute(&png(&img), &us());

        assert_eq!((out.width, out.height), (600, 600));
        assert!(out.report.face_found);
        assert!(out.report.background_flattened);
        assert!(out.report.face_placed);
        assert!(out.report.encoded);
        assert_eq!(out.report.head_height_px, Some(420));
        // 420px exceeds the 412px US maximum; reported, not enforced.
        assert_eq!(out.report.head_size_ok, Some(false));

        let decoded = image::load_from_memory(&out.bytes).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (600, 600));
        let (top, bottom) = dark_rows(&decoded);
        let height = (bottom - top + 1) as f64;
        assert!((height - 420.0).abs() <= 3.0, "head height {height}");
    }

    #[test]
    fn test_no_face_fits_to_canvas() {
        let (img, _) = portrait();
        let out = use_case(Box::new(StubDetector { bbox: None })).execute(&png(&img), &ca());

        assert_eq!((out.width, out.height), (827, 1181));
        assert!(!out.report.face_found);
        assert!(!out.report.face_placed);
        assert!(out.report.resized_to_profile);
        assert_eq!(out.report.head_height_px, None);

        // 800x600 fitted into 827x1181 leaves white bands above and below.
        let decoded = image::load_from_memory(&out.bytes).unwrap().to_rgb8();
        assert!(decoded.get_pixel(413, 5).0.iter().all(|&c| c > 245));
        assert!(decoded.get_pixel(413, 1175).0.iter().all(|&c| c > 245));
    }

    #[test]
    fn test_detector_failure_uses_fallbacks() {
        let (img, _) = portrait();
        let out = use_case(Box::new(FailingDetector)).execute(&png(&img), &us());
        assert!(!out.report.face_found);
        assert!(out.report.encoded);
        assert_eq!((out.width, out.height), (600, 600));
    }

    #[test]
    fn test_fallback_detector_box_is_not_trusted() {
        let (img, _) = portrait();
        let out = use_case(Box::new(FallbackDetector::new())).execute(&png(&img), &us());
        assert!(!out.report.face_found);
        assert!(!out.report.face_placed);
    }

    #[test]
    fn test_undecodable_photo_is_returned_unchanged() {
        let garbage = CapturedPhoto::new(b"not an image".to_vec());
        let out = use_case(Box::new(StubDetector { bbox: None })).execute(&garbage, &us());
        assert_eq!(out.bytes, b"not an image".to_vec());
        assert!(!out.report.decoded);
        assert!(!out.report.encoded);
    }

    #[test]
    fn test_output_is_jpeg() {
        let (img, _) = portrait();
        let out = use_case(Box::new(StubDetector { bbox: None })).execute(&png(&img), &us());
        assert_eq!(
            image::guess_format(&out.bytes).unwrap(),
            image::ImageFormat::Jpeg
        );
    }
}
