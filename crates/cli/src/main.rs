use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};

use passport_photo_core::detection::domain::detector_adapter::DetectorAdapter;
use passport_photo_core::detection::domain::face_detector::FaceDetector;
use passport_photo_core::detection::infrastructure::detector_factory::{
    create_detector, load_detector, DetectorBackend, DetectorConfig,
};
use passport_photo_core::detection::infrastructure::fallback_detector::FallbackDetector;
use passport_photo_core::normalization::domain::photo::{CapturedPhoto, FinalPhoto};
use passport_photo_core::normalization::domain::normalizer_config::NormalizerConfig;
use passport_photo_core::pipeline::capture_session::{
    CaptureSession, SessionConfig, VerdictListener,
};
use passport_photo_core::pipeline::frame_sampler::SamplerConfig;
use passport_photo_core::pipeline::normalize_photo_use_case::NormalizePhotoUseCase;
use passport_photo_core::profile::domain::country_profile::CountryProfile;
use passport_photo_core::profile::infrastructure::country_table::CountryProfiles;
use passport_photo_core::validation::domain::brightness::measure_brightness;
use passport_photo_core::validation::domain::capture_gate::can_capture;
use passport_photo_core::validation::domain::classifier::{classify, ClassifierThresholds};
use passport_photo_core::validation::domain::guidance::guidance;
use passport_photo_core::validation::domain::verdict::ValidationVerdict;
use passport_photo_core::video::domain::frame_source::FrameSource;
use passport_photo_core::video::domain::photo_writer::PhotoExporter;
use passport_photo_core::video::infrastructure::image_file_source::ImageFileSource;
use passport_photo_core::video::infrastructure::image_sequence_source::ImageSequenceSource;
use passport_photo_core::video::infrastructure::photo_file_writer::PhotoFileWriter;

/// Passport photo validation and normalization.
#[derive(Parser)]
#[command(name = "passport-photo")]
struct Cli {
    /// Face detector backend: yolo, blazeface or fallback.
    #[arg(long, global = true, default_value = "yolo")]
    backend: String,

    /// Model file for the detector (skips the cache and download).
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, global = true)]
    confidence: Option<f64>,

    /// Country table to use instead of the bundled one.
    #[arg(long, global = true)]
    countries: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the supported countries and their photo requirements.
    Countries,

    /// Validate a single image as if it were a live frame.
    Check {
        image: PathBuf,

        /// Also print this country's photo criteria.
        #[arg(long)]
        country: Option<String>,
    },

    /// Replay a directory of frames through live validation.
    Watch {
        dir: PathBuf,

        /// Sampling interval in milliseconds (300-500).
        #[arg(long, default_value = "400")]
        interval_ms: u64,

        /// Stop after this many seconds (default: one pass over the frames).
        #[arg(long)]
        duration_secs: Option<u64>,

        /// Restart from the first frame after the last one.
        #[arg(long)]
        looping: bool,

        /// Capture and normalize the first in-position frame for this country.
        #[arg(long, requires = "output")]
        country: Option<String>,

        /// Directory the captured photo is written to.
        #[arg(long, requires = "country")]
        output: Option<PathBuf>,
    },

    /// Normalize a captured photo to a country's format.
    Process {
        image: PathBuf,

        #[arg(long)]
        country: String,

        #[arg(long)]
        output: PathBuf,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let detector_config = validate(&cli)?;
    let profiles = load_profiles(cli.countries.as_deref())?;

    match cli.command {
        Command::Countries => run_countries(&profiles),
        Command::Check { image, country } => {
            let profile = country.map(|c| profiles.get(&c).cloned()).transpose()?;
            run_check(&image, &detector_config, profile.as_ref())
        }
        Command::Watch {
            dir,
            interval_ms,
            duration_secs,
            looping,
            country,
            output,
        } => {
            let target = match (country, output) {
                (Some(c), Some(o)) => Some((profiles.get(&c)?.clone(), o)),
                _ => None,
            };
            let sampler = SamplerConfig::new(Duration::from_millis(interval_ms))?;
            run_watch(
                &dir,
                &detector_config,
                sampler,
                duration_secs.map(Duration::from_secs),
                looping,
                target,
            )
        }
        Command::Process {
            image,
            country,
            output,
        } => {
            let profile = profiles.get(&country)?;
            run_process(&image, &detector_config, profile, &output)
        }
    }
}

fn run_countries(profiles: &CountryProfiles) -> Result<(), Box<dyn std::error::Error>> {
    println!("Country table version {}", profiles.version());
    for profile in profiles.iter() {
        println!();
        println!(
            "{}  {}  {}x{} px, head {}-{} px",
            profile.code,
            profile.name,
            profile.dimensions.width,
            profile.dimensions.height,
            profile.head_size.min,
            profile.head_size.max
        );
        print_criteria(profile);
    }
    Ok(())
}

fn run_check(
    image: &Path,
    config: &DetectorConfig,
    profile: Option<&CountryProfile>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut source = ImageFileSource::open(image)?;
    let frame = source.grab()?;

    let backend = load_detector(config, Some(progress_reporter()))?;
    eprintln!();
    let mut adapter = DetectorAdapter::new(backend, config.backend.name());

    let detection = adapter.detect(&frame);
    let thresholds = ClassifierThresholds::default();
    let verdict = classify(&detection, measure_brightness(&frame), None, &thresholds);
    let hint = guidance(&verdict, &thresholds);

    print_verdict(&verdict);
    println!(
        "Guidance:       {} ({}) {}",
        hint.status,
        hint.status.color_hex(),
        hint.message
    );
    println!(
        "Capture:        {}",
        if can_capture(&verdict) {
            "allowed"
        } else {
            "blocked"
        }
    );
    if let Some(profile) = profile {
        println!();
        println!("{} requirements:", profile.name);
        print_criteria(profile);
    }
    Ok(())
}

fn run_watch(
    dir: &Path,
    config: &DetectorConfig,
    sampler: SamplerConfig,
    duration: Option<Duration>,
    looping: bool,
    target: Option<(CountryProfile, PathBuf)>,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = ImageSequenceSource::open(dir, looping)?;
    let frames = source.len() as u32;
    let duration = duration.unwrap_or(sampler.interval * (frames + 1));
    log::info!(
        "Replaying {frames} frames from {} for {:.1}s",
        dir.display(),
        duration.as_secs_f64()
    );

    let detector = create_detector(config, Some(progress_reporter()));
    let adapter = DetectorAdapter::new(detector, config.backend.name());
    let session_config = SessionConfig {
        sampler,
        ..SessionConfig::default()
    };
    let thresholds = session_config.thresholds.clone();
    let listener: VerdictListener = Box::new(move |frame: usize, verdict: &ValidationVerdict| {
        let hint = guidance(verdict, &thresholds);
        println!("[frame {frame:>4}] {:<8} {}", hint.status, hint.message);
    });

    let mut session = CaptureSession::start(
        Box::new(source),
        adapter,
        session_config,
        Some(listener),
    )?;

    let deadline = Instant::now() + duration;
    let mut written = None;
    while Instant::now() < deadline {
        if let Some((profile, output)) = target.as_ref() {
            if session.can_capture() {
                match session.capture() {
                    Ok(photo) => {
                        let final_photo = session.normalize(&photo, profile);
                        written = Some(export(&final_photo, profile, output)?);
                        break;
                    }
                    Err(e) => log::warn!("Capture failed, will retry: {e}"),
                }
            }
        }
        thread::sleep(Duration::from_millis(50));
    }
    session.stop();

    match (target, written) {
        (Some(_), Some(path)) => println!("Output written to {}", path.display()),
        (Some(_), None) => {
            return Err("No frame was in position; nothing captured".into());
        }
        (None, _) => {}
    }
    Ok(())
}

fn run_process(
    image: &Path,
    config: &DetectorConfig,
    profile: &CountryProfile,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes =
        fs::read(image).map_err(|e| format!("Could not read {}: {e}", image.display()))?;
    let photo = CapturedPhoto::new(bytes);

    let backend: Box<dyn FaceDetector> = match load_detector(config, Some(progress_reporter())) {
        Ok(detector) => detector,
        Err(e) => {
            log::warn!("Face detector unavailable ({e}); fitting the photo without placement");
            Box::new(FallbackDetector::new())
        }
    };
    eprintln!();
    let adapter = DetectorAdapter::new(backend, config.backend.name());

    let use_case = NormalizePhotoUseCase::new(
        Arc::new(Mutex::new(adapter)),
        NormalizerConfig::default(),
    );
    let final_photo = use_case.execute(&photo, profile);
    let path = export(&final_photo, profile, output)?;

    let report = &final_photo.report;
    println!("Output written to {}", path.display());
    println!("Size:           {}x{}", final_photo.width, final_photo.height);
    println!("Face placed:    {}", report.face_placed);
    println!(
        "Background:     {}",
        if report.background_flattened {
            "flattened"
        } else {
            "unchanged"
        }
    );
    if let (Some(height), Some(ok)) = (report.head_height_px, report.head_size_ok) {
        println!(
            "Head height:    {height} px ({} for {}-{} px)",
            if ok { "ok" } else { "out of range" },
            profile.head_size.min,
            profile.head_size.max
        );
    }
    Ok(())
}

fn export(
    photo: &FinalPhoto,
    profile: &CountryProfile,
    output: &Path,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let exporter = PhotoExporter::new(output, Box::new(PhotoFileWriter::new()));
    exporter.export(photo, &profile.code)
}

fn load_profiles(path: Option<&Path>) -> Result<CountryProfiles, Box<dyn std::error::Error>> {
    let profiles = match path {
        Some(path) => CountryProfiles::from_path(path)?,
        None => CountryProfiles::bundled()?,
    };
    log::debug!("Loaded countries: {}", profiles.codes().join(", "));
    Ok(profiles)
}

fn print_verdict(verdict: &ValidationVerdict) {
    println!("Detector:       {}", verdict.source);
    println!("Face detected:  {}", verdict.face_detected);
    if let Some(face) = &verdict.face {
        println!(
            "Face center:    ({:.2}, {:.2}), size {:.2}",
            face.center_x, face.center_y, face.relative_size
        );
        if let Some(open) = face.eyes_open {
            println!("Eyes visible:   {open}");
        }
        if let Some(level) = face.head_tilt_ok {
            println!("Head level:     {level}");
        }
    }
    println!("In position:    {}", verdict.in_position);
    println!("Lighting ok:    {}", verdict.lighting_ok);
}

fn print_criteria(profile: &CountryProfile) {
    println!("    {}", profile.instructions);
    for criterion in &profile.criteria {
        println!("    - {criterion}");
    }
}

fn validate(cli: &Cli) -> Result<DetectorConfig, Box<dyn std::error::Error>> {
    let backend: DetectorBackend = cli.backend.parse()?;
    if let Some(confidence) = cli.confidence {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(
                format!("Confidence must be between 0.0 and 1.0, got {confidence}").into(),
            );
        }
    }
    if let Some(model) = &cli.model {
        if !model.exists() {
            return Err(format!("Model file not found: {}", model.display()).into());
        }
    }
    match &cli.command {
        Command::Check { image, .. } | Command::Process { image, .. } if !image.exists() => {
            return Err(format!("Input file not found: {}", image.display()).into());
        }
        Command::Watch { dir, .. } if !dir.is_dir() => {
            return Err(format!("Frame directory not found: {}", dir.display()).into());
        }
        _ => {}
    }
    Ok(DetectorConfig {
        backend,
        model_path: cli.model.clone(),
        confidence: cli.confidence,
        ..DetectorConfig::default()
    })
}

fn progress_reporter() -> Arc<dyn Fn(u64, u64) + Send + Sync> {
    Arc::new(download_progress)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
}
