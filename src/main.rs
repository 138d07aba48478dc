mod args;

use adb_screen_match::adb::AdbBackend;
use adb_screen_match::game_automation::{
    DebugHandle, ImageProcessor, LogCrateSink, MatchConfig, ProcessorOptions, Region,
    RunningSignal, SimilarityEngine, SnapshotDebugView, first_number, tesseract_factory,
};
use args::{Args, Mode};
use image::DynamicImage;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

fn main() -> ExitCode {
    let Some(args) = Args::parse() else {
        return ExitCode::SUCCESS;
    };

    let default_filter = if args.debug_mode { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("❌ Failed to start tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(args)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(message) => {
            eprintln!("❌ {message}");
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> Result<bool, String> {
    let sink = LogCrateSink::shared("adb_screen_match");

    // Pure image comparison needs no device
    if let Mode::Compare(a, b) = &args.mode {
        let (a, b) = (load_image(a)?, load_image(b)?);
        let score = SimilarityEngine::new(sink).similarity(Some(&a), Some(&b));
        println!("Similarity: {score:.4}");
        return Ok(true);
    }

    let use_rust = args.use_rust_impl.unwrap_or_else(AdbBackend::use_rust_from_env);
    let backend = AdbBackend::connect_first(use_rust)
        .await
        .map_err(|e| format!("Open device error: {e}"))?;
    let (sx, sy) = backend.screen_dimensions();
    println!(
        "📱 Device: {} size: {}x{} (backend={})",
        backend.device_name(),
        sx,
        sy,
        if use_rust { "rust" } else { "shell" }
    );

    // Owned here; the processor only holds a weak handle
    let debug_view = match &args.debug_dir {
        Some(dir) => Some(Arc::new(
            SnapshotDebugView::new(dir).map_err(|e| format!("Debug dir {}: {e}", dir.display()))?,
        )),
        None => None,
    };

    let mut config = MatchConfig::default();
    if let Some(threshold) = args.threshold {
        config = config.with_threshold(threshold);
    }
    if let Some(attempts) = args.attempts {
        config = config.with_max_attempts(attempts);
    }

    let mut options = ProcessorOptions {
        debug: debug_view
            .as_ref()
            .map(DebugHandle::attach)
            .unwrap_or_default(),
        config,
        ..ProcessorOptions::default()
    };
    if let Some(language) = &args.ocr_language {
        options.ocr = tesseract_factory(language);
    }
    let processor = ImageProcessor::with_options(Arc::new(backend), sink, options);

    let running = RunningSignal::new();
    let on_ctrl_c = running.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Ctrl-C received, stopping");
            on_ctrl_c.clear();
        }
    });

    let outcome = match args.mode {
        Mode::Screenshot => {
            let screenshot = processor
                .take_screenshot()
                .await
                .ok_or("Screenshot failed")?;
            save_image(&screenshot, "cli-screenshot.png")?;
            true
        }
        Mode::Check(file) => {
            let template = load_image(&file)?;
            let screenshot = processor.take_screenshot().await;
            let name = template_name(&file);
            processor.check(screenshot.as_ref(), &template, Some(name.as_str()), None)
        }
        Mode::Wait(file) => {
            let template = load_image(&file)?;
            let report = processor
                .poll_until_found(&template, &template_name(&file), &running, None, None)
                .await;
            println!(
                "{:?} after {} attempts, {} capture failures (last score {:.2})",
                report.state, report.attempts, report.capture_failures, report.last_similarity
            );
            report.found()
        }
        Mode::Ocr(region) => read_region(&processor, region).await,
        Mode::Card(x, y) => {
            let card = processor
                .get_card(x, y, Duration::from_secs(1))
                .await
                .ok_or("Card capture failed")?;
            save_image(&card, "cli-card.png")?;
            true
        }
        Mode::Compare(..) => unreachable!("handled before connecting"),
    };

    if let Some(view) = &debug_view {
        println!("🖼️ {} debug snapshots in {}", view.snapshots(), view.dir().display());
    }
    Ok(outcome)
}

async fn read_region(processor: &ImageProcessor<AdbBackend>, region: Region) -> bool {
    let Some(crop) = processor.capture_region(region).await else {
        return false;
    };
    let tokens = processor.extract_text(&crop).await;
    println!("Text {region}: {}", tokens.join(" "));
    match first_number(&tokens) {
        Some(number) => {
            println!("Number: {number}");
            true
        }
        None => {
            println!("Number: none");
            !tokens.is_empty()
        }
    }
}

fn template_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Template".to_string())
}

fn load_image(path: &Path) -> Result<DynamicImage, String> {
    image::open(path).map_err(|e| format!("Failed to load {}: {e}", path.display()))
}

fn save_image(image: &DynamicImage, path: &str) -> Result<(), String> {
    image
        .save(path)
        .map_err(|e| format!("Write failed: {e}"))?;
    println!("✅ Saved {}x{} to {path}", image.width(), image.height());
    Ok(())
}
