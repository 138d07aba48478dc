use adb_screen_match::game_automation::Region;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Screenshot,
    Check(PathBuf),
    Wait(PathBuf),
    Compare(PathBuf, PathBuf),
    Ocr(Region),
    Card(u32, u32),
}

#[derive(Debug, PartialEq)]
pub struct Args {
    pub mode: Mode,
    pub debug_mode: bool,
    /// None: fall back to ADB_IMPL
    pub use_rust_impl: Option<bool>,
    pub threshold: Option<f64>,
    pub attempts: Option<u32>,
    pub debug_dir: Option<PathBuf>,
    /// Tesseract language code; None keeps the engine default
    pub ocr_language: Option<String>,
}

impl Args {
    pub fn parse() -> Option<Self> {
        let args: Vec<String> = env::args().skip(1).collect();
        match Self::parse_from(&args) {
            Ok(parsed) => parsed,
            Err(message) => {
                eprintln!("❌ {message}");
                print_help();
                None
            }
        }
    }

    /// `Ok(None)` when the invocation only printed help or version
    pub fn parse_from(args: &[String]) -> Result<Option<Self>, String> {
        let mut mode: Option<Mode> = None;
        let mut debug_mode = false;
        let mut use_rust_impl = None;
        let mut threshold = None;
        let mut attempts = None;
        let mut debug_dir = None;
        let mut ocr_language = None;

        for arg in args {
            if arg == "--help" || arg == "-h" {
                print_help();
                return Ok(None);
            } else if arg == "--version" || arg == "-v" {
                println!(
                    "ADB Screen Match v{} (c) {}",
                    env!("APP_VERSION_DISPLAY"),
                    env!("APP_BUILD_YEAR")
                );
                return Ok(None);
            } else if arg == "--debug" {
                debug_mode = true;
            } else if arg == "--screenshot" || arg == "-s" {
                mode = Some(Mode::Screenshot);
            } else if let Some(file) = arg.strip_prefix("--check=") {
                mode = Some(Mode::Check(PathBuf::from(file)));
            } else if let Some(file) = arg.strip_prefix("--wait=") {
                mode = Some(Mode::Wait(PathBuf::from(file)));
            } else if let Some(pair) = arg.strip_prefix("--compare=") {
                let (a, b) = pair
                    .split_once(',')
                    .ok_or_else(|| format!("Expected --compare=A,B, got: {pair}"))?;
                mode = Some(Mode::Compare(PathBuf::from(a), PathBuf::from(b)));
            } else if let Some(val) = arg.strip_prefix("--ocr=") {
                let region =
                    Region::parse(val).ok_or_else(|| format!("Invalid region '{val}', expected x,y,w,h"))?;
                mode = Some(Mode::Ocr(region));
            } else if let Some(val) = arg.strip_prefix("--card=") {
                let (x, y) = val
                    .split_once(',')
                    .and_then(|(x, y)| Some((x.trim().parse().ok()?, y.trim().parse().ok()?)))
                    .ok_or_else(|| format!("Invalid card position '{val}', expected x,y"))?;
                mode = Some(Mode::Card(x, y));
            } else if let Some(val) = arg.strip_prefix("--threshold=") {
                let value: f64 = val
                    .parse()
                    .map_err(|_| format!("Invalid threshold value: {val}"))?;
                if !(0.0..=1.0).contains(&value) {
                    return Err(format!("Threshold must be within 0.0..=1.0, got {value}"));
                }
                threshold = Some(value);
            } else if let Some(val) = arg.strip_prefix("--attempts=") {
                let value: u32 = val
                    .parse()
                    .map_err(|_| format!("Invalid attempts value: {val}"))?;
                attempts = Some(value.max(1));
            } else if let Some(val) = arg.strip_prefix("--impl=") {
                use_rust_impl = Some(match val {
                    "rust" => true,
                    "shell" => false,
                    other => return Err(format!("Unknown impl '{other}', expected 'rust' or 'shell'")),
                });
            } else if let Some(dir) = arg.strip_prefix("--debug-dir=") {
                debug_dir = Some(PathBuf::from(dir));
            } else if let Some(lang) = arg.strip_prefix("--lang=") {
                let valid = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '+';
                if lang.is_empty() || !lang.chars().all(valid) {
                    return Err(format!("Invalid OCR language '{lang}', expected e.g. eng or eng+jpn"));
                }
                ocr_language = Some(lang.to_string());
            } else {
                return Err(format!("Unknown argument: {arg}"));
            }
        }

        Ok(Some(Args {
            mode: mode.unwrap_or(Mode::Screenshot),
            debug_mode,
            use_rust_impl,
            threshold,
            attempts,
            debug_dir,
            ocr_language,
        }))
    }
}

fn print_help() {
    println!("🤖 ADB Screen Match");
    println!();
    println!("USAGE:");
    println!("    adb-screen-match [FLAGS]");
    println!();
    println!("FLAGS:");
    println!("    --screenshot, -s      Capture the screen to cli-screenshot.png (default)");
    println!("    --check=FILE          Check the current screen once for the template in FILE");
    println!("    --wait=FILE           Poll until the template in FILE appears, then tap it");
    println!("    --compare=A,B         Print the structural similarity of two image files");
    println!("    --ocr=x,y,w,h         Read text and the first number in a screen region");
    println!("    --card=x,y            Long-press a card and save its zoomed view to cli-card.png");
    println!("    --threshold=F         Similarity a match must exceed (default: 0.8)");
    println!("    --attempts=N          Failed attempts before --wait gives up (default: 50)");
    println!("    --impl=<shell|rust>   ADB implementation (default: rust, or ADB_IMPL)");
    println!("                          The shell implementation requires the adb tool on PATH.");
    println!("    --debug-dir=DIR       Save an annotated PNG of every tap into DIR");
    println!("    --lang=CODE           Tesseract language for --ocr (default: eng)");
    println!("    --debug               Enable debug logging");
    println!("    --help, -h            Show this help message");
    println!("    --version, -v         Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    adb-screen-match --screenshot --impl=shell");
    println!("    adb-screen-match --wait=templates/battle.png --attempts=20");
    println!("    adb-screen-match --ocr=790,1325,60,50");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Option<Args>, String> {
        let owned: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        Args::parse_from(&owned)
    }

    #[test]
    fn test_defaults_to_screenshot() {
        let args = parse(&[]).unwrap().unwrap();
        assert_eq!(args.mode, Mode::Screenshot);
        assert_eq!(args.use_rust_impl, None);
        assert!(!args.debug_mode);
    }

    #[test]
    fn test_wait_with_overrides() {
        let args = parse(&["--wait=battle.png", "--threshold=0.9", "--attempts=0", "--impl=shell"])
            .unwrap()
            .unwrap();
        assert_eq!(args.mode, Mode::Wait(PathBuf::from("battle.png")));
        assert_eq!(args.threshold, Some(0.9));
        assert_eq!(args.attempts, Some(1));
        assert_eq!(args.use_rust_impl, Some(false));
    }

    #[test]
    fn test_region_and_card_modes() {
        let args = parse(&["--ocr=790,1325,60,50"]).unwrap().unwrap();
        assert_eq!(args.mode, Mode::Ocr(Region::new(790, 1325, 60, 50)));

        let args = parse(&["--card=460,1220", "--debug-dir=taps"]).unwrap().unwrap();
        assert_eq!(args.mode, Mode::Card(460, 1220));
        assert_eq!(args.debug_dir, Some(PathBuf::from("taps")));
    }

    #[test]
    fn test_ocr_language() {
        let args = parse(&["--ocr=0,0,10,10", "--lang=eng+jpn"]).unwrap().unwrap();
        assert_eq!(args.ocr_language.as_deref(), Some("eng+jpn"));
        assert_eq!(parse(&[]).unwrap().unwrap().ocr_language, None);
        assert!(parse(&["--lang="]).is_err());
        assert!(parse(&["--lang=../eng"]).is_err());
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(parse(&["--threshold=1.5"]).is_err());
        assert!(parse(&["--impl=java"]).is_err());
        assert!(parse(&["--compare=only-one.png"]).is_err());
        assert!(parse(&["--card=1"]).is_err());
        assert!(parse(&["--bogus"]).is_err());
    }
}
