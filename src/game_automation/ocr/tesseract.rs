// OCR engine backed by the tesseract command line tool
use super::OcrEngine;
use crate::game_automation::error::VisionError;
use image::GrayImage;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::NamedTempFile;

const TESSERACT_ENV: &str = "TESSERACT_PATH";

/// Tesseract traineddata used unless overridden
pub const DEFAULT_LANGUAGE: &str = "eng";

#[cfg(windows)]
const TESSERACT_BIN: &str = "tesseract.exe";
#[cfg(not(windows))]
const TESSERACT_BIN: &str = "tesseract";

#[derive(Debug, Clone)]
pub struct TesseractCli {
    executable: PathBuf,
    language: String,
}

impl TesseractCli {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Find the executable via `TESSERACT_PATH`, then `PATH`
    pub fn locate() -> Result<Self, VisionError> {
        if let Some(path) = std::env::var_os(TESSERACT_ENV).map(PathBuf::from) {
            if path.is_file() {
                return Ok(Self::new(path));
            }
            log::warn!("{TESSERACT_ENV}={} is not a file, searching PATH", path.display());
        }

        std::env::var_os("PATH")
            .iter()
            .flat_map(std::env::split_paths)
            .map(|dir| dir.join(TESSERACT_BIN))
            .find(|candidate| candidate.is_file())
            .map(Self::new)
            .ok_or_else(|| VisionError::OcrUnavailable {
                description: format!("{TESSERACT_BIN} not found on PATH or in {TESSERACT_ENV}"),
            })
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

impl OcrEngine for TesseractCli {
    fn read_text(&self, image: &GrayImage) -> Result<Vec<String>, VisionError> {
        let input = NamedTempFile::with_suffix(".png")?;
        image.save(input.path())?;

        // psm 6: a single uniform block of text
        let output = Command::new(&self.executable)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg("6")
            .output()?;

        if !output.status.success() {
            return Err(VisionError::OcrFailed {
                description: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(parse_tokens(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Whitespace-separated tokens in reading order
pub fn parse_tokens(stdout: &str) -> Vec<String> {
    stdout.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokens() {
        assert_eq!(parse_tokens("HP 120\nStage 2\n\x0c"), vec!["HP", "120", "Stage", "2"]);
        assert!(parse_tokens("  \n\x0c").is_empty());
    }

    #[test]
    fn test_language_defaults_to_english() {
        let engine = TesseractCli::new("/usr/bin/tesseract");
        assert_eq!(engine.language(), "eng");
        assert_eq!(engine.with_language("jpn").language(), "jpn");
    }

    #[test]
    fn test_missing_executable_fails_cleanly() {
        let engine = TesseractCli::new("/nonexistent/tesseract-binary");
        let image = GrayImage::new(4, 4);
        assert!(matches!(engine.read_text(&image), Err(VisionError::Io { .. })));
    }
}
