pub mod adb;
pub mod game_automation;

pub use adb::AdbBackend;
pub use game_automation::ImageProcessor;
