//! Confirmation poller
//!
//! Capture, locate, act: either once against a screenshot the caller already
//! holds, or in a bounded retry loop that polls the device until the template
//! shows up, the attempt budget runs out, or the running signal is cleared.

use super::dispatcher::ActionDispatcher;
use super::log_sink::SharedLogSink;
use super::match_image::SubimageLocator;
use super::types::{MatchResult, PollReport, PollState, RunningSignal};
use crate::adb::DeviceControl;
use image::DynamicImage;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

pub struct ConfirmationPoller<D: DeviceControl> {
    device: Arc<D>,
    locator: Arc<dyn SubimageLocator>,
    dispatcher: Arc<ActionDispatcher<D>>,
    sink: SharedLogSink,
    backoff: Duration,
}

impl<D: DeviceControl> ConfirmationPoller<D> {
    pub fn new(
        device: Arc<D>,
        locator: Arc<dyn SubimageLocator>,
        dispatcher: Arc<ActionDispatcher<D>>,
        sink: SharedLogSink,
        backoff: Duration,
    ) -> Self {
        Self {
            device,
            locator,
            dispatcher,
            sink,
            backoff,
        }
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// One-shot presence test against a screenshot the caller already has.
    /// Never touches the device.
    pub fn check(
        &self,
        screenshot: Option<&DynamicImage>,
        template: &DynamicImage,
        log_message: Option<&str>,
        threshold: f64,
    ) -> bool {
        let Some(screenshot) = screenshot else {
            self.sink.log("Screenshot is None in check");
            return false;
        };

        let result = self.locator.locate(screenshot, template);
        let found = result.is_match(threshold);

        if let Some(msg) = log_message {
            self.log_outcome(msg, &result, found);
        }
        found
    }

    /// One-shot check that taps the match. Never retries.
    pub async fn check_and_click(
        &self,
        screenshot: Option<&DynamicImage>,
        template: &DynamicImage,
        log_message: Option<&str>,
        threshold: f64,
    ) -> bool {
        let Some(screenshot) = screenshot else {
            self.sink.log("Screenshot is None in check_and_click");
            return false;
        };

        let result = self.locator.locate(screenshot, template);
        match result.position {
            Some(position) if result.similarity > threshold => {
                let msg = log_message.unwrap_or("Template found");
                let message = if log_message.is_some() {
                    format!("{msg} found - {:.2}", result.similarity)
                } else {
                    format!("{msg} - {:.2}", result.similarity)
                };
                self.dispatcher
                    .log_and_click(position, &message, Some(screenshot))
                    .await;
                true
            }
            _ => {
                if let Some(msg) = log_message {
                    self.log_outcome(msg, &result, false);
                }
                false
            }
        }
    }

    /// Poll until `template` is found and tapped. Returns true only when the
    /// action was dispatched.
    pub async fn check_and_click_until_found(
        &self,
        template: &DynamicImage,
        log_message: &str,
        running: &RunningSignal,
        threshold: f64,
        max_attempts: u32,
    ) -> bool {
        self.poll_until_found(template, log_message, running, threshold, max_attempts)
            .await
            .found()
    }

    /// The retry loop behind [`Self::check_and_click_until_found`].
    ///
    /// Capture failures sleep the backoff but do not count against
    /// `max_attempts`. A ceiling of 0 is treated as 1.
    pub async fn poll_until_found(
        &self,
        template: &DynamicImage,
        log_message: &str,
        running: &RunningSignal,
        threshold: f64,
        max_attempts: u32,
    ) -> PollReport {
        let max_attempts = max_attempts.max(1);
        let mut report = PollReport::new();

        self.sink.log(&format!("Searching... {log_message}"));

        loop {
            if !running.is_set() {
                report.state = PollState::Cancelled;
                self.sink.log(&format!("{log_message} search cancelled"));
                return report;
            }

            let screenshot = match self.device.capture_screen().await {
                Ok(screenshot) => screenshot,
                Err(e) => {
                    report.capture_failures += 1;
                    if e.is_disconnect() {
                        log::warn!("Device looks disconnected, still polling: {e}");
                    }
                    self.sink.log(&format!(
                        "Failed to take screenshot in check_and_click_until_found: {e}"
                    ));
                    self.wait(&mut report).await;
                    continue;
                }
            };

            let result = self.locator.locate(&screenshot, template);
            report.last_similarity = result.similarity;

            if let Some(position) = result.position.filter(|_| result.similarity > threshold) {
                self.dispatcher
                    .log_and_click(
                        position,
                        &format!("{log_message} found - {:.2}", result.similarity),
                        Some(&screenshot),
                    )
                    .await;
                self.sink.log(&format!("✅ {log_message} found"));
                report.state = PollState::Found;
                report.position = Some(position);
                return report;
            }

            report.attempts += 1;
            log::debug!(
                "{log_message}: attempt {}/{} scored {:.3}",
                report.attempts,
                max_attempts,
                result.similarity
            );
            if report.attempts >= max_attempts {
                self.sink.log(&format!(
                    "❌ Max attempts reached. {log_message} not found. Stopping the bot."
                ));
                report.state = PollState::Exhausted;
                return report;
            }
            self.wait(&mut report).await;
        }
    }

    async fn wait(&self, report: &mut PollReport) {
        sleep(self.backoff).await;
        report.backoffs += 1;
    }

    fn log_outcome(&self, msg: &str, result: &MatchResult, found: bool) {
        if found {
            self.sink.log(&format!("{msg} found - {:.2}", result.similarity));
        } else {
            self.sink.log(&format!("{msg} NOT found - {:.2}", result.similarity));
        }
    }
}
