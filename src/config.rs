use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::constants::*;
use crate::geometry::Size;
use crate::input::CellScale;

/// Pixel metrics of the popup chrome, used for hit testing and rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChromeMetrics {
    pub header_height: i32,
    pub header_button_width: i32,
    pub footer_height: i32,
    pub footer_button_width: i32,
    pub resize_handle: i32,
}

impl Default for ChromeMetrics {
    fn default() -> Self {
        Self {
            header_height: HEADER_HEIGHT,
            header_button_width: HEADER_BUTTON_WIDTH,
            footer_height: FOOTER_HEIGHT,
            footer_button_width: FOOTER_BUTTON_WIDTH,
            resize_handle: RESIZE_HANDLE_SIZE,
        }
    }
}

/// Tunables for [`crate::window::PopupManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerConfig {
    pub transition: Duration,
    pub min_size: Size,
    pub minimized_size: Size,
    pub stack_base: i32,
    pub stack_gap: i32,
    pub base_z_index: i32,
    pub event_queue_capacity: usize,
    pub chrome: ChromeMetrics,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            transition: TRANSITION_DURATION,
            min_size: Size::new(MIN_RESIZE_WIDTH, MIN_RESIZE_HEIGHT),
            minimized_size: Size::new(MINIMIZED_WIDTH, MINIMIZED_HEIGHT),
            stack_base: MINIMIZED_STACK_BASE,
            stack_gap: MINIMIZED_STACK_GAP,
            base_z_index: BASE_Z_INDEX,
            event_queue_capacity: EVENT_QUEUE_CAPACITY,
            chrome: ChromeMetrics::default(),
        }
    }
}

impl ManagerConfig {
    pub fn with_transition(mut self, transition: Duration) -> Self {
        self.transition = transition;
        self
    }

    pub fn with_min_size(mut self, min_size: Size) -> Self {
        self.min_size = min_size;
        self
    }

    /// Vertical distance between two consecutive minimized slots.
    pub fn stack_step(&self) -> i32 {
        self.minimized_size.height + self.stack_gap
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "popup-demo",
    version = env!("CARGO_PKG_VERSION"),
    about = "Terminal playground for the popup window manager"
)]
pub struct DemoCli {
    /// Width of one terminal cell in viewport pixels.
    #[arg(long = "cell-width", value_name = "PX", default_value_t = 10)]
    pub cell_width: i32,

    /// Height of one terminal cell in viewport pixels.
    #[arg(long = "cell-height", value_name = "PX", default_value_t = 20)]
    pub cell_height: i32,

    /// Input poll interval; also the animation tick.
    #[arg(long = "poll-ms", value_name = "MS", default_value_t = 16)]
    pub poll_ms: u64,

    /// Exit transition length.
    #[arg(long = "transition-ms", value_name = "MS", default_value_t = 300)]
    pub transition_ms: u64,

    /// Append logs to this file instead of the in-app log strip.
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub scale: CellScale,
    pub poll_interval: Duration,
    pub manager: ManagerConfig,
    pub log_file: Option<PathBuf>,
}

impl TryFrom<&DemoCli> for DemoConfig {
    type Error = String;

    fn try_from(cli: &DemoCli) -> Result<Self, Self::Error> {
        if !(1..=100).contains(&cli.cell_width) || !(1..=100).contains(&cli.cell_height) {
            return Err("cell size must be between 1 and 100 pixels".to_string());
        }
        if !(1..=1000).contains(&cli.poll_ms) {
            return Err("poll interval must be between 1 and 1000 ms".to_string());
        }
        if cli.transition_ms > 10_000 {
            return Err("transition must be at most 10000 ms".to_string());
        }
        Ok(Self {
            scale: CellScale::new(cli.cell_width, cli.cell_height),
            poll_interval: Duration::from_millis(cli.poll_ms),
            manager: ManagerConfig::default()
                .with_transition(Duration::from_millis(cli.transition_ms)),
            log_file: cli.log_file.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let cfg = ManagerConfig::default();
        assert_eq!(cfg.transition, Duration::from_millis(300));
        assert_eq!(cfg.min_size, Size::new(400, 300));
        assert_eq!(cfg.minimized_size, Size::new(300, 60));
        assert_eq!(cfg.stack_step(), 70);
    }

    #[test]
    fn demo_cli_defaults_validate() {
        let cli = DemoCli::parse_from(["popup-demo"]);
        let cfg = DemoConfig::try_from(&cli).unwrap();
        assert_eq!(cfg.scale, CellScale::new(10, 20));
        assert_eq!(cfg.poll_interval, Duration::from_millis(16));
        assert_eq!(cfg.manager.transition, Duration::from_millis(300));
        assert!(cfg.log_file.is_none());
    }

    #[test]
    fn demo_cli_rejects_out_of_range_values() {
        let cli = DemoCli::parse_from(["popup-demo", "--cell-width", "0"]);
        assert!(DemoConfig::try_from(&cli).is_err());
        let cli = DemoCli::parse_from(["popup-demo", "--poll-ms", "5000"]);
        assert!(DemoConfig::try_from(&cli).is_err());
        let cli = DemoCli::parse_from(["popup-demo", "--log-file", "/tmp/popup.log"]);
        let cfg = DemoConfig::try_from(&cli).unwrap();
        assert_eq!(cfg.log_file, Some(PathBuf::from("/tmp/popup.log")));
    }
}
