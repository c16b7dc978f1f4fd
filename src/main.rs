use std::io;
use std::time::Instant;

use clap::Parser;
use ratatui::layout::Rect;

use popup_wm::config::{DemoCli, DemoConfig};
use popup_wm::demo::DemoApp;
use popup_wm::drivers::console::{ConsoleInputDriver, ConsoleOutputDriver};
use popup_wm::drivers::{InputDriver, OutputDriver};
use popup_wm::event_loop::{ControlFlow, EventLoop};
use popup_wm::log_buffer::{LogHandle, set_global_log};
use popup_wm::tracing_sub;

fn main() -> io::Result<()> {
    let args = DemoCli::parse();
    let config = DemoConfig::try_from(&args)
        .map_err(|msg| io::Error::new(io::ErrorKind::InvalidInput, msg))?;

    let log = match &config.log_file {
        Some(path) => {
            tracing_sub::init_with_file(path)?;
            None
        }
        None => {
            let handle = LogHandle::default();
            set_global_log(handle.clone());
            tracing_sub::init_default();
            Some(handle)
        }
    };

    let (cols, rows) = crossterm::terminal::size()?;
    let mut app = DemoApp::new(&config, Rect::new(0, 0, cols, rows), log);

    let mut output = ConsoleOutputDriver::new()?;
    output.enter()?;
    let mut input = ConsoleInputDriver::new();
    input.set_mouse_capture(true)?;
    tracing::info!(cols, rows, "popup demo started");

    let mut event_loop = EventLoop::new(input, config.poll_interval);
    let mut last_tick = Instant::now();
    let result = event_loop.run(|_, event| match event {
        None => {
            let now = Instant::now();
            app.tick(now - last_tick);
            last_tick = now;
            output.draw(|frame| app.draw(frame))?;
            Ok(ControlFlow::Continue)
        }
        Some(event) => Ok(app.handle_event(event)),
    });

    event_loop.driver().set_mouse_capture(false)?;
    output.exit()?;
    result
}
