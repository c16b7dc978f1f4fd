use std::io;
use std::time::Duration;

use crossterm::event::Event;

use crate::drivers::InputDriver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
    Continue,
    Quit,
}

/// Single-threaded message pump for the demo.
///
/// It is the only place that polls the input driver. Each iteration calls the
/// handler once with `None` (the idle turn, used to advance the popup clock
/// and redraw), then drains every queued event so a burst of mouse drags does
/// not fall behind the renderer.
pub struct EventLoop<D> {
    driver: D,
    poll_interval: Duration,
}

impl<D: InputDriver> EventLoop<D> {
    pub fn new(driver: D, poll_interval: Duration) -> Self {
        Self {
            driver,
            poll_interval,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn driver(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn run<F>(&mut self, mut handler: F) -> io::Result<()>
    where
        F: FnMut(&mut D, Option<Event>) -> io::Result<ControlFlow>,
    {
        loop {
            if let ControlFlow::Quit = handler(&mut self.driver, None)? {
                break;
            }

            if self.driver.poll(self.poll_interval)? {
                loop {
                    let event = self.driver.read()?;
                    if let ControlFlow::Quit = handler(&mut self.driver, Some(event))? {
                        return Ok(());
                    }
                    if !self.driver.poll(Duration::from_millis(0))? {
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::collections::VecDeque;

    struct Scripted {
        events: VecDeque<Event>,
    }

    impl InputDriver for Scripted {
        fn poll(&mut self, _timeout: Duration) -> io::Result<bool> {
            Ok(!self.events.is_empty())
        }

        fn read(&mut self) -> io::Result<Event> {
            self.events
                .pop_front()
                .ok_or_else(|| io::Error::other("script exhausted"))
        }
    }

    fn key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    #[test]
    fn drains_burst_and_stops_on_quit() {
        let driver = Scripted {
            events: VecDeque::from(vec![key('a'), key('b'), key('q'), key('z')]),
        };
        let mut event_loop = EventLoop::new(driver, Duration::from_millis(1));
        let mut seen = Vec::new();
        let mut idle = 0;
        event_loop
            .run(|_, event| {
                let Some(Event::Key(k)) = event else {
                    idle += 1;
                    return Ok(ControlFlow::Continue);
                };
                seen.push(k.code);
                if k.code == KeyCode::Char('q') {
                    Ok(ControlFlow::Quit)
                } else {
                    Ok(ControlFlow::Continue)
                }
            })
            .unwrap();
        assert_eq!(
            seen,
            vec![KeyCode::Char('a'), KeyCode::Char('b'), KeyCode::Char('q')]
        );
        assert_eq!(idle, 1);
        assert_eq!(event_loop.driver().events.len(), 1);
    }
}
