// Terminal drag-pad loop
// Reads mouse drags, translates them into wheel commands and hands them to the
// non-blocking driver. Leaving the loop (quit or error) always sends a stop.

use std::io::{self, Stdout, Write};
use std::time::Instant;

use crossterm::{
    cursor::{Hide, Show},
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::{info, warn};

// local imports
use crate::config::{DriveConfig, INPUT_POLL};
use crate::input::{GestureEvent, GesturePhase};
use crate::messages::DriveRequest;
use crate::motor::{CommandDriver, CommandLink};
use crate::surface::{GestureSurface, TerminalSurface};
use crate::translator::Translator;

/// Translator wired to the command driver
pub struct Teleop {
    translator: Translator,
    driver: CommandDriver,
}

impl Teleop {
    pub fn new(config: DriveConfig, driver: CommandDriver) -> Self {
        Self {
            translator: Translator::new(config),
            driver,
        }
    }

    /// Feed one gesture event; any resulting command is queued for sending
    pub fn on_gesture(
        &mut self,
        event: &GestureEvent,
        now: Instant,
        surface: &mut dyn GestureSurface,
    ) {
        if let Some(command) = self.translator.handle(event, now, surface) {
            let request = match event.phase {
                GesturePhase::End => DriveRequest::Stop(command),
                GesturePhase::Start | GesturePhase::Move => DriveRequest::Move(command),
            };
            self.driver.submit(request);
        }
    }

    /// Send the neutral command and wait for the driver to drain
    pub async fn finish(mut self, surface: &mut dyn GestureSurface) -> u64 {
        let stop = self.translator.stop(surface);
        self.driver.submit(DriveRequest::Stop(stop));
        let attempted = self.driver.shutdown().await;
        info!(
            "Accepted {} move commands ({} requests)",
            self.translator.accepted(),
            attempted
        );
        attempted
    }
}

pub async fn run(config: DriveConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    config.validate()?;

    // Fatal at startup: no usable HTTP client or endpoint
    let link = CommandLink::new(&config)?;
    let driver = CommandDriver::spawn(link, config.min_interval);

    info!(
        "Drag pad started: centre={} range={} min interval={}ms",
        config.centre,
        config.range,
        config.min_interval.as_millis()
    );

    let mut teleop = Teleop::new(config, driver);
    let (width, height) = terminal::size()?;
    let mut surface = TerminalSurface::new(io::stdout(), width, height);

    let result = match enter_pad(&mut surface) {
        Ok(()) => drive_loop(&mut teleop, &mut surface),
        Err(e) => Err(e),
    };
    if let Err(e) = leave_pad() {
        warn!("Failed to restore terminal: {}", e);
    }

    teleop.finish(&mut surface).await;
    result.map_err(Into::into)
}

fn enter_pad(surface: &mut TerminalSurface<Stdout>) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture, Hide)?;
    surface.flush()
}

fn leave_pad() -> io::Result<()> {
    let mut out = io::stdout();
    execute!(out, Show, DisableMouseCapture, LeaveAlternateScreen)?;
    out.flush()?;
    terminal::disable_raw_mode()
}

fn drive_loop<W: Write>(teleop: &mut Teleop, surface: &mut TerminalSurface<W>) -> io::Result<()> {
    loop {
        if !event::poll(INPUT_POLL)? {
            continue;
        }

        match event::read()? {
            Event::Mouse(mouse) => {
                if let Some(gesture) = GestureEvent::from_terminal(&mouse) {
                    teleop.on_gesture(&gesture, Instant::now(), surface);
                    surface.flush()?;
                }
            }
            Event::Key(key) if is_quit(&key) => {
                info!("Quit requested");
                return Ok(());
            }
            Event::Resize(width, height) => {
                surface.resize(width, height);
                surface.flush()?;
            }
            _ => {}
        }
    }
}

fn is_quit(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}
