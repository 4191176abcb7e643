use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, MouseEventKind,
    },
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{stdout, Stdout};
use std::time::Duration;
use tracing::{error, info};

use sedit::buffer::Motion;
use sedit::mode::{dispatch, EditorContext, InputResult, Mode};
use sedit::ui::{self, viewport::Viewport};
use sedit::{logging, Cli, Config, Session};

type Term = Terminal<CrosstermBackend<Stdout>>;

fn setup_terminal() -> Result<Term> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(DisableMouseCapture)?;
    stdout().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn scroll(session: &mut Session, motion: Motion) {
    let moved = session.move_cursor(motion);
    session.report(moved);
}

fn run(terminal: &mut Term, session: &mut Session) -> Result<()> {
    let mut mode = Mode::Edit;
    let height = ui::text_height(terminal.size()?.height);
    let mut view = Viewport::new(0, height);

    loop {
        session.poll();

        // The loader holds the lock while publishing; skip this frame then
        {
            let session: &Session = session;
            if let Some(resident) = session.try_resident() {
                terminal.draw(|frame| ui::draw(frame, session, &resident, &mut view, &mode))?;
            }
        }

        // Poll for events with timeout to maintain ~60fps
        if !event::poll(Duration::from_millis(16))? {
            continue;
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                let ctx = EditorContext {
                    session: &mut *session,
                    page: view.page(),
                };
                match dispatch(&mut mode, key, ctx)? {
                    InputResult::ModeSwitch(next) => mode = next,
                    InputResult::Quit => break,
                    InputResult::Handled | InputResult::NotHandled => {}
                }
            }
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => scroll(session, Motion::Up),
                MouseEventKind::ScrollDown => scroll(session, Motion::Down),
                _ => {}
            },
            _ => {}
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from(&cli);
    logging::init(&config.log_file)?;

    let mut session = Session::open(&cli.file, config)
        .with_context(|| format!("failed to open {}", cli.file.display()))?;

    // Set up panic hook to restore terminal
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = stdout().execute(DisableMouseCapture);
        let _ = stdout().execute(LeaveAlternateScreen);
        default_panic(info);
    }));

    let mut terminal = setup_terminal()?;
    let result = run(&mut terminal, &mut session);
    restore_terminal(&mut terminal)?;

    if let Err(e) = &result {
        error!(error = %e, "editor loop failed");
    }
    session.shutdown();
    info!("exit");

    result
}
