// memscan: interactive memory fuzzer

use std::io;
use std::process::ExitCode;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use memscan::session::{Console, LineKind, Session};
use memscan::ui::App;

#[derive(Debug, Parser)]
#[command(name = "memscan", version, about = "search, filter, peek and poke typed values in a running process")]
struct Cli {
    /// PID of the process to attach to, or "self"
    target: Option<String>,

    /// Commands to run before entering the interactive shell
    #[arg(short = 'c', long = "command", value_name = "CMD")]
    commands: Vec<String>,

    /// Run the given commands and exit without the TUI
    #[arg(long)]
    batch: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut session = Session::new();
    let mut console = Console::new();

    let mut rc = 0;
    if let Some(target) = &cli.target {
        rc = session.execute_line(&format!("attach {}", target), &mut console);
    }
    for command in &cli.commands {
        if !session.is_running() {
            break;
        }
        rc = session.execute(command, &mut console);
    }

    if cli.batch || !session.is_running() {
        for line in console.lines() {
            match line.kind {
                LineKind::Error => eprintln!("{}", line.text),
                _ => println!("{}", line.text),
            }
        }
        return ExitCode::from(rc.clamp(0, 255) as u8);
    }

    match run_tui(session, console) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("memscan: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_tui(session: Session, console: Console) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session, console);
    let result = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}
