use clap::{Parser, Subcommand, ValueEnum};
use karel::vm::events::CallStackRecorder;
use karel::vm::{Program, ProgramError, RuntimeObserver};
use karel::{Session, World, WorldDocument, WorldError, importer, logging};
use log::{LevelFilter, error, info};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;
use thiserror::Error;

// Exit status for anything that is not a program result
const FAILURE_EXIT: u8 = 255;

// --- Command Line Arguments ---
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Debug filter to specify log topics (e.g., "vm,world,instructions")
    /// Available topics: vm, world, instructions
    #[arg(long, global = true)]
    debug_filter: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a compiled program and print the outcome. Exits with the fault code.
    Run {
        /// Compiled program (JSON list of opcode records)
        program: PathBuf,

        /// World document; read from stdin when omitted
        #[arg(long)]
        world: Option<PathBuf>,

        /// What to print when the run ends
        #[arg(long, value_enum, default_value_t = DumpMode::Result)]
        dump: DumpMode,

        /// Suppress call/return notifications
        #[arg(long)]
        no_events: bool,
    },
    /// Convert a legacy .mdo/.kec pair into a world document.
    Import {
        mdo: PathBuf,
        kec: PathBuf,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum DumpMode {
    /// The world as the program left it
    World,
    /// The outcome report
    Result,
}

#[derive(Error, Debug)]
enum CliError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot read world from stdin: {0}")]
    Stdin(std::io::Error),
    #[error(transparent)]
    World(#[from] WorldError),
    #[error(transparent)]
    Program(#[from] ProgramError),
    #[error("cannot encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

// Traces calls on the `vm` topic and keeps the call-stack summary
#[derive(Default)]
struct CallTrace {
    recorder: CallStackRecorder,
}

impl RuntimeObserver for CallTrace {
    fn on_call(&mut self, function: &str, param: i32, line: i32) {
        self.recorder.on_call(function, param, line);
        karel::debug_vm!(
            "{:indent$}CALL {}({}) at line {}",
            "",
            function,
            param,
            line,
            indent = 2 * (self.recorder.depth() - 1)
        );
    }

    fn on_return(&mut self, line: i32) {
        karel::debug_vm!(
            "{:indent$}RET at line {}",
            "",
            line,
            indent = 2 * self.recorder.depth().saturating_sub(1)
        );
        self.recorder.on_return(line);
    }
}

fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Warn,
    }
}

fn init_logging(args: &Args) {
    let explicit = args.log_level.is_some() || args.debug_filter.is_some();
    if !explicit && std::env::var_os("RUST_LOG").is_some() {
        env_logger::init();
        return;
    }

    let level = args.log_level.as_deref().map_or(LevelFilter::Warn, parse_level);
    if let Err(e) = logging::init_logger(level, args.debug_filter.clone()) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }
}

fn read(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn read_text(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn run(program: &Path, world: Option<&Path>, dump: DumpMode, no_events: bool) -> Result<i32, CliError> {
    let program = Program::from_json(&read_text(program)?)?;
    let text = match world {
        Some(path) => read_text(path)?,
        None => std::io::read_to_string(std::io::stdin()).map_err(CliError::Stdin)?,
    };
    let world = World::from_document(&WorldDocument::from_json(&text)?)?;

    info!(
        "Running {} instructions on '{}' ({}x{})",
        program.len(),
        world.name(),
        world.width(),
        world.height()
    );

    let trace = Rc::new(RefCell::new(CallTrace::default()));
    let mut session = Session::new(world, program);
    session.runtime_mut().set_observer(Rc::clone(&trace));
    session.runtime_mut().set_notifications(!no_events);
    let fault = session.run();
    info!(
        "Finished after {} instructions: {}",
        session.runtime().state().instruction_count,
        karel::outcome::status_phrase(fault)
    );
    if !no_events {
        let trace = trace.borrow();
        let recorder = &trace.recorder;
        info!(
            "{} calls, {} returns, max call depth {}",
            recorder.calls, recorder.returns, recorder.max_depth
        );
    }

    let output = match dump {
        DumpMode::World => session.world().save_current().to_json()?,
        DumpMode::Result => session.outcome().to_json()?,
    };
    println!("{}", output);

    Ok(session.runtime().state().result_code())
}

fn import(mdo: &Path, kec: &Path, output: Option<&Path>) -> Result<i32, CliError> {
    let mdo_words = importer::words_from_le_bytes(&read(mdo)?)?;
    let kec_words = importer::words_from_le_bytes(&read(kec)?)?;
    let world = importer::decode(&mdo_words, &kec_words)?;
    let json = world.save().to_json()?;

    match output {
        Some(path) => std::fs::write(path, json + "\n").map_err(|source| CliError::Write {
            path: path.to_path_buf(),
            source,
        })?,
        None => println!("{}", json),
    }
    info!("Imported {} ({}x{})", mdo.display(), world.width(), world.height());
    Ok(0)
}

fn main() -> ExitCode {
    // Parse command line arguments
    let args = Args::parse();
    init_logging(&args);

    let result = match &args.command {
        Command::Run {
            program,
            world,
            dump,
            no_events,
        } => run(program, world.as_deref(), *dump, *no_events),
        Command::Import { mdo, kec, output } => import(mdo, kec, output.as_deref()),
    };

    match result {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(FAILURE_EXIT)),
        Err(e) => {
            error!("{}", e);
            ExitCode::from(FAILURE_EXIT)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NESTED: &str = r#"[["LOAD", 1], ["CALL", 3, "outer"], ["HALT"],
                             ["LOAD", 2], ["CALL", 6, "inner"], ["RET"],
                             ["RET"]]"#;

    fn setup(events: bool) -> (Session, Rc<RefCell<CallTrace>>) {
        let trace = Rc::new(RefCell::new(CallTrace::default()));
        let mut session = Session::new(World::new(3, 3), Program::from_json(NESTED).unwrap());
        session.runtime_mut().set_observer(Rc::clone(&trace));
        session.runtime_mut().set_notifications(events);
        (session, trace)
    }

    #[test]
    fn test_call_trace_records_nested_calls() {
        let (mut session, trace) = setup(true);
        assert_eq!(session.run(), None);
        let trace = trace.borrow();
        assert_eq!((trace.recorder.calls, trace.recorder.returns), (2, 2));
        assert_eq!(trace.recorder.max_depth, 2);
    }

    #[test]
    fn test_no_events_silences_call_trace() {
        let (mut session, trace) = setup(false);
        assert_eq!(session.run(), None);
        let trace = trace.borrow();
        assert_eq!(trace.recorder.calls, 0);
        assert_eq!(trace.recorder.max_depth, 0);
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), LevelFilter::Debug);
        assert_eq!(parse_level("bogus"), LevelFilter::Warn);
    }

    #[test]
    fn test_cli_arguments() {
        let args = Args::parse_from(["karel", "run", "prog.json", "--no-events", "--dump", "world"]);
        assert!(matches!(
            args.command,
            Command::Run { no_events: true, dump: DumpMode::World, .. }
        ));
    }
}
