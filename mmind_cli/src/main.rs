use std::error::Error;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use clap::Parser;
use serde_derive::{Deserialize, Serialize};
use signal_hook::consts::{SIGINT, SIGTERM};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use mmind::control::{MMIND_ENDGAME, MMIND_NEWGAME, MMIND_REMAINING};
use mmind::{
    Authorizer, ControlArg, ControlChannel, ControlReply, ErrorCode, GuessHandle, Interrupt,
    MmindError, SessionConfig, SessionService, Whence,
};

#[derive(clap::Parser)]
#[clap(about = "Play a game of mastermind against an in-process session")]
struct Opts {
    #[clap(short = 'c', long = "config", default_value = "mmind.toml")]
    config: String,
    /// Allow control commands without root privileges.
    #[clap(long = "admin")]
    admin: bool,
}

#[derive(Default, Debug, Serialize, Deserialize)]
#[serde(default)]
struct PlayerConfig {
    session: SessionConfig,
}

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Guess(String),
    Remaining,
    NewGame(Option<u64>),
    EndGame,
    Show,
    Help,
    Quit,
    Unknown(String),
}

fn parse_line(line: &str) -> Option<Input> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if !line.starts_with(':') {
        return Some(Input::Guess(line.to_string()));
    }
    let mut words = line[1..].split_whitespace();
    let input = match words.next() {
        Some("remaining") | Some("r") => Input::Remaining,
        Some("new") | Some("n") => Input::NewGame(words.next().and_then(|w| w.parse().ok())),
        Some("end") | Some("e") => Input::EndGame,
        Some("show") | Some("s") => Input::Show,
        Some("help") | Some("h") => Input::Help,
        Some("quit") | Some("q") => Input::Quit,
        _ => Input::Unknown(line.to_string()),
    };
    Some(input)
}

const HELP: &str = "\
<digits>        submit a guess
:remaining      attempts left
:new <number>   start a new game with a secret
:end            end the game
:show           print the board
:quit           leave
";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn report<W: Write>(out: &mut W, err: &MmindError) -> io::Result<()> {
    writeln!(out, "error {}: {}", err.code(), err)
}

fn show(handle: &mut GuessHandle) -> mmind::Result<String> {
    handle.seek_to(0, Whence::Start)?;
    let mut board = Vec::new();
    let mut buf = [0u8; 64];
    loop {
        let n = handle.read_bytes(&mut buf)?;
        if n == 0 {
            break;
        }
        board.extend(buf[..n].iter().filter(|&&b| b != 0));
    }
    Ok(String::from_utf8_lossy(&board).into_owned())
}

fn run<R, W>(
    service: Arc<SessionService>,
    interrupt: &Interrupt,
    auth: &dyn Authorizer,
    input: R,
    out: &mut W,
) -> Result<(), Box<dyn Error>>
where
    R: BufRead,
    W: Write,
{
    let mut handle = GuessHandle::open(service.clone()).with_interrupt(interrupt.clone());
    let ctl = ControlChannel::new(service).with_interrupt(interrupt.clone());

    for line in input.lines() {
        if interrupt.is_raised() {
            break;
        }
        let line = line?;
        let input = match parse_line(&line) {
            Some(input) => input,
            None => continue,
        };
        debug!(?input, "input");
        let outcome = match input {
            Input::Guess(guess) => handle.write_record(guess.as_bytes()).map(|record| match record {
                Some(record) => record.to_string(),
                None => "board is full\n".to_string(),
            }),
            Input::Remaining => ctl
                .dispatch_raw(auth, MMIND_REMAINING, None)
                .map(|reply| match reply {
                    ControlReply::Remaining(n) => format!("remaining guesses: {}\n", n),
                    ControlReply::Done => String::new(),
                }),
            Input::NewGame(secret) => ctl
                .dispatch_raw(auth, MMIND_NEWGAME, secret.map(ControlArg::Number))
                .map(|_| "started new game\n".to_string()),
            Input::EndGame => ctl
                .dispatch_raw(auth, MMIND_ENDGAME, None)
                .map(|_| "game ended\n".to_string()),
            Input::Show => show(&mut handle),
            Input::Help => Ok(HELP.to_string()),
            Input::Quit => break,
            Input::Unknown(text) => Ok(format!("unknown command {:?}, try :help\n", text)),
        };
        match outcome {
            Ok(text) => out.write_all(text.as_bytes())?,
            Err(MmindError::Interrupted) => break,
            Err(e) => report(out, &e)?,
        }
        out.flush()?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let opts: Opts = Opts::parse();
    let cfg: PlayerConfig = confy::load_path(&opts.config)?;
    let service = SessionService::new(&cfg.session)?;
    info!(
        quantum = cfg.session.store.quantum,
        qset = cfg.session.store.qset,
        max_attempts = cfg.session.max_attempts,
        "session ready"
    );

    let interrupt = Interrupt::new();
    for signal in [SIGINT, SIGTERM].iter() {
        signal_hook::flag::register(*signal, interrupt.flag())?;
    }

    let admin = opts.admin;
    let auth = move || admin || unsafe { libc::geteuid() } == 0;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(service, &interrupt, &auth, stdin.lock(), &mut out)
}
