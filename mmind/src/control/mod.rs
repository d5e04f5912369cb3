//! Out-of-band commands: remaining attempts, new game, end game.
//!
//! Raw command codes are laid out like ioctl numbers with no direction or
//! size bits: the magic byte `'k'` in bits 8..16 and the command number in
//! bits 0..8. Codes are checked before the caller's authorization, and the
//! authorization before anything is touched.

use std::convert::TryFrom;
use std::sync::Arc;

use tracing::warn;

use crate::core::{Interrupt, SessionService};
use crate::errors::{MmindError, Result};
use crate::scoring::Code;
use crate::session::GuessSession;

pub const MMIND_IOC_MAGIC: u8 = b'k';

pub const MMIND_REMAINING: u32 = ioc(0);
pub const MMIND_NEWGAME: u32 = ioc(1);
pub const MMIND_ENDGAME: u32 = ioc(2);

const fn ioc(nr: u32) -> u32 {
    ((MMIND_IOC_MAGIC as u32) << 8) | nr
}

/// Decides whether the current caller may issue control commands.
pub trait Authorizer {
    fn is_authorized(&self) -> bool;
}

impl<F> Authorizer for F
where
    F: Fn() -> bool,
{
    fn is_authorized(&self) -> bool {
        self()
    }
}

/// A caller identity with a fixed privilege bit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    pub privileged: bool,
}

impl Caller {
    pub fn admin() -> Caller {
        Caller { privileged: true }
    }

    pub fn unprivileged() -> Caller {
        Caller { privileged: false }
    }
}

impl Authorizer for Caller {
    fn is_authorized(&self) -> bool {
        self.privileged
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CommandCode {
    Remaining,
    NewGame,
    EndGame,
}

impl TryFrom<u32> for CommandCode {
    type Error = MmindError;

    fn try_from(raw: u32) -> Result<CommandCode> {
        if (raw >> 8) & 0xff != MMIND_IOC_MAGIC as u32 || raw >> 16 != 0 {
            return Err(MmindError::UnsupportedCommand(raw));
        }
        match raw & 0xff {
            0 => Ok(CommandCode::Remaining),
            1 => Ok(CommandCode::NewGame),
            2 => Ok(CommandCode::EndGame),
            _ => Err(MmindError::UnsupportedCommand(raw)),
        }
    }
}

impl CommandCode {
    pub fn raw(self) -> u32 {
        match self {
            CommandCode::Remaining => MMIND_REMAINING,
            CommandCode::NewGame => MMIND_NEWGAME,
            CommandCode::EndGame => MMIND_ENDGAME,
        }
    }
}

/// Argument accompanying a raw command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlArg {
    Number(u64),
    Code(Code),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    QueryRemaining,
    NewGame(Code),
    EndGame,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ControlReply {
    Remaining(u32),
    Done,
}

pub struct ControlChannel {
    service: Arc<SessionService>,
    interrupt: Interrupt,
}

impl ControlChannel {
    pub fn new(service: Arc<SessionService>) -> ControlChannel {
        ControlChannel {
            service,
            interrupt: Interrupt::new(),
        }
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> ControlChannel {
        self.interrupt = interrupt;
        self
    }

    fn authorize(&self, auth: &dyn Authorizer, code: CommandCode) -> Result<()> {
        if auth.is_authorized() {
            Ok(())
        } else {
            warn!(command = ?code, "control command denied");
            Err(MmindError::PermissionDenied)
        }
    }

    pub fn dispatch(&self, auth: &dyn Authorizer, command: Command) -> Result<ControlReply> {
        let code = match command {
            Command::QueryRemaining => CommandCode::Remaining,
            Command::NewGame(_) => CommandCode::NewGame,
            Command::EndGame => CommandCode::EndGame,
        };
        self.authorize(auth, code)?;
        self.service
            .with_session(&self.interrupt, |s| apply(s, command))
    }

    /// Decodes and runs a raw command code with its optional argument.
    pub fn dispatch_raw(
        &self,
        auth: &dyn Authorizer,
        raw: u32,
        arg: Option<ControlArg>,
    ) -> Result<ControlReply> {
        let code = CommandCode::try_from(raw)?;
        self.authorize(auth, code)?;
        self.service.with_session(&self.interrupt, |s| {
            let command = match code {
                CommandCode::Remaining => Command::QueryRemaining,
                CommandCode::EndGame => Command::EndGame,
                CommandCode::NewGame => Command::NewGame(secret_from_arg(arg, s.code_len())?),
            };
            apply(s, command)
        })
    }
}

fn secret_from_arg(arg: Option<ControlArg>, code_len: usize) -> Result<Code> {
    match arg {
        Some(ControlArg::Number(n)) => Code::from_number(n, code_len),
        Some(ControlArg::Code(code)) => Ok(code),
        None => Err(MmindError::InvalidArgument("new game needs a secret".to_string())),
    }
}

fn apply(session: &mut GuessSession, command: Command) -> Result<ControlReply> {
    match command {
        Command::QueryRemaining => Ok(ControlReply::Remaining(session.remaining())),
        Command::NewGame(secret) => {
            session.new_game(secret)?;
            Ok(ControlReply::Done)
        }
        Command::EndGame => {
            session.end_game();
            Ok(ControlReply::Done)
        }
    }
}
