pub mod control;
pub mod core;
mod errors;
mod handle;
mod reader;
pub mod record;
pub mod scoring;
pub mod session;
mod writer;


pub use crate::control::{Authorizer, Caller, Command, ControlArg, ControlChannel, ControlReply};
pub use crate::core::{Interrupt, SessionConfig, SessionService, StoreConfig, Whence};
pub use crate::errors::{ErrorCode, MmindError, Result};
pub use crate::handle::GuessHandle;
pub use crate::record::FeedbackRecord;
pub use crate::scoring::{score, Code, Score};
pub use crate::session::{GuessSession, SessionState};
