#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod config;
mod error;
mod event;
mod flag;
mod gate;
mod interrupt;
mod log;
mod mutex;
mod office;
mod session;

pub use crate::config::*;
pub use crate::error::*;
pub use crate::event::*;
pub use crate::flag::*;
pub use crate::gate::*;
pub use crate::interrupt::*;
pub use crate::log::{LedgerSnapshot, SubmissionLog};
pub use crate::office::*;
pub use crate::session::{Actor, SessionId};
