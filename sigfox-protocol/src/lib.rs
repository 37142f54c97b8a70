//! Wisol Sigfox Modem Protocol
//!
//! This crate defines the serial AT command protocol spoken between the
//! node controller and the Wisol Sigfox radio module. The protocol is a
//! human-readable line protocol:
//!
//! ```text
//! controller ──► "AT$I=10\r"                 (command text + CR)
//! modem      ──► "002BEF41\r\n"              (response text + CR [+ LF])
//! ```
//!
//! Commands are grouped into ordered [`CommandSequence`]s (startup, transmit,
//! diagnostics, recovery) terminated by the [`CommandStep::END`] sentinel.
//! Responses are framed byte by byte with [`LineFramer`], which declares a
//! response complete once the configured number of marker characters has
//! been seen.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod commands;
pub mod frame;
pub mod zone;

pub use commands::{
    diagnostics_sequence, recovery_sequence, startup_sequence, transmit_sequence, CommandLine,
    CommandSequence, CommandStep, ResponseHandler, StepCondition, MAX_BYTES_PER_MESSAGE,
    MAX_COMMAND_LEN, MAX_SEQUENCE_LEN,
};
pub use frame::{FramerError, LineFramer, Response, END_OF_RESPONSE, MAX_RESPONSE_LEN};
pub use zone::{Country, Zone};
