//! Wire types shared by the livewire bridge and its connectors.
//!
//! ## Protocol
//!
//! Every message is a single JSON object terminated by `\n`. Clients send:
//!
//! ```json
//! {"id":"req_1a2b3c4d","action":"get_session_info","params":{}}
//! ```
//!
//! and receive exactly one response carrying the same `id`:
//!
//! ```json
//! {"id":"req_1a2b3c4d","ok":true,"result":{"tempo":120.0}}
//! {"id":"req_1a2b3c4d","ok":false,"error":"Unknown action: bogus","code":"UNKNOWN_ACTION"}
//! ```

mod codec;
mod command;
mod response;

pub use codec::{CodecError, LineBuffer, MAX_LINE_BYTES, decode_line, encode_line};
pub use command::{Command, Params};
pub use response::{ErrorCode, Outcome, Response};
