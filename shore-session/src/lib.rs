//! Session state machine: the comm-log data model, the reducer that folds
//! parsed records into it, and the tailer that feeds the reducer.

pub mod commlog;
pub mod reducer;
pub mod session;
pub mod tailer;

pub use commlog::CommLog;
pub use reducer::{NoopCallbacks, SessionCallbacks, SessionReducer};
pub use session::{Session, Transfer, TransferDirection};
pub use tailer::{Tailer, TailerError};
