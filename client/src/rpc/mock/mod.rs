//! Client backends that need no node: an in-process application, a scripted
//! mock, and a recorder that can wrap any client (including another recorder).

mod app;
mod call;
mod client;
mod recorder;
mod script;

pub use app::AbciApp;
pub use call::{Call, CallArgs, CallResponse, QueryArgs};
pub use client::AbciMock;
pub use recorder::AbciRecorder;
pub use script::{Expectation, Script};
