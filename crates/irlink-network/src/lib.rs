//! HTTP surface of the irlink board.
//!
//! This crate maps the JSON API onto a shared
//! [`BoardController`](irlink_controller::BoardController):
//!
//! | Method | Path | Purpose |
//! |---|---|---|
//! | GET | `/info` | identity, addresses, port counts |
//! | GET | `/status` | liveness and learning flag |
//! | GET | `/ports` | every port with its pin capability |
//! | POST | `/ports/configure` | set mode and name of a port |
//! | POST | `/adopt` | rename and adopt the board |
//! | POST | `/send_ir` | transmit a code |
//! | POST | `/test_output` | emit a carrier burst |
//! | POST | `/learning/start` | bind the receiver for a timed capture |
//! | POST | `/learning/stop` | end capture |
//! | GET | `/learning/status` | last captured code |
//!
//! Errors are JSON bodies built by [`ApiError`].

pub mod dto;
pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, HttpServer, HttpServerConfig, SharedController, app_state, router};
