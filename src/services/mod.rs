pub mod responder;

pub use responder::{ChatResponder, EchoResponder, ResponderError, TextGenResponder};
