//! Command dispatch: reads one Array off a connection's input, normalizes
//! its first element into a verb, and invokes the matching handler.
//! See `original_source/pkg/command/{handler,context}.go`.

pub mod storage;

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::resp::{make_error, Value};

pub const ERR_EXPECTED_ARRAY: &str = "WRONGTYPE expected array";
pub const ERR_EMPTY_COMMAND: &str = "WRONGTYPE empty command";
pub const ERR_EXPECTED_BULK_STRING: &str = "WRONGTYPE expected bulk string as command";

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("context closed")]
    Closed,
}

/// A single command verb's implementation. Takes the arguments that
/// followed the verb and returns the reply to emit.
pub type Handler = Arc<dyn Fn(&[Value]) -> Result<Value, HandlerError> + Send + Sync>;

/// An error raised while processing a command's arguments — its message is
/// folded into the "error processing VERB" reply, never sent verbatim.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HandlerError(String);

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        HandlerError(message.into())
    }
}

/// A case-insensitive verb -> [`Handler`] table.
#[derive(Default)]
pub struct Handlers(HashMap<String, Handler>);

impl Handlers {
    pub fn new() -> Self {
        Handlers(HashMap::new())
    }

    pub fn insert(&mut self, verb: &str, handler: Handler) {
        self.0.insert(verb.to_ascii_uppercase(), handler);
    }

    pub fn merge(mut self, other: Handlers) -> Self {
        self.0.extend(other.0);
        self
    }
}

/// Normalizes the verb, looks it up, and runs its handler — wrapping any
/// error with the verb name the way a misbehaving command should report
/// itself. An unrecognized verb produces an `ERR unknown command` reply
/// rather than propagating an error.
pub fn dispatch(handlers: &Handlers, args: &[Value]) -> Value {
    let Some(first) = args.first() else {
        return make_error(ERR_EMPTY_COMMAND);
    };
    let Value::BulkString(verb_bytes) = first else {
        return make_error(ERR_EXPECTED_BULK_STRING);
    };
    let verb = String::from_utf8_lossy(verb_bytes).to_ascii_uppercase();
    match handlers.0.get(&verb) {
        Some(h) => match h(&args[1..]) {
            Ok(reply) => reply,
            Err(e) => make_error(format!("ERR error processing {verb}. {e}")),
        },
        None => make_error(format!("ERR unknown command '{verb}'")),
    }
}

/// The channels a connection's handle loop reads commands from and writes
/// replies to. `closed` fires (its sender drops) when either the read or
/// write side of the connection has shut down.
pub struct Context {
    input: mpsc::Receiver<Value>,
    output: mpsc::Sender<Value>,
    closed: watch::Receiver<()>,
}

impl Context {
    pub fn new(
        input: mpsc::Receiver<Value>,
        output: mpsc::Sender<Value>,
        closed: watch::Receiver<()>,
    ) -> Self {
        Context {
            input,
            output,
            closed,
        }
    }

    async fn accept(&mut self) -> Result<Value, CommandError> {
        tokio::select! {
            _ = self.closed.changed() => Err(CommandError::Closed),
            v = self.input.recv() => v.ok_or(CommandError::Closed),
        }
    }

    async fn emit(&mut self, v: Value) -> Result<(), CommandError> {
        tokio::select! {
            _ = self.closed.changed() => Err(CommandError::Closed),
            res = self.output.send(v) => res.map_err(|_| CommandError::Closed),
        }
    }
}

/// Reads the next value off `ctx`, requires it to be an Array, dispatches
/// its elements through `handlers`, and emits the reply. Propagates
/// [`CommandError::Closed`] once `ctx` is closed, so the caller's loop can
/// exit on that specific error.
pub async fn handle_next(ctx: &mut Context, handlers: &Handlers) -> Result<(), CommandError> {
    let v = ctx.accept().await?;
    let reply = match v {
        Value::Array(arr) => dispatch(handlers, arr.items()),
        _ => make_error(ERR_EXPECTED_ARRAY),
    };
    ctx.emit(reply).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resp::{ok, ArrayValue};
    use bytes::Bytes;

    fn bulk(s: &str) -> Value {
        Value::BulkString(Bytes::copy_from_slice(s.as_bytes()))
    }

    fn echo_handlers() -> Handlers {
        let mut h = Handlers::new();
        h.insert("PING", Arc::new(|_args: &[Value]| Ok(ok())));
        h.insert(
            "FAIL",
            Arc::new(|_args: &[Value]| Err(HandlerError::new("boom"))),
        );
        h
    }

    #[test]
    fn dispatch_is_case_insensitive() {
        let h = echo_handlers();
        let reply = dispatch(&h, &[bulk("ping")]);
        assert!(reply.equal(&ok()));
    }

    #[test]
    fn dispatch_unknown_verb_errors() {
        let h = echo_handlers();
        let reply = dispatch(&h, &[bulk("NOPE")]);
        match reply {
            Value::SimpleError(e) => assert_eq!(e.0.message(), "unknown command 'NOPE'"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn dispatch_wraps_handler_error_with_verb() {
        let h = echo_handlers();
        let reply = dispatch(&h, &[bulk("FAIL")]);
        match reply {
            Value::SimpleError(e) => {
                assert_eq!(e.0.message(), "error processing FAIL. boom")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn dispatch_on_empty_args_is_empty_command_error() {
        let h = echo_handlers();
        let reply = dispatch(&h, &[]);
        match reply {
            Value::SimpleError(e) => assert_eq!(e.0.message(), "empty command"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn handle_next_dispatches_array_and_emits_reply() {
        let (in_tx, in_rx) = mpsc::channel(1);
        let (out_tx, mut out_rx) = mpsc::channel(1);
        let (_closed_tx, closed_rx) = watch::channel(());
        let mut ctx = Context::new(in_rx, out_tx, closed_rx);
        let h = echo_handlers();

        in_tx
            .send(Value::Array(ArrayValue::new(vec![bulk("PING")])))
            .await
            .unwrap();
        handle_next(&mut ctx, &h).await.unwrap();
        let reply = out_rx.recv().await.unwrap();
        assert!(reply.equal(&ok()));
    }

    #[tokio::test]
    async fn handle_next_rejects_non_array_input() {
        let (in_tx, in_rx) = mpsc::channel(1);
        let (out_tx, mut out_rx) = mpsc::channel(1);
        let (_closed_tx, closed_rx) = watch::channel(());
        let mut ctx = Context::new(in_rx, out_tx, closed_rx);
        let h = echo_handlers();

        in_tx.send(Value::Integer(1)).await.unwrap();
        handle_next(&mut ctx, &h).await.unwrap();
        let reply = out_rx.recv().await.unwrap();
        match reply {
            Value::SimpleError(e) => assert_eq!(e.0.message(), "expected array"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
