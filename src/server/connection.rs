//! Per-connection pipeline: a blocking read task parses incoming values off
//! the socket, an async handle task dispatches commands, and a blocking
//! write task marshals replies back — wired together by channels so a
//! stalled peer on one side can't block the others. See
//! `original_source/pkg/server/server.go`'s `socketContext`.
//!
//! The wire codec (`resp::Reader`) is built around `std::io::BufRead`, so
//! the read/write loops run as blocking tasks over a `std::net::TcpStream`
//! (via `tokio::net::TcpStream::into_std`) rather than fighting the codec
//! into an async-read shape. This is the same three-loop structure the
//! original goroutines form, just with `tokio::task::spawn_blocking` in
//! place of a bare goroutine for the two I/O-bound loops.

use std::io::{BufReader, BufWriter, Write};
use std::net::{Shutdown, TcpStream as StdTcpStream};
use std::sync::{Arc, Once};

use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};

use crate::command::{self, CommandError, Context, Handlers};
use crate::resp::{make_error, Reader, Value};

const CHANNEL_CAPACITY: usize = 32;

/// Drives one connection end to end: spawns the read/write loops, runs the
/// handle loop on the current task, and tears everything down once any of
/// the three detects the connection is finished.
pub async fn handle(stream: TcpStream, handlers: Arc<Handlers>) -> anyhow::Result<()> {
    let std_stream = stream.into_std()?;
    std_stream.set_nonblocking(false)?;
    let reader_stream = std_stream.try_clone()?;
    let writer_stream = std_stream.try_clone()?;

    let closer = Arc::new(std_stream);
    let close_once = Arc::new(Once::new());

    let (input_tx, input_rx) = mpsc::channel::<Value>(CHANNEL_CAPACITY);
    let (output_tx, output_rx) = mpsc::channel::<Value>(CHANNEL_CAPACITY);
    let (closed_tx, closed_rx) = watch::channel(());

    let read_task = tokio::task::spawn_blocking({
        let input_tx = input_tx.clone();
        let output_tx = output_tx.clone();
        let closer = closer.clone();
        let close_once = close_once.clone();
        let closed_tx = closed_tx.clone();
        move || read_loop(reader_stream, input_tx, output_tx, closer, close_once, closed_tx)
    });

    let write_task = tokio::task::spawn_blocking({
        let closer = closer.clone();
        let close_once = close_once.clone();
        let closed_tx = closed_tx.clone();
        move || write_loop(writer_stream, output_rx, closer, close_once, closed_tx)
    });

    // `input_tx` and `output_tx` themselves aren't used on this task, only
    // their clones above and the ones moved into `Context`; drop the
    // originals so the channels close once every real owner is gone.
    drop(input_tx);

    let mut ctx = Context::new(input_rx, output_tx, closed_rx);
    loop {
        match command::handle_next(&mut ctx, &handlers).await {
            Ok(()) => {}
            Err(CommandError::Closed) => break,
        }
    }
    drop(ctx);
    do_close(&closer, &close_once, &closed_tx);

    let _ = read_task.await;
    let _ = write_task.await;
    Ok(())
}

fn do_close(stream: &StdTcpStream, once: &Once, closed_tx: &watch::Sender<()>) {
    once.call_once(|| {
        let _ = stream.shutdown(Shutdown::Both);
        let _ = closed_tx.send(());
    });
}

fn read_loop(
    stream: StdTcpStream,
    input_tx: mpsc::Sender<Value>,
    output_tx: mpsc::Sender<Value>,
    closer: Arc<StdTcpStream>,
    close_once: Arc<Once>,
    closed_tx: watch::Sender<()>,
) {
    let mut reader = Reader::new(BufReader::new(stream));
    loop {
        match reader.next() {
            Ok(v) => {
                if input_tx.blocking_send(v).is_err() {
                    break;
                }
            }
            Err(e) if e.is_eof() => break,
            Err(e) => {
                log::warn!("read error: {e}");
                if output_tx.blocking_send(make_error(e.to_string())).is_err() {
                    break;
                }
            }
        }
    }
    do_close(&closer, &close_once, &closed_tx);
}

fn write_loop(
    stream: StdTcpStream,
    mut output_rx: mpsc::Receiver<Value>,
    closer: Arc<StdTcpStream>,
    close_once: Arc<Once>,
    closed_tx: watch::Sender<()>,
) {
    let mut writer = BufWriter::new(stream);
    while let Some(value) = output_rx.blocking_recv() {
        let result = value.marshal(&mut writer).and_then(|_| writer.flush());
        if let Err(e) = result {
            log::warn!("write error: {e}");
            break;
        }
    }
    do_close(&closer, &close_once, &closed_tx);
}
