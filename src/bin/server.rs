//! Line-based TCP front-end for the detection/recovery core.
//!
//! Wire protocol (bit-exact, required for compatibility with existing
//! collaborators): UTF-8 text, `\n`-terminated lines. Each line a client
//! sends contains exactly one observed number (integer or decimal) — no
//! command keywords. For every line received, the server re-runs detection
//! against that value and replies with the configured prediction length's
//! worth of predicted values, one per line, followed by one blank
//! terminator line. A line that fails to parse as a number disconnects the
//! client; the server then returns to listening for new connections.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use clap::Parser;
use derandom::{NumberType, RandomManager};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "derandom-server", about = "TCP front-end for PRNG detection and prediction")]
struct Args {
    #[arg(long, default_value_t = 6869)]
    port: u16,

    #[arg(long, default_value_t = 1024)]
    history_capacity: usize,

    /// How many predicted values each reply line group carries.
    #[arg(long, default_value_t = 10)]
    prediction_length: usize,
}

fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let listener = TcpListener::bind(("0.0.0.0", args.port))?;
    info!(port = args.port, "listening");

    // One manager lives for the server's whole lifetime: detection and
    // history persist across reconnects, not just within one connection.
    // Connections are handled on their own thread, but the shared lock
    // means only one of them is ever actually mutating the manager at a
    // time, matching the exclusive-access discipline on state-mutating
    // generator operations.
    let manager = Arc::new(Mutex::new(RandomManager::new(args.history_capacity, NumberType::Raw)));

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let peer = stream.peer_addr().ok();
                info!(?peer, "client connected");
                let manager = Arc::clone(&manager);
                let prediction_length = args.prediction_length;
                thread::spawn(move || {
                    if let Err(err) = handle_client(stream, &manager, prediction_length) {
                        warn!(?peer, %err, "client connection ended with an error");
                    } else {
                        info!(?peer, "client disconnected");
                    }
                });
            }
            Err(err) => warn!(%err, "failed to accept connection"),
        }
    }
    Ok(())
}

/// Each received line carries one observed number; each reply is
/// `prediction_length` predicted values, one per line, followed by a blank
/// terminator line. A line that fails to parse disconnects the client.
fn handle_client(stream: TcpStream, manager: &Mutex<RandomManager>, prediction_length: usize) -> std::io::Result<()> {
    let mut writer = stream.try_clone()?;
    let reader = BufReader::new(stream);

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut manager = manager.lock().unwrap();
        if manager.detect_generator(&[line.to_string()]).is_err() {
            return Ok(());
        }

        if let Ok(predicted) = manager.predict(prediction_length) {
            for word in predicted.words() {
                writeln!(writer, "{word}")?;
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}
