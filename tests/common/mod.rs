//! Shared in-process test servers, mirroring the upstream project's own
//! `tests` package (`NewEchoServer` et al.): a plain `TcpListener` plus a
//! thread per accepted connection, with no framing beyond what the test
//! itself cares about.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

/// Starts a TCP echo server on an ephemeral port and returns its address.
/// Accepts connections in the background for as long as the process runs;
/// each connection echoes back whatever it reads, one read at a time.
pub fn echo_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            thread::spawn(move || {
                let mut buf = [0u8; 4096];
                loop {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => return,
                        Ok(n) => {
                            if stream.write_all(&buf[..n]).is_err() {
                                return;
                            }
                        }
                    }
                }
            });
        }
    });

    addr
}

/// Starts a TCP server that reads fixed-size requests and replies to only
/// every `respond_every_nth` request, mirroring the upstream integration
/// suite's "server configured to respond to only some requests" scenario
/// (used to exercise `DeadlineExceeded` handling). Replies are `reply_size`
/// bytes of arbitrary content.
pub fn partial_responder(request_size: usize, reply_size: usize, respond_every_nth: u64) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            thread::spawn(move || {
                let mut buf = vec![0u8; request_size];
                let reply = vec![7u8; reply_size];
                let mut seen = 0u64;
                loop {
                    match stream.read_exact(&mut buf) {
                        Ok(()) => {}
                        Err(_) => return,
                    }
                    seen += 1;
                    if seen % respond_every_nth == 0 && stream.write_all(&reply).is_err() {
                        return;
                    }
                }
            });
        }
    });

    addr
}

/// Returns a never-accepting address, i.e. guaranteed connection refused.
pub fn unreachable_address() -> String {
    // Port 1 is a privileged, essentially always-closed port on loopback.
    "127.0.0.1:1".to_string()
}
