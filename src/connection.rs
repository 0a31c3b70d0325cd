//! A single TCP connection to the target, shared by the workers bound to it
//! and (optionally) a response reader.

use parking_lot::Mutex;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

/// An open socket plus its stable id. Writes are serialized through
/// `write_lock` so concurrent workers bound to the same connection never
/// interleave payload bytes on the wire; the lock is only ever held across
/// the write call itself, never across a sleep.
pub struct Connection {
    pub id: usize,
    stream: TcpStream,
    write_lock: Mutex<()>,
}

impl Connection {
    /// Dials `target_address` with `dial_timeout`. The timeout applies only
    /// to connection establishment; subsequent reads/writes are governed by
    /// their own deadlines.
    pub fn dial(id: usize, target_address: &str, dial_timeout: Duration) -> io::Result<Connection> {
        let mut last_err = None;
        for addr in std::net::ToSocketAddrs::to_socket_addrs(target_address)? {
            match TcpStream::connect_timeout(&addr, dial_timeout) {
                Ok(stream) => {
                    return Ok(Connection {
                        id,
                        stream,
                        write_lock: Mutex::new(()),
                    })
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::AddrNotAvailable, "no addresses resolved")
        }))
    }

    /// Writes `payload` as a single write call under the per-connection write
    /// lock. Returns the number of bytes actually written; the caller
    /// decides whether a short count is a `WriteIncomplete` error.
    pub fn write_once(&self, payload: &[u8]) -> io::Result<usize> {
        let _guard = self.write_lock.lock();
        (&self.stream).write(payload)
    }

    /// Clones the underlying stream for exclusive use by a `ResponseReader`.
    /// Reads and writes on the same socket are independent in the kernel, so
    /// no coordination with `write_lock` is required here.
    pub fn try_clone_for_reading(&self) -> io::Result<TcpStream> {
        self.stream.try_clone()
    }

    /// Shuts down both directions of the socket, which unblocks any
    /// in-flight read or write on a cloned handle.
    pub fn close(&self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

/// Reads exactly `buf.len()` bytes, repeating reads until the buffer is
/// filled or a read fails. A read returning zero bytes before the buffer is
/// full is treated as a premature close.
pub fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed before full response was read",
                ))
            }
            Ok(n) => filled += n,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
