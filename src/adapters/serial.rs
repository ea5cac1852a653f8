//! UART adapter for the stand controller link.
//!
//! [`SerialConnector`] opens the configured device with a fixed per-read
//! timeout; [`SerialLineSource`] splits the byte stream into lines. A
//! timeout is not a disconnect: any partial line is kept for the next
//! call. A line longer than `max_line_bytes` (terminator included) is
//! reported as [`LineRead::Overlong`] with its first bytes and the rest is
//! dropped, so a controller spewing garbage cannot grow the buffer. Every
//! call consumes a bounded amount of input before returning.

use std::io::{self, BufRead, BufReader, Read};
use std::time::Duration;

use serialport::SerialPort;

use crate::app::ports::{Connector, LineRead, LineSource};
use crate::config::SerialConfig;

pub struct SerialConnector {
    device: String,
    baud: u32,
    timeout: Duration,
    max_line_bytes: usize,
}

impl SerialConnector {
    pub fn new(config: &SerialConfig) -> Self {
        Self {
            device: config.device.clone(),
            baud: config.baud,
            timeout: config.read_timeout(),
            max_line_bytes: config.max_line_bytes,
        }
    }
}

impl Connector for SerialConnector {
    type Source = SerialLineSource<Box<dyn SerialPort>>;

    fn open(&mut self) -> io::Result<Self::Source> {
        let port = serialport::new(&self.device, self.baud)
            .timeout(self.timeout)
            .open()?;
        Ok(SerialLineSource::new(port, self.max_line_bytes))
    }

    fn describe(&self) -> String {
        format!("{} @ {}", self.device, self.baud)
    }
}

/// Newline splitter over any byte reader.
pub struct SerialLineSource<R: Read> {
    reader: BufReader<R>,
    pending: Vec<u8>,
    max_line_bytes: usize,
    /// Dropping the tail of an overlong line.
    discarding: bool,
}

impl<R: Read> SerialLineSource<R> {
    pub fn new(inner: R, max_line_bytes: usize) -> Self {
        Self {
            reader: BufReader::new(inner),
            pending: Vec::with_capacity(256),
            max_line_bytes,
            discarding: false,
        }
    }

    fn take_line(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.pending)
            .trim_end_matches(['\r', '\n'])
            .to_owned();
        self.pending.clear();
        line
    }
}

fn is_timeout(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

impl<R: Read> LineSource for SerialLineSource<R> {
    fn read_line(&mut self) -> io::Result<LineRead> {
        loop {
            let (consumed, complete) = {
                let available = match self.reader.fill_buf() {
                    Ok(buf) => buf,
                    Err(e) if is_timeout(e.kind()) => return Ok(LineRead::Pending),
                    Err(e) => return Err(e),
                };
                if available.is_empty() {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "serial device closed",
                    ));
                }
                match available.iter().position(|&b| b == b'\n') {
                    Some(i) => {
                        if !self.discarding {
                            self.pending.extend_from_slice(&available[..=i]);
                        }
                        (i + 1, true)
                    }
                    None => {
                        if !self.discarding {
                            self.pending.extend_from_slice(available);
                        }
                        (available.len(), false)
                    }
                }
            };
            self.reader.consume(consumed);

            // Tail of a line already reported as overlong: one chunk per call.
            if self.discarding {
                if complete {
                    self.discarding = false;
                }
                return Ok(LineRead::Pending);
            }

            if self.pending.len() > self.max_line_bytes {
                self.discarding = !complete;
                self.pending.truncate(self.max_line_bytes);
                return Ok(LineRead::Overlong(self.take_line()));
            }

            if complete {
                return Ok(LineRead::Line(self.take_line()));
            }
        }
    }
}
