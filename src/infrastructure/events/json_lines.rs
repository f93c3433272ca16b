//! JSON lines event emitter
//!
//! Writes one `{"event":"rn-recordback","body":{...}}` object per line, so a host
//! process reading stdout can follow progress.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::application::ports::{EmitError, EventEmitter};
use crate::domain::session::{ProgressEvent, PROGRESS_EVENT};

#[derive(Serialize)]
struct Envelope<'a> {
    event: &'static str,
    body: &'a ProgressEvent,
}

/// Emits progress events as newline-delimited JSON
pub struct JsonLinesEmitter<W: Write + Send> {
    out: Mutex<W>,
}

impl JsonLinesEmitter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> JsonLinesEmitter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Consume the emitter and return the writer
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> EventEmitter for JsonLinesEmitter<W> {
    fn emit(&self, event: &ProgressEvent) -> Result<(), EmitError> {
        let line = serde_json::to_string(&Envelope {
            event: PROGRESS_EVENT,
            body: event,
        })
        .map_err(|e| EmitError::DeliveryFailed(e.to_string()))?;

        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(out, "{}", line)
            .and_then(|_| out.flush())
            .map_err(|e| match e.kind() {
                io::ErrorKind::BrokenPipe => EmitError::Disconnected,
                _ => EmitError::DeliveryFailed(e.to_string()),
            })
    }
}
