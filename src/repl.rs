//! Line-oriented host shim.
//!
//! Reads cells from stdin (a blank line submits the buffered cell),
//! feeds them to the kernel and prints the resulting notifications. This
//! is a development driver, not a notebook transport.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tracing::info;

use crate::model::{CycleResult, KernelInfo, Notification, StreamName};
use crate::router::Kernel;

/// Kernel handle shared between the REPL loop and any host-side threads.
/// Cycles are serialized by the lock, so cell effects never interleave.
#[derive(Clone)]
pub struct SharedKernel {
    inner: Arc<Mutex<Kernel>>,
}

impl SharedKernel {
    pub fn new(kernel: Kernel) -> Self {
        Self {
            inner: Arc::new(Mutex::new(kernel)),
        }
    }

    pub fn execute(&self, code: &str, silent: bool) -> CycleResult {
        self.inner.lock().execute(code, silent)
    }

    pub fn info(&self) -> KernelInfo {
        self.inner.lock().info()
    }
}

/// Run the blocking REPL until stdin closes.
pub fn run(kernel: &SharedKernel) -> Result<()> {
    let info = kernel.info();
    println!("{} {}", info.banner, info.implementation_version);
    println!("Submit a cell with a blank line; Ctrl-D exits.\n");

    let stdin = io::stdin();
    let mut cell = String::new();
    prompt(">>> ")?;
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        if line.trim().is_empty() {
            if !cell.trim().is_empty() {
                let result = kernel.execute(&cell, false);
                print_result(&result);
            }
            cell.clear();
            prompt(">>> ")?;
        } else {
            cell.push_str(&line);
            cell.push('\n');
            prompt("... ")?;
        }
    }
    if !cell.trim().is_empty() {
        let result = kernel.execute(&cell, false);
        print_result(&result);
    }
    info!("stdin closed, shutting down");
    Ok(())
}

fn prompt(text: &str) -> Result<()> {
    print!("{text}");
    io::stdout().flush().context("failed to flush stdout")?;
    Ok(())
}

fn print_result(result: &CycleResult) {
    for notification in &result.notifications {
        match notification {
            Notification::Stream { name, text } => match name {
                StreamName::Stdout => println!("{text}"),
                StreamName::Stderr => eprintln!("{text}"),
            },
            Notification::Display { data } => {
                if let Some(text) = data.get("text/plain").and_then(|value| value.as_str()) {
                    println!("{text}");
                }
            }
        }
    }
}
