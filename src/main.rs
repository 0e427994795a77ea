//! linkwrap: wrap a command (or a pipe) and turn file paths, URLs, and
//! symbols in its output into OSC 8 hyperlinks, byte-for-byte otherwise.

mod capture;
mod cli;
mod fileindex;
mod linker;
mod symbols;
mod symwalk;
mod terminal;

use std::env;
use std::io::{self, IsTerminal, Read, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use portable_pty::PtySize;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::capture::WriteLog;
use crate::cli::Args;
use crate::fileindex::FileIndex;
use crate::linker::{Linker, LinkerOptions};
use crate::terminal::pty::PtySession;

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("linkwrap: {err:#}");
            1
        }
    };
    std::process::exit(code);
}

async fn run() -> Result<i32> {
    let raw_args: Vec<String> = env::args().skip(1).collect();
    let args = match cli::parse_args(&raw_args) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            eprint!("{}", cli::USAGE);
            return Ok(1);
        }
    };

    if args.command.is_empty() && io::stdin().is_terminal() {
        eprint!("{}", cli::USAGE);
        return Ok(1);
    }

    let cwd = env::current_dir().context("determine working directory")?;
    let hostname = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_default();

    let cancel = CancellationToken::new();
    let index = if args.resolve_basename {
        let index = Arc::new(FileIndex::new(cwd.clone(), &args.exclude_dirs));
        tokio::spawn(Arc::clone(&index).start(cancel.clone()));
        Some(index)
    } else {
        None
    };

    let write_log = if args.debug_writes {
        let log = WriteLog::create().context("create debug write log")?;
        eprintln!("linkwrap: logging writes to {}", log.path().display());
        Some(log)
    } else {
        None
    };

    let linker = Linker::new(LinkerOptions {
        output: Box::new(io::stdout()),
        cwd,
        hostname,
        scheme: args.scheme.clone(),
        terminator: args.terminator,
        domains: args.domains.clone(),
        resolve_basename: args.resolve_basename,
        symbol_links: args.symbol_links,
        index,
        write_log,
    });

    let code = if args.command.is_empty() {
        run_pipe_mode(linker).await
    } else {
        run_pty_mode(linker, &args).await?
    };

    cancel.cancel();
    Ok(code)
}

/// Copy stdin through the linker. 0 on clean EOF, 1 on I/O failure.
async fn run_pipe_mode(mut linker: Linker) -> i32 {
    let result = tokio::task::spawn_blocking(move || {
        io::copy(&mut io::stdin().lock(), &mut linker)?;
        linker.flush()
    })
    .await;

    match result {
        Ok(Ok(())) => 0,
        _ => 1,
    }
}

/// Run the command under a PTY, stream its output through the linker, and
/// propagate its exit code.
async fn run_pty_mode(mut linker: Linker, args: &Args) -> Result<i32> {
    let (cols, rows) = crossterm::terminal::size().unwrap_or((80, 24));
    let (mut session, mut output_rx) = PtySession::spawn(
        &args.command,
        PtySize {
            rows,
            cols,
            pixel_width: 0,
            pixel_height: 0,
        },
    )?;

    // Raw mode so keystrokes reach the child unmangled; restored below.
    let raw_mode = enable_raw_mode().is_ok();

    let (stdin_tx, mut stdin_rx) = mpsc::channel::<Vec<u8>>(64);
    std::thread::spawn(move || {
        let mut stdin = io::stdin();
        let mut buf = [0u8; 1024];
        loop {
            match stdin.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if stdin_tx.blocking_send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
            }
        }
    });

    let mut sigwinch = signal(SignalKind::window_change()).context("install SIGWINCH handler")?;
    let mut sigterm = signal(SignalKind::terminate()).context("install SIGTERM handler")?;
    let mut killer = session.killer();

    let mut io_failed = false;
    loop {
        tokio::select! {
            chunk = output_rx.recv() => {
                let Some(chunk) = chunk else { break };
                if linker.write_all(&chunk).is_err() {
                    io_failed = true;
                    break;
                }
            }
            data = stdin_rx.recv() => {
                if let Some(data) = data {
                    let _ = session.write_input(&data);
                }
            }
            _ = sigwinch.recv() => {
                if let Ok((cols, rows)) = crossterm::terminal::size() {
                    let _ = session.resize(PtySize { rows, cols, pixel_width: 0, pixel_height: 0 });
                }
            }
            _ = sigterm.recv() => {
                let _ = killer.kill();
            }
        }
    }
    let _ = linker.flush();

    if io_failed {
        // Nothing left to show the output to; don't wait on a child that
        // may never notice.
        let _ = killer.kill();
    }
    let code = session.wait().unwrap_or(1);

    if raw_mode {
        // Leave the terminal with attributes reset and cooked input.
        let mut stdout = io::stdout();
        let _ = stdout.write_all(b"\x1b[0m");
        let _ = stdout.flush();
        let _ = disable_raw_mode();
    }

    if io_failed {
        return Ok(1);
    }
    Ok(code as i32)
}
