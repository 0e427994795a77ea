//! PTY session for the wrapped command
//!
//! Spawns the command under a pseudo-terminal so it behaves as if attached
//! to the user's terminal (colors on, line buffering off), bridges the
//! blocking master read onto a channel, and exposes write/resize/wait for
//! the event loop in `main`.

use std::env;
use std::io::{Read, Write};

use anyhow::{Context, Result};
use portable_pty::{
    native_pty_system, Child, ChildKiller, CommandBuilder, MasterPty, PtySize,
};
use tokio::sync::mpsc;

pub struct PtySession {
    master: Box<dyn MasterPty + Send>,
    child: Box<dyn Child + Send + Sync>,
    writer: Box<dyn Write + Send>,
}

impl PtySession {
    /// Spawn `command` under a new PTY of the given size. Returns the session
    /// and a channel carrying the child's output; the channel closes on EOF.
    pub fn spawn(command: &[String], size: PtySize) -> Result<(Self, mpsc::Receiver<Vec<u8>>)> {
        let pty_system = native_pty_system();
        let pair = pty_system.openpty(size).context("open pty")?;

        let mut cmd = CommandBuilder::new(&command[0]);
        cmd.args(&command[1..]);
        if let Ok(cwd) = env::current_dir() {
            cmd.cwd(cwd);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .with_context(|| format!("spawn {}", command[0]))?;
        // The slave side lives on in the child; keeping our handle open would
        // stop the master read from seeing EOF.
        drop(pair.slave);

        let mut reader = pair.master.try_clone_reader().context("clone pty reader")?;
        let writer = pair.master.take_writer().context("take pty writer")?;

        let (tx, rx) = mpsc::channel::<Vec<u8>>(64);
        std::thread::spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if tx.blocking_send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Ok((
            Self {
                master: pair.master,
                child,
                writer,
            },
            rx,
        ))
    }

    /// Forward user keystrokes to the child.
    pub fn write_input(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(data)?;
        self.writer.flush()
    }

    pub fn resize(&self, size: PtySize) -> Result<()> {
        self.master.resize(size).context("resize pty")
    }

    /// Handle that can terminate the child from another task.
    pub fn killer(&self) -> Box<dyn ChildKiller + Send + Sync> {
        self.child.clone_killer()
    }

    /// Wait for the child to exit and return its exit code.
    pub fn wait(&mut self) -> Result<u32> {
        let status = self.child.wait().context("wait for child")?;
        Ok(status.exit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size() -> PtySize {
        PtySize {
            rows: 24,
            cols: 80,
            pixel_width: 0,
            pixel_height: 0,
        }
    }

    #[tokio::test]
    async fn captures_child_output_and_exit_code() {
        let command = vec![
            "/bin/sh".to_string(),
            "-c".to_string(),
            "printf hello; exit 7".to_string(),
        ];
        let (mut session, mut rx) = PtySession::spawn(&command, size()).unwrap();

        let mut output = Vec::new();
        while let Some(chunk) = rx.recv().await {
            output.extend_from_slice(&chunk);
        }

        assert!(
            output.windows(5).any(|w| w == b"hello"),
            "output was {output:?}"
        );
        assert_eq!(session.wait().unwrap(), 7);
    }

    #[tokio::test]
    async fn forwards_input_to_child() {
        let command = vec!["/bin/cat".to_string()];
        let (mut session, mut rx) = PtySession::spawn(&command, size()).unwrap();

        session.write_input(b"ping\n").unwrap();

        let mut output = Vec::new();
        while !output.windows(4).any(|w| w == b"ping") {
            match rx.recv().await {
                Some(chunk) => output.extend_from_slice(&chunk),
                None => break,
            }
        }
        assert!(output.windows(4).any(|w| w == b"ping"));

        // EOF (ctrl-d) lets cat exit cleanly.
        session.write_input(&[0x04]).unwrap();
        while rx.recv().await.is_some() {}
        assert_eq!(session.wait().unwrap(), 0);
    }
}
