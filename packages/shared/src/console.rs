//! Console line reader shared by the server and client binaries.

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

/// Spawn a blocking thread that reads console lines with rustyline.
///
/// rustyline is synchronous, so lines are forwarded to async code over an
/// unbounded channel. The channel closes on EOF (Ctrl+D), interrupt
/// (Ctrl+C) or a readline error, which callers treat as "quit".
pub fn spawn_line_reader(prompt: impl Into<String>) -> mpsc::UnboundedReceiver<String> {
    let prompt = prompt.into();
    let (tx, rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                tracing::error!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str()).ok();
                    }
                    if tx.send(line).is_err() {
                        // Receiver dropped, exit thread
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    rx
}
