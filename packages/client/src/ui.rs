//! UI utilities for the client.

use std::io::Write;

/// Redisplay the prompt after receiving a message
pub fn redisplay_prompt(name: &str) {
    print!("{}> ", name);
    std::io::stdout().flush().ok();
}

/// Print bytes received from the server on their own line
pub fn print_received(bytes: &[u8], name: &str) {
    println!("\n{}", String::from_utf8_lossy(bytes).trim_end_matches('\n'));
    redisplay_prompt(name);
}
