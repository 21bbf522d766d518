//! Client session: one reader task, one writer loop.

use std::io;

use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt},
    net::{TcpStream, tcp::OwnedWriteHalf},
    sync::mpsc,
};

use crate::{
    config::ClientConfig,
    error::ClientError,
    input::{ClientInput, encode_outgoing},
};

/// Why a session ended
#[derive(Debug)]
pub enum SessionEnd {
    /// The user typed `/exit`
    UserExit,
    /// Console input closed (EOF or Ctrl+C)
    InputClosed,
    /// The server shut down its send direction
    ServerClosed,
    /// Sending or receiving failed
    ConnectionLost(io::Error),
}

/// Connect to the server. Any failure here is a setup failure.
pub async fn connect(config: &ClientConfig) -> Result<TcpStream, ClientError> {
    config.validate()?;

    let addr = config.server_addr();
    let stream = TcpStream::connect(&addr)
        .await
        .map_err(|source| ClientError::Connect { addr, source })?;

    tracing::info!("Connected to {} as '{}'", config.server_addr(), config.name);
    Ok(stream)
}

/// Run the session until the user exits or the connection ends.
///
/// # Arguments
///
/// * `stream` - Connected stream returned by [`connect`]
/// * `config` - Client configuration (name, framing, buffer size)
/// * `input` - Console lines typed by the user
/// * `output` - Receives every chunk of bytes read from the server
pub async fn run_session(
    stream: TcpStream,
    config: &ClientConfig,
    mut input: mpsc::UnboundedReceiver<String>,
    output: mpsc::UnboundedSender<Vec<u8>>,
) -> SessionEnd {
    let (reader, mut writer) = stream.into_split();
    let mut read_task = tokio::spawn(receive_loop(reader, config.buffer_size, output));

    // If either side completes, stop the other
    let end = tokio::select! {
        read_result = &mut read_task => match read_result {
            Ok(end) => end,
            Err(e) => SessionEnd::ConnectionLost(io::Error::other(e)),
        },
        write_end = send_loop(&mut writer, config, &mut input) => write_end,
    };

    if let Err(e) = writer.shutdown().await {
        tracing::debug!("Shutdown of send direction failed: {}", e);
    }
    read_task.abort();

    end
}

async fn send_loop(
    writer: &mut OwnedWriteHalf,
    config: &ClientConfig,
    input: &mut mpsc::UnboundedReceiver<String>,
) -> SessionEnd {
    while let Some(line) = input.recv().await {
        match ClientInput::parse(&line) {
            ClientInput::Exit => return SessionEnd::UserExit,
            ClientInput::Skip => continue,
            ClientInput::Send(text) => {
                let payload = encode_outgoing(&config.name, text, config.framing);
                if let Err(e) = writer.write_all(&payload).await {
                    tracing::warn!("Failed to send message: {}", e);
                    return SessionEnd::ConnectionLost(e);
                }
            }
        }
    }

    SessionEnd::InputClosed
}

async fn receive_loop<R>(
    mut reader: R,
    buffer_size: usize,
    output: mpsc::UnboundedSender<Vec<u8>>,
) -> SessionEnd
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; buffer_size.max(1)];

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                tracing::info!("Server closed the connection");
                return SessionEnd::ServerClosed;
            }
            Ok(n) => {
                // Printing is best effort; the session keeps running without a listener
                let _ = output.send(buf[..n].to_vec());
            }
            Err(e) => {
                tracing::warn!("Receive failed: {}", e);
                return SessionEnd::ConnectionLost(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_receive_loop_forwards_chunks_until_eof() {
        // テスト項目: 受信データが出力チャネルに転送され、EOF で終了する
        // given (前提条件):
        let (mut server_side, client_side) = tokio::io::duplex(64);
        let (tx, mut rx) = mpsc::unbounded_channel();

        // when (操作):
        let task = tokio::spawn(receive_loop(client_side, 64, tx));
        server_side.write_all(b"bob: hi").await.unwrap();
        server_side.shutdown().await.unwrap();
        let end = task.await.unwrap();

        // then (期待する結果):
        assert!(matches!(end, SessionEnd::ServerClosed));
        assert_eq!(rx.recv().await, Some(b"bob: hi".to_vec()));
    }
}
