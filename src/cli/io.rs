//! Line-oriented JSON I/O for the CLI
//!
//! - Input: one JSON request per line on stdin
//! - Output: one JSON response per line on stdout
//! - UTF-8 only

use std::io::{self, BufRead, Write};

use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::errors::{CliError, CliResult};

/// Read one request line from stdin
pub fn read_request() -> CliResult<String> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;

    if line.trim().is_empty() {
        return Err(CliError::io_error("Empty input"));
    }
    Ok(line)
}

/// Write one JSON line to stdout
pub fn write_json(json_str: &str) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", json_str)?;
    stdout.flush()?;
    Ok(())
}

/// Write one JSON line to an async writer, for use inside the runtime
pub async fn write_json_line<W>(out: &mut W, json_str: &str) -> CliResult<()>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(json_str.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await?;
    Ok(())
}
