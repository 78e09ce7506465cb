use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

/// Where the email body comes from. Text wins over file; stdin is the fallback.
pub fn read_body(text: Option<String>, file: Option<&Path>, stdin: impl Read) -> Result<String> {
    if let Some(t) = text {
        return Ok(t);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("reading email from {}", path.display()));
    }
    let mut buf = String::new();
    let mut stdin = stdin;
    stdin
        .read_to_string(&mut buf)
        .context("reading email from stdin")?;
    Ok(buf)
}
