use crate::Result;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use polars::prelude::*;
use std::path::Path;

pub const DOWNLOAD_NAME: &str = "playerstats.csv";

/// CSV text with a header row and no index column.
pub fn to_csv(df: &DataFrame) -> Result<String> {
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .finish(&mut df.clone())?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn write_csv<P: AsRef<Path>>(df: &DataFrame, path: P) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df.clone())?;
    Ok(())
}

/// An HTML anchor carrying the CSV inline as a base64 `data:` URL.
pub fn download_link(df: &DataFrame) -> Result<String> {
    let b64 = BASE64.encode(to_csv(df)?);
    Ok(format!(
        r#"<a href="data:file/csv;base64,{}" download="{}">Download CSV File</a>"#,
        b64, DOWNLOAD_NAME
    ))
}
