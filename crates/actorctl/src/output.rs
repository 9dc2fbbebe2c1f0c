use bytes::Bytes;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let line = |cells: Vec<String>| {
        let padded: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{cell:w$}")
            })
            .collect();
        println!("{}", padded.join("  ").trim_end());
    };

    line(headers.iter().map(|h| h.to_string()).collect());
    line(widths.iter().map(|&w| "-".repeat(w)).collect());
    for row in rows {
        line(row);
    }
}

/// One decoded blob, shown both as hex and as lossy UTF-8.
#[derive(Debug, Serialize)]
pub struct BlobView {
    pub index: usize,
    pub len: usize,
    pub hex: String,
    pub text: String,
}

pub fn blob_views(blobs: &[Bytes]) -> Vec<BlobView> {
    blobs
        .iter()
        .enumerate()
        .map(|(index, blob)| BlobView {
            index,
            len: blob.len(),
            hex: hex::encode(blob),
            text: String::from_utf8_lossy(blob).into_owned(),
        })
        .collect()
}

pub fn print_blobs(blobs: &[Bytes], json: bool) -> anyhow::Result<()> {
    let views = blob_views(blobs);
    if json {
        return print_json(&views);
    }
    if views.is_empty() {
        println!("(no blobs)");
        return Ok(());
    }
    let rows = views
        .into_iter()
        .map(|v| vec![v.index.to_string(), v.len.to_string(), v.text])
        .collect();
    print_table(&["INDEX", "LEN", "TEXT"], rows);
    Ok(())
}
