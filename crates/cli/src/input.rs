//! Parsing of vector input files and command-line vectors.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Parses `"x,y,z"` (whitespace around values allowed) into a vector.
pub fn parse_vector(text: &str) -> Result<Vec<f32>, String> {
    text.split(',')
        .map(|field| {
            let field = field.trim();
            field
                .parse::<f32>()
                .map_err(|e| format!("invalid value '{field}': {e}"))
                .and_then(|v| {
                    if v.is_finite() {
                        Ok(v)
                    } else {
                        Err(format!("non-finite value '{field}'"))
                    }
                })
        })
        .collect()
}

/// Reads one comma-separated vector per line. Blank lines and lines starting
/// with `#` are skipped; every vector must share the first vector's length.
pub fn read_vectors(path: &Path) -> io::Result<Vec<Vec<f32>>> {
    let reader = BufReader::new(File::open(path)?);
    let mut vectors: Vec<Vec<f32>> = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let vector = parse_vector(line).map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("line {}: {e}", lineno + 1))
        })?;
        if let Some(first) = vectors.first() {
            if first.len() != vector.len() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "line {}: expected {} values, got {}",
                        lineno + 1,
                        first.len(),
                        vector.len()
                    ),
                ));
            }
        }
        vectors.push(vector);
    }
    Ok(vectors)
}
