//! Plain-text matrix/vector loader: one floating-point value per line (or,
//! more liberally, whitespace-separated), row-major for matrices. Keeps
//! file I/O a thin, fallible boundary function rather than a parser
//! abstraction.

use crate::error::{LcqpError, Result};
use faer::{Col, Mat};
use std::path::Path;

fn read_values(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path).map_err(|source| LcqpError::UnableToReadFile {
        path: path.display().to_string(),
        source,
    })?;
    let mut values = Vec::new();
    for token in text.split_whitespace() {
        let v: f64 = token.parse().map_err(|_| LcqpError::UnableToReadFile {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, format!("not a number: {token}")),
        })?;
        values.push(v);
    }
    Ok(values)
}

/// Reads a row-major dense matrix of shape `(rows, cols)` from a plain-text
/// file.
pub fn read_dense_matrix(path: &Path, rows: usize, cols: usize) -> Result<Mat<f64>> {
    let values = read_values(path)?;
    if values.len() != rows * cols {
        return Err(LcqpError::UnableToReadFile {
            path: path.display().to_string(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("expected {} values for a {rows}x{cols} matrix, found {}", rows * cols, values.len()),
            ),
        });
    }
    Ok(Mat::from_fn(rows, cols, |i, j| values[i * cols + j]))
}

/// Reads a vector of the given length from a plain-text file.
pub fn read_vector(path: &Path, len: usize) -> Result<Col<f64>> {
    let values = read_values(path)?;
    if values.len() != len {
        return Err(LcqpError::UnableToReadFile {
            path: path.display().to_string(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("expected {len} values, found {}", values.len()),
            ),
        });
    }
    Ok(Col::from_fn(len, |i| values[i]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_vector_from_whitespace_separated_file() {
        let mut path = std::env::temp_dir();
        path.push(format!("lcqpanther_test_vec_{:?}.txt", std::thread::current().id()));
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "1.0\n2.5\n-3.0").unwrap();
        drop(f);
        let v = read_vector(&path, 3).unwrap();
        assert_eq!(v[0], 1.0);
        assert_eq!(v[1], 2.5);
        assert_eq!(v[2], -3.0);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_yields_unable_to_read_file() {
        let path = Path::new("/nonexistent/path/to/lcqpanther_missing.txt");
        let err = read_vector(path, 1).unwrap_err();
        assert!(matches!(err, LcqpError::UnableToReadFile { .. }));
    }

    #[test]
    fn wrong_length_is_rejected() {
        let mut path = std::env::temp_dir();
        path.push(format!("lcqpanther_test_vec_wronglen_{:?}.txt", std::thread::current().id()));
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "1.0 2.0 3.0").unwrap();
        drop(f);
        let err = read_vector(&path, 2).unwrap_err();
        assert!(matches!(err, LcqpError::UnableToReadFile { .. }));
        std::fs::remove_file(&path).unwrap();
    }
}
