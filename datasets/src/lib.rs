//! `mlkit-datasets` provides loaders and synthetic data generators for the `mlkit` crates.
//!
//! ## The Big Picture
//!
//! `mlkit-datasets` is a crate in the `mlkit` family. It turns CSV files into
//! [`DataSet`](mlkit::DataSet)s ready to be clustered, and, with the `generate` feature
//! enabled, produces well separated blobs used by tests and benchmarks.
//!
//! ## Loading a CSV file
//!
//! The first row holds the feature names, every following row one item. If the file is
//! labeled, the last column is stripped from the records and attached as item labels.
//! ```
//! use mlkit::prelude::*;
//! use mlkit_datasets::dataset_from_csv;
//!
//! let data = "height,width,kind\n1.0,2.0,a\n3.0,4.5,b\n";
//! let dataset = dataset_from_csv(data.as_bytes(), true, b',').unwrap();
//!
//! assert_eq!(dataset.nsamples(), 2);
//! assert_eq!(dataset.feature_names(), vec!["height", "width"]);
//! assert_eq!(dataset.labels(), Some(&["a".to_string(), "b".to_string()][..]));
//! ```
use std::io::Read;

use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use mlkit::DataSet;
use thiserror::Error;

#[cfg(feature = "generate")]
pub mod generate;

/// An error when reading a dataset
#[derive(Error, Debug)]
pub enum ReadError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// A record value could not be read as a number
    #[error("row {row}, column {column}: cannot parse {value:?} as a number")]
    Parse {
        row: usize,
        column: usize,
        value: String,
    },
    /// A labeled file without any column
    #[error("labeled data requires at least one column")]
    MissingLabel,
    #[error(transparent)]
    Dataset(#[from] mlkit::Error),
}

/// Read a dataset from Gzipped CSV bytes
pub fn dataset_from_gz_csv<R: Read>(
    gz: R,
    labeled: bool,
    separator: u8,
) -> Result<DataSet<f64>, ReadError> {
    dataset_from_csv(GzDecoder::new(gz), labeled, separator)
}

/// Read a dataset from CSV bytes with a header row
///
/// The header names the features. When `labeled` is set, the last column of every row is
/// kept verbatim as the item label and excluded from the records. Every other value must parse
/// as a number and every row must have the same number of values.
pub fn dataset_from_csv<R: Read>(
    csv: R,
    labeled: bool,
    separator: u8,
) -> Result<DataSet<f64>, ReadError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(separator)
        .trim(csv::Trim::All)
        .from_reader(csv);

    let mut feature_names = reader
        .headers()?
        .iter()
        .map(String::from)
        .collect::<Vec<_>>();
    if labeled && feature_names.pop().is_none() {
        return Err(ReadError::MissingLabel);
    }

    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let mut values = record.iter().collect::<Vec<_>>();
        if labeled {
            let label = values.pop().ok_or(ReadError::MissingLabel)?;
            labels.push(label.to_string());
        }

        let values = values
            .into_iter()
            .enumerate()
            .map(|(column, value)| {
                value.parse::<f64>().map_err(|_| ReadError::Parse {
                    row,
                    column,
                    value: value.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(values);
    }

    let dataset = DataSet::from_rows(rows)?.with_feature_names(feature_names);
    if labeled {
        Ok(dataset.with_labels(labels)?)
    } else {
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use ndarray::array;
    use std::io::Write;

    #[test]
    fn unlabeled_csv() {
        let data = "x;y\n0;0\n0; 1\n5;0\n5;1\n";
        let dataset = dataset_from_csv(data.as_bytes(), false, b';').unwrap();

        assert_abs_diff_eq!(
            dataset.records(),
            array![[0., 0.], [0., 1.], [5., 0.], [5., 1.]]
        );
        assert_eq!(dataset.feature_names(), vec!["x", "y"]);
        assert!(dataset.labels().is_none());
    }

    #[test]
    fn gz_csv() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"a,b,class\n1,2,left\n3,4,right\n").unwrap();
        let bytes = encoder.finish().unwrap();

        let dataset = dataset_from_gz_csv(&bytes[..], true, b',').unwrap();
        assert_abs_diff_eq!(dataset.records(), array![[1., 2.], [3., 4.]]);
        assert_eq!(
            dataset.labels().unwrap(),
            &["left".to_string(), "right".to_string()]
        );
    }

    #[test]
    fn non_numeric_value() {
        let data = "x,y\n0,0\n0,abc\n";
        let res = dataset_from_csv(data.as_bytes(), false, b',');
        assert!(matches!(
            res,
            Err(ReadError::Parse { row: 1, column: 1, ref value }) if value == "abc"
        ));
    }

    #[test]
    fn rows_of_different_arity() {
        let data = "x,y\n0,0\n0\n";
        let res = dataset_from_csv(data.as_bytes(), false, b',');
        assert!(matches!(
            res,
            Err(ReadError::Dataset(mlkit::Error::Arity {
                row: 1,
                expected: 2,
                found: 1
            }))
        ));
    }

    #[test]
    fn header_only() {
        let dataset = dataset_from_csv("x,y\n".as_bytes(), false, b',').unwrap();
        assert!(dataset.is_empty());
    }
}
