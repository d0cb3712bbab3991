use std::fs::File;
use std::path::Path;

use polars::prelude::*;

use crate::error::{BrainMappError, Result};
use crate::mgh::read_mgh;
use crate::qc::check_file_exists;

pub fn read_surface_values(path: &Path) -> Result<Vec<f64>> {
    check_file_exists(path)?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let values = match ext.as_str() {
        "mgh" | "mgz" => read_mgh(path)?.flatten(),
        "txt" | "csv" | "asc" => read_vector_file(path)?,
        other => {
            return Err(BrainMappError::format(
                path,
                format!("unsupported surface file extension '{other}'"),
            ));
        }
    };

    if values.is_empty() {
        return Err(BrainMappError::format(path, "surface file holds no vertices"));
    }
    Ok(values)
}

pub fn read_vector_file(path: &Path) -> Result<Vec<f64>> {
    let to_format = |e: PolarsError| BrainMappError::format(path, e.to_string());
    let df = CsvReadOptions::default()
        .with_has_header(false)
        .with_parse_options(
            CsvParseOptions::default().with_null_values(Some(NullValues::AllColumns(vec![
                "NA".into(),
                "NaN".into(),
                "nan".into(),
                ".".into(),
            ]))),
        )
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(to_format)?
        .finish()
        .map_err(to_format)?;

    let Some(column) = df.get_columns().first() else {
        return Ok(Vec::new());
    };
    let series = column
        .as_series()
        .ok_or_else(|| BrainMappError::format(path, "vector column is not materialised"))?
        .strict_cast(&DataType::Float64)
        .map_err(|_| BrainMappError::format(path, "vector file holds non-numeric values"))?;
    let values = series.f64().map_err(to_format)?;
    Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

pub fn write_dataframe(df: &DataFrame, path: &Path) -> anyhow::Result<()> {
    let mut file = File::create(path)?;
    let mut csv = CsvWriter::new(&mut file).with_separator(b'\t');
    let mut df = df.clone();
    csv.finish(&mut df)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_text_vectors_with_missing_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lh.values.txt");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "0.5\nNA\n-2\n.").unwrap();
        let values = read_surface_values(&path).unwrap();
        assert_eq!(values.len(), 4);
        assert_eq!(values[0], 0.5);
        assert!(values[1].is_nan());
        assert_eq!(values[2], -2.0);
        assert!(values[3].is_nan());
    }

    #[test]
    fn integer_vectors_are_widened() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lh.labels.asc");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "0\n3\n3\n1").unwrap();
        assert_eq!(read_surface_values(&path).unwrap(), vec![0.0, 3.0, 3.0, 1.0]);
    }

    #[test]
    fn non_numeric_vectors_are_format_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lh.values.txt");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "0.5\nabc\n1.5").unwrap();
        assert!(matches!(
            read_surface_values(&path),
            Err(BrainMappError::MapFormat { .. })
        ));
    }

    #[test]
    fn missing_and_unknown_files_are_typed_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("lh.nothing.mgh");
        assert!(matches!(
            read_surface_values(&missing),
            Err(BrainMappError::MapFileNotFound(_))
        ));

        let odd = dir.path().join("lh.values.nii");
        File::create(&odd).unwrap();
        assert!(matches!(
            read_surface_values(&odd),
            Err(BrainMappError::MapFormat { .. })
        ));

        let empty = dir.path().join("lh.values.txt");
        File::create(&empty).unwrap();
        assert!(matches!(
            read_surface_values(&empty),
            Err(BrainMappError::MapFormat { .. })
        ));
    }
}
