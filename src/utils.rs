use crate::error::{Error, Result};
use polars::prelude::*;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Resolve the number of worker threads.
///
/// `0` means half of the available cores, never fewer than one.
pub fn get_num_threads(num_threads: usize) -> usize {
    if num_threads == 0 {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        (cores / 2).max(1)
    } else {
        num_threads
    }
}

/// Name of the protein a predicted structure belongs to: its parent directory.
pub fn protein_name_from_structure(file: &Path) -> String {
    file.parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Name of the protein a per-protein table belongs to: the file stem up to the first `_`.
pub fn protein_name_from_table(file: &Path) -> String {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    stem.split('_').next().unwrap_or_default().to_string()
}

/// Compare two strings so that runs of digits are ordered by value.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut xs = a.chars().peekable();
    let mut ys = b.chars().peekable();

    loop {
        match (xs.peek().copied(), ys.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let x_run = take_digits(&mut xs);
                let y_run = take_digits(&mut ys);
                let x_trim = x_run.trim_start_matches('0');
                let y_trim = y_run.trim_start_matches('0');
                let ord = x_trim
                    .len()
                    .cmp(&y_trim.len())
                    .then_with(|| x_trim.cmp(y_trim))
                    .then_with(|| x_run.len().cmp(&y_run.len()));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                xs.next();
                ys.next();
            }
        }
    }
}

fn take_digits(it: &mut std::iter::Peekable<std::str::Chars>) -> String {
    let mut run = String::new();
    while let Some(c) = it.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        it.next();
    }
    run
}

/// Read a tab-separated table with a header row.
pub fn read_tsv(path: &Path) -> Result<DataFrame> {
    non_empty(read_delimited(path, b'\t')?, path)
}

/// Read a table written by [`write_df_to_file`], picking the format from its extension.
///
/// Unknown extensions are read as tab-separated values.
pub fn read_table(path: &Path) -> Result<DataFrame> {
    let file_type = DataFrameFileType::from_path(path).unwrap_or(DataFrameFileType::Tsv);
    let df = match file_type {
        DataFrameFileType::Tsv => read_delimited(path, b'\t')?,
        DataFrameFileType::Csv => read_delimited(path, b',')?,
        DataFrameFileType::Parquet => ParquetReader::new(std::fs::File::open(path)?).finish()?,
        DataFrameFileType::Json => JsonReader::new(std::fs::File::open(path)?)
            .with_json_format(JsonFormat::Json)
            .finish()?,
        DataFrameFileType::NDJson => JsonLineReader::new(std::fs::File::open(path)?).finish()?,
    };
    non_empty(df, path)
}

fn read_delimited(path: &Path, separator: u8) -> Result<DataFrame> {
    Ok(CsvReadOptions::default()
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_separator(separator))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?)
}

fn non_empty(df: DataFrame, path: &Path) -> Result<DataFrame> {
    if df.height() == 0 {
        return Err(Error::EmptyTable {
            path: path.to_path_buf(),
        });
    }
    Ok(df)
}

/// Pull a numeric column out of a table as `f64`, nulls included.
pub fn float_column(df: &DataFrame, name: &str, path: &Path) -> Result<Vec<Option<f64>>> {
    let missing = || Error::Column {
        path: path.to_path_buf(),
        column: name.to_string(),
    };
    let series = df
        .column(name)
        .map_err(|_| missing())?
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|_| missing())?;
    Ok(series.f64().map_err(|_| missing())?.into_iter().collect())
}

/// Same as [`float_column`] but every value must be present.
pub fn required_float_column(df: &DataFrame, name: &str, path: &Path) -> Result<Vec<f64>> {
    float_column(df, name, path)?
        .into_iter()
        .collect::<Option<Vec<f64>>>()
        .ok_or_else(|| Error::Column {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
}

/// Pull a string column out of a table.
pub fn str_column(df: &DataFrame, name: &str, path: &Path) -> Result<Vec<String>> {
    let missing = || Error::Column {
        path: path.to_path_buf(),
        column: name.to_string(),
    };
    let series = df
        .column(name)
        .map_err(|_| missing())?
        .as_materialized_series()
        .cast(&DataType::String)
        .map_err(|_| missing())?;
    Ok(series
        .str()
        .map_err(|_| missing())?
        .into_iter()
        .map(|s| s.unwrap_or_default().to_string())
        .collect())
}

/// Write a DataFrame to `file_path`, replacing its extension with the one of `file_type`.
///
/// Floating point columns of delimited outputs are written with two decimals.
pub fn write_df_to_file(
    df: &mut DataFrame,
    file_path: &Path,
    file_type: DataFrameFileType,
) -> Result<PathBuf> {
    let output_file = file_path.with_extension(file_type.to_string());
    let mut file = std::fs::File::create(&output_file)?;
    match file_type {
        DataFrameFileType::Tsv | DataFrameFileType::Csv => {
            let separator = match file_type {
                DataFrameFileType::Tsv => b'\t',
                _ => b',',
            };
            CsvWriter::new(&mut file)
                .include_header(true)
                .with_separator(separator)
                .with_float_precision(Some(2))
                .finish(df)?;
        }
        DataFrameFileType::Parquet => {
            ParquetWriter::new(&mut file).finish(df)?;
        }
        DataFrameFileType::Json => {
            JsonWriter::new(&mut file)
                .with_json_format(JsonFormat::Json)
                .finish(df)?;
        }
        DataFrameFileType::NDJson => {
            JsonWriter::new(&mut file)
                .with_json_format(JsonFormat::JsonLines)
                .finish(df)?;
        }
    }
    Ok(output_file)
}

/// File format for writing DataFrames.
#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum DataFrameFileType {
    /// Tab-separated values
    Tsv,
    /// Comma-separated values
    Csv,
    /// Parquet columnar storage
    Parquet,
    /// Standard JSON
    Json,
    /// Newline-delimited JSON
    NDJson,
}

impl DataFrameFileType {
    /// Format matching the extension of `path`, if it is one [`write_df_to_file`] produces.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
        match ext.as_str() {
            "tsv" => Some(DataFrameFileType::Tsv),
            "csv" => Some(DataFrameFileType::Csv),
            "parquet" => Some(DataFrameFileType::Parquet),
            "json" => Some(DataFrameFileType::Json),
            "ndjson" => Some(DataFrameFileType::NDJson),
            _ => None,
        }
    }
}

impl std::fmt::Display for DataFrameFileType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DataFrameFileType::Tsv => write!(f, "tsv"),
            DataFrameFileType::Csv => write!(f, "csv"),
            DataFrameFileType::Parquet => write!(f, "parquet"),
            DataFrameFileType::Json => write!(f, "json"),
            DataFrameFileType::NDJson => write!(f, "ndjson"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_ordering_of_model_names() {
        let mut names = vec![
            "protB/relaxed_model_10.pdb",
            "protB/relaxed_model_2.pdb",
            "protA/relaxed_model_1.pdb",
            "protB/relaxed_model_1.pdb",
        ];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(
            names,
            vec![
                "protA/relaxed_model_1.pdb",
                "protB/relaxed_model_1.pdb",
                "protB/relaxed_model_2.pdb",
                "protB/relaxed_model_10.pdb",
            ]
        );
    }

    #[test]
    fn natural_ordering_edge_cases() {
        assert_eq!(natural_cmp("a", "a"), Ordering::Equal);
        assert_eq!(natural_cmp("a", "ab"), Ordering::Less);
        assert_eq!(natural_cmp("x9", "x10"), Ordering::Less);
        assert_eq!(natural_cmp("x010", "x9"), Ordering::Greater);
        assert_eq!(natural_cmp("x01", "x1"), Ordering::Greater);
    }

    #[test]
    fn protein_names() {
        assert_eq!(
            protein_name_from_structure(Path::new("/data/complete/T1024/ranked_0.pdb")),
            "T1024"
        );
        assert_eq!(
            protein_name_from_table(Path::new("/data/complete/T1024/T1024_charge_values.tsv")),
            "T1024"
        );
        assert_eq!(protein_name_from_table(Path::new("plain.tsv")), "plain");
    }

    #[test]
    fn thread_count_defaults_to_half_the_cores() {
        assert!(get_num_threads(0) >= 1);
        assert_eq!(get_num_threads(3), 3);
    }

    #[test]
    fn tsv_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut df = df!(
            "pH" => [6.0, 7.0],
            "name" => ["a", "b"],
        )
        .unwrap();
        let written =
            write_df_to_file(&mut df, &dir.path().join("table"), DataFrameFileType::Tsv).unwrap();
        assert_eq!(written.extension().unwrap(), "tsv");

        let text = std::fs::read_to_string(&written).unwrap();
        assert!(text.starts_with("pH\tname\n6.00\ta\n"));

        let back = read_tsv(&written).unwrap();
        assert_eq!(
            required_float_column(&back, "pH", &written).unwrap(),
            vec![6.0, 7.0]
        );
        assert_eq!(str_column(&back, "name", &written).unwrap(), vec!["a", "b"]);
        assert!(matches!(
            float_column(&back, "missing", &written),
            Err(Error::Column { .. })
        ));
    }

    #[test]
    fn table_format_from_extension() {
        assert_eq!(
            DataFrameFileType::from_path(Path::new("ss_summary.parquet")),
            Some(DataFrameFileType::Parquet)
        );
        assert_eq!(
            DataFrameFileType::from_path(Path::new("a/ss_summary.CSV")),
            Some(DataFrameFileType::Csv)
        );
        assert_eq!(DataFrameFileType::from_path(Path::new("ss_summary")), None);
        assert_eq!(DataFrameFileType::from_path(Path::new("ss_summary.txt")), None);
    }

    #[test]
    fn every_output_format_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        for file_type in [
            DataFrameFileType::Tsv,
            DataFrameFileType::Csv,
            DataFrameFileType::Parquet,
            DataFrameFileType::Json,
            DataFrameFileType::NDJson,
        ] {
            let mut df = df!(
                "chain_length" => [120u32, 85],
                "energy" => [Some("-2716.089183"), None],
            )
            .unwrap();
            let written = write_df_to_file(&mut df, &dir.path().join("summary"), file_type).unwrap();

            let back = read_table(&written).unwrap();
            assert_eq!(
                required_float_column(&back, "chain_length", &written).unwrap(),
                vec![120.0, 85.0],
                "{file_type}"
            );
            assert_eq!(
                float_column(&back, "energy", &written).unwrap(),
                vec![Some(-2716.089183), None],
                "{file_type}"
            );
        }
    }

    #[test]
    fn empty_table_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "a,b\n").unwrap();
        assert!(matches!(read_table(&path), Err(Error::EmptyTable { .. })));
    }
}
