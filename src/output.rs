// Export helpers shared by every subcommand: CSV/JSON/text writers plus the
// console preview tables. All artifact paths are built by the caller; this
// module only promises the bytes land or the error says which file failed.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("não foi possível criar o diretório de saída `{path}`: {source}")]
    CreateDir { path: PathBuf, source: std::io::Error },
    #[error("não foi possível escrever `{path}`: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("não foi possível escrever `{path}`: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("não foi possível serializar `{path}`: {source}")]
    Json { path: PathBuf, source: serde_json::Error },
}

/// Create the output directory (and parents) before the first artifact lands.
pub fn ensure_dir(path: &Path) -> Result<(), OutputError> {
    fs::create_dir_all(path)
        .map_err(|source| OutputError::CreateDir { path: path.to_path_buf(), source })
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), OutputError> {
    let csv_error = |source: csv::Error| OutputError::Csv { path: path.to_path_buf(), source };
    let mut wtr = csv::Writer::from_path(path).map_err(csv_error)?;
    for row in rows {
        wtr.serialize(row).map_err(csv_error)?;
    }
    wtr.flush().map_err(|source| OutputError::Io { path: path.to_path_buf(), source })
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), OutputError> {
    let s = serde_json::to_string_pretty(value)
        .map_err(|source| OutputError::Json { path: path.to_path_buf(), source })?;
    fs::write(path, s).map_err(|source| OutputError::Io { path: path.to_path_buf(), source })
}

pub fn write_text(path: &Path, content: &str) -> Result<(), OutputError> {
    fs::write(path, content)
        .map_err(|source| OutputError::Io { path: path.to_path_buf(), source })
}

/// Console preview: a titled markdown table capped at `max_rows`.
pub fn preview_table<T>(title: &str, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("\n{title}");
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(sem linhas)\n");
        return;
    }
    let table = Table::new(slice).with(Style::markdown()).to_string();
    println!("{table}\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Serialize)]
    struct Linha {
        nome: String,
        qtd: usize,
    }

    #[test]
    fn csv_writer_emits_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("saida.csv");
        let rows = vec![
            Linha { nome: "Pintura".to_string(), qtd: 3 },
            Linha { nome: "Laudos".to_string(), qtd: 1 },
        ];
        write_csv(&path, &rows).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "nome,qtd\nPintura,3\nLaudos,1\n");
    }

    #[test]
    fn json_writer_pretty_prints() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("resumo.json");
        write_json(&path, &Linha { nome: "Pintura".to_string(), qtd: 3 }).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"nome\": \"Pintura\""));
        assert!(content.contains("\"qtd\": 3"));
    }

    #[test]
    fn text_writer_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lista.txt");
        write_text(&path, "Pintura Externa\nLaudo AVCB\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "Pintura Externa\nLaudo AVCB\n");
    }

    #[test]
    fn ensure_dir_creates_nested_directories() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
        // A second call on an existing directory is a no-op.
        ensure_dir(&nested).unwrap();
    }

    #[test]
    fn writing_into_a_missing_directory_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nao_existe").join("saida.csv");
        let err = write_csv(&path, &[Linha { nome: "x".to_string(), qtd: 0 }]).unwrap_err();
        assert!(matches!(err, OutputError::Csv { .. }));
        assert!(err.to_string().contains("saida.csv"));
    }
}
