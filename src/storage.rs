//! Reading and writing templates, profiles, instances, and reports.
//!
//! Inputs are JSON, or YAML when the file extension is `.yaml` or `.yml`.
//! Outputs are always JSON, except for the CSV report table.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    domain::{Instance, Profile, Template},
    report::Report,
};

/// Errors that can occur while loading an input file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be opened or read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// The file is not valid JSON for the expected shape.
    #[error("failed to parse JSON in {}: {source}", path.display())]
    Json {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        source: serde_json::Error,
    },

    /// The file is not valid YAML for the expected shape.
    #[error("failed to parse YAML in {}: {source}", path.display())]
    Yaml {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        source: serde_yaml::Error,
    },
}

/// Errors that can occur while writing an output file.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The file could not be created or written.
    #[error("failed to write {}: {source}", path.display())]
    Io {
        /// The file being written.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// JSON serialization failed.
    #[error("failed to serialize {}: {source}", path.display())]
    Json {
        /// The file being written.
        path: PathBuf,
        /// The underlying error.
        source: serde_json::Error,
    },

    /// CSV serialization failed.
    #[error("failed to write CSV to {}: {source}", path.display())]
    Csv {
        /// The file being written.
        path: PathBuf,
        /// The underlying error.
        source: csv::Error,
    },
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    if is_yaml(path) {
        serde_yaml::from_reader(reader).map_err(|source| LoadError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_json::from_reader(reader).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Load a requirement template library.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a template.
pub fn load_template(path: &Path) -> Result<Template, LoadError> {
    let template: Template = load(path)?;
    tracing::debug!(
        path = %path.display(),
        template = %template.template_id,
        requirements = template.requirements().count(),
        "loaded template"
    );
    Ok(template)
}

/// Load a component profile.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a flat map of
/// scalar values.
pub fn load_profile(path: &Path) -> Result<Profile, LoadError> {
    load(path)
}

/// Load a previously generated instance.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not an instance.
pub fn load_instance(path: &Path) -> Result<Instance, LoadError> {
    load(path)
}

/// Load any document in its untyped form.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_document(path: &Path) -> Result<serde_json::Value, LoadError> {
    load(path)
}

fn create(path: &Path) -> Result<BufWriter<File>, ExportError> {
    let io_error = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    File::create(path).map(BufWriter::new).map_err(io_error)
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), ExportError> {
    let mut writer = create(path)?;
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| ExportError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer
        .write_all(b"\n")
        .and_then(|()| writer.flush())
        .map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Write an instance as pretty-printed JSON.
///
/// Parent directories are created automatically if they don't exist.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_instance(instance: &Instance, path: &Path) -> Result<(), ExportError> {
    write_json(instance, path)
}

/// Write a report as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_report_json(report: &Report, path: &Path) -> Result<(), ExportError> {
    write_json(report, path)
}

/// Write a report's grouped table as CSV.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_report_csv(report: &Report, path: &Path) -> Result<(), ExportError> {
    let writer = create(path)?;
    report.write_csv(writer).map_err(|source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    })
}
