// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{ConfigFile, ProcessSpec, RawConfigFile, RawProcessSpec};
use crate::errors::{FleetError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::FleetError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let data_file = raw.backend_processes_data_file.ok_or_else(|| {
            FleetError::ConfigError(
                "configuration does not contain 'backend_processes_data_file' entry".to_string(),
            )
        })?;

        let processes = raw
            .backend_processes
            .iter()
            .map(extract_process_spec)
            .collect::<Result<Vec<_>>>()?;

        ensure_unique_names(&processes)?;

        Ok(ConfigFile::new_unchecked(data_file, processes))
    }
}

/// Check every mandatory field of one entry, in a fixed order, and build the
/// validated spec.
pub fn extract_process_spec(raw: &RawProcessSpec) -> Result<ProcessSpec> {
    let missing = |field: &'static str| FleetError::MissingField {
        field,
        entry: echo_entry(raw),
    };

    let name = raw.name.clone().ok_or_else(|| missing("name"))?;
    let path = raw.path.clone().ok_or_else(|| missing("path"))?;
    let port = raw.port.ok_or_else(|| missing("port"))?;
    let search_string = raw
        .search_string
        .clone()
        .ok_or_else(|| missing("search_string"))?;
    let arguments = raw.arguments.clone().ok_or_else(|| missing("arguments"))?;
    let log_file = raw.log_file.clone().ok_or_else(|| missing("log_file"))?;

    Ok(ProcessSpec {
        name,
        path,
        port,
        search_string,
        arguments,
        log_file,
    })
}

fn echo_entry(raw: &RawProcessSpec) -> String {
    serde_json::to_string(raw).unwrap_or_else(|_| format!("{raw:?}"))
}

fn ensure_unique_names(processes: &[ProcessSpec]) -> Result<()> {
    let mut seen = HashSet::new();
    for spec in processes {
        if !seen.insert(spec.name.as_str()) {
            return Err(FleetError::ConfigError(format!(
                "process name '{}' is declared more than once",
                spec.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_entry() -> RawProcessSpec {
        RawProcessSpec {
            name: Some("openocd".into()),
            path: Some("/usr/bin/openocd".into()),
            port: Some(3333),
            search_string: Some("openocd".into()),
            arguments: Some(vec!["-f".into(), "board.cfg".into()]),
            log_file: Some("openocd.log".into()),
        }
    }

    #[test]
    fn complete_entry_is_accepted() {
        let spec = extract_process_spec(&full_entry()).unwrap();
        assert_eq!(spec.name, "openocd");
        assert_eq!(spec.process_call(), "/usr/bin/openocd -f board.cfg");
    }

    #[test]
    fn missing_port_is_named_and_entry_echoed() {
        let mut raw = full_entry();
        raw.port = None;

        match extract_process_spec(&raw) {
            Err(FleetError::MissingField { field, entry }) => {
                assert_eq!(field, "port");
                assert!(entry.contains("openocd"));
            }
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn empty_argument_list_is_present() {
        let mut raw = full_entry();
        raw.arguments = Some(vec![]);
        let spec = extract_process_spec(&raw).unwrap();
        assert_eq!(spec.process_call(), "/usr/bin/openocd");
    }

    #[test]
    fn missing_data_file_key_is_rejected() {
        let raw = RawConfigFile {
            backend_processes_data_file: None,
            backend_processes: vec![full_entry()],
        };
        match ConfigFile::try_from(raw) {
            Err(FleetError::ConfigError(msg)) => {
                assert!(msg.contains("backend_processes_data_file"))
            }
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let raw = RawConfigFile {
            backend_processes_data_file: Some("procs.json".into()),
            backend_processes: vec![full_entry(), full_entry()],
        };
        assert!(matches!(
            ConfigFile::try_from(raw),
            Err(FleetError::ConfigError(_))
        ));
    }
}
