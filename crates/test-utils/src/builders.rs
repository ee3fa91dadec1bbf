#![allow(dead_code)]

use std::path::Path;

use procfleet::config::{ConfigFile, RawConfigFile, RawProcessSpec};
use procfleet::store::{ProcessRecord, RecordStatus};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                backend_processes_data_file: Some("backend_processes.json".to_string()),
                backend_processes: Vec::new(),
            },
        }
    }

    pub fn with_data_file(mut self, name: &str) -> Self {
        self.config.backend_processes_data_file = Some(name.to_string());
        self
    }

    pub fn with_process(mut self, process: RawProcessSpec) -> Self {
        self.config.backend_processes.push(process);
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    /// Validated config rooted at `base_dir`.
    pub fn build_in(self, base_dir: impl AsRef<Path>) -> ConfigFile {
        ConfigFile::try_from(self.config)
            .expect("Failed to build valid config from builder")
            .with_base_dir(base_dir.as_ref())
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for one `backend_processes` entry, complete by default.
pub struct ProcessSpecBuilder {
    spec: RawProcessSpec,
}

impl ProcessSpecBuilder {
    pub fn new(name: &str, port: u16) -> Self {
        Self {
            spec: RawProcessSpec {
                name: Some(name.to_string()),
                path: Some(format!("/opt/backend/{name}")),
                port: Some(port),
                search_string: Some(name.to_string()),
                arguments: Some(vec![]),
                log_file: Some(format!("{name}.log")),
            },
        }
    }

    pub fn path(mut self, path: &str) -> Self {
        self.spec.path = Some(path.to_string());
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.spec
            .arguments
            .get_or_insert_with(Vec::new)
            .push(arg.to_string());
        self
    }

    /// Drop one of the six mandatory fields by name.
    pub fn without(mut self, field: &str) -> Self {
        match field {
            "name" => self.spec.name = None,
            "path" => self.spec.path = None,
            "port" => self.spec.port = None,
            "search_string" => self.spec.search_string = None,
            "arguments" => self.spec.arguments = None,
            "log_file" => self.spec.log_file = None,
            other => panic!("unknown field {other}"),
        }
        self
    }

    pub fn build(self) -> RawProcessSpec {
        self.spec
    }
}

/// A record as it would look after a successful launch.
pub fn running_record(name: &str, pid: u32) -> ProcessRecord {
    ProcessRecord {
        name: name.to_string(),
        pid,
        log_file: format!("{name}.log"),
        process_call: format!("/opt/backend/{name}"),
        start_time: "09:30:00.000".to_string(),
        port: 4000,
        search_string: name.to_string(),
        status: RecordStatus::Running,
        sigterm_time: None,
        sigkill_time: None,
        note: None,
    }
}
