//! Structured fast-path for the tool registry CLI.
//!
//! Instead of inferring structure from help text, the registry's own
//! listing commands are called and their output parsed. Each listing is
//! isolated: a failed call degrades to an empty list and never affects the
//! others.

pub mod parse;

use std::time::Duration;

use climb_core::{RegistryGroup, RegistryPrompt, RegistryServer, RegistryTool, ToolSchema};
use tracing::{debug, warn};

use crate::config::{DEFAULT_REGISTRY_URL, DiscoverConfig};
use crate::error::ProcessError;
use crate::executor::{ExecOptions, ProcessRunner};
use crate::render::Report;

/// Resource counts shown in the overview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overview {
    pub servers: usize,
    pub tools: usize,
    pub groups: usize,
    pub prompts: usize,
}

impl Overview {
    /// Overview leaves in display order.
    pub fn leaves(&self) -> [String; 4] {
        [
            format!("servers [n={}]", self.servers),
            format!("tools [n={}]", self.tools),
            format!("groups [n={}]", self.groups),
            format!("prompts [n={}]", self.prompts),
        ]
    }
}

/// Calls the registry CLI through a [`ProcessRunner`].
pub struct RegistryClient<'a> {
    runner: &'a dyn ProcessRunner,
    program: String,
    extra_args: Vec<String>,
    listing_timeout: Duration,
    usage_timeout: Duration,
}

impl<'a> RegistryClient<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, config: &DiscoverConfig) -> Self {
        // The CLI already defaults to the local registry.
        let extra_args = if config.registry_url != DEFAULT_REGISTRY_URL {
            vec!["--registry".to_string(), config.registry_url.clone()]
        } else {
            Vec::new()
        };
        Self {
            runner,
            program: config.registry_program.clone(),
            extra_args,
            listing_timeout: config.listing_timeout(),
            usage_timeout: config.usage_timeout(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn call(&self, args: &[&str], timeout: Duration) -> Result<String, ProcessError> {
        let argv: Vec<String> = args
            .iter()
            .map(|arg| arg.to_string())
            .chain(self.extra_args.iter().cloned())
            .collect();
        let output = self
            .runner
            .execute(&self.program, &argv, &ExecOptions::strict(timeout))?;
        Ok(output.stdout)
    }

    /// Runs `list <kind>` and parses it, or returns an empty list.
    fn listing<T>(&self, kind: &str, parse: fn(&str) -> Vec<T>) -> Vec<T> {
        match self.call(&["list", kind], self.listing_timeout) {
            Ok(stdout) => {
                let records = parse(&stdout);
                debug!(kind, count = records.len(), "Registry listing parsed");
                records
            }
            Err(err) => {
                warn!(kind, error = %err, "Registry listing failed");
                Vec::new()
            }
        }
    }

    pub fn servers(&self) -> Vec<RegistryServer> {
        self.listing("servers", parse::parse_servers)
    }

    pub fn tools(&self) -> Vec<RegistryTool> {
        self.listing("tools", parse::parse_tools)
    }

    pub fn groups(&self) -> Vec<RegistryGroup> {
        self.listing("groups", parse::parse_groups)
    }

    pub fn prompts(&self) -> Vec<RegistryPrompt> {
        self.listing("prompts", parse::parse_prompts)
    }

    /// Issues the four listings concurrently and counts the results.
    pub fn overview(&self) -> Overview {
        let ((servers, tools), (groups, prompts)) = rayon::join(
            || rayon::join(|| self.servers().len(), || self.tools().len()),
            || rayon::join(|| self.groups().len(), || self.prompts().len()),
        );
        Overview {
            servers,
            tools,
            groups,
            prompts,
        }
    }

    /// Input schema for `tool`, or `None` when it cannot be determined.
    pub fn tool_schema(&self, tool: &str) -> Option<ToolSchema> {
        match self.call(&["usage", tool], self.usage_timeout) {
            Ok(stdout) => {
                let schema = parse::parse_tool_schema(&stdout);
                if schema.is_none() {
                    debug!(tool, "Tool usage carried no schema");
                }
                schema
            }
            Err(err) => {
                warn!(tool, error = %err, "Tool usage lookup failed");
                None
            }
        }
    }

    /// Renders the registry view for `path`.
    pub fn discover(&self, path: &[String]) -> Report {
        let head = path.first().map(String::as_str);
        match head {
            Some("servers") => {
                let items: Vec<String> = self
                    .servers()
                    .iter()
                    .map(|server| format!("{} {}", server.name, on_off(server.enabled)))
                    .collect();
                self.list_report("servers", &items)
            }
            Some("tools") => {
                let items: Vec<String> = self
                    .tools()
                    .iter()
                    .map(|tool| format!("{} {}", tool.canonical_name, on_off(tool.enabled)))
                    .collect();
                self.list_report("tools", &items)
            }
            Some("groups") => {
                let items: Vec<String> = self.groups().into_iter().map(|group| group.name).collect();
                self.list_report("groups", &items)
            }
            Some("prompts") => {
                let items: Vec<String> = self
                    .prompts()
                    .into_iter()
                    .map(|prompt| prompt.canonical_name)
                    .collect();
                self.list_report("prompts", &items)
            }
            Some("tool") => match path.get(1) {
                Some(tool) => self.tool_report(tool),
                None => {
                    let mut report = Report::titled(&self.program);
                    report.tree(&["tool <name>"], 1);
                    report
                }
            },
            _ => {
                let mut report = Report::titled(&self.program);
                report.tree(&self.overview().leaves(), 1);
                report
            }
        }
    }

    fn list_report(&self, label: &str, items: &[String]) -> Report {
        let mut report = Report::titled(&self.program);
        report.list(label, items);
        report
    }

    fn tool_report(&self, tool: &str) -> Report {
        let schema = self.tool_schema(tool);
        let (required, optional) = match &schema {
            Some(schema) => (
                schema.required.join(","),
                schema.optional_parameters().join(","),
            ),
            None => (String::new(), String::new()),
        };
        let mut report = Report::titled(tool);
        report.tree(
            &[
                format!("req: {}", or_dash(&required)),
                format!("opt: {}", or_dash(&optional)),
            ],
            1,
        );
        report
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "[on]" } else { "[off]" }
}

fn or_dash(joined: &str) -> &str {
    if joined.is_empty() { "-" } else { joined }
}
