//! Command-line interface implementation

use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::arena::NodeArena;
use crate::config::{load_config, merge_cli_overrides, CliOverrides, ConfigError, VgraphConfig};
use crate::context::{Landscape, ResolverContext};
use crate::host::{FixedHost, RealPolicy};
use crate::models::{Node, NodeId};
use crate::parser::{build_arena_with_limit, parse_stream, GraphError};
use crate::resolve::{Resolution, Resolver};

const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_INVALID_ARGS: u8 = 2;

/// vgraph - Resolve sprite-variant node graphs
#[derive(Parser)]
#[command(name = "vgraph")]
#[command(about = "vgraph - Resolve sprite-variant node graphs from JSON5 snapshots")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to vgraph.toml (default: discovered from the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a node of a graph snapshot and report the outcome
    Resolve {
        /// Graph snapshot (JSON5 / JSONL node records)
        graph: PathBuf,

        /// Node to start from (record number)
        #[arg(long)]
        root: u32,

        /// Host variable as ID=VALUE or ID:PARAM=VALUE (hex with 0x allowed)
        #[arg(long = "var", value_parser = parse_var)]
        vars: Vec<VarArg>,

        /// Random bits of the object
        #[arg(long, default_value = "0", value_parser = parse_u32)]
        random: u32,

        /// Random bits of the parent object (default: same as --random)
        #[arg(long, value_parser = parse_u32)]
        parent_random: Option<u32>,

        /// Triggers already waiting on the object
        #[arg(long, default_value = "0", value_parser = parse_u8)]
        waiting: u8,

        /// Trigger bits active for this resolution
        #[arg(long, default_value = "0", value_parser = parse_u8)]
        trigger: u8,

        /// Callback being answered
        #[arg(long, default_value = "0", value_parser = parse_u16)]
        callback: u16,

        /// First callback parameter
        #[arg(long, default_value = "0", value_parser = parse_u32)]
        param1: u32,

        /// Second callback parameter
        #[arg(long, default_value = "0", value_parser = parse_u32)]
        param2: u32,

        /// Initial accumulator
        #[arg(long, default_value = "0", value_parser = parse_u32)]
        last_value: u32,

        /// Resolve real nodes to their loading results instead of loaded ones
        #[arg(long)]
        loading: bool,

        /// Override the recursion ceiling
        #[arg(long)]
        max_depth: Option<usize>,

        /// Override the landscape (temperate, arctic, tropic, toyland)
        #[arg(long, value_parser = parse_landscape)]
        landscape: Option<Landscape>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a graph snapshot and summarize its nodes
    Check {
        /// Graph snapshot (JSON5 / JSONL node records)
        graph: PathBuf,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

/// A `--var` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarArg {
    pub variable: u8,
    pub parameter: Option<u8>,
    pub value: u32,
}

/// Parse a decimal, `0x` hex or `0b` binary number.
pub fn parse_u32(s: &str) -> Result<u32, String> {
    let s = s.trim();
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else if let Some(bin) = s.strip_prefix("0b") {
        u32::from_str_radix(bin, 2)
    } else {
        s.parse()
    };
    parsed.map_err(|e| format!("invalid number '{}': {}", s, e))
}

fn parse_u16(s: &str) -> Result<u16, String> {
    let value = parse_u32(s)?;
    u16::try_from(value).map_err(|_| format!("'{}' does not fit in 16 bits", s))
}

fn parse_u8(s: &str) -> Result<u8, String> {
    let value = parse_u32(s)?;
    u8::try_from(value).map_err(|_| format!("'{}' does not fit in 8 bits", s))
}

/// Parse `ID=VALUE` or `ID:PARAM=VALUE`.
pub fn parse_var(s: &str) -> Result<VarArg, String> {
    let (key, value) =
        s.split_once('=').ok_or_else(|| format!("expected ID=VALUE, got '{}'", s))?;
    let (variable, parameter) = match key.split_once(':') {
        Some((variable, parameter)) => (parse_u8(variable)?, Some(parse_u8(parameter)?)),
        None => (parse_u8(key)?, None),
    };
    Ok(VarArg { variable, parameter, value: parse_u32(value)? })
}

fn parse_landscape(s: &str) -> Result<Landscape, String> {
    match s.to_ascii_lowercase().as_str() {
        "temperate" => Ok(Landscape::Temperate),
        "arctic" => Ok(Landscape::Arctic),
        "tropic" => Ok(Landscape::Tropic),
        "toyland" => Ok(Landscape::Toyland),
        other => Err(format!("unknown landscape '{}'", other)),
    }
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Resolve {
            graph,
            root,
            vars,
            random,
            parent_random,
            waiting,
            trigger,
            callback,
            param1,
            param2,
            last_value,
            loading,
            max_depth,
            landscape,
            json,
        } => {
            let overrides = CliOverrides { max_depth, landscape, ..Default::default() };
            let config = match resolve_config(cli.config.as_deref(), &overrides) {
                Ok(config) => config,
                Err(code) => return code,
            };

            let mut host = FixedHost::new()
                .with_random_bits(random)
                .with_waiting_triggers(waiting)
                .with_real_policy(if loading { RealPolicy::Loading } else { RealPolicy::Loaded });
            if let Some(bits) = parent_random {
                host = host.with_parent_random_bits(bits);
            }
            for var in &vars {
                host.set_variable(None, var.variable, var.parameter, var.value);
            }

            let ctx = ResolverContext::new(config.globals)
                .with_callback(callback, param1, param2)
                .with_trigger(trigger)
                .with_last_value(last_value);

            run_resolve(&graph, NodeId(root), &config, ctx, host, json)
        }
        Commands::Check { graph, json } => {
            let config = match resolve_config(cli.config.as_deref(), &CliOverrides::default()) {
                Ok(config) => config,
                Err(code) => return code,
            };
            run_check(&graph, &config, json)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn resolve_config(path: Option<&Path>, overrides: &CliOverrides) -> Result<VgraphConfig, ExitCode> {
    let mut config = match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Err(ExitCode::from(EXIT_INVALID_ARGS));
        }
    };

    merge_cli_overrides(&mut config, overrides);
    let errors = config.validate();
    if !errors.is_empty() {
        let e = ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect());
        eprintln!("Error: {}", e);
        return Err(ExitCode::from(EXIT_INVALID_ARGS));
    }

    Ok(config)
}

/// Read, parse and build a graph snapshot. Errors are reported on stderr.
fn load_graph(path: &Path, max_blocks: usize) -> Result<NodeArena, ExitCode> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: Cannot open graph file '{}': {}", path.display(), e);
            return Err(ExitCode::from(EXIT_INVALID_ARGS));
        }
    };

    let parse_result = parse_stream(BufReader::new(file));
    if !parse_result.warnings.is_empty() {
        for warning in &parse_result.warnings {
            eprintln!("Error: line {}: {}", warning.line, warning.message);
        }
        return Err(ExitCode::from(EXIT_ERROR));
    }

    match build_arena_with_limit(parse_result.nodes, max_blocks) {
        Ok(arena) => Ok(arena),
        Err(GraphError::DanglingLinks(links)) => {
            for link in &links {
                eprintln!("Error: node {} refers to unknown node {}", link.from, link.to);
            }
            Err(ExitCode::from(EXIT_ERROR))
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Err(ExitCode::from(EXIT_ERROR))
        }
    }
}

/// Execute the resolve command
fn run_resolve(
    graph: &Path,
    root: NodeId,
    config: &VgraphConfig,
    mut ctx: ResolverContext,
    mut host: FixedHost,
    json: bool,
) -> ExitCode {
    let arena = match load_graph(graph, config.resolver.max_blocks) {
        Ok(arena) => arena,
        Err(code) => return code,
    };

    if arena.get(root).is_none() {
        eprintln!("Error: Root node {} not found ({} nodes in graph)", root, arena.len());
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let resolver = Resolver::new(&arena).with_max_depth(config.resolver.max_depth);
    let resolution = match resolver.resolve(Some(root), &mut ctx, &mut host) {
        Ok(resolution) => resolution,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if json {
        let result = match resolution {
            None => serde_json::Value::Null,
            Some(Resolution::Callback(result)) => {
                serde_json::json!({ "type": "callback", "result": result })
            }
            Some(Resolution::Node(id)) => {
                serde_json::json!({ "type": "node", "id": id, "node": arena.get(id) })
            }
        };
        let output = serde_json::json!({
            "root": root,
            "result": result,
            "last_value": ctx.last_value,
            "reseed": ctx.reseed,
            "waiting_triggers": host.waiting_triggers(),
        });
        println!("{}", output);
    } else {
        println!("{} -> {}", root, describe_resolution(&arena, resolution));
        println!("last_value: {} (0x{:08X})", ctx.last_value, ctx.last_value);
        println!("reseed: 0x{:08X}", ctx.reseed);
        println!("waiting_triggers: 0x{:02X}", host.waiting_triggers());
    }

    ExitCode::from(EXIT_SUCCESS)
}

fn describe_resolution(arena: &NodeArena, resolution: Option<Resolution>) -> String {
    match resolution {
        None => "null".to_string(),
        Some(Resolution::Callback(result)) => format!("callback 0x{:04X} (computed)", result),
        Some(Resolution::Node(id)) => match arena.get(id) {
            Some(Node::Callback(callback)) => format!("{} callback 0x{:04X}", id, callback.result),
            Some(Node::Result(result)) => {
                let end = result.sprite.saturating_add(u32::from(result.count));
                format!("{} sprites {}..{}", id, result.sprite, end)
            }
            Some(node) => format!("{} {}", id, node.kind_name()),
            None => format!("{} (missing)", id),
        },
    }
}

/// Execute the check command
fn run_check(graph: &Path, config: &VgraphConfig, json: bool) -> ExitCode {
    let arena = match load_graph(graph, config.resolver.max_blocks) {
        Ok(arena) => arena,
        Err(code) => return code,
    };

    let mut kinds: BTreeMap<&'static str, usize> = BTreeMap::new();
    for (_, node) in arena.iter() {
        *kinds.entry(node.kind_name()).or_default() += 1;
    }

    if json {
        let output = serde_json::json!({
            "nodes": arena.len(),
            "blocks": arena.block_count(),
            "kinds": kinds,
        });
        println!("{}", output);
    } else {
        println!("{}: {} nodes in {} blocks", graph.display(), arena.len(), arena.block_count());
        for (kind, count) in &kinds {
            println!("  {}: {}", kind, count);
        }
    }

    ExitCode::from(EXIT_SUCCESS)
}
