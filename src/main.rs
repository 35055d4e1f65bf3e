//! USD CLI - Tool for inspecting USDC files.

use std::env;
use std::sync::atomic::{AtomicU8, Ordering};

use usd::attr::PropertyKind;
use usd::prelude::{load_usdc_from_file, CrateReaderConfig, Prim, Stage};

/// Verbosity level (thread-safe)
const LOG_QUIET: u8 = 0;
const LOG_INFO: u8 = 1;
const LOG_DEBUG: u8 = 2;

static LOG_LEVEL: AtomicU8 = AtomicU8::new(LOG_INFO);

#[inline]
fn log_level() -> u8 {
    LOG_LEVEL.load(Ordering::Relaxed)
}

#[inline]
fn set_log_level(level: u8) {
    LOG_LEVEL.store(level, Ordering::Relaxed);
}

macro_rules! info {
    ($($arg:tt)*) => {
        if log_level() >= LOG_INFO {
            println!("{}", format!($($arg)*));
        }
    };
}

macro_rules! debug {
    ($($arg:tt)*) => {
        if log_level() >= LOG_DEBUG {
            println!("[DEBUG] {}", format!($($arg)*));
        }
    };
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => set_log_level(LOG_DEBUG),
            "-q" | "--quiet" => set_log_level(LOG_QUIET),
            _ => filtered_args.push(arg),
        }
    }

    if filtered_args.is_empty() {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    match filtered_args[0] {
        "info" if filtered_args.len() == 2 => cmd_info(filtered_args[1]),
        "tree" if filtered_args.len() == 2 => cmd_tree(filtered_args[1]),
        path if filtered_args.len() == 1 => cmd_tree(path),
        _ => {
            print_usage(&args[0]);
            std::process::exit(1);
        }
    }
}

fn print_usage(program: &str) {
    println!("Usage: {program} [-v|-q] [info|tree] <file.usdc>");
    println!();
    println!("Commands:");
    println!("  info <file>   Print stage metadata");
    println!("  tree <file>   Print the prim hierarchy (default)");
}

fn load(path: &str) -> Stage {
    let config = CrateReaderConfig::default();
    match load_usdc_from_file(path, &config) {
        Ok(stage) => stage,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

fn cmd_info(path: &str) {
    let stage = load(path);
    let metas = stage.metas();
    info!("upAxis:             {}", metas.up_axis.as_str());
    info!("metersPerUnit:      {}", metas.meters_per_unit);
    info!("timeCodesPerSecond: {}", metas.time_codes_per_second);
    info!("startTimeCode:      {}", metas.start_time_code);
    info!("endTimeCode:        {}", metas.end_time_code);
    if !metas.default_prim.is_empty() {
        info!("defaultPrim:        {}", metas.default_prim);
    }
    info!("root prims:         {}", stage.root_prims().len());
}

fn cmd_tree(path: &str) {
    let stage = load(path);
    for prim in stage.root_prims() {
        print_prim(prim, 0);
    }
}

fn print_prim(prim: &Prim, indent: usize) {
    let pad = "  ".repeat(indent);
    info!("{pad}{} \"{}\"", prim.type_name(), prim.name());
    for (name, prop) in prim.properties().iter() {
        let desc = match prop.kind() {
            PropertyKind::Attribute(attr) => format!("{} {}", attr.type_name(), name),
            PropertyKind::EmptyAttribute(ty) => format!("{ty} {name} (declared)"),
            PropertyKind::Connection(conn) => {
                format!("{} {name}.connect ({} targets)", conn.type_name, conn.targets().len())
            }
            PropertyKind::Relationship(rel) => {
                format!("rel {name} ({} targets)", rel.targets().len())
            }
            PropertyKind::NoTargetsRelationship => format!("rel {name}"),
        };
        debug!("{pad}  .{desc}");
    }
    for child in prim.children() {
        print_prim(child, indent + 1);
    }
}
