// wishcraft - type a few letters, get the command you meant
//
// Main entry point. Parses CLI args and dispatches to handlers. State lives
// in a JSON file between runs, so every command loads it, does its thing,
// and writes it back if anything changed.

use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing_subscriber::EnvFilter;
use wishcraft_lib::{
    context::PathRuleSpec,
    core::NavigationSink,
    store::WishRecord,
    EngineConfig, PathRule, RestoreMode, SnapshotFile, Wish, WishEngine, WishError,
};

const PATH_RULES_FILE: &str = "paths.json";

/// What `load` reads: wishes plus optional path rules
#[derive(Debug, Deserialize)]
struct WishFile {
    // checked one by one so a bad magic word is reported as such
    #[serde(default)]
    wishes: Vec<serde_json::Value>,
    #[serde(default)]
    path_rules: Vec<PathRuleSpec>,
}

/// Navigation wishes just print where they'd go
struct StdoutSink;

impl NavigationSink for StdoutSink {
    fn navigate(&self, target: &str, open_in_new_surface: bool) {
        if open_in_new_surface {
            println!("→ {} (new window)", target);
        } else {
            println!("→ {}", target);
        }
    }
}

/// Engine plus the files it was loaded from
struct Workspace {
    engine: WishEngine,
    state: SnapshotFile,
    rules_path: PathBuf,
}

impl Workspace {
    fn open(state_override: Option<String>, config_path: Option<String>) -> anyhow::Result<Self> {
        let state = match state_override.or_else(|| env::var("WISHCRAFT_STATE").ok()) {
            Some(path) => SnapshotFile::new(path),
            None => SnapshotFile::default_location()?,
        };
        let rules_path = state.path().with_file_name(PATH_RULES_FILE);

        let config = match config_path {
            Some(path) => EngineConfig::from_json_file(&path)
                .with_context(|| format!("failed to load config from {}", path))?,
            None => EngineConfig::default(),
        };

        let mut engine = WishEngine::with_config(config)?.with_navigation_sink(Rc::new(StdoutSink));
        if let Some(snapshot) = state.load()? {
            engine.restore(snapshot, RestoreMode::Replace);
        }
        engine.add_path_rules(load_path_rules(&rules_path)?);

        Ok(Self {
            engine,
            state,
            rules_path,
        })
    }

    fn save(&self) -> anyhow::Result<()> {
        if let Some(snapshot) = self.engine.snapshot() {
            self.state.save(&snapshot)?;
        }

        let specs: Vec<PathRuleSpec> = self
            .engine
            .path_rules()
            .iter()
            .map(PathRule::to_spec)
            .collect();
        let json = serde_json::to_string_pretty(&specs)?;
        std::fs::write(&self.rules_path, json)
            .with_context(|| format!("failed to write {}", self.rules_path.display()))?;
        Ok(())
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        match e.downcast_ref::<WishError>() {
            Some(wish_error) => eprintln!("✗ {}", wish_error.user_message()),
            None => eprintln!("✗ {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    // Grab whatever the user typed
    let mut args: Vec<String> = env::args().skip(1).collect();
    let state_override = take_option(&mut args, "--state");
    let config_path = take_option(&mut args, "--config");

    if args.is_empty() {
        print_usage();
        return Ok(());
    }

    let command = args[0].clone();
    let rest = &args[1..];

    match command.as_str() {
        "version" | "-v" | "--version" => {
            println!("wishcraft v{}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        "help" | "-h" | "--help" => {
            print_usage();
            return Ok(());
        }
        _ => {}
    }

    let mut workspace = Workspace::open(state_override, config_path)?;
    let changed = match command.as_str() {
        "load" => handle_load(&mut workspace.engine, rest)?,
        "query" => handle_query(&workspace.engine, rest),
        "make" => handle_make(&mut workspace.engine, rest),
        "context" => handle_context(&mut workspace.engine, rest),
        "path" => handle_path(&mut workspace.engine, rest),
        "list" => handle_list(&workspace.engine),
        "status" => handle_status(&workspace),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            false
        }
    };

    if changed {
        workspace.save()?;
    }
    Ok(())
}

fn handle_load(engine: &mut WishEngine, args: &[String]) -> anyhow::Result<bool> {
    let path = match args.first() {
        Some(path) => path,
        None => {
            eprintln!("Error: No wish file provided");
            return Ok(false);
        }
    };

    let raw = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?;
    let file: WishFile = serde_json::from_str(&raw).map_err(WishError::from)?;

    let rules = file
        .path_rules
        .into_iter()
        .map(PathRule::from_spec)
        .collect::<wishcraft_lib::Result<Vec<_>>>()?;
    let rule_count = rules.len();
    engine.add_path_rules(rules);

    let records = file
        .wishes
        .into_iter()
        .map(WishRecord::from_value)
        .collect::<wishcraft_lib::Result<Vec<_>>>()?;
    let wishes = engine.register_batch(records.into_iter().map(WishRecord::into_spec));
    let unmakeable = wishes.iter().filter(|w| !w.has_handler()).count();

    println!("✓ Loaded {} wish(es) and {} path rule(s)", wishes.len(), rule_count);
    if unmakeable > 0 {
        println!("  {} of them have no navigate target and can't be made", unmakeable);
    }
    Ok(true)
}

fn handle_query(engine: &WishEngine, args: &[String]) -> bool {
    let fragment = args.join(" ");
    let results = engine.query(Some(fragment.as_str()));

    if results.is_empty() {
        println!("No wishes matching '{}'", fragment);
    } else {
        println!("\nFound {} wish(es) matching '{}':", results.len(), fragment);
        println!("{}", "=".repeat(60));
        for (i, wish) in results.iter().enumerate() {
            print_wish(i + 1, wish);
        }
        println!("{}", "=".repeat(60));
    }
    false
}

fn handle_make(engine: &mut WishEngine, args: &[String]) -> bool {
    // Parse flags and keep the rest as the fragment
    let mut fragment_parts = Vec::new();
    let mut id: Option<String> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--id" => {
                i += 1;
                if i < args.len() {
                    id = Some(args[i].clone());
                }
            }
            arg => fragment_parts.push(arg.to_string()),
        }
        i += 1;
    }

    let fragment = fragment_parts.join(" ");
    let fragment = (!fragment.is_empty()).then_some(fragment.as_str());

    match engine.invoke(id.as_deref(), fragment) {
        Some(wish) => {
            println!(
                "✓ Made '{}' (made {} times)",
                primary_word(&wish),
                wish.usage.total
            );
            true
        }
        None => {
            println!("✗ Nothing to make for '{}'", fragment.unwrap_or_default());
            false
        }
    }
}

fn handle_context(engine: &mut WishEngine, args: &[String]) -> bool {
    let labels = args.get(1..).unwrap_or_default().to_vec();

    let (context, changed) = match args.first().map(String::as_str) {
        None => (engine.context(), false),
        Some("set") => (engine.set_context(labels), true),
        Some("add") => (engine.add_context(labels), true),
        Some("remove") => (engine.remove_context(labels), true),
        Some("revert") => (engine.revert_context(), true),
        Some("reset") => (engine.reset_context_to_default(), true),
        Some(other) => {
            eprintln!("Unknown context action: {}", other);
            eprintln!("Expected one of: set, add, remove, revert, reset");
            return false;
        }
    };

    println!("Context: {}", context.join(", "));
    changed
}

fn handle_path(engine: &mut WishEngine, args: &[String]) -> bool {
    let keep = args.iter().any(|arg| arg == "--keep");
    let path = match args.iter().find(|arg| !arg.starts_with("--")) {
        Some(path) => path,
        None => {
            eprintln!("Error: No path provided");
            return false;
        }
    };

    let before = engine.wishes_in_context(None).len();
    let context = engine.resolve_path_context(path, keep);
    let dropped = before - engine.wishes_in_context(None).len();

    println!("Context: {}", context.join(", "));
    if dropped > 0 {
        println!("  deregistered {} wish(es) scoped to labels that went away", dropped);
    }
    true
}

fn handle_list(engine: &WishEngine) -> bool {
    let wishes = engine.wishes_in_context(None);
    let active = engine.context();
    let visible: Vec<String> = engine
        .wishes_in_context(Some(active.as_slice()))
        .into_iter()
        .map(|wish| wish.id)
        .collect();

    if wishes.is_empty() {
        println!("No wishes registered. Try: wishcraft load wishes.json");
        return false;
    }

    println!("\nRegistered wishes:");
    println!("{}", "=".repeat(60));
    for (i, wish) in wishes.iter().enumerate() {
        let marker = if visible.contains(&wish.id) { " " } else { "·" };
        print!("{}", marker);
        print_wish(i + 1, wish);
    }
    println!("{}", "=".repeat(60));
    println!("· = not visible in the current context");
    false
}

fn handle_status(workspace: &Workspace) -> bool {
    let engine = &workspace.engine;
    let snapshot = engine.snapshot().unwrap_or_default();

    println!("\nwishcraft Status");
    println!("{}", "=".repeat(60));
    println!("  State file:  {}", workspace.state.path().display());
    println!("  Enabled:     {}", engine.is_enabled());
    println!("  Wishes:      {}", snapshot.wishes.len());
    println!("  Fragments:   {}", snapshot.recency.len());
    println!("  Path rules:  {}", engine.path_rules().len());
    println!("  Context:     {}", snapshot.context.join(", "));
    println!("{}", "=".repeat(60));
    false
}

fn print_wish(position: usize, wish: &Wish) {
    let target = wish
        .handler
        .as_ref()
        .and_then(|handler| handler.navigation_target())
        .map(|nav| format!(" → {}", nav.target))
        .unwrap_or_default();
    println!(
        "{:3}. {} [{}]{} (made {} times)",
        position,
        primary_word(wish),
        wish.id,
        target,
        wish.usage.total
    );
}

fn primary_word(wish: &Wish) -> &str {
    wish.primary_magic_word()
        .map(|word| word.as_str())
        .unwrap_or("<no magic words>")
}

/// Pull `--flag value` out of the argument list
fn take_option(args: &mut Vec<String>, flag: &str) -> Option<String> {
    let index = args.iter().position(|arg| arg == flag)?;
    args.remove(index);
    if index < args.len() {
        Some(args.remove(index))
    } else {
        None
    }
}

fn load_path_rules(path: &Path) -> anyhow::Result<Vec<PathRule>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let specs: Vec<PathRuleSpec> = serde_json::from_str(&raw).map_err(WishError::from)?;
    let rules = specs
        .into_iter()
        .map(PathRule::from_spec)
        .collect::<wishcraft_lib::Result<Vec<_>>>()?;
    Ok(rules)
}

fn print_usage() {
    println!(
        r#"wishcraft v{} - type a few letters, get the command you meant

USAGE:
    wishcraft [--state FILE] [--config FILE] <COMMAND> [OPTIONS]

COMMANDS:
    load <wishes.json>         Register wishes (and path rules) from a file
    query <fragment>           Show matching wishes, best first
    make <fragment> [--id ID]  Make the best match (or the wish with ID)
    context [ACTION] [labels]  Show or change the context
                               ACTION: set | add | remove | revert | reset
    path <path> [--keep]       Move the context to match a path
                               (--keep: don't deregister wishes)
    list                       Show every registered wish
    status                     Show state file and counts
    version                    Show version
    help                       Show this help

EXAMPLES:
    wishcraft load wishes.json
    wishcraft query set
    wishcraft make set
    wishcraft context add editor
    wishcraft path /users/42

STATE:
    Kept in ~/.wishcraft/state.json unless --state or WISHCRAFT_STATE
    says otherwise. Set RUST_LOG=debug to see what the engine is doing.
"#,
        env!("CARGO_PKG_VERSION")
    );
}
