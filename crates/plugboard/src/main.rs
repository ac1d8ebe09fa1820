mod cli;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use plugboard_core::event::{sync_event_handler, EventPayload, EventResult, TopicPattern};
use plugboard_core::kernel::bootstrap::Application;
use plugboard_core::kernel::constants;

use cli::{find_builtin, options_for, BuiltinPlugin, OptionOverride, BUILTIN_PLUGINS};

/// Plugboard: plug named plugins into an application and watch their lifecycle
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Print "pong" and exit
    #[arg(long)]
    ping: bool,

    /// Configuration file (.json, .yaml/.yml or .toml) seeding plugin options
    #[arg(short, long, env = constants::CONFIG_ENV_VAR, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Inspect built-in plugins
    Plugin {
        #[command(subcommand)]
        command: PluginCommand,
    },
    /// Plug built-in plugins, report their lifecycle events, then shut down
    Run {
        /// Plugin to plug (repeatable); all built-in plugins when omitted
        #[arg(long = "plugin", value_name = "NAME")]
        plugins: Vec<String>,
        /// Option passed to a plugin at plug time (repeatable)
        #[arg(long = "set", value_name = "NAME.KEY=VALUE")]
        set: Vec<OptionOverride>,
    },
}

#[derive(Subcommand, Debug)]
enum PluginCommand {
    /// List built-in plugins
    List {},
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    if args.ping {
        println!("pong");
        return ExitCode::SUCCESS;
    }

    let app = match &args.config {
        Some(path) => match Application::from_config_file(path) {
            Ok(app) => app,
            Err(e) => {
                eprintln!("Failed to load configuration from {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => Application::default(),
    };

    match args.command {
        Some(Commands::Plugin {
            command: PluginCommand::List {},
        }) => {
            list_plugins(&app).await;
            ExitCode::SUCCESS
        }
        Some(Commands::Run { plugins, set }) => run(&app, &plugins, &set).await,
        None => {
            println!("{} v{}", constants::APP_NAME, constants::APP_VERSION);
            println!("No command specified, try --help.");
            ExitCode::SUCCESS
        }
    }
}

async fn list_plugins(app: &Application) {
    println!("Built-in plugins:");
    for plugin in BUILTIN_PLUGINS {
        let configured = if app.options(plugin.name).await.is_some() {
            " (configured)"
        } else {
            ""
        };
        println!("  - {}: {}{}", plugin.name, plugin.description, configured);
    }
}

async fn run(app: &Application, requested: &[String], overrides: &[OptionOverride]) -> ExitCode {
    let selected: Vec<&'static BuiltinPlugin> = if requested.is_empty() {
        BUILTIN_PLUGINS.iter().collect()
    } else {
        let mut selected = Vec::with_capacity(requested.len());
        for name in requested {
            match find_builtin(name) {
                Some(plugin) => selected.push(plugin),
                None => {
                    eprintln!("Unknown plugin '{}'", name);
                    return ExitCode::FAILURE;
                }
            }
        }
        selected
    };
    if let Some(unknown) = overrides.iter().find(|o| find_builtin(&o.plugin).is_none()) {
        eprintln!("Unknown plugin '{}' in --set", unknown.plugin);
        return ExitCode::FAILURE;
    }

    let failed = Arc::new(AtomicBool::new(false));
    let failed_clone = Arc::clone(&failed);
    app.events()
        .subscribe(
            TopicPattern::all_plugins(),
            sync_event_handler(move |event| {
                match &event.payload {
                    EventPayload::Error(e) => {
                        failed_clone.store(true, Ordering::SeqCst);
                        println!("error {}: {}", event.topic, e);
                    }
                    _ => println!("event {}", event.topic),
                }
                EventResult::Continue
            }),
        )
        .await;

    for plugin in selected {
        log::debug!("Plugging built-in plugin '{}'", plugin.name);
        if let Err(e) = app
            .plug_shared(plugin.create(), options_for(overrides, plugin.name))
            .await
        {
            log::debug!("Plugging '{}' failed: {}", plugin.name, e);
        }
    }
    let errors = app.shutdown().await;
    log::info!("Shut down with {} error(s) during unplug", errors.len());

    if failed.load(Ordering::SeqCst) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
