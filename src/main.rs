//! actionmap - Input Action Monitor
//!
//! Shows the current hotkey bindings and every action fired, frame by frame.

use actionmap::config::{default_keymap_path, parse_binding, SettingsStore};
use actionmap::input::RawInputCollector;
use actionmap::monitor::{Monitor, MonitorTerminal};
use actionmap::ActionHandler;
use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, Command};
use log::{debug, info};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};

const DEFAULT_FPS: u32 = 30;

fn cli() -> Command {
    Command::new("actionmap")
        .version(actionmap::VERSION)
        .about("Interactive monitor for input action bindings")
        .long_about(
            "actionmap maps keyboard, mouse and window input to named actions and shows \
             which actions fire each frame. Hotkeys are loaded from a TOML keymap.",
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help("Keymap file to load and save rebinds to"),
        )
        .arg(
            Arg::new("fps")
                .long("fps")
                .value_name("N")
                .value_parser(value_parser!(u32).range(1..=240))
                .default_value("30")
                .help("Frames evaluated per second"),
        )
        .arg(
            Arg::new("bind")
                .long("bind")
                .value_name("NAME=KEY[,KEY]")
                .action(ArgAction::Append)
                .help("Override a hotkey for this session, e.g. up=I,Up"),
        )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging for development
    env_logger::init();

    let matches = cli().get_matches();

    let mut store = match matches
        .get_one::<PathBuf>("config")
        .cloned()
        .or_else(default_keymap_path)
    {
        Some(path) => SettingsStore::load(&path)
            .with_context(|| format!("Failed to load keymap {}", path.display()))?,
        None => SettingsStore::in_memory(),
    };

    // Session overrides go straight to the table and are not persisted
    if let Some(bindings) = matches.get_many::<String>("bind") {
        for binding in bindings {
            let (id, keys) = parse_binding(binding)?;
            store.hotkeys_mut().set(id, keys);
        }
    }

    let fps = matches.get_one::<u32>("fps").copied().unwrap_or(DEFAULT_FPS);

    let mut terminal = MonitorTerminal::new();
    let key_releases = terminal.initialize()?;
    let (width, height) = terminal.size()?;

    let monitor = Rc::new(RefCell::new(Monitor::new(
        u32::from(width),
        u32::from(height),
    )));
    let mut handler = ActionHandler::with_app(store.hotkeys_mut(), Rc::clone(&monitor));
    let mut collector = if key_releases {
        RawInputCollector::new()
    } else {
        info!("terminal does not report key releases, using momentary keys");
        RawInputCollector::with_momentary_keys()
    };

    let mut ticker = time::interval(Duration::from_secs(1) / fps);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        monitor.borrow_mut().begin_frame();
        collector.begin_frame();

        handler.clear_events();
        for event in collector.poll_frame(Duration::ZERO)? {
            handler.push_event(event);
        }

        let report = handler.invoke_callbacks(collector.device());
        if !report.is_clean() {
            debug!("frame had {} handler failure(s)", report.failures.len());
        }

        terminal.draw(&monitor.borrow(), store.hotkeys())?;
        if monitor.borrow().quit_requested() {
            break;
        }
    }

    handler.detach(store.hotkeys_mut());
    terminal.cleanup()?;
    Ok(())
}
