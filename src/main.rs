mod config;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use crossterm::event::KeyEvent;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use logdeck_logs::{
    LogWriter, LogdeckConfig, Notifier, StorageEvent, StorageSummary, TailController, TailEvent,
};
use logdeck_service::{LogQueryClient, MemoryLogService, PushChannel, demo_records};
use logdeck_tui::{
    Action, AppState, ConfirmDialog, Event, EventHandler, HelpOverlay, KeyBindings, KeyContext,
    Navigate, ReaderScreen, RecordDetailScreen, Screen, StorageScreen, Tui, WriterScreen,
};
use logdeck_types::{LevelSummary, Notification};

/// Logdeck - read, tail, chart and write application logs in the terminal
#[derive(Parser, Debug)]
#[command(name = "logdeck")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of demo records to seed the in-memory log service with
    #[arg(long, default_value = "120")]
    seed: usize,

    /// Write diagnostics to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Terminal tick rate in milliseconds
    #[arg(long, default_value = "100")]
    tick_rate_ms: u64,

    /// Screen to open first
    #[arg(long, value_enum, default_value_t = StartScreen::Reader)]
    screen: StartScreen,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StartScreen {
    Reader,
    Storage,
    Writer,
}

impl From<StartScreen> for Screen {
    fn from(screen: StartScreen) -> Self {
        match screen {
            StartScreen::Reader => Screen::Reader,
            StartScreen::Storage => Screen::Storage,
            StartScreen::Writer => Screen::Writer,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(args.log_file.as_deref())?;

    let config = config::load(args.config.as_deref())?;

    let result = run_app(args, config).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into());

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

/// Controllers driven by the main loop
struct Controllers {
    tail: TailController,
    storage: StorageSummary,
    writer: LogWriter,
}

async fn run_app(args: Args, config: LogdeckConfig) -> Result<()> {
    let service = MemoryLogService::with_records(demo_records(args.seed, Utc::now()));
    info!(records = service.len(), "seeded log service");

    let client: Arc<dyn LogQueryClient> = Arc::new(service.clone());
    let push: Arc<dyn PushChannel> = Arc::new(service);

    let (notifier, notifications) = Notifier::channel();
    let (tail, tail_rx) = TailController::new(
        Arc::clone(&client),
        push,
        notifier.clone(),
        &config.reader,
        config.tail.clone(),
    );
    let (storage, storage_rx) =
        StorageSummary::new(Arc::clone(&client), notifier.clone(), &config.storage);
    let writer = LogWriter::new(client, notifier);
    let mut ctl = Controllers {
        tail,
        storage,
        writer,
    };

    let (action_tx, action_rx) = mpsc::unbounded_channel::<Action>();
    let mut state = AppState::new(args.screen.into());
    let keybindings = KeyBindings::new();

    ctl.tail.refresh().await;
    ctl.storage.load().await;

    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(Duration::from_millis(args.tick_rate_ms));

    let result = event_loop(
        &mut tui,
        &mut events,
        &mut state,
        &mut ctl,
        &keybindings,
        Channels {
            action_tx,
            action_rx,
            tail_rx,
            storage_rx,
            notifications,
        },
    )
    .await;

    // Teardown runs whatever the loop returned
    ctl.tail.shutdown().await;
    ctl.storage.shutdown();
    events.shutdown();
    let restored = tui.restore();

    result?;
    restored?;
    Ok(())
}

/// Channels polled by the event loop
struct Channels {
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    tail_rx: mpsc::UnboundedReceiver<TailEvent>,
    storage_rx: mpsc::UnboundedReceiver<StorageEvent>,
    notifications: mpsc::UnboundedReceiver<Notification>,
}

async fn event_loop(
    tui: &mut Tui,
    events: &mut EventHandler,
    state: &mut AppState,
    ctl: &mut Controllers,
    keybindings: &KeyBindings,
    channels: Channels,
) -> Result<()> {
    let Channels {
        action_tx,
        mut action_rx,
        mut tail_rx,
        mut storage_rx,
        mut notifications,
    } = channels;

    render(tui, state, ctl)?;

    loop {
        let dirty = tokio::select! {
            Some(event) = events.next() => {
                match event {
                    Event::Key(key) => {
                        if let Some(action) = key_action(state, keybindings, &key) {
                            let _ = action_tx.send(action);
                        }
                        false
                    }
                    Event::Tick => {
                        let _ = action_tx.send(Action::Tick);
                        false
                    }
                    Event::Resize(_, _) => true,
                    Event::Error(e) => {
                        state.show_toast(Notification::error(e));
                        true
                    }
                }
            }

            // Push-driven refresh results
            Some(event) = tail_rx.recv() => {
                ctl.tail.apply(event);
                true
            }

            // Storage auto-refresh
            Some(StorageEvent::Tick) = storage_rx.recv() => {
                ctl.storage.begin_loading();
                render(tui, state, ctl)?;
                ctl.storage.load().await;
                true
            }

            Some(notification) = notifications.recv() => {
                state.show_toast(notification);
                true
            }

            Some(action) = action_rx.recv() => {
                // Draw loading and transition states before awaiting the service
                if begin_remote(state, ctl, &action) {
                    render(tui, state, ctl)?;
                }
                handle_action(state, ctl, action).await
            }
        };

        if state.should_quit {
            return Ok(());
        }

        if dirty {
            render(tui, state, ctl)?;
        }
    }
}

/// Map a key press to an action for the current input mode
fn key_action(
    state: &AppState,
    keybindings: &KeyBindings,
    key: &KeyEvent,
) -> Option<Action> {
    if state.ui_state.confirm_prompt.is_some() {
        return keybindings.get_action(KeyContext::Confirm, key);
    }

    match state.current_screen {
        Screen::Reader if state.ui_state.search_active => {
            keybindings.get_search_input_action(key)
        }
        Screen::Writer => keybindings.get_writer_action(key),
        screen => keybindings.get_action(KeyContext::for_screen(screen), key),
    }
}

/// Put controllers into their pending state for actions that await a remote
/// call; returns whether there is something new to draw
fn begin_remote(state: &mut AppState, ctl: &mut Controllers, action: &Action) -> bool {
    match action {
        Action::ToggleTail => ctl.tail.begin_toggle(),
        Action::Refresh if state.current_screen == Screen::Storage => {
            ctl.storage.begin_loading();
            true
        }
        Action::NextDateRange | Action::PrevDateRange => {
            ctl.storage.begin_loading();
            true
        }
        Action::ConfirmDelete => {
            state.ui_state.confirm_prompt = None;
            ctl.storage.begin_delete()
        }
        _ => false,
    }
}

/// Apply an action; returns whether the screen needs a redraw
async fn handle_action(state: &mut AppState, ctl: &mut Controllers, action: Action) -> bool {
    match action {
        Action::Quit => {
            state.should_quit = true;
        }
        Action::GoBack => {
            if state.ui_state.help_visible {
                state.ui_state.help_visible = false;
            } else {
                state.go_back();
            }
        }
        Action::Navigate(screen) => {
            state.navigate_to(screen);
        }
        Action::ToggleHelp => {
            state.ui_state.help_visible = !state.ui_state.help_visible;
        }
        Action::DismissToast => {
            state.dismiss_toast();
        }

        Action::ListUp => match state.current_screen {
            Screen::Reader => state.list_up(ctl.tail.visible_logs().len()),
            Screen::Storage => state.summary_up(),
            _ => {}
        },
        Action::ListDown => match state.current_screen {
            Screen::Reader => state.list_down(ctl.tail.visible_logs().len()),
            Screen::Storage => state.summary_down(ctl.storage.summaries().len()),
            _ => {}
        },
        Action::ListSelect => {
            let visible = ctl.tail.visible_logs();
            let selected = state.selected_index();
            ReaderScreen::open_selected(state, &visible, selected);
        }

        Action::Refresh => match state.current_screen {
            Screen::Storage => ctl.storage.load().await,
            _ => {
                ctl.tail.refresh().await;
            }
        },
        // Transition already started by `begin_remote`
        Action::ToggleTail => ctl.tail.finish_toggle().await,
        Action::ToggleLevel(level) => {
            ctl.tail.toggle_level(level).await;
        }
        Action::CyclePageSize => ctl.tail.cycle_page_size().await,
        Action::DeleteSelected => {
            if let Some(id) = ReaderScreen::selected_id(state, &ctl.tail) {
                ctl.tail.delete_log(&id).await;
            }
        }

        Action::OpenSearch => {
            let current = ctl.tail.search().map(|s| s.pattern().to_string());
            state.start_search(current.as_deref());
        }
        Action::CloseSearch => state.cancel_search(),
        Action::SearchInput(c) => state.search_input_char(c),
        Action::SearchBackspace => state.search_input_backspace(),
        Action::SearchClear => state.ui_state.search_input.clear(),
        Action::ApplySearch => {
            let case_insensitive = state.ui_state.search_case_insensitive;
            match ctl
                .tail
                .set_search(&state.ui_state.search_input, case_insensitive)
            {
                Ok(()) => {
                    state.ui_state.search_active = false;
                    state.ui_state.search_error = None;
                    state.ui_state.list_state.select(Some(0));
                }
                // Keep input open to fix
                Err(e) => state.ui_state.search_error = Some(e.to_string()),
            }
        }
        Action::ClearSearch => {
            ctl.tail.clear_search();
            state.cancel_search();
        }
        Action::ToggleCaseSensitive => {
            state.ui_state.search_case_insensitive = !state.ui_state.search_case_insensitive;
            let pattern = ctl.tail.search().map(|s| s.pattern().to_string());
            if let Some(pattern) = pattern {
                let case_insensitive = state.ui_state.search_case_insensitive;
                if let Err(e) = ctl.tail.set_search(&pattern, case_insensitive) {
                    state.ui_state.search_error = Some(e.to_string());
                }
            }
        }

        Action::NextDateRange => ctl.storage.next_date_range().await,
        Action::PrevDateRange => ctl.storage.prev_date_range().await,
        Action::CycleChartType => {
            let next = ctl.storage.chart_type().next();
            ctl.storage.set_chart_type(next.as_str());
        }
        Action::RequestDelete => {
            let level = StorageScreen::selected_level(state);
            state.ui_state.confirm_prompt = Some(ctl.storage.request_delete(level));
        }
        Action::ConfirmDelete => {
            state.ui_state.confirm_prompt = None;
            if ctl.storage.confirm_delete().await {
                // The reader may still list deleted records
                ctl.tail.refresh().await;
            }
        }
        Action::CancelDelete => {
            state.ui_state.confirm_prompt = None;
            ctl.storage.cancel_delete();
        }

        Action::WriterInput(c) => ctl.writer.push_char(c),
        Action::WriterBackspace => ctl.writer.pop_char(),
        Action::WriterClear => ctl.writer.set_message(""),
        Action::WriterCycleLevel => ctl.writer.cycle_level(),
        Action::WriterSubmit => {
            ctl.writer.submit().await;
        }

        Action::Tick => {
            // Redraw only when something timed out or the chart changed
            return state.expire_toast(Instant::now())
                | ctl.tail.expire_highlight()
                | ctl.storage.take_chart_redraw();
        }
        Action::Render => {}
    }

    true
}

fn render(tui: &mut Tui, state: &mut AppState, ctl: &Controllers) -> Result<()> {
    tui.terminal().draw(|frame| {
        match state.current_screen {
            Screen::Reader => ReaderScreen::render(frame, state, &ctl.tail),
            Screen::Storage => StorageScreen::render(frame, state, &ctl.storage),
            Screen::Writer => WriterScreen::render(frame, state, &ctl.writer),
            Screen::RecordDetail => RecordDetailScreen::render(frame, state),
        }

        if let Some(prompt) = &state.ui_state.confirm_prompt {
            let title = ctl
                .storage
                .pending_delete()
                .map(|level| LevelSummary::empty(level).delete_title())
                .unwrap_or_else(|| "Delete logs".to_string());
            ConfirmDialog::render(frame, &title, prompt);
        }

        if state.ui_state.help_visible {
            HelpOverlay::render(frame, state.current_screen);
        }
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use logdeck_logs::{ReaderConfig, StorageConfig, TailConfig};
    use logdeck_types::{LogLevel, TailState};

    fn controllers() -> (Controllers, MemoryLogService) {
        let service = MemoryLogService::new();
        let client: Arc<dyn LogQueryClient> = Arc::new(service.clone());
        let (notifier, _) = Notifier::channel();
        let (tail, _) = TailController::new(
            Arc::clone(&client),
            Arc::new(service.clone()),
            notifier.clone(),
            &ReaderConfig::default(),
            TailConfig::default(),
        );
        let (storage, _) =
            StorageSummary::new(Arc::clone(&client), notifier.clone(), &StorageConfig::default());
        let writer = LogWriter::new(client, notifier);
        (
            Controllers {
                tail,
                storage,
                writer,
            },
            service,
        )
    }

    #[tokio::test]
    async fn test_tail_toggle_is_drawn_before_subscribing() {
        let (mut ctl, service) = controllers();
        let mut state = AppState::new(Screen::Reader);

        assert!(begin_remote(&mut state, &mut ctl, &Action::ToggleTail));
        assert_eq!(ctl.tail.state(), TailState::Subscribing);
        assert_eq!(service.subscriber_count(), 0);

        handle_action(&mut state, &mut ctl, Action::ToggleTail).await;
        assert_eq!(ctl.tail.state(), TailState::Tailing);
        assert_eq!(service.subscriber_count(), 1);

        ctl.tail.shutdown().await;
    }

    #[tokio::test]
    async fn test_confirmed_delete_shows_loading_first() {
        let (mut ctl, _service) = controllers();
        let mut state = AppState::new(Screen::Storage);

        state.ui_state.confirm_prompt = Some(ctl.storage.request_delete(LogLevel::Debug));
        assert!(begin_remote(&mut state, &mut ctl, &Action::ConfirmDelete));
        assert_eq!(state.ui_state.confirm_prompt, None);
        assert!(ctl.storage.is_loading());

        handle_action(&mut state, &mut ctl, Action::ConfirmDelete).await;
        assert!(!ctl.storage.is_loading());
        assert_eq!(ctl.storage.pending_delete(), None);
    }

    #[tokio::test]
    async fn test_local_actions_have_no_pending_state() {
        let (mut ctl, _service) = controllers();
        let mut state = AppState::new(Screen::Reader);

        assert!(!begin_remote(&mut state, &mut ctl, &Action::Refresh));
        assert!(!begin_remote(&mut state, &mut ctl, &Action::ToggleHelp));
        assert!(!ctl.storage.is_loading());

        state.navigate_to(Screen::Storage);
        assert!(begin_remote(&mut state, &mut ctl, &Action::Refresh));
        assert!(ctl.storage.is_loading());
    }
}
