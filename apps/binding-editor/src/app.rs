//! Application state and key handling.

use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent};
use reel_keybinds::{
    parse_line, render_line, AnnotatedBinding, BindingRegistry, BindingsChanged, ConfAccess,
    ConfFile, SharedRegistry,
};
use tracing::info;

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    None,
    Filter,
    Add,
    Edit,
}

pub struct App {
    pub config: Config,
    pub conf_path: PathBuf,
    pub rows: Vec<AnnotatedBinding>,
    pub selected_index: usize,
    pub input_mode: InputMode,
    pub input_buffer: String,
    pub message: Option<String>,
    pub show_help: bool,
    pub read_only: bool,
    pub last_saved: Option<DateTime<Local>>,
    registry: SharedRegistry,
    events: Receiver<BindingsChanged>,
}

impl App {
    pub fn new(conf_override: Option<PathBuf>, read_only: bool) -> Result<Self> {
        let config = Config::load();
        let conf_path = conf_override.unwrap_or_else(|| config.input_conf_path());
        let access = if read_only {
            ConfAccess::ReadOnly
        } else {
            ConfAccess::ReadWrite
        };

        let mut registry = if conf_path.exists() {
            BindingRegistry::open(&conf_path, access)
                .with_context(|| format!("cannot load {}", conf_path.display()))?
        } else if read_only {
            // Nothing on disk to look at; browse the shipped defaults.
            let conf = ConfFile::from_text(
                &conf_path,
                reel_keybinds::default_conf_text(),
                ConfAccess::ReadOnly,
            )
            .context("built-in default bindings do not load")?;
            BindingRegistry::new(conf)
        } else {
            if let Some(parent) = conf_path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("cannot create {}", parent.display()))?;
            }
            fs::write(&conf_path, reel_keybinds::default_conf_text())
                .with_context(|| format!("cannot create {}", conf_path.display()))?;
            info!(path = %conf_path.display(), "created a new input.conf from the defaults");
            BindingRegistry::open(&conf_path, access)
                .with_context(|| format!("cannot load {}", conf_path.display()))?
        };

        let events = registry.subscribe();

        let mut message = None;
        match config.load_extensions() {
            Ok(batch) if !batch.is_empty() => {
                let outcome = registry.merge_extension_bindings(batch);
                if !outcome.rejected.is_empty() {
                    let keys: Vec<&str> = outcome
                        .rejected
                        .iter()
                        .map(|r| r.submitted.key.as_str())
                        .collect();
                    message = Some(format!(
                        "{} extension binding(s) rejected: {}",
                        outcome.rejected.len(),
                        keys.join(", ")
                    ));
                }
            }
            Ok(_) => {}
            Err(err) => message = Some(format!("extensions.toml: {err}")),
        }

        let rows = registry.visible_rows().to_vec();
        Ok(Self {
            config,
            conf_path,
            rows,
            selected_index: 0,
            input_mode: InputMode::None,
            input_buffer: String::new(),
            message,
            show_help: false,
            read_only,
            last_saved: None,
            registry: SharedRegistry::new(registry),
            events,
        })
    }

    /// Drain pending registry notifications into the table state. The last
    /// notification wins: it carries the full visible list and the rows the
    /// mutation wants selected.
    pub fn poll_notifications(&mut self) {
        let mut latest = None;
        for event in self.events.try_iter() {
            latest = Some(event);
        }
        if let Some(event) = latest {
            self.rows = event.visible;
            if let Some(selection) = &event.change.selection_after {
                if let Some(&index) = selection.iter().next() {
                    self.selected_index = index;
                }
            }
        }
        self.clamp_selection();
    }

    /// The active filter, straight from the registry (mutations may clear
    /// it behind the app's back).
    pub fn filter_text(&self) -> String {
        self.registry.lock().filter().to_string()
    }

    pub fn can_quit(&self) -> bool {
        self.input_mode == InputMode::None && !self.show_help
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.message = None;

        if self.show_help {
            self.show_help = false;
            return;
        }

        if self.input_mode != InputMode::None {
            self.handle_input_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('g') | KeyCode::Home => self.selected_index = 0,
            KeyCode::Char('G') | KeyCode::End => {
                if !self.rows.is_empty() {
                    self.selected_index = self.rows.len() - 1;
                }
            }
            KeyCode::Char('/') => {
                self.input_mode = InputMode::Filter;
                self.input_buffer = self.filter_text();
            }
            KeyCode::Char('a') => {
                self.input_mode = InputMode::Add;
                self.input_buffer.clear();
            }
            KeyCode::Char('e') => self.start_edit(),
            KeyCode::Char('d') => self.delete_selected(),
            KeyCode::Char('J') => self.move_selected(1),
            KeyCode::Char('K') => self.move_selected(-1),
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Esc => {
                self.registry.lock().set_filter("");
                self.poll_notifications();
            }
            _ => {}
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                if self.input_mode == InputMode::Filter {
                    self.registry.lock().set_filter("");
                    self.poll_notifications();
                }
                self.stop_input();
            }
            KeyCode::Enter => self.finish_input(),
            KeyCode::Backspace => {
                self.input_buffer.pop();
                if self.input_mode == InputMode::Filter {
                    self.apply_filter();
                }
            }
            KeyCode::Char(c) => {
                self.input_buffer.push(c);
                if self.input_mode == InputMode::Filter {
                    self.apply_filter();
                }
            }
            _ => {}
        }
    }

    fn finish_input(&mut self) {
        match self.input_mode {
            // The filter is already applied keystroke by keystroke.
            InputMode::Filter => self.stop_input(),
            InputMode::Add => self.commit_add(),
            InputMode::Edit => self.commit_edit(),
            InputMode::None => {}
        }
    }

    fn apply_filter(&mut self) {
        self.registry.lock().set_filter(self.input_buffer.clone());
        self.poll_notifications();
    }

    fn stop_input(&mut self) {
        self.input_mode = InputMode::None;
        self.input_buffer.clear();
    }

    fn commit_add(&mut self) {
        let Some(binding) = parse_line(&self.input_buffer) else {
            // Stay in input mode so the line can be fixed up.
            self.message = Some("Not a binding line (expected: <key> <action...>)".to_string());
            return;
        };
        let result = self
            .registry
            .lock()
            .insert_bindings(self.selected_index, true, vec![binding]);
        match result {
            Ok(_) => {
                self.note_saved("Binding added");
                self.stop_input();
            }
            Err(err) => self.message = Some(err.to_string()),
        }
        self.poll_notifications();
    }

    fn commit_edit(&mut self) {
        let Some(binding) = parse_line(&self.input_buffer) else {
            self.message = Some("Not a binding line (expected: <key> <action...>)".to_string());
            return;
        };
        let result = self.registry.lock().update_binding(self.selected_index, binding);
        match result {
            Ok(true) => {
                self.note_saved("Binding updated");
                self.stop_input();
            }
            Ok(false) => {
                self.message = Some("This row cannot be edited".to_string());
                self.stop_input();
            }
            Err(err) => self.message = Some(err.to_string()),
        }
        self.poll_notifications();
    }

    fn start_edit(&mut self) {
        if !self.registry.lock().is_editable(self.selected_index) {
            self.message = Some("This row cannot be edited".to_string());
            return;
        }
        if let Some(row) = self.rows.get(self.selected_index) {
            self.input_mode = InputMode::Edit;
            self.input_buffer = render_line(&row.binding);
        }
    }

    fn delete_selected(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        if !self.registry.lock().is_editable(self.selected_index) {
            self.message = Some("This row cannot be removed".to_string());
            return;
        }
        let result = self.registry.lock().remove_rows(&[self.selected_index]);
        match result {
            Ok(()) => self.note_saved("Binding removed"),
            Err(err) => self.message = Some(err.to_string()),
        }
        self.poll_notifications();
    }

    /// Move the selected row one slot up or down in the visible list.
    fn move_selected(&mut self, delta: i32) {
        let index = self.selected_index;
        let target = index as i64 + i64::from(delta);
        if target < 0 || target as usize >= self.rows.len() {
            return;
        }

        let result = {
            let mut registry = self.registry.lock();
            if !registry.is_editable(index) {
                self.message = Some("This row cannot be moved".to_string());
                return;
            }
            let Some(id) = registry.visible_row(index).and_then(|row| row.id()) else {
                return;
            };
            if delta > 0 {
                registry.move_bindings(&[id], index + 1, true)
            } else {
                registry.move_bindings(&[id], index - 1, false)
            }
        };
        match result {
            Ok(()) => self.note_saved("Binding moved"),
            Err(err) => self.message = Some(err.to_string()),
        }
        self.poll_notifications();
    }

    fn reload(&mut self) {
        let result = self.registry.lock().reload();
        match result {
            Ok(inactive) if inactive.is_empty() => {
                self.message = Some("Reloaded".to_string());
            }
            Ok(inactive) => {
                self.message = Some(format!(
                    "Reloaded; {} extension binding(s) lost their key",
                    inactive.len()
                ));
            }
            Err(err) => self.message = Some(err.to_string()),
        }
        self.poll_notifications();
    }

    fn move_selection(&mut self, delta: i32) {
        let len = self.rows.len();
        if len == 0 {
            return;
        }
        let new_index = self.selected_index as i32 + delta;
        self.selected_index = new_index.clamp(0, len as i32 - 1) as usize;
    }

    fn note_saved(&mut self, what: &str) {
        self.last_saved = Some(Local::now());
        self.message = Some(what.to_string());
    }

    fn clamp_selection(&mut self) {
        if self.rows.is_empty() {
            self.selected_index = 0;
        } else if self.selected_index >= self.rows.len() {
            self.selected_index = self.rows.len() - 1;
        }
    }
}
