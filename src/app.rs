//! App Core for PageMark.
//!
//! Holds the shared store, the lifecycle coordinator and one page agent
//! per open page URL, and routes notifications between them.

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use serde_json::Value;

use crate::config::AppConfig;
use crate::database::store::{KeyValueStore, SqliteStore, MARKERS_KEY};
use crate::managers::control_surface::ControlSurface;
use crate::managers::page_agent::PageAgent;
use crate::managers::shortcut_manager::{ShortcutAction, ShortcutManager, ShortcutManagerTrait};
use crate::services::lifecycle::{InstallReason, LifecycleCoordinator};
use crate::types::errors::{MarkerError, ShortcutError};
use crate::types::message::{PageChannel, PageMessage};

/// Central application struct.
pub struct App {
    pub store: Arc<dyn KeyValueStore>,
    pub config: AppConfig,
    pub lifecycle: LifecycleCoordinator,
    shortcuts: ShortcutManager,
    pages: HashMap<String, PageAgent>,
}

impl App {
    /// Opens the SQLite store under `config.data_dir` and runs startup.
    pub fn new(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        fs::create_dir_all(&config.data_dir)
            .map_err(|e| format!("creating data dir {}: {}", config.data_dir.display(), e))?;
        let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(config.db_path())?);
        tracing::info!(path = %config.db_path().display(), "store opened");
        Ok(Self::with_store(store, config))
    }

    /// Builds the app around an existing store and runs startup.
    pub fn with_store(store: Arc<dyn KeyValueStore>, config: AppConfig) -> Self {
        let mut app = Self {
            lifecycle: LifecycleCoordinator::new(Arc::clone(&store)),
            store,
            config,
            shortcuts: ShortcutManager::new(),
            pages: HashMap::new(),
        };
        app.startup();
        app
    }

    /// Initialises an empty store on first run and loads settings.
    fn startup(&mut self) {
        match self.store.get(MARKERS_KEY) {
            Ok(None) => {
                if let Err(e) = self.lifecycle.on_installed(InstallReason::Install) {
                    tracing::error!(error = %e, "initialising store failed");
                }
            }
            Ok(Some(_)) => {}
            Err(e) => tracing::error!(error = %e, "store unavailable at startup"),
        }
        self.lifecycle.startup();
    }

    /// Returns the agent for `url`, creating and loading it on first use.
    pub fn open_page(&mut self, url: &str, page_title: Option<&str>) -> Result<&mut PageAgent, MarkerError> {
        if !self.pages.contains_key(url) {
            let mut agent = PageAgent::new(
                Arc::clone(&self.store),
                url,
                page_title.unwrap_or_default(),
                self.lifecycle.settings().clone(),
                self.config.autosave_quiet_period,
            );
            agent.set_shortcuts(self.shortcuts.clone());
            agent.load()?;
            self.pages.insert(url.to_string(), agent);
        }
        let agent = self
            .pages
            .get_mut(url)
            .ok_or_else(|| MarkerError::NotFound(url.to_string()))?;
        if let Some(title) = page_title {
            agent.set_page_title(title);
        }
        Ok(agent)
    }

    pub fn page(&mut self, url: &str) -> Option<&mut PageAgent> {
        self.pages.get_mut(url)
    }

    /// Drops the agent for `url`; its pending auto-save is cancelled.
    pub fn close_page(&mut self, url: &str) -> bool {
        self.pages.remove(url).is_some()
    }

    /// A popup bound to the shared store.
    pub fn control_surface(&self) -> ControlSurface {
        ControlSurface::new(Arc::clone(&self.store))
    }

    /// Delivers `message` to every open page, skipping `except`.
    pub fn broadcast(&mut self, message: &PageMessage, except: Option<&str>) {
        let payload = message.to_value();
        for (url, agent) in self.pages.iter_mut() {
            if Some(url.as_str()) == except {
                continue;
            }
            if let Err(e) = agent.handle_message(message.action(), &payload) {
                tracing::warn!(url = %url, error = %e, "page rejected broadcast");
            }
        }
    }

    /// Propagates a marker-map change to every open page but the writer.
    pub fn markers_changed(&mut self, writer: Option<&str>) {
        if let Some(message) = self.lifecycle.on_storage_changed(MARKERS_KEY) {
            self.broadcast(&message, writer);
        }
    }

    /// The key chord bound to `action`, if any.
    pub fn shortcut(&self, action: ShortcutAction) -> Option<&str> {
        self.shortcuts.get_shortcut(action)
    }

    /// Binds `action` to `keys`, or unbinds it when `keys` is `None`, and
    /// pushes the new table to every open page.
    pub fn rebind_shortcut(&mut self, action: ShortcutAction, keys: Option<&str>) -> Result<(), ShortcutError> {
        match keys {
            Some(keys) => self.shortcuts.register_shortcut(action, keys)?,
            None => self.shortcuts.unregister_shortcut(action)?,
        }
        tracing::info!(action = action.name(), keys = ?keys, "shortcut rebound");
        self.shortcuts_changed();
        Ok(())
    }

    /// Restores the default key bindings on every open page.
    pub fn reset_shortcuts(&mut self) {
        self.shortcuts.reset_to_defaults();
        self.shortcuts_changed();
    }

    fn shortcuts_changed(&mut self) {
        for agent in self.pages.values_mut() {
            agent.set_shortcuts(self.shortcuts.clone());
        }
    }

    /// Pushes the current settings to every open page.
    pub fn settings_changed(&mut self) {
        let settings = self.lifecycle.settings().clone();
        for agent in self.pages.values_mut() {
            agent.apply_settings(settings.clone());
        }
    }
}

/// Delivers popup and lifecycle messages to the page agents of this app,
/// opening the page's agent first if needed.
impl PageChannel for App {
    fn send(&mut self, url: &str, message: PageMessage) -> Result<Value, String> {
        let agent = self.open_page(url, None).map_err(|e| e.to_string())?;
        let response = agent.handle_message(message.action(), &message.to_value())?;
        Ok(if message.expects_response() { response } else { Value::Null })
    }
}
