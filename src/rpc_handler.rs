//! Message dispatch for PageMark.
//!
//! `handle_message` is the single routing table for every action: page
//! actions go to the page agent for the request's `url`, store-wide
//! actions to the lifecycle coordinator, popup requests through the
//! control surface to the active page, and page/tab events from the
//! embedding UI update the matching agent. Split out of `rpc_server.rs` so
//! it can be tested without stdin/stdout.

use std::sync::Mutex;

use chrono::Utc;
use serde_json::{json, Value};

use crate::app::App;
use crate::managers::control_surface::Navigation;
use crate::managers::page_agent::Viewport;
use crate::managers::shortcut_manager::ShortcutAction;
use crate::services::lifecycle::InstallReason;
use crate::types::message::failure_response;

/// Actions answered by the page agent of `params.url`.
const PAGE_ACTIONS: &[&str] = &[
    "savePosition",
    "getMarkers",
    "scrollToMarker",
    "deleteMarker",
    "togglePanel",
    "markersAvailable",
    "markersUpdated",
];

/// Page actions that change the persisted marker map.
const PAGE_MUTATIONS: &[&str] = &["savePosition", "deleteMarker"];

fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", key))
}

fn number(params: &Value, key: &str) -> f64 {
    params.get(key).and_then(|v| v.as_f64()).unwrap_or(0.0)
}

/// `{"savePosition": "Ctrl+Shift+M", ...}`, `null` for unbound actions.
fn shortcut_table(app: &App) -> Value {
    ShortcutAction::ALL
        .into_iter()
        .map(|a| (a.name().to_string(), json!(app.shortcut(a))))
        .collect::<serde_json::Map<_, _>>()
        .into()
}

/// Dispatch one action.
///
/// Returns `Ok(Value)` for handled actions (operation failures are encoded
/// as `{"success": false, "error"}` inside it) and `Err(String)` for
/// unknown actions or malformed requests.
pub fn handle_message(app: &Mutex<App>, action: &str, params: &Value) -> Result<Value, String> {
    match action {
        // ─── Page agent ───
        a if PAGE_ACTIONS.contains(&a) => {
            let url = required_str(params, "url")?;
            let page_title = params.get("pageTitle").and_then(|v| v.as_str());
            let mut app = app.lock().map_err(|e| e.to_string())?;
            let agent = match app.open_page(url, page_title) {
                Ok(agent) => agent,
                Err(e) => return Ok(failure_response(&e)),
            };
            let response = agent.handle_message(action, params)?;
            let changed = PAGE_MUTATIONS.contains(&action)
                && response.get("success").and_then(Value::as_bool).unwrap_or(false);
            if changed {
                app.markers_changed(Some(url));
            }
            Ok(response)
        }

        // ─── Lifecycle / popup (store-wide) ───
        "getStats" | "exportMarkers" | "getSettings" => {
            let mut app = app.lock().map_err(|e| e.to_string())?;
            app.lifecycle.handle_message(action, params)
        }
        "clearAllMarkers" | "importMarkers" => {
            let mut app = app.lock().map_err(|e| e.to_string())?;
            let response = app.lifecycle.handle_message(action, params)?;
            if response.get("success").and_then(Value::as_bool).unwrap_or(false) {
                app.markers_changed(None);
            }
            Ok(response)
        }
        "setSetting" => {
            let mut app = app.lock().map_err(|e| e.to_string())?;
            let response = app.lifecycle.handle_message(action, params)?;
            app.settings_changed();
            Ok(response)
        }
        "getSummary" => {
            let app = app.lock().map_err(|e| e.to_string())?;
            Ok(match app.control_surface().summary(Utc::now()) {
                Ok(summary) => json!({"success": true, "summary": summary}),
                Err(e) => failure_response(&e),
            })
        }

        // ─── Popup requests to the active page ───
        "popupSavePosition" => {
            let active_url = required_str(params, "activeUrl")?;
            let title = params.get("title").and_then(|v| v.as_str());
            let mut app = app.lock().map_err(|e| e.to_string())?;
            let mut surface = app.control_surface();
            let ok = surface.save_position(&mut *app, active_url, title);
            if ok {
                app.markers_changed(Some(active_url));
            }
            Ok(json!({"success": ok, "notifications": surface.take_notifications()}))
        }
        "popupShowMarkers" => {
            let active_url = required_str(params, "activeUrl")?;
            let mut app = app.lock().map_err(|e| e.to_string())?;
            let mut surface = app.control_surface();
            let ok = surface.show_markers(&mut *app, active_url);
            Ok(json!({"success": ok, "notifications": surface.take_notifications()}))
        }
        "popupGoToMarker" => {
            let marker_id = required_str(params, "markerId")?;
            let url = required_str(params, "url")?;
            let active_url = required_str(params, "activeUrl")?;
            let mut app = app.lock().map_err(|e| e.to_string())?;
            let mut surface = app.control_surface();
            let mut response = match surface.go_to_marker(&mut *app, marker_id, url, active_url) {
                Ok(Navigation::SamePage) => json!({"success": true, "navigate": null}),
                Ok(Navigation::Navigate { url, then }) => {
                    json!({"success": true, "navigate": url, "then": then.to_value()})
                }
                Err(e) => failure_response(&e),
            };
            response["notifications"] = json!(surface.take_notifications());
            Ok(response)
        }
        "popupDeleteMarker" => {
            let marker_id = required_str(params, "markerId")?;
            let url = required_str(params, "url")?;
            let active_url = required_str(params, "activeUrl")?;
            let mut app = app.lock().map_err(|e| e.to_string())?;
            let mut surface = app.control_surface();
            let mut response = match surface.delete_marker(&mut *app, marker_id, url, active_url) {
                Ok(()) => {
                    app.markers_changed(None);
                    json!({"success": true})
                }
                Err(e) => failure_response(&e),
            };
            response["notifications"] = json!(surface.take_notifications());
            Ok(response)
        }

        // ─── Keyboard shortcuts ───
        "getShortcuts" => {
            let app = app.lock().map_err(|e| e.to_string())?;
            Ok(json!({"success": true, "shortcuts": shortcut_table(&app)}))
        }
        "setShortcut" => {
            let name = required_str(params, "shortcut")?;
            let action = ShortcutAction::from_name(name).ok_or_else(|| format!("unknown shortcut: {}", name))?;
            let keys = params.get("keys").and_then(|v| v.as_str());
            let mut app = app.lock().map_err(|e| e.to_string())?;
            Ok(match app.rebind_shortcut(action, keys) {
                Ok(()) => json!({"success": true, "shortcuts": shortcut_table(&app)}),
                Err(e) => failure_response(&e),
            })
        }
        "resetShortcuts" => {
            let mut app = app.lock().map_err(|e| e.to_string())?;
            app.reset_shortcuts();
            Ok(json!({"success": true, "shortcuts": shortcut_table(&app)}))
        }

        // ─── Events from the embedding UI ───
        "install" => {
            let reason = match params.get("reason").and_then(|v| v.as_str()).unwrap_or("install") {
                "install" => InstallReason::Install,
                "update" => InstallReason::Update,
                other => return Err(format!("unknown install reason: {}", other)),
            };
            let mut app = app.lock().map_err(|e| e.to_string())?;
            Ok(match app.lifecycle.on_installed(reason) {
                Ok(outcome) => json!({
                    "success": true,
                    "openWelcomePage": outcome.open_welcome_page,
                    "contextMenu": app.lifecycle.context_menu_items(),
                }),
                Err(e) => failure_response(&e),
            })
        }
        "contextMenuClicked" => {
            let menu_item = required_str(params, "menuItemId")?;
            let url = required_str(params, "url")?;
            let message = {
                let app = app.lock().map_err(|e| e.to_string())?;
                app.lifecycle.on_context_menu_click(menu_item)
            };
            match message {
                Some(message) => {
                    let mut forwarded = message.to_value();
                    forwarded["url"] = json!(url);
                    handle_message(app, message.action(), &forwarded)
                }
                None => Err(format!("unknown menu item: {}", menu_item)),
            }
        }
        "tabUpdated" => {
            let url = required_str(params, "url")?;
            let complete = params.get("status").and_then(|v| v.as_str()) == Some("complete");
            let mut app = app.lock().map_err(|e| e.to_string())?;
            let Some(message) = app.lifecycle.on_tab_updated(url, complete) else {
                return Ok(Value::Null);
            };
            if let Some(agent) = app.page(url) {
                agent.handle_message(message.action(), &message.to_value())?;
            }
            Ok(message.to_value())
        }
        "pageScrolled" => {
            let url = required_str(params, "url")?;
            let viewport = Viewport {
                scroll_x: number(params, "scrollX"),
                scroll_y: number(params, "scrollY"),
                scroll_height: number(params, "scrollHeight"),
                client_height: number(params, "clientHeight"),
            };
            let mut app = app.lock().map_err(|e| e.to_string())?;
            let agent = app.open_page(url, None).map_err(|e| e.to_string())?;
            agent.on_scroll(viewport);
            Ok(json!({"indicators": agent.indicators()}))
        }
        "pageResized" => {
            let url = required_str(params, "url")?;
            let mut app = app.lock().map_err(|e| e.to_string())?;
            let agent = app.open_page(url, None).map_err(|e| e.to_string())?;
            agent.on_resize(number(params, "scrollHeight"), number(params, "clientHeight"));
            Ok(json!({"indicators": agent.indicators()}))
        }
        "pageKey" => {
            let url = required_str(params, "url")?;
            let keys = required_str(params, "keys")?;
            let mut app = app.lock().map_err(|e| e.to_string())?;
            let agent = app.open_page(url, None).map_err(|e| e.to_string())?;
            let action = agent.handle_key(keys);
            Ok(json!({"action": action.map(|a| a.name())}))
        }
        "pageState" => {
            let url = required_str(params, "url")?;
            let mut app = app.lock().map_err(|e| e.to_string())?;
            let agent = app.open_page(url, None).map_err(|e| e.to_string())?;
            let scroll_target = agent
                .take_scroll_target()
                .map(|t| json!({"scrollX": t.scroll_x, "scrollY": t.scroll_y}));
            Ok(json!({
                "panelVisible": agent.is_panel_visible(),
                "panel": agent.panel_entries(Utc::now()),
                "indicators": agent.indicators(),
                "scrollTarget": scroll_target,
                "notifications": agent.take_notifications(),
            }))
        }
        "pageClosed" => {
            let url = required_str(params, "url")?;
            let mut app = app.lock().map_err(|e| e.to_string())?;
            Ok(json!({"closed": app.close_page(url)}))
        }

        "ping" => Ok(json!({"pong": true})),

        _ => Err(format!("unknown action: {}", action)),
    }
}
