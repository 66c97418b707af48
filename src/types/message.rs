use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages delivered to a page agent by the popup or the lifecycle coordinator.
///
/// Serialized as `{"action": "<name>", ...payload}`, the same shape the
/// dispatcher in [`crate::rpc_handler`] reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PageMessage {
    SavePosition {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    GetMarkers,
    #[serde(rename_all = "camelCase")]
    ScrollToMarker { marker_id: String },
    #[serde(rename_all = "camelCase")]
    DeleteMarker { marker_id: String },
    TogglePanel,
    MarkersAvailable { count: usize },
    MarkersUpdated,
}

impl PageMessage {
    /// The action name used for dispatch.
    pub fn action(&self) -> &'static str {
        match self {
            PageMessage::SavePosition { .. } => "savePosition",
            PageMessage::GetMarkers => "getMarkers",
            PageMessage::ScrollToMarker { .. } => "scrollToMarker",
            PageMessage::DeleteMarker { .. } => "deleteMarker",
            PageMessage::TogglePanel => "togglePanel",
            PageMessage::MarkersAvailable { .. } => "markersAvailable",
            PageMessage::MarkersUpdated => "markersUpdated",
        }
    }

    /// Notifications carry no response.
    pub fn expects_response(&self) -> bool {
        !matches!(
            self,
            PageMessage::MarkersAvailable { .. } | PageMessage::MarkersUpdated
        )
    }

    /// The message as a JSON object, payload fields flattened next to `action`.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// `{"success": true}` merged with the fields of `extra` (an object, or null).
pub fn success_response(extra: Value) -> Value {
    let mut response = serde_json::json!({ "success": true });
    if let (Value::Object(target), Value::Object(fields)) = (&mut response, extra) {
        target.extend(fields);
    }
    response
}

/// `{"success": false, "error": "<message>"}`.
pub fn failure_response(error: &dyn std::fmt::Display) -> Value {
    serde_json::json!({ "success": false, "error": error.to_string() })
}

/// Delivers page messages to the page agent of a tab.
///
/// Implemented by [`crate::app::App`] for its open pages; tests use a
/// recording sink.
pub trait PageChannel {
    /// Sends `message` to the page showing `url` and returns its response
    /// (`Value::Null` for notifications).
    fn send(&mut self, url: &str, message: PageMessage) -> Result<Value, String>;
}
