//! Error Code Mapping
//!
//! Maps error codes and raw driver messages to `CapabilityError` variants so
//! every capability implementation classifies failures the same way.

use crate::error::capability_error::CapabilityError;
use serde_json::Value;

/// Maps a capability error code and message to a `CapabilityError`.
///
/// # Arguments
/// * `code` - The error code string (e.g., "ELEMENT_STALE")
/// * `message` - The human-readable error message
/// * `details` - Optional additional details (`{"x": .., "y": ..}`)
pub fn map_error_code(code: &str, message: &str, details: Option<&Value>) -> CapabilityError {
    let (x, y) = extract_point(details);
    match code {
        "CONNECTION_LOST" => CapabilityError::ConnectionLost,
        "NOT_READY" => CapabilityError::NotReady,
        "ELEMENT_STALE" => CapabilityError::ElementStale { x, y },
        "CONTEXT_UNAVAILABLE" => CapabilityError::ContextUnavailable(message.to_string()),
        "ELEMENT_NOT_INTERACTABLE" => CapabilityError::ElementNotInteractable {
            x,
            y,
            reason: message.to_string(),
        },
        "TIMEOUT" => CapabilityError::Timeout {
            operation: message.to_string(),
        },
        "INVALID_ARGUMENT" | "INVALID_REQUEST" => {
            CapabilityError::InvalidArgument(message.to_string())
        }
        "ELEMENT_GONE" | "ELEMENT_NOT_FOUND" => CapabilityError::ElementGone { x, y },
        "NAVIGATION_ERROR" => CapabilityError::Navigation(message.to_string()),
        "SCRIPT_ERROR" => CapabilityError::ScriptError(message.to_string()),
        "NOT_SUPPORTED" => CapabilityError::NotSupported(message.to_string()),
        _ => CapabilityError::Other(format!("[{}] {}", code, message)),
    }
}

/// Classifies a raw driver error message (CDP, WebDriver) that carries no code.
pub fn classify_message(message: &str) -> CapabilityError {
    let lower = message.to_lowercase();
    // CDP reports most failures as -32000; only these messages mean the page
    // context went away underneath the call.
    if lower.contains("cannot find context")
        || lower.contains("cannot find default execution context")
        || lower.contains("execution context was destroyed")
        || lower.contains("inspected target navigated or closed")
        || lower.contains("no frame with given id")
    {
        CapabilityError::ContextUnavailable(message.to_string())
    } else if lower.contains("stale") || lower.contains("detached") {
        CapabilityError::ElementStale { x: 0.0, y: 0.0 }
    } else if lower.contains("timeout") || lower.contains("timed out") {
        CapabilityError::Timeout {
            operation: message.to_string(),
        }
    } else if lower.contains("websocket")
        || lower.contains("connection")
        || lower.contains("channel closed")
    {
        CapabilityError::ConnectionLost
    } else if lower.contains("invalid") {
        CapabilityError::InvalidArgument(message.to_string())
    } else {
        CapabilityError::Other(message.to_string())
    }
}

/// Returns a recovery hint for the given error code.
pub fn hint_for_code(code: &str) -> Option<&'static str> {
    match code {
        "CONNECTION_LOST" | "NOT_READY" => Some("Relaunch the browser session"),
        "ELEMENT_STALE" | "CONTEXT_UNAVAILABLE" => {
            Some("Page changed; capture a new screenshot and retry")
        }
        "ELEMENT_NOT_INTERACTABLE" => Some("Element may be covered; try scrolling first"),
        "TIMEOUT" => Some("Increase timeout or wait for the page to settle"),
        "ELEMENT_GONE" => Some("Describe the element differently"),
        "NAVIGATION_ERROR" => Some("Check URL is valid and accessible"),
        "INVALID_ARGUMENT" => Some("Check instruction parameters"),
        _ => None,
    }
}

fn extract_point(details: Option<&Value>) -> (f32, f32) {
    let coord = |key: &str| {
        details
            .and_then(|d| d.get(key))
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0) as f32
    };
    (coord("x"), coord("y"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_map_element_stale() {
        let details = json!({"x": 40.0, "y": 12.5});
        let err = map_error_code("ELEMENT_STALE", "node detached", Some(&details));
        assert_eq!(err, CapabilityError::ElementStale { x: 40.0, y: 12.5 });
        assert!(err.is_transient());
    }

    #[test]
    fn test_map_element_not_found_is_gone() {
        let err = map_error_code("ELEMENT_NOT_FOUND", "no node at point", None);
        assert!(matches!(err, CapabilityError::ElementGone { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_map_not_interactable() {
        let details = json!({"x": 3, "y": 4});
        match map_error_code("ELEMENT_NOT_INTERACTABLE", "covered", Some(&details)) {
            CapabilityError::ElementNotInteractable { x, y, reason } => {
                assert_eq!((x, y), (3.0, 4.0));
                assert_eq!(reason, "covered");
            }
            other => panic!("Expected ElementNotInteractable, got {:?}", other),
        }
    }

    #[test]
    fn test_map_unknown_code_fallback() {
        let err = map_error_code("SOME_NEW_CODE", "Something happened", None);
        match err {
            CapabilityError::Other(msg) => {
                assert!(msg.contains("SOME_NEW_CODE"));
                assert!(msg.contains("Something happened"));
            }
            _ => panic!("Expected Other"),
        }
    }

    #[test]
    fn test_classify_cdp_messages() {
        assert!(matches!(
            classify_message("Execution context was destroyed"),
            CapabilityError::ContextUnavailable(_)
        ));
        assert!(matches!(
            classify_message("Request timed out"),
            CapabilityError::Timeout { .. }
        ));
        assert!(matches!(
            classify_message("WebSocket connection closed"),
            CapabilityError::ConnectionLost
        ));
        assert!(matches!(
            classify_message("Invalid parameters"),
            CapabilityError::InvalidArgument(_)
        ));
        assert!(!classify_message("boom").is_transient());
    }

    #[test]
    fn test_generic_cdp_server_error_is_not_retried() {
        let err = classify_message("Cannot navigate to invalid URL (code: -32000)");
        assert!(matches!(err, CapabilityError::InvalidArgument(_)));
        assert!(!err.is_transient());

        let err = classify_message("Node is not an element (code: -32000)");
        assert!(!err.is_transient());

        let err = classify_message("Inspected target navigated or closed (code: -32000)");
        assert!(matches!(err, CapabilityError::ContextUnavailable(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn test_hint_for_code() {
        assert_eq!(
            hint_for_code("TIMEOUT"),
            Some("Increase timeout or wait for the page to settle")
        );
        assert_eq!(hint_for_code("UNKNOWN_CODE"), None);
        assert_eq!(
            CapabilityError::Other("x".into()).recovery_hint(),
            "Check instruction wording"
        );
    }
}
