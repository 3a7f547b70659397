//! Render state handed to the front-end.
//!
//! The front-end boots from this snapshot without parsing anything
//! itself, so the page's event list is computed here.

use serde::Serialize;

use crate::document::{Event, Timeline, TimelineDocument};
use crate::error::MwResult;

/// Global variable the HTML templates read their initial state from.
pub const INITIAL_STATE_VAR: &str = "__markwhen_initial_state";

/// Global variable holding the push channel address in live mode.
pub const SOCKET_URL_VAR: &str = "__markwhen_wss_url";

/// Identifier sent with every pushed state update.
pub const SESSION_ID: &str = "markwhen";

/// Snapshot of one document for one view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderState<'a> {
    pub raw_text: &'a str,
    pub parsed: &'a [Timeline],
    pub page: Page<'a>,
}

/// The timeline selected for display and its events.
#[derive(Debug, Clone, Serialize)]
pub struct Page<'a> {
    pub parsed: Option<&'a Timeline>,
    pub transformed: &'a [Event],
}

impl<'a> RenderState<'a> {
    /// Build the snapshot. The first timeline is always the page shown.
    pub fn build(document: &'a TimelineDocument, raw_text: &'a str) -> Self {
        let page = document.first();
        RenderState {
            raw_text,
            parsed: &document.timelines,
            page: Page {
                parsed: page,
                transformed: page.map(|t| t.events.as_slice()).unwrap_or_default(),
            },
        }
    }

    /// `<script>` tag assigning the initial state for a static or served page.
    pub fn bootstrap_script(&self) -> MwResult<String> {
        let initial = InitialState {
            app: AppSettings {
                is_dark: false,
                page_index: 0,
            },
            markwhen: self,
        };
        Ok(script_assign(INITIAL_STATE_VAR, &serde_json::to_string(&initial)?))
    }

    /// Message pushed to live-preview clients after a change.
    pub fn envelope(&self) -> MwResult<String> {
        let envelope = StateEnvelope {
            kind: "state",
            request: true,
            id: SESSION_ID,
            params: self,
        };
        Ok(serde_json::to_string(&envelope)?)
    }
}

#[derive(Serialize)]
struct InitialState<'s, 'a> {
    app: AppSettings,
    markwhen: &'s RenderState<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    is_dark: bool,
    page_index: usize,
}

#[derive(Serialize)]
struct StateEnvelope<'s, 'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    request: bool,
    id: &'static str,
    params: &'s RenderState<'a>,
}

/// `<script>var name = value</script>`, with `</` escaped so text inside
/// the JSON cannot close the tag early.
pub fn script_assign(name: &str, json: &str) -> String {
    format!("<script>var {} = {}</script>", name, json.replace("</", "<\\/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;

    #[test]
    fn page_is_first_timeline() {
        let text = "2024-01-01: A\n2024-01-02: B\n_-_-_break_-_-_\n2024-03-01: C\n";
        let doc = parse(text);
        let state = RenderState::build(&doc, text);

        assert_eq!(state.parsed.len(), 2);
        assert_eq!(state.page.transformed.len(), 2);
        assert_eq!(state.page.parsed, Some(&doc.timelines[0]));
    }

    #[test]
    fn serialized_shape() {
        let text = "2024-01-01: A";
        let doc = parse(text);
        let value = serde_json::to_value(RenderState::build(&doc, text)).unwrap();

        assert_eq!(value["rawText"], "2024-01-01: A");
        assert_eq!(value["parsed"][0]["events"][0]["text"], "A");
        assert_eq!(value["page"]["transformed"][0]["text"], "A");
        assert_eq!(
            value["page"]["parsed"]["events"][0]["dateRange"]["fromDateTimeIso"],
            "2024-01-01T00:00:00+00:00"
        );
    }

    #[test]
    fn empty_document_has_empty_page() {
        let doc = TimelineDocument { timelines: vec![] };
        let value = serde_json::to_value(RenderState::build(&doc, "")).unwrap();
        assert!(value["page"]["parsed"].is_null());
        assert_eq!(value["page"]["transformed"], serde_json::json!([]));
    }

    #[test]
    fn bootstrap_is_identical_for_identical_input() {
        let text = "title: T\n\n2024-01-01: A\nnotes\n";
        let doc = parse(text);
        let first = RenderState::build(&doc, text).bootstrap_script().unwrap();
        let second = RenderState::build(&doc, text).bootstrap_script().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn bootstrap_wraps_state_with_app_settings() {
        let text = "2024-01-01: A";
        let doc = parse(text);
        let script = RenderState::build(&doc, text).bootstrap_script().unwrap();

        let json = script
            .strip_prefix("<script>var __markwhen_initial_state = ")
            .and_then(|s| s.strip_suffix("</script>"))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(json).unwrap();

        assert_eq!(value["app"]["isDark"], false);
        assert_eq!(value["app"]["pageIndex"], 0);
        assert_eq!(value["markwhen"]["rawText"], "2024-01-01: A");
    }

    #[test]
    fn script_text_cannot_close_the_tag() {
        let text = "2024-01-01: </script><b>";
        let doc = parse(text);
        let script = RenderState::build(&doc, text).bootstrap_script().unwrap();
        assert_eq!(script.matches("</script>").count(), 1);
        assert!(script.ends_with("</script>"));
    }

    #[test]
    fn envelope_shape() {
        let text = "2024-01-01: A";
        let doc = parse(text);
        let envelope = RenderState::build(&doc, text).envelope().unwrap();
        let value: serde_json::Value = serde_json::from_str(&envelope).unwrap();

        assert_eq!(value["type"], "state");
        assert_eq!(value["request"], true);
        assert_eq!(value["id"], SESSION_ID);
        assert_eq!(value["params"]["parsed"][0]["events"][0]["text"], "A");
    }
}
