//! HTML view templates and state injection.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{MwError, MwResult, TemplateError};
use crate::output::Representation;
use crate::state::RenderState;

/// Comments and scripts are matched alongside the head tag so that a
/// `<head>` inside them is skipped.
static HEAD_SCAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<!--.*?-->|<script\b.*?</script\s*>|<head(?:\s[^>]*)?>")
        .expect("head pattern is valid")
});

const BUILTIN_TIMELINE: &str = include_str!("../html/timeline.html");
const BUILTIN_CALENDAR: &str = include_str!("../html/calendar.html");
const BUILTIN_RESUME: &str = include_str!("../html/resume.html");

/// Where view templates come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Templates {
    /// The views compiled into mw.
    Builtin,
    /// `<view>.html` files in a directory.
    Dir(PathBuf),
}

impl Templates {
    /// A configured directory, or the built-in views when there is none.
    pub fn from_dir(dir: Option<PathBuf>) -> Self {
        dir.map_or(Templates::Builtin, Templates::Dir)
    }

    pub fn load(&self, view: Representation) -> MwResult<String> {
        match self {
            Templates::Dir(dir) => load_template(dir, view),
            Templates::Builtin => builtin(view)
                .map(str::to_string)
                .ok_or_else(|| TemplateError::NotFound(template_path(Path::new(""), view)).into()),
        }
    }
}

fn builtin(view: Representation) -> Option<&'static str> {
    match view {
        Representation::Timeline => Some(BUILTIN_TIMELINE),
        Representation::Calendar => Some(BUILTIN_CALENDAR),
        Representation::Resume => Some(BUILTIN_RESUME),
        Representation::Json => None,
    }
}

/// Path of the template for an HTML view inside `dir`.
pub fn template_path(dir: &Path, view: Representation) -> PathBuf {
    dir.join(format!("{}.html", view.as_str()))
}

/// Read the template for `view`. A missing file is reported as
/// [`TemplateError::NotFound`].
pub fn load_template(dir: &Path, view: Representation) -> MwResult<String> {
    let path = template_path(dir, view);
    match std::fs::read_to_string(&path) {
        Ok(html) => Ok(html),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(TemplateError::NotFound(path).into())
        }
        Err(source) => Err(MwError::Read { path, source }),
    }
}

/// Insert `scripts` directly after the opening `<head>` tag, ahead of
/// anything else in the head.
pub fn inject_into_head(template: &str, scripts: &str) -> Result<String, TemplateError> {
    let open = HEAD_SCAN
        .find_iter(template)
        .find(|m| m.as_str()[1..].get(..4).is_some_and(|tag| tag.eq_ignore_ascii_case("head")))
        .ok_or(TemplateError::MissingHead)?;

    let mut html = String::with_capacity(template.len() + scripts.len());
    html.push_str(&template[..open.end()]);
    html.push_str(scripts);
    html.push_str(&template[open.end()..]);
    Ok(html)
}

/// Render an HTML view: the view's template with the initial state script,
/// followed by `extra_scripts`, injected at the top of its head.
pub fn render_view(
    templates: &Templates,
    view: Representation,
    state: &RenderState,
    extra_scripts: &str,
) -> MwResult<String> {
    let template = templates.load(view)?;
    let scripts = state.bootstrap_script()? + extra_scripts;
    Ok(inject_into_head(&template, &scripts)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;

    #[test]
    fn injects_before_existing_head_content() {
        let template = "<html><head><title>T</title></head><body></body></html>";
        let html = inject_into_head(template, "<script>x</script>").unwrap();
        assert_eq!(
            html,
            "<html><head><script>x</script><title>T</title></head><body></body></html>"
        );
    }

    #[test]
    fn head_with_attributes_and_case() {
        let template = "<HTML><HEAD lang=\"en\">\n<meta charset=\"utf-8\"></HEAD></HTML>";
        let html = inject_into_head(template, "<script></script>").unwrap();
        assert!(html.starts_with("<HTML><HEAD lang=\"en\"><script></script>\n<meta"));
    }

    #[test]
    fn header_element_is_not_head() {
        let template = "<body><header>nav</header></body>";
        assert_eq!(
            inject_into_head(template, "<script></script>"),
            Err(TemplateError::MissingHead)
        );
    }

    #[test]
    fn first_head_only() {
        let template = "<head></head><template><head></head></template>";
        let html = inject_into_head(template, "S").unwrap();
        assert_eq!(html, "<head>S</head><template><head></head></template>");
    }

    #[test]
    fn head_inside_comment_or_script_is_skipped() {
        let template = "<!-- <head> --><script>var s = \"<head>\";</script><html><head></head></html>";
        let html = inject_into_head(template, "S").unwrap();
        assert!(html.ends_with("<html><head>S</head></html>"));
        assert_eq!(html.matches('S').count(), 1);
    }

    #[test]
    fn only_commented_head_is_missing() {
        assert_eq!(
            inject_into_head("<!--\n<head>\n--><body></body>", "S"),
            Err(TemplateError::MissingHead)
        );
    }

    #[test]
    fn builtin_views_render_without_a_directory() {
        let doc = parse("2024-01-01: A");
        let state = RenderState::build(&doc, "2024-01-01: A");

        for view in [Representation::Timeline, Representation::Calendar, Representation::Resume] {
            let html = render_view(&Templates::Builtin, view, &state, "").unwrap();
            assert!(html.contains("<head><script>var __markwhen_initial_state = "));
        }
        assert!(Templates::Builtin.load(Representation::Json).is_err());
    }

    #[test]
    fn configured_directory_replaces_builtin_views() {
        assert_eq!(Templates::from_dir(None), Templates::Builtin);
        assert_eq!(
            Templates::from_dir(Some(PathBuf::from("/srv/views"))),
            Templates::Dir(PathBuf::from("/srv/views"))
        );
    }

    #[test]
    fn missing_template_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_template(dir.path(), Representation::Resume).unwrap_err();
        assert!(matches!(
            err,
            MwError::Template(TemplateError::NotFound(ref p)) if p.ends_with("resume.html")
        ));
    }

    #[test]
    fn loads_named_template() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("calendar.html"), "<head></head>").unwrap();
        assert_eq!(
            load_template(dir.path(), Representation::Calendar).unwrap(),
            "<head></head>"
        );
    }

    #[test]
    fn render_view_prepends_state_then_extras() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("timeline.html"),
            "<html><head><script src=\"app.js\"></script></head></html>",
        )
        .unwrap();
        let text = "2024-01-01: A";
        let doc = parse(text);
        let state = RenderState::build(&doc, text);

        let templates = Templates::Dir(dir.path().to_path_buf());

        let html =
            render_view(&templates, Representation::Timeline, &state, "<script>X</script>").unwrap();

        let state_at = html.find("__markwhen_initial_state").unwrap();
        let extra_at = html.find("<script>X</script>").unwrap();
        let app_at = html.find("app.js").unwrap();
        assert!(html.starts_with("<html><head><script>var __markwhen_initial_state"));
        assert!(state_at < extra_at && extra_at < app_at);
    }

    #[test]
    fn render_view_without_head_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("resume.html"), "<body></body>").unwrap();
        let doc = parse("");
        let state = RenderState::build(&doc, "");

        let templates = Templates::Dir(dir.path().to_path_buf());

        let err = render_view(&templates, Representation::Resume, &state, "").unwrap_err();
        assert!(matches!(err, MwError::Template(TemplateError::MissingHead)));
    }
}
