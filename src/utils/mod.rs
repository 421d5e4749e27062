use std::sync::OnceLock;

/// Extensions accepted for uploaded template files
pub const ALLOWED_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

static CATEGORY_ID_RE: OnceLock<Option<regex_lite::Regex>> = OnceLock::new();

/// Validate a category id: lowercase letters, digits and hyphens only.
pub fn is_valid_category_id(id: &str) -> bool {
    CATEGORY_ID_RE
        .get_or_init(|| regex_lite::Regex::new(r"^[a-z0-9-]+$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(id))
}

/// Check if an uploaded filename carries an allowed extension
pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Make a client-supplied filename safe to store.
///
/// Path separators become spaces, whitespace runs become `_`, anything
/// outside `[A-Za-z0-9._-]` is dropped and leading/trailing `.`/`_` are
/// trimmed, so the result can never name a parent or hidden path.
/// e.g., "../../etc/my switch.yaml" -> "etc_my_switch.yaml"
pub fn sanitize_filename(filename: &str) -> String {
    let spaced: String = filename
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Validate a template name taken from a URL path.
/// Rejects anything that could escape the category directory.
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_category_id() {
        assert!(is_valid_category_id("network-1"));
        assert!(is_valid_category_id("lab"));
        assert!(!is_valid_category_id("Network_1"));
        assert!(!is_valid_category_id("network_1"));
        assert!(!is_valid_category_id(""));
        assert!(!is_valid_category_id("../x"));
        assert!(!is_valid_category_id("data center"));
    }

    #[test]
    fn test_allowed_file() {
        assert!(allowed_file("switch.yaml"));
        assert!(allowed_file("switch.YML"));
        assert!(allowed_file("export.json"));
        assert!(!allowed_file("switch.txt"));
        assert!(!allowed_file("yaml"));
        assert!(!allowed_file("archive.json.zip"));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("switch.yaml"), "switch.yaml");
        assert_eq!(sanitize_filename("../../etc/my switch.yaml"), "etc_my_switch.yaml");
        assert_eq!(sanitize_filename("C:\\temp\\edge.json"), "C_temp_edge.json");
        assert_eq!(sanitize_filename(".hidden.yaml"), "hidden.yaml");
        assert_eq!(sanitize_filename("wan$(rm).yaml"), "wanrm.yaml");
        assert_eq!(sanitize_filename("../.."), "");
    }

    #[test]
    fn test_is_safe_name() {
        assert!(is_safe_name("switch"));
        assert!(is_safe_name("switch.v2"));
        assert!(!is_safe_name("../secret"));
        assert!(!is_safe_name("a/b"));
        assert!(!is_safe_name(""));
    }
}
