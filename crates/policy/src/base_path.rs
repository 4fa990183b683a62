/// Filenames the worker script is deployed under
pub const WORKER_SCRIPT_NAMES: &[&str] =
    &["service-worker.js", "service-worker-simple.js", "service_worker.js"];

/// Works out the sub-path the app is deployed under from the path of the worker
/// script, e.g. `/hub/service-worker.js` -> `/hub`
///
/// A worker at the root of the origin gives an empty base path. If the script
/// isn't one of [`WORKER_SCRIPT_NAMES`] its directory is used instead.
pub fn detect_base_path(script_path: &str) -> String {
    let dir = WORKER_SCRIPT_NAMES
        .iter()
        .find_map(|name| {
            script_path
                .strip_suffix(name)
                .filter(|dir| dir.is_empty() || dir.ends_with('/'))
        })
        .unwrap_or_else(|| match script_path.rfind('/') {
            Some(i) => &script_path[..i],
            None => "",
        });

    dir.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod test {
    use super::detect_base_path;

    #[test]
    fn test_root_worker_has_empty_base() {
        assert_eq!(detect_base_path("/service-worker.js"), "");
        assert_eq!(detect_base_path("/service-worker-simple.js"), "");
    }

    #[test]
    fn test_project_pages_base() {
        assert_eq!(detect_base_path("/training-hub/service-worker.js"), "/training-hub");
        assert_eq!(detect_base_path("/a/b/service_worker.js"), "/a/b");
    }

    #[test]
    fn test_similar_names_are_not_stripped() {
        // Only whole path segments count as the script name
        assert_eq!(detect_base_path("/app/my-service-worker.js"), "/app");
    }

    #[test]
    fn test_unknown_script_name_uses_directory() {
        assert_eq!(detect_base_path("/app/sw.js"), "/app");
        assert_eq!(detect_base_path("/sw.js"), "");
    }
}
