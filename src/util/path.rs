use std::path::{Path, PathBuf};

/// Extension of exported Graphviz files.
pub const DOT_EXTENSION: &str = "dot";

/// Expand `~` and `$VAR`/`${VAR}` in a path; unknown variables leave the input untouched.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Target of a tree export: `<dir>/<stem>.dot`.
///
/// A stem that already ends in `.dot` is used as is.
pub fn export_path(dir: &Path, stem: &str) -> PathBuf {
    let has_extension = Path::new(stem)
        .extension()
        .is_some_and(|ext| ext == DOT_EXTENSION);
    if has_extension {
        dir.join(stem)
    } else {
        dir.join(format!("{}.{}", stem, DOT_EXTENSION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_plain_stem_then_dot_extension_is_appended() {
        assert_eq!(
            export_path(Path::new("/tmp/out"), "network"),
            PathBuf::from("/tmp/out/network.dot")
        );
    }

    #[test]
    fn given_stem_with_other_extension_then_it_is_kept() {
        assert_eq!(
            export_path(Path::new("."), "v1.2"),
            PathBuf::from("./v1.2.dot")
        );
        assert_eq!(
            export_path(Path::new("."), "tree.dot"),
            PathBuf::from("./tree.dot")
        );
    }

    #[test]
    fn given_unknown_variable_then_input_is_returned() {
        assert_eq!(
            expand_env_vars("$SOCIALTREE_SURELY_UNSET_VAR/x"),
            "$SOCIALTREE_SURELY_UNSET_VAR/x"
        );
    }
}
