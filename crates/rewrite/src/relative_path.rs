use std::path::Path;

/// How the `./` prefix of a canonical specifier is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathStyle {
    /// Compares directories character by character. Sibling directories that
    /// share a name prefix (`/usr/local` and `/usr/locale`) end up with a
    /// redundant `./../` specifier; kept for output that matches earlier runs.
    #[default]
    Compatible,
    /// Compares whole path segments.
    Segment,
}

/// Minimal relative specifier from the file `from` to the file `to`, both
/// absolute. Uses forward slashes and keeps the target's extension.
pub fn relative_specifier(from: &Path, to: &Path, style: PathStyle) -> String {
    let from_dir = parent_dir(from);
    let to_dir = parent_dir(to);
    let to_file = to
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let from_segments = segments(&from_dir);
    let to_segments = segments(&to_dir);
    let base = join_relative(&from_segments, &to_segments, &to_file);
    let from_current_dir = format!("./{base}");

    match style {
        PathStyle::Segment => {
            if base.starts_with("../") {
                base
            } else {
                from_current_dir
            }
        }
        PathStyle::Compatible => {
            use std::cmp::Ordering;
            match from_segments.len().cmp(&to_segments.len()) {
                Ordering::Equal => {
                    let common = longest_common_prefix(&from_dir, &to_dir);
                    let depth = segments(common).len();
                    if from_segments.get(depth) != to_segments.get(depth) {
                        base
                    } else {
                        from_current_dir
                    }
                }
                Ordering::Less => from_current_dir,
                Ordering::Greater => base,
            }
        }
    }
}

/// Longest prefix of `a` that `b` starts with, compared by characters.
pub fn longest_common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let mut end = 0;
    for ((index, left), right) in a.char_indices().zip(b.chars()) {
        if left != right {
            break;
        }
        end = index + left.len_utf8();
    }
    &a[..end]
}

fn parent_dir(path: &Path) -> String {
    path.parent()
        .map(|dir| dir.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default()
}

fn segments(dir: &str) -> Vec<&str> {
    dir.split('/').filter(|segment| !segment.is_empty()).collect()
}

/// `relative(from_dir, to_dir)` joined with the target file name.
fn join_relative(from: &[&str], to: &[&str], file: &str) -> String {
    let common = from
        .iter()
        .zip(to)
        .take_while(|(left, right)| left == right)
        .count();

    let mut parts: Vec<&str> = Vec::with_capacity(from.len() + to.len() + 1);
    parts.extend(std::iter::repeat("..").take(from.len() - common));
    parts.extend(&to[common..]);
    parts.push(file);
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compatible(from: &str, to: &str) -> String {
        relative_specifier(Path::new(from), Path::new(to), PathStyle::Compatible)
    }

    fn segment(from: &str, to: &str) -> String {
        relative_specifier(Path::new(from), Path::new(to), PathStyle::Segment)
    }

    #[test]
    fn test_longest_common_prefix() {
        assert_eq!(longest_common_prefix("hello world!!", "hello world!!!!"), "hello world!!");
        assert_eq!(longest_common_prefix("/usr/local", "/usr/locale"), "/usr/local");
        assert_eq!(longest_common_prefix("/usr/bin", "/opt"), "/");
        assert_eq!(longest_common_prefix("", "/opt"), "");
    }

    #[test]
    fn test_same_directory() {
        assert_eq!(compatible("/usr/local/foo/bar.ts", "/usr/local/foo/foo.ts"), "./foo.ts");
        assert_eq!(segment("/usr/local/foo/bar.ts", "/usr/local/foo/foo.ts"), "./foo.ts");
    }

    #[test]
    fn test_different_root_of_sub_directory() {
        assert_eq!(
            compatible("/usr/local/bin/tmp/bar.ts", "/usr/local/conf/tmp/foo.ts"),
            "../../conf/tmp/foo.ts"
        );
    }

    #[test]
    fn test_same_root_of_sub_directory() {
        assert_eq!(compatible("/usr/local/bin/bar.ts", "/usr/local/bin/tmp/foo.ts"), "./tmp/foo.ts");
    }

    #[test]
    fn test_parent_directory() {
        assert_eq!(compatible("/usr/local/bin.ts", "/usr/foo.ts"), "../foo.ts");
        assert_eq!(segment("/usr/local/bin.ts", "/usr/foo.ts"), "../foo.ts");
    }

    #[test]
    fn test_sibling_with_shared_name_prefix() {
        assert_eq!(compatible("/usr/local/a.ts", "/usr/locale/b.ts"), "./../locale/b.ts");
        assert_eq!(segment("/usr/local/a.ts", "/usr/locale/b.ts"), "../locale/b.ts");
    }

    #[test]
    fn test_directory_index_target() {
        assert_eq!(compatible("/repo/src/App.tsx", "/repo/src/A/index.ts"), "./A/index.ts");
    }
}
