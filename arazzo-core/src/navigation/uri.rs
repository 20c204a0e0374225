use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const FILE_SCHEME: &str = "file://";

// RFC 3986 unreserved characters and `/` pass through.
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

fn has_drive_prefix(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes.len() == 2 || bytes[2] == b'/' || bytes[2] == b'\\')
}

fn is_absolute_path(value: &str) -> bool {
    value.starts_with('/') || has_drive_prefix(value) || Path::new(value).is_absolute()
}

/// `/tmp/a b.yaml` -> `file:///tmp/a%20b.yaml`, `C:\a\b.yaml` -> `file:///c%3A/a/b.yaml`.
pub fn path_to_uri(path: &Path) -> Result<String> {
    let raw = path.to_string_lossy();
    if !is_absolute_path(&raw) {
        return Err(Error::InvalidUri(format!(
            "path '{}' is not absolute",
            path.display()
        )));
    }

    // Drives are written the way editors send them: `file:///c%3A/...`.
    if has_drive_prefix(&raw) {
        let (drive, rest) = raw.split_at(2);
        let letter = drive[..1].to_ascii_lowercase();
        let rest = rest.replace('\\', "/");
        let rest = if rest.is_empty() { "/".to_owned() } else { rest };
        return Ok(format!(
            "{FILE_SCHEME}/{letter}%3A{}",
            utf8_percent_encode(&rest, PATH_ENCODE_SET)
        ));
    }

    Ok(format!(
        "{FILE_SCHEME}{}",
        utf8_percent_encode(&raw, PATH_ENCODE_SET)
    ))
}

/// Accepts `file://` URIs (with an empty or `localhost` authority) and bare
/// absolute paths. Drive letters may arrive as `C:` or `c%3A`.
pub fn uri_to_path(uri: &str) -> Result<PathBuf> {
    let trimmed = uri.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidUri("empty uri".to_owned()));
    }

    let Some(rest) = trimmed.strip_prefix(FILE_SCHEME) else {
        if is_absolute_path(trimmed) {
            return Ok(PathBuf::from(trimmed));
        }
        return Err(Error::InvalidUri(format!(
            "'{trimmed}' is neither a file:// uri nor an absolute path"
        )));
    };

    let rest = rest.strip_prefix("localhost").unwrap_or(rest);
    if !rest.starts_with('/') {
        return Err(Error::InvalidUri(format!(
            "'{trimmed}' names a remote host; only local file uris are supported"
        )));
    }

    let decoded = percent_decode_str(rest)
        .decode_utf8()
        .map_err(|err| Error::InvalidUri(format!("'{trimmed}' is not valid UTF-8: {err}")))?;

    if let Some(windows) = decoded.strip_prefix('/').filter(|tail| has_drive_prefix(tail)) {
        return Ok(PathBuf::from(native_drive_path(windows)));
    }

    Ok(PathBuf::from(decoded.into_owned()))
}

#[cfg(windows)]
fn native_drive_path(path: &str) -> String {
    path.replace('/', "\\")
}

#[cfg(not(windows))]
fn native_drive_path(path: &str) -> String {
    path.to_owned()
}

/// One spelling per file: `localhost` authorities, drive-letter variants and
/// escape case all collapse to what `path_to_uri` produces.
pub fn canonical_uri(uri: &str) -> Result<String> {
    path_to_uri(&uri_to_path(uri)?)
}

/// `canonical_uri`, or the input unchanged when it is not a file uri.
pub fn uri_key(uri: &str) -> String {
    canonical_uri(uri).unwrap_or_else(|_| uri.to_owned())
}

pub fn file_name(uri: &str) -> String {
    uri_to_path(uri)
        .ok()
        .and_then(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| {
            uri.rsplit('/')
                .next()
                .unwrap_or(uri)
                .to_owned()
        })
}

#[cfg(test)]
mod tests {
    use super::{canonical_uri, file_name, path_to_uri, uri_key, uri_to_path};
    use std::path::{Path, PathBuf};

    #[test]
    fn encodes_reserved_characters() {
        let uri = path_to_uri(Path::new("/work/my specs/pet#store.yaml")).expect("valid path");
        assert_eq!(uri, "file:///work/my%20specs/pet%23store.yaml");
    }

    #[test]
    fn uri_round_trips_through_path() {
        for uri in [
            "file:///work/my%20specs/petstore.yaml",
            "file:///tmp/a%2Bb/%C3%A9t%C3%A9.json",
            "file:///plain/path.yml",
            "file:///c%3A/specs/my%20api.yaml",
        ] {
            let path = uri_to_path(uri).expect("valid uri");
            assert_eq!(path_to_uri(&path).expect("valid path"), uri);
        }
    }

    #[test]
    fn path_round_trips_through_uri() {
        for raw in ["/work/my specs/petstore.yaml", "/tmp/100% real/x.json", "/"] {
            let path = PathBuf::from(raw);
            let uri = path_to_uri(&path).expect("valid path");
            assert_eq!(uri_to_path(&uri).expect("valid uri"), path);
        }
    }

    #[cfg(not(windows))]
    #[test]
    fn normalizes_both_drive_letter_conventions() {
        assert_eq!(
            uri_to_path("file:///C:/specs/api.yaml").expect("valid uri"),
            PathBuf::from("C:/specs/api.yaml")
        );
        assert_eq!(
            uri_to_path("file:///c%3A/specs/api.yaml").expect("valid uri"),
            PathBuf::from("c:/specs/api.yaml")
        );
        assert_eq!(
            path_to_uri(Path::new(r"C:\specs\my api.yaml")).expect("valid path"),
            "file:///c%3A/specs/my%20api.yaml"
        );
    }

    #[test]
    fn equivalent_uris_share_one_canonical_form() {
        for variant in [
            "file:///c%3A/specs/my%20api.yaml",
            "file:///C:/specs/my%20api.yaml",
            "file:///c:/specs/my%20api.yaml",
            "file://localhost/c%3A/specs/my%20api.yaml",
        ] {
            assert_eq!(
                canonical_uri(variant).expect("valid uri"),
                "file:///c%3A/specs/my%20api.yaml",
                "{variant}"
            );
        }

        assert_eq!(
            canonical_uri("file:///tmp/a%2bb.json").expect("valid uri"),
            "file:///tmp/a%2Bb.json"
        );
        assert_eq!(
            canonical_uri("file://localhost/srv/a.yaml").expect("valid uri"),
            "file:///srv/a.yaml"
        );
        assert_eq!(uri_key("untitled:Untitled-1"), "untitled:Untitled-1");
    }

    #[test]
    fn accepts_localhost_authority_and_bare_paths() {
        assert_eq!(
            uri_to_path("file://localhost/srv/a.yaml").expect("valid uri"),
            PathBuf::from("/srv/a.yaml")
        );
        assert_eq!(
            uri_to_path("/srv/a.yaml").expect("absolute path"),
            PathBuf::from("/srv/a.yaml")
        );
    }

    #[test]
    fn rejects_unrecognized_inputs() {
        for input in ["", "untitled:Untitled-1", "https://example.com/a.yaml", "relative/a.yaml", "file://server/share/a.yaml"] {
            let error = uri_to_path(input).expect_err("input should be rejected");
            assert!(error.to_string().starts_with("invalid uri"), "{input}");
        }
        assert!(path_to_uri(Path::new("relative.yaml")).is_err());
    }

    #[test]
    fn file_name_is_decoded() {
        assert_eq!(file_name("file:///work/pet%20store.yaml"), "pet store.yaml");
    }
}
