/// One part of a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq)]
pub struct Part<'a> {
    /// `name` parameter of the part's Content-Disposition.
    pub name: Option<String>,
    /// `filename` parameter; `Some("")` when the browser sent no file.
    pub filename: Option<String>,
    pub data: &'a [u8],
}

/// Returns the index of the first occurrence of `needle` in `haystack`.
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Splits `haystack` on every occurrence of `needle`.
pub fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut result = Vec::new();
    let mut start = 0;
    while start <= haystack.len() {
        if let Some(pos) = find_subsequence(&haystack[start..], needle) {
            result.push(&haystack[start..start + pos]);
            start += pos + needle.len();
        } else {
            result.push(&haystack[start..]);
            break;
        }
    }
    result
}

/// Extracts the boundary from a `multipart/form-data; boundary=...`
/// Content-Type. Returns `None` for any other media type.
pub fn extract_boundary(content_type: &str) -> Option<String> {
    let mut params = split_params(content_type).into_iter();
    let media_type = params.next()?;
    if !media_type.trim().eq_ignore_ascii_case("multipart/form-data") {
        return None;
    }
    params
        .filter_map(|p| p.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| unquote(value.trim()).to_owned())
        .filter(|b| !b.is_empty())
}

/// Parses every part of a multipart body delimited by `boundary`.
///
/// Parts without a header/body separator are ignored. Parsing stops at the
/// closing `--boundary--` delimiter.
pub fn parse_parts<'a>(body: &'a [u8], boundary: &str) -> Vec<Part<'a>> {
    let delimiter = format!("--{}", boundary);
    let mut parts = Vec::new();

    // The first piece is the preamble before the opening delimiter.
    for piece in split_on(body, delimiter.as_bytes()).into_iter().skip(1) {
        if piece.starts_with(b"--") {
            break;
        }
        let piece = piece.strip_prefix(b"\r\n").unwrap_or(piece);
        let sep = b"\r\n\r\n";
        let Some(sep_pos) = find_subsequence(piece, sep) else {
            continue;
        };

        let headers = String::from_utf8_lossy(&piece[..sep_pos]);
        let raw = &piece[sep_pos + sep.len()..];
        let data = raw.strip_suffix(b"\r\n").unwrap_or(raw);

        let (name, filename) = headers
            .split("\r\n")
            .filter_map(|line| line.split_once(':'))
            .find(|(field, _)| field.trim().eq_ignore_ascii_case("Content-Disposition"))
            .map(|(_, value)| parse_disposition(value))
            .unwrap_or((None, None));

        parts.push(Part { name, filename, data });
    }
    parts
}

/// Finds the uploaded file sent under form field `field`.
///
/// Only parts that carry a `filename` parameter count as files; a plain
/// form field with the same name is skipped. Non-multipart requests have no
/// file parts.
pub fn find_file_part<'a>(content_type: Option<&str>, body: &'a [u8], field: &str) -> Option<Part<'a>> {
    let boundary = extract_boundary(content_type?)?;
    parse_parts(body, &boundary)
        .into_iter()
        .find(|p| p.name.as_deref() == Some(field) && p.filename.is_some())
}

/// `(name, filename)` from a Content-Disposition value such as
/// `form-data; name="file"; filename="chest.png"`.
fn parse_disposition(value: &str) -> (Option<String>, Option<String>) {
    let mut name = None;
    let mut filename = None;
    for param in split_params(value).into_iter().skip(1) {
        let Some((key, val)) = param.split_once('=') else {
            continue;
        };
        let val = unquote(val.trim()).to_owned();
        match key.trim().to_ascii_lowercase().as_str() {
            "name" => name = Some(val),
            "filename" => filename = Some(val),
            _ => {}
        }
    }
    (name, filename)
}

/// Splits a header value on `;`, ignoring separators inside double quotes.
fn split_params(value: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                params.push(value[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    params.push(value[start..].trim());
    params
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::test_support::{content_type, form_body};

    #[test]
    fn boundary_requires_form_data_media_type() {
        assert_eq!(
            extract_boundary("multipart/form-data; boundary=abc123").as_deref(),
            Some("abc123")
        );
        assert_eq!(
            extract_boundary("Multipart/Form-Data; Boundary=\"quoted;b\"").as_deref(),
            Some("quoted;b")
        );
        assert_eq!(extract_boundary("application/json"), None);
        assert_eq!(extract_boundary("multipart/form-data"), None);
    }

    #[test]
    fn parts_keep_binary_payloads_intact() {
        let payload: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x00, 0xff];
        let body = form_body(&[("note", None, b"hi"), ("file", Some("x.png"), payload)]);
        let parts = parse_parts(&body, test_support::BOUNDARY);

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].name.as_deref(), Some("note"));
        assert_eq!(parts[0].filename, None);
        assert_eq!(parts[0].data, b"hi");
        assert_eq!(parts[1].filename.as_deref(), Some("x.png"));
        assert_eq!(parts[1].data, payload);
    }

    #[test]
    fn file_part_needs_matching_name_and_filename() {
        let ct = content_type();

        let body = form_body(&[("file", Some("scan.jpg"), b"data")]);
        let part = find_file_part(Some(&ct), &body, "file").unwrap();
        assert_eq!(part.data, b"data");

        // A plain field called "file" is not an upload.
        let body = form_body(&[("file", None, b"data")]);
        assert!(find_file_part(Some(&ct), &body, "file").is_none());

        // filename="file" on another field must not match name="file".
        let body = form_body(&[("image", Some("file"), b"data")]);
        assert!(find_file_part(Some(&ct), &body, "file").is_none());
    }

    #[test]
    fn empty_filename_is_still_a_file_part() {
        let body = form_body(&[("file", Some(""), b"")]);
        let part = find_file_part(Some(&content_type()), &body, "file").unwrap();
        assert_eq!(part.filename.as_deref(), Some(""));
    }

    #[test]
    fn non_multipart_requests_have_no_file_part() {
        let body = form_body(&[("file", Some("scan.jpg"), b"data")]);
        assert!(find_file_part(None, &body, "file").is_none());
        assert!(find_file_part(Some("application/octet-stream"), &body, "file").is_none());
    }

    #[test]
    fn disposition_params_may_contain_semicolons_in_quotes() {
        let (name, filename) = parse_disposition(r#"form-data; name="file"; filename="a;b.png""#);
        assert_eq!(name.as_deref(), Some("file"));
        assert_eq!(filename.as_deref(), Some("a;b.png"));
    }
}
