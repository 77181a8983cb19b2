/* 📖 # multipart/form-data uploads

Browsers upload files as `multipart/form-data`: parts separated by
`--<boundary>` lines, each with its own headers and a blank line before the
data. Only what the upload form needs is understood here: the
`Content-Disposition` name and filename. Other part headers are ignored.
*/

use commentary_base::{CommentaryResult, bail, err};

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartPart {
    /// Form field name.
    pub name: Option<String>,
    /// Present for file uploads.
    pub file_name: Option<String>,
    pub data: Vec<u8>,
}

/// The `boundary` parameter of a `multipart/form-data` content type.
pub fn boundary_from_content_type(content_type: &str) -> Option<String> {
    let mut params = content_type.split(';');
    let media_type = params.next()?.trim();
    if !media_type.eq_ignore_ascii_case("multipart/form-data") {
        return None;
    }
    params.find_map(|param| {
        let (name, value) = param.trim().split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("boundary")
            .then(|| unquote(value.trim()).to_string())
            .filter(|boundary| !boundary.is_empty())
    })
}

/// Split a multipart body into its parts.
pub fn parse_multipart(body: &[u8], boundary: &str) -> CommentaryResult<Vec<MultipartPart>> {
    let delimiter = format!("--{}", boundary).into_bytes();
    let closing = [b"\r\n".as_slice(), &delimiter].concat();

    let Some(mut position) = find(body, &delimiter, 0) else {
        bail!("multipart body does not contain boundary '{}'", boundary);
    };
    let mut parts = Vec::new();
    loop {
        position += delimiter.len();
        let rest = &body[position..];
        if rest.starts_with(b"--") {
            return Ok(parts);
        }
        if !rest.starts_with(b"\r\n") {
            bail!("malformed multipart boundary line");
        }
        position += 2;

        let (headers, data_start) = if body[position..].starts_with(b"\r\n") {
            ("", position + 2)
        } else {
            let Some(header_end) = find(body, b"\r\n\r\n", position) else {
                bail!("multipart part headers are not terminated");
            };
            let headers = std::str::from_utf8(&body[position..header_end])
                .map_err(|_| err!("multipart part headers are not valid UTF-8"))?;
            (headers, header_end + 4)
        };

        let Some(data_end) = find(body, &closing, data_start) else {
            bail!("multipart part is not terminated by a boundary");
        };
        parts.push(parse_part(headers, body[data_start..data_end].to_vec()));
        position = data_end + 2;
    }
}

fn parse_part(headers: &str, data: Vec<u8>) -> MultipartPart {
    let mut part = MultipartPart {
        name: None,
        file_name: None,
        data,
    };
    for line in headers.split("\r\n") {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case("content-disposition") {
            continue;
        }
        for param in value.split(';').skip(1) {
            let Some((key, raw)) = param.trim().split_once('=') else {
                continue;
            };
            let value = unquote(raw.trim()).to_string();
            match key.trim().to_ascii_lowercase().as_str() {
                "name" => part.name = Some(value),
                "filename" => part.file_name = Some(value),
                _ => {}
            }
        }
    }
    part
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}
