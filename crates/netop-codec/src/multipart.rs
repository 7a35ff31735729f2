//! `multipart/form-data` bodies.

use uuid::Uuid;

use crate::attachment::Attachment;
use crate::error::Result;
use crate::params::{ParamValue, Params};

/// An encoded multipart body together with its boundary token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multipart {
    pub boundary: String,
    pub body:     Vec<u8>,
}

impl Multipart {
    /// Value for the request `Content-Type` header.
    pub fn content_type(&self) -> String { format!("multipart/form-data; boundary={}", self.boundary) }
}

/// Encode one part per parameter, then the attachment (if any) as a binary
/// part.
///
/// The boundary is random and regenerated until it does not occur in any
/// part payload.
pub fn encode_multipart(params: &Params, attachment: Option<&Attachment>) -> Result<Multipart> {
    let payload = attachment.map(Attachment::payload).transpose()?;

    let mut boundary = new_boundary();
    while collides(&boundary, params, payload.as_deref()) {
        boundary = new_boundary();
    }

    let mut body = Vec::new();
    for (name, value) in params {
        open_part(&mut body, &boundary);
        match value {
            ParamValue::Text(text) => {
                push_line(&mut body, &format!("Content-Disposition: form-data; name=\"{}\"", quote(name)));
                push_line(&mut body, "");
                body.extend_from_slice(text.as_bytes());
            }
            ParamValue::Binary {
                data,
                file_name,
                content_type,
            } => {
                let file_name = file_name.as_deref().unwrap_or(name);
                push_line(
                    &mut body,
                    &format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"",
                        quote(name),
                        quote(file_name)
                    ),
                );
                push_line(
                    &mut body,
                    &format!(
                        "Content-Type: {}",
                        content_type.as_deref().unwrap_or("application/octet-stream")
                    ),
                );
                push_line(&mut body, "");
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }

    if let (Some(attachment), Some(payload)) = (attachment, payload) {
        open_part(&mut body, &boundary);
        push_line(
            &mut body,
            &format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"",
                quote(attachment.field()),
                quote(attachment.file())
            ),
        );
        push_line(&mut body, &format!("Content-Type: {}", attachment.content_type()));
        push_line(&mut body, "Content-Transfer-Encoding: binary");
        push_line(&mut body, "");
        body.extend_from_slice(&payload);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(b"--");
    body.extend_from_slice(boundary.as_bytes());
    body.extend_from_slice(b"--\r\n");

    Ok(Multipart { boundary, body })
}

fn new_boundary() -> String { format!("netop-{}", Uuid::new_v4().simple()) }

fn collides(boundary: &str, params: &Params, payload: Option<&[u8]>) -> bool {
    let needle = boundary.as_bytes();
    let contains = |haystack: &[u8]| haystack.windows(needle.len()).any(|window| window == needle);

    params.values().any(|value| match value {
        ParamValue::Text(text) => contains(text.as_bytes()),
        ParamValue::Binary { data, .. } => contains(data),
    }) || payload.is_some_and(contains)
}

fn open_part(body: &mut Vec<u8>, boundary: &str) {
    body.extend_from_slice(b"--");
    body.extend_from_slice(boundary.as_bytes());
    body.extend_from_slice(b"\r\n");
}

fn push_line(body: &mut Vec<u8>, line: &str) {
    body.extend_from_slice(line.as_bytes());
    body.extend_from_slice(b"\r\n");
}

fn quote(value: &str) -> String { value.replace('\\', "\\\\").replace('"', "\\\"") }

#[cfg(test)]
mod tests {
    use super::*;

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|window| window == needle)
    }

    #[test]
    fn test_text_parts_and_closing_boundary() {
        let mut params = Params::new();
        params.insert("caption".to_string(), "hello".into());
        params.insert("album".to_string(), "trip".into());

        let multipart = encode_multipart(&params, None).unwrap();
        let body = String::from_utf8(multipart.body.clone()).unwrap();
        let b = &multipart.boundary;

        let expected = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"album\"\r\n\r\ntrip\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"caption\"\r\n\r\nhello\r\n\
             --{b}--\r\n"
        );
        assert_eq!(body, expected);
        assert_eq!(multipart.content_type(), format!("multipart/form-data; boundary={b}"));
    }

    #[test]
    fn test_attachment_part_is_last_and_unchanged() {
        let jpeg = vec![0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10, 0xff, 0xd9];
        let attachment = Attachment::jpeg(jpeg.clone(), 0.8);
        let mut params = Params::new();
        params.insert("user".to_string(), "42".into());

        let multipart = encode_multipart(&params, Some(&attachment)).unwrap();

        let header = b"Content-Type: image/jpeg\r\nContent-Transfer-Encoding: binary\r\n\r\n";
        let start = find(&multipart.body, header).unwrap() + header.len();
        assert_eq!(&multipart.body[start..start + jpeg.len()], jpeg.as_slice());
        assert!(find(&multipart.body, b"name=\"image\"; filename=\"image.jpg\"").unwrap() > find(&multipart.body, b"name=\"user\"").unwrap());
        assert!(multipart.body.ends_with(format!("--{}--\r\n", multipart.boundary).as_bytes()));
    }

    #[test]
    fn test_binary_param_defaults() {
        let mut params = Params::new();
        params.insert("blob".to_string(), ParamValue::binary(vec![1, 2, 3]));

        let multipart = encode_multipart(&params, None).unwrap();
        assert!(find(&multipart.body, b"name=\"blob\"; filename=\"blob\"\r\nContent-Type: application/octet-stream\r\n\r\n\x01\x02\x03\r\n").is_some());
    }

    #[test]
    fn test_boundaries_are_unique() {
        let first = encode_multipart(&Params::new(), None).unwrap();
        let second = encode_multipart(&Params::new(), None).unwrap();
        assert_ne!(first.boundary, second.boundary);
    }

    #[test]
    fn test_field_names_are_quoted() {
        let mut params = Params::new();
        params.insert("a\"b".to_string(), "v".into());
        let multipart = encode_multipart(&params, None).unwrap();
        assert!(find(&multipart.body, b"name=\"a\\\"b\"").is_some());
    }
}
