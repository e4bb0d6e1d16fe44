//! transport::multipart
//!
//! `multipart/form-data` encoding for content uploads.

const CRLF: &[u8] = b"\r\n";

/// A file part attached to a multipart body.
#[derive(Debug, Clone)]
pub struct FilePart<'a> {
    /// Media type of the content.
    pub mime_type: &'a str,
    /// Raw bytes.
    pub data: &'a [u8],
}

/// Encode form fields and an optional file into a multipart body.
///
/// Every field becomes a `text/plain; charset=utf-8` part. The file part is
/// named `content` and takes its filename from the `cmis:name` property
/// value when one is among the fields.
///
/// Returns `(content_type, body)`.
pub fn encode(fields: &[(String, String)], file: Option<FilePart<'_>>) -> (String, Vec<u8>) {
    let boundary = format!("cmisclient{}", uuid::Uuid::new_v4().simple());
    encode_with_boundary(fields, file, &boundary)
}

pub(crate) fn encode_with_boundary(
    fields: &[(String, String)],
    file: Option<FilePart<'_>>,
    boundary: &str,
) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    let mut file_name = None;

    for (idx, (name, value)) in fields.iter().enumerate() {
        // propertyId[n] = cmis:name pairs with propertyValue[n]
        if value == "cmis:name" {
            if let Some(suffix) = name.strip_prefix("propertyId") {
                let value_key = format!("propertyValue{}", suffix);
                file_name = fields
                    .iter()
                    .skip(idx)
                    .find(|(k, _)| *k == value_key)
                    .map(|(_, v)| v.clone());
            }
        }
        body.extend_from_slice(format!("--{}", boundary).as_bytes());
        body.extend_from_slice(CRLF);
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"", name).as_bytes(),
        );
        body.extend_from_slice(CRLF);
        body.extend_from_slice(b"Content-Type: text/plain; charset=utf-8");
        body.extend_from_slice(CRLF);
        body.extend_from_slice(CRLF);
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(CRLF);
    }

    if let Some(file) = file {
        let file_name = file_name.unwrap_or_else(|| "content".to_string());
        body.extend_from_slice(format!("--{}", boundary).as_bytes());
        body.extend_from_slice(CRLF);
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"content\"; filename=\"{}\"",
                file_name.replace('"', "%22")
            )
            .as_bytes(),
        );
        body.extend_from_slice(CRLF);
        body.extend_from_slice(format!("Content-Type: {}", file.mime_type).as_bytes());
        body.extend_from_slice(CRLF);
        body.extend_from_slice(b"Content-Transfer-Encoding: binary");
        body.extend_from_slice(CRLF);
        body.extend_from_slice(CRLF);
        body.extend_from_slice(file.data);
        body.extend_from_slice(CRLF);
    }

    body.extend_from_slice(format!("--{}--", boundary).as_bytes());
    body.extend_from_slice(CRLF);

    (format!("multipart/form-data; boundary={}", boundary), body)
}
