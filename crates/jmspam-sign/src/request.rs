use chrono::{DateTime, Utc};
use jmspam_core::Operation;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::signer::{sign, SignError};

/// RFC 3986 unreserved characters stay literal; everything else, space
/// included, escapes to `%XX`. Must match the server-side decoder.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Header names folded into the signing string, in signing order.
const SIGNED_HEADER_NAMES: [&str; 4] = ["(request-target)", "accept", "date", "x-jms-org"];

/// The `headers=` list carried in the `Authorization` value. Must name
/// exactly the lines of the signing string, in the same order.
pub const SIGNED_HEADERS: &str = "(request-target) accept date x-jms-org";

const ACCEPT: &str = "application/json";
const SOURCE: &str = "jms-pam";
const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// A fully specified outbound request, ready for any HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// Builds signed request descriptors for one endpoint and key.
///
/// Holds only resolved configuration; every [`build`](Self::build) call is
/// independent, so a builder can be shared across threads freely.
#[derive(Clone)]
pub struct RequestBuilder {
    base_url: String,
    key_id: String,
    secret: Vec<u8>,
    org_id: String,
}

impl std::fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("base_url", &self.base_url)
            .field("key_id", &self.key_id)
            .field("secret", &"<redacted>")
            .field("org_id", &self.org_id)
            .finish()
    }
}

impl RequestBuilder {
    pub fn new(
        base_url: impl Into<String>,
        key_id: impl Into<String>,
        secret: impl Into<Vec<u8>>,
        org_id: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            key_id: key_id.into(),
            secret: secret.into(),
            org_id: org_id.into(),
        }
    }

    /// Canonicalize `op`, sign it, and return the request descriptor.
    ///
    /// `now` is the only time source; output is byte-identical for a
    /// frozen `now`. On error no descriptor is produced.
    pub fn build(&self, op: &Operation, now: DateTime<Utc>) -> Result<RequestDescriptor, SignError> {
        if op.method().is_empty() {
            return Err(SignError::InvalidOperation("method is empty".into()));
        }
        if !op.path().starts_with('/') {
            return Err(SignError::InvalidOperation(format!(
                "path must start with '/': {}",
                op.path()
            )));
        }
        if self.org_id.is_empty() {
            return Err(SignError::InvalidOrg);
        }

        let query = encode_query(op.params())?;
        let request_target = match query.as_deref() {
            Some(q) => format!("{} {}?{}", op.method(), op.path(), q),
            None => format!("{} {}", op.method(), op.path()),
        };
        let date = now.format(IMF_FIXDATE).to_string();

        let signing_string = signing_string(&request_target, &date, &self.org_id);
        let token = sign(&signing_string, &self.secret)?;
        let authorization = format!(
            "Signature keyId=\"{}\",algorithm=\"hmac-sha256\",headers=\"{SIGNED_HEADERS}\",signature=\"{token}\"",
            self.key_id
        );

        let url = match query.as_deref() {
            Some(q) => format!("{}{}?{}", self.base_url, op.path(), q),
            None => format!("{}{}", self.base_url, op.path()),
        };

        Ok(RequestDescriptor {
            method: op.method().to_string(),
            url,
            headers: vec![
                ("Accept".into(), ACCEPT.into()),
                ("Date".into(), date),
                ("X-JMS-ORG".into(), self.org_id.clone()),
                ("X-Source".into(), SOURCE.into()),
                ("Authorization".into(), authorization),
            ],
        })
    }
}

/// Newline-joined signed header lines, no trailing newline. The line
/// order is [`SIGNED_HEADER_NAMES`].
fn signing_string(request_target: &str, date: &str, org_id: &str) -> String {
    let lines = [
        (SIGNED_HEADER_NAMES[0], request_target),
        (SIGNED_HEADER_NAMES[1], ACCEPT),
        (SIGNED_HEADER_NAMES[2], date),
        (SIGNED_HEADER_NAMES[3], org_id),
    ];
    lines
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Percent-encode and join query parameters, preserving input order.
/// Returns `None` for an empty query so callers can omit the `?` suffix.
fn encode_query(params: &[(String, String)]) -> Result<Option<String>, SignError> {
    if params.is_empty() {
        return Ok(None);
    }

    let mut parts = Vec::with_capacity(params.len());
    for (name, value) in params {
        if name.is_empty() {
            return Err(SignError::EncodingError("empty parameter name".into()));
        }
        if has_control_chars(name) || has_control_chars(value) {
            return Err(SignError::EncodingError(format!(
                "control character in parameter {name}"
            )));
        }
        parts.push(format!(
            "{}={}",
            utf8_percent_encode(name, QUERY_ENCODE_SET),
            utf8_percent_encode(value, QUERY_ENCODE_SET)
        ));
    }
    Ok(Some(parts.join("&")))
}

fn has_control_chars(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_control())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ORG: &str = "00000000-0000-0000-0000-000000000002";

    fn frozen_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 3, 11, 20, 0).unwrap()
    }

    fn secret_op() -> Operation {
        Operation::get("/api/v1/accounts/integration-applications/account-secret/")
            .query("asset", "ubuntu_docker")
            .query("account", "root")
    }

    fn builder() -> RequestBuilder {
        RequestBuilder::new("https://jms.example.com", "key-1", *b"test-secret", ORG)
    }

    #[test]
    fn headers_list_matches_signed_lines() {
        assert_eq!(SIGNED_HEADER_NAMES.join(" "), SIGNED_HEADERS);
    }

    #[test]
    fn signing_string_exact_bytes() {
        let target = "get /api/v1/accounts/integration-applications/account-secret/?asset=ubuntu_docker&account=root";
        let s = signing_string(target, "Tue, 03 Jun 2025 11:20:00 GMT", ORG);
        assert_eq!(
            s,
            "(request-target): get /api/v1/accounts/integration-applications/account-secret/?asset=ubuntu_docker&account=root\n\
             accept: application/json\n\
             date: Tue, 03 Jun 2025 11:20:00 GMT\n\
             x-jms-org: 00000000-0000-0000-0000-000000000002"
        );
    }

    #[test]
    fn known_signature_for_frozen_clock() {
        // HMAC-SHA256 of the signing string above, secret "test-secret".
        let descriptor = builder().build(&secret_op(), frozen_now()).unwrap();
        let auth = header(&descriptor, "Authorization");
        assert_eq!(
            auth,
            "Signature keyId=\"key-1\",algorithm=\"hmac-sha256\",\
             headers=\"(request-target) accept date x-jms-org\",\
             signature=\"DL1tloyniboMcxIhV8q4nooJZZFCvI/z2v5QA/1OUlk=\""
        );
    }

    #[test]
    fn descriptor_headers_and_url() {
        let descriptor = builder().build(&secret_op(), frozen_now()).unwrap();
        assert_eq!(descriptor.method, "get");
        assert_eq!(
            descriptor.url,
            "https://jms.example.com/api/v1/accounts/integration-applications/account-secret/?asset=ubuntu_docker&account=root"
        );
        assert_eq!(header(&descriptor, "Accept"), "application/json");
        assert_eq!(header(&descriptor, "Date"), "Tue, 03 Jun 2025 11:20:00 GMT");
        assert_eq!(header(&descriptor, "X-JMS-ORG"), ORG);
        assert_eq!(header(&descriptor, "X-Source"), "jms-pam");
    }

    #[test]
    fn build_is_deterministic_for_frozen_clock() {
        let b = builder();
        let first = b.build(&secret_op(), frozen_now()).unwrap();
        let second = b.build(&secret_op(), frozen_now()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_query_omits_question_mark() {
        let op = Operation::get("/api/v1/users/");
        let descriptor = builder().build(&op, frozen_now()).unwrap();
        assert_eq!(descriptor.url, "https://jms.example.com/api/v1/users/");
        assert!(!descriptor.url.contains('?'));
    }

    #[test]
    fn swapping_params_changes_signature() {
        let swapped = Operation::get("/api/v1/accounts/integration-applications/account-secret/")
            .query("account", "root")
            .query("asset", "ubuntu_docker");
        let b = builder();
        let a = b.build(&secret_op(), frozen_now()).unwrap();
        let c = b.build(&swapped, frozen_now()).unwrap();
        assert_ne!(header(&a, "Authorization"), header(&c, "Authorization"));
    }

    #[test]
    fn space_encodes_as_percent_20() {
        let op = Operation::get("/api/v1/assets/").query("name", "web server 01");
        let descriptor = builder().build(&op, frozen_now()).unwrap();
        assert!(descriptor.url.ends_with("?name=web%20server%2001"));
    }

    #[test]
    fn trailing_slash_trimmed_from_base_url() {
        let b = RequestBuilder::new("https://jms.example.com/", "key-1", *b"test-secret", ORG);
        let descriptor = b.build(&Operation::get("/api/v1/users/"), frozen_now()).unwrap();
        assert_eq!(descriptor.url, "https://jms.example.com/api/v1/users/");
    }

    #[test]
    fn empty_method_rejected() {
        let op = Operation::new("", "/api/v1/users/");
        assert!(matches!(
            builder().build(&op, frozen_now()),
            Err(SignError::InvalidOperation(_))
        ));
    }

    #[test]
    fn relative_path_rejected() {
        let op = Operation::get("api/v1/users/");
        assert!(matches!(
            builder().build(&op, frozen_now()),
            Err(SignError::InvalidOperation(_))
        ));
    }

    #[test]
    fn empty_org_rejected() {
        let b = RequestBuilder::new("https://jms.example.com", "key-1", *b"test-secret", "");
        assert!(matches!(
            b.build(&secret_op(), frozen_now()),
            Err(SignError::InvalidOrg)
        ));
    }

    #[test]
    fn empty_secret_rejected() {
        let b = RequestBuilder::new("https://jms.example.com", "key-1", Vec::new(), ORG);
        assert!(matches!(
            b.build(&secret_op(), frozen_now()),
            Err(SignError::InvalidKey)
        ));
    }

    #[test]
    fn control_chars_in_query_rejected() {
        let op = Operation::get("/api/v1/assets/").query("name", "a\nb");
        assert!(matches!(
            builder().build(&op, frozen_now()),
            Err(SignError::EncodingError(_))
        ));
    }

    #[test]
    fn debug_redacts_secret() {
        let printed = format!("{:?}", builder());
        assert!(!printed.contains("test-secret"));
        assert!(printed.contains("<redacted>"));
    }

    fn header<'a>(descriptor: &'a RequestDescriptor, name: &str) -> &'a str {
        descriptor
            .headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }
}
