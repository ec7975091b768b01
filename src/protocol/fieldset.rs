//! Fieldset tokens: the builder that writes them and the cursor that reads
//! them back.
//!
//! Token rules (both directions):
//! - absent value -> empty token
//! - bool -> `"1"` / `"0"`
//! - number -> shortest decimal string
//! - string -> as-is
//! - flat tag/value map -> `"k=v;"` pairs in one token
//!
//! There are no per-field tags or lengths. Encode and decode must agree on
//! field order and on every version guard, or every later field in the frame
//! is misread.

use crate::error::{Result, TwsError};

/// One decoded inbound payload: the NUL-split tokens, trailing empty token
/// already removed.
pub type Fieldset = Vec<String>;

/// Serialize a fieldset into one length-prefixed frame.
pub fn encode_frame(fields: &[String]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(fields.iter().map(|f| f.len() + 1).sum());
    for field in fields {
        payload.extend_from_slice(field.as_bytes());
        payload.push(0);
    }

    let mut out = Vec::with_capacity(4 + payload.len());
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(&payload);
    out
}

/// Serialize a bare string (no trailing NUL) into one length-prefixed frame.
///
/// Only the handshake version-range string uses this shape.
pub fn encode_string_frame(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + s.len());
    out.extend_from_slice(&(s.len() as u32).to_be_bytes());
    out.extend_from_slice(s.as_bytes());
    out
}

/// Builder for outbound fieldsets with one typed push method per token rule.
#[derive(Debug, Default)]
pub struct FieldsetBuilder {
    fields: Vec<String>,
}

impl FieldsetBuilder {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn push_str(&mut self, v: &str) -> &mut Self {
        self.fields.push(v.to_string());
        self
    }

    pub fn push_string(&mut self, v: String) -> &mut Self {
        self.fields.push(v);
        self
    }

    pub fn push_int(&mut self, v: i64) -> &mut Self {
        self.fields.push(v.to_string());
        self
    }

    pub fn push_i32(&mut self, v: i32) -> &mut Self {
        self.fields.push(v.to_string());
        self
    }

    pub fn push_opt_int(&mut self, v: Option<i64>) -> &mut Self {
        match v {
            Some(v) => self.push_int(v),
            None => self.push_empty(),
        }
    }

    pub fn push_float(&mut self, v: f64) -> &mut Self {
        self.fields.push(format_float(v));
        self
    }

    pub fn push_opt_float(&mut self, v: Option<f64>) -> &mut Self {
        match v {
            Some(v) => self.push_float(v),
            None => self.push_empty(),
        }
    }

    pub fn push_bool(&mut self, v: bool) -> &mut Self {
        self.fields.push(if v { "1" } else { "0" }.to_string());
        self
    }

    /// Tri-state bool: absent -> empty token.
    pub fn push_opt_bool(&mut self, v: Option<bool>) -> &mut Self {
        match v {
            Some(v) => self.push_bool(v),
            None => self.push_empty(),
        }
    }

    pub fn push_empty(&mut self) -> &mut Self {
        self.fields.push(String::new());
        self
    }

    /// Flat tag/value map, serialized as a single `"k=v;"` token.
    pub fn push_tags(&mut self, tags: &[(String, String)]) -> &mut Self {
        let mut out = String::new();
        for (tag, value) in tags {
            out.push_str(tag);
            out.push('=');
            out.push_str(value);
            out.push(';');
        }
        self.fields.push(out);
        self
    }

    pub fn into_fields(self) -> Vec<String> {
        self.fields
    }
}

fn format_float(v: f64) -> String {
    // `Display` for f64 already prints 45.0 as "45".
    format!("{}", v)
}

/// Sequential reader over an inbound fieldset.
///
/// Decoders consume tokens strictly in order; a missing token is a protocol
/// error rather than a silent default, because position is the only framing.
#[derive(Debug)]
pub struct FieldCursor<'a> {
    fields: &'a [String],
    pos: usize,
}

impl<'a> FieldCursor<'a> {
    pub fn new(fields: &'a [String]) -> Self {
        Self { fields, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.fields.len().saturating_sub(self.pos)
    }

    pub fn next_str(&mut self) -> Result<&'a str> {
        let field = self
            .fields
            .get(self.pos)
            .ok_or_else(|| TwsError::Protocol("unexpected end of fieldset".into()))?;
        self.pos += 1;
        Ok(field)
    }

    pub fn next_string(&mut self) -> Result<String> {
        self.next_str().map(str::to_string)
    }

    pub fn skip(&mut self) -> Result<()> {
        self.next_str().map(|_| ())
    }

    /// Integer token; an empty token reads as 0.
    pub fn next_int(&mut self) -> Result<i64> {
        let raw = self.next_str()?;
        if raw.is_empty() {
            return Ok(0);
        }
        raw.parse().map_err(|_| TwsError::bad_token("integer", raw))
    }

    pub fn next_i32(&mut self) -> Result<i32> {
        let raw = self.next_str()?;
        if raw.is_empty() {
            return Ok(0);
        }
        raw.parse().map_err(|_| TwsError::bad_token("integer", raw))
    }

    /// Integer token; an empty token reads as absent.
    pub fn next_opt_int(&mut self) -> Result<Option<i64>> {
        let raw = self.next_str()?;
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse()
            .map(Some)
            .map_err(|_| TwsError::bad_token("integer", raw))
    }

    /// Float token; an empty token reads as 0.
    pub fn next_float(&mut self) -> Result<f64> {
        let raw = self.next_str()?;
        if raw.is_empty() {
            return Ok(0.0);
        }
        raw.parse().map_err(|_| TwsError::bad_token("float", raw))
    }

    /// Float token; an empty token reads as absent.
    pub fn next_opt_float(&mut self) -> Result<Option<f64>> {
        let raw = self.next_str()?;
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse()
            .map(Some)
            .map_err(|_| TwsError::bad_token("float", raw))
    }

    /// Bool token: `"1"` is true, anything else is false.
    pub fn next_bool(&mut self) -> Result<bool> {
        Ok(self.next_str()? == "1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_frame_layout() {
        let fields = vec!["71".to_string(), "2".to_string(), "1".to_string(), String::new()];
        let bytes = encode_frame(&fields);

        // 4-byte BE length prefix over "71\0" "2\0" "1\0" "\0"
        let payload_len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        assert_eq!(payload_len as usize, bytes.len() - 4);
        assert_eq!(&bytes[4..], b"71\x002\x001\x00\x00");
    }

    #[test]
    fn test_encode_string_frame_no_trailing_nul() {
        let bytes = encode_string_frame("v100..151");
        assert_eq!(&bytes[..4], &9u32.to_be_bytes());
        assert_eq!(&bytes[4..], b"v100..151");
    }

    #[test]
    fn test_builder_token_rules() {
        let mut b = FieldsetBuilder::new();
        b.push_str("BUY")
            .push_int(100)
            .push_float(1.5)
            .push_float(45.0)
            .push_bool(true)
            .push_bool(false)
            .push_empty()
            .push_opt_float(None)
            .push_opt_bool(None)
            .push_tags(&[("key".into(), "value".into()), ("k2".into(), "v2".into())]);

        assert_eq!(
            b.into_fields(),
            vec!["BUY", "100", "1.5", "45", "1", "0", "", "", "", "key=value;k2=v2;"]
        );
    }

    #[test]
    fn test_cursor_typed_reads() {
        let fields: Vec<String> = ["42", "3.25", "1", "0", "", "text"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut cur = FieldCursor::new(&fields);

        assert_eq!(cur.next_int().unwrap(), 42);
        assert_eq!(cur.next_float().unwrap(), 3.25);
        assert!(cur.next_bool().unwrap());
        assert!(!cur.next_bool().unwrap());
        assert_eq!(cur.next_opt_float().unwrap(), None);
        assert_eq!(cur.next_str().unwrap(), "text");
        assert_eq!(cur.remaining(), 0);
    }

    #[test]
    fn test_cursor_empty_numeric_defaults() {
        let fields: Vec<String> = ["", ""].iter().map(|s| s.to_string()).collect();
        let mut cur = FieldCursor::new(&fields);
        assert_eq!(cur.next_int().unwrap(), 0);
        assert_eq!(cur.next_float().unwrap(), 0.0);
    }

    #[test]
    fn test_cursor_past_end_is_protocol_error() {
        let fields: Vec<String> = vec!["1".to_string()];
        let mut cur = FieldCursor::new(&fields);
        cur.skip().unwrap();
        assert!(matches!(cur.next_str(), Err(TwsError::Protocol(_))));
    }

    #[test]
    fn test_cursor_bad_number_is_protocol_error() {
        let fields: Vec<String> = vec!["abc".to_string()];
        let mut cur = FieldCursor::new(&fields);
        assert!(matches!(cur.next_int(), Err(TwsError::Protocol(_))));
    }

    #[test]
    fn test_builder_cursor_round_trip() {
        let mut b = FieldsetBuilder::new();
        b.push_int(7).push_str("SMART").push_bool(true).push_opt_float(Some(0.5));
        let fields = b.into_fields();

        let mut cur = FieldCursor::new(&fields);
        assert_eq!(cur.next_int().unwrap(), 7);
        assert_eq!(cur.next_str().unwrap(), "SMART");
        assert!(cur.next_bool().unwrap());
        assert_eq!(cur.next_opt_float().unwrap(), Some(0.5));
    }
}
