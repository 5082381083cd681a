//! Request signing and webhook signature verification.
//!
//! Both directions sign the same way: the top-level keys of the JSON object
//! are sorted byte-wise, the object is re-encoded the way the provider's SDK
//! encodes it (`/` as `\/`, non-ASCII as `\uXXXX`, nested objects in
//! document order) and the bytes are HMAC-SHA256'd into lowercase hex.

use std::io;

use hmac::{Hmac, Mac};
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Field name the request signature is attached under.
pub const SIGNATURE_FIELD: &str = "signature";

/// JSON formatter matching the provider SDK's default string escaping.
struct SdkFormatter;

impl serde_json::ser::Formatter for SdkFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            if ch == '/' || !ch.is_ascii() {
                writer.write_all(&fragment.as_bytes()[start..i])?;
                if ch == '/' {
                    writer.write_all(b"\\/")?;
                } else {
                    let mut units = [0u16; 2];
                    for unit in ch.encode_utf16(&mut units) {
                        write!(writer, "\\u{:04x}", unit)?;
                    }
                }
                start = i + ch.len_utf8();
            }
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}

/// Encodes `value` in signing form.
///
/// Only the top level of an object is sorted.
pub fn canonical_json(value: &Value) -> Result<String, serde_json::Error> {
    let sorted;
    let value = match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
            sorted = Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect::<Map<String, Value>>(),
            );
            &sorted
        }
        other => other,
    };

    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, SdkFormatter);
    value.serialize(&mut ser)?;
    // The formatter only ever writes valid UTF-8.
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// HMAC-SHA256 of `payload` with `secret`, hex-encoded.
pub fn hmac_hex(payload: &[u8], secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Computes the signature of a JSON object.
pub fn sign_payload(value: &Value, secret: &str) -> Result<String, serde_json::Error> {
    Ok(hmac_hex(canonical_json(value)?.as_bytes(), secret))
}

/// Drops top-level `null` fields, signs the rest, and attaches the signature.
pub fn sign_request(mut value: Value, secret: &str) -> Result<Value, serde_json::Error> {
    if let Value::Object(map) = &mut value {
        map.retain(|_, v| !v.is_null());
    }
    let signature = sign_payload(&value, secret)?;
    if let Value::Object(map) = &mut value {
        map.insert(SIGNATURE_FIELD.to_string(), Value::String(signature));
    }
    Ok(value)
}

/// Constant-time comparison of two signatures.
pub fn signatures_match(expected: &str, received: &str) -> bool {
    expected.as_bytes().ct_eq(received.as_bytes()).into()
}

/// Verifies a webhook signature using constant-time comparison.
pub fn verify_payload(value: &Value, signature: &str, secret: &str) -> bool {
    match sign_payload(value, secret) {
        Ok(expected) => signatures_match(&expected, signature),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_top_level_keys_are_sorted() {
        let value: Value = serde_json::from_str(r#"{"b":1,"a":{"z":1,"y":2},"C":true}"#).unwrap();
        assert_eq!(
            canonical_json(&value).unwrap(),
            r#"{"C":true,"a":{"z":1,"y":2},"b":1}"#
        );
    }

    #[test]
    fn test_sdk_escaping() {
        let value = json!({ "url": "https://x.ru/a", "comment": "Счёт 1" });
        assert_eq!(
            canonical_json(&value).unwrap(),
            r#"{"comment":"\u0421\u0447\u0451\u0442 1","url":"https:\/\/x.ru\/a"}"#
        );
    }

    #[test]
    fn test_astral_characters_use_surrogate_pairs() {
        let value = json!({ "e": "😀" });
        assert_eq!(canonical_json(&value).unwrap(), r#"{"e":"\ud83d\ude00"}"#);
    }

    #[test]
    fn test_floats_keep_fraction() {
        let value = json!({ "sum": 1500.0 });
        assert_eq!(canonical_json(&value).unwrap(), r#"{"sum":1500.0}"#);
    }

    #[test]
    fn test_hmac_known_vector() {
        // RFC 4231 test case 2
        assert_eq!(
            hmac_hex(b"what do ya want for nothing?", "Jefe"),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_sign_request_strips_nulls_and_attaches_signature() {
        let signed = sign_request(
            json!({ "sum": 10.0, "orderId": "1_a", "comment": null }),
            "secret",
        )
        .unwrap();
        let obj = signed.as_object().unwrap();
        assert!(!obj.contains_key("comment"));

        let expected = sign_payload(&json!({ "orderId": "1_a", "sum": 10.0 }), "secret").unwrap();
        assert_eq!(obj[SIGNATURE_FIELD], expected);
    }

    #[test]
    fn test_signature_independent_of_key_order() {
        let a: Value = serde_json::from_str(r#"{"order_id":"1_a","status":"success"}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"status":"success","order_id":"1_a"}"#).unwrap();
        assert_eq!(
            sign_payload(&a, "k").unwrap(),
            sign_payload(&b, "k").unwrap()
        );
    }

    #[test]
    fn test_verify_payload() {
        let payload = json!({ "order_id": "482_abx123", "status": "success", "amount": 100.0 });
        let signature = sign_payload(&payload, "webhook_secret_123").unwrap();

        assert!(verify_payload(&payload, &signature, "webhook_secret_123"));
        assert!(!verify_payload(&payload, &signature, "wrong_secret"));
        assert!(!verify_payload(
            &json!({ "order_id": "482_abx123", "status": "success", "amount": 1.0 }),
            &signature,
            "webhook_secret_123"
        ));
    }
}
