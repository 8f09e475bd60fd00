//! Cloudflare API v4 wire types

use serde::{Deserialize, Serialize};

/// Envelope every Cloudflare API response is wrapped in
#[derive(Debug, Deserialize)]
pub struct CloudflareResponse<T> {
    pub success: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub errors: Vec<CloudflareApiError>,
}

impl<T> CloudflareResponse<T> {
    /// First error message the API reported, if any
    pub fn first_error(&self) -> Option<String> {
        self.errors
            .first()
            .map(|e| format!("{} (code {})", e.message, e.code))
    }
}

#[derive(Debug, Deserialize)]
pub struct CloudflareApiError {
    pub code: i64,
    pub message: String,
}

/// DNS record as returned by the API
#[derive(Debug, Deserialize)]
pub struct CloudflareDnsRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    pub ttl: u32,
    #[serde(default)]
    pub proxied: Option<bool>,
}

/// Zone as returned by `GET /zones/{zone_id}`
#[derive(Debug, Deserialize)]
pub struct CloudflareZone {
    pub id: String,
    pub name: String,
}

/// Body of `POST /zones/{zone_id}/dns_records`
#[derive(Debug, Serialize)]
pub struct CreateDnsRecord<'a> {
    #[serde(rename = "type")]
    pub record_type: &'a str,
    pub name: &'a str,
    pub content: &'a str,
    pub ttl: u32,
    pub proxied: bool,
    pub comment: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_list() {
        let body = r#"{
            "success": true,
            "errors": [],
            "messages": [],
            "result": [{
                "id": "372e67954025e0ba6aaa6d586b9e0b59",
                "type": "A",
                "name": "api.example.com",
                "content": "203.0.113.5",
                "ttl": 1,
                "proxied": true,
                "comment": "Managed by dnsrec"
            }]
        }"#;

        let parsed: CloudflareResponse<Vec<CloudflareDnsRecord>> =
            serde_json::from_str(body).unwrap();
        let records = parsed.result.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record_type, "A");
        assert_eq!(records[0].proxied, Some(true));
    }

    #[test]
    fn test_parse_failure_envelope() {
        let body = r#"{
            "success": false,
            "errors": [{ "code": 81057, "message": "Record already exists." }],
            "result": null
        }"#;

        let parsed: CloudflareResponse<CloudflareDnsRecord> = serde_json::from_str(body).unwrap();
        assert!(!parsed.success);
        assert_eq!(
            parsed.first_error().as_deref(),
            Some("Record already exists. (code 81057)")
        );
    }

    #[test]
    fn test_create_body_uses_type_key() {
        let body = CreateDnsRecord {
            record_type: "CNAME",
            name: "www.example.com",
            content: "example.com",
            ttl: 300,
            proxied: false,
            comment: "Managed by dnsrec",
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["type"], "CNAME");
        assert_eq!(json["comment"], "Managed by dnsrec");
        assert!(json.get("record_type").is_none());
    }
}
