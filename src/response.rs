//! The `{statusCode, body}` envelope handed back to the invoker.
//!
//! ```text
//! 200  {message: "Conversion successful", slideCount, images: [...]}
//! 400  {error, errorKind: "too_many_pages", slideCount}
//! 500  {error, errorKind}
//! ```
//!
//! Library callers get the structured [`ConversionResponse`]; the Lambda
//! entry point sends [`EncodedResponse`], whose `body` is a JSON string.

use crate::config::Locale;
use crate::error::{ConvertError, ErrorKind};
use crate::output::{ConversionOutput, PublishedSlide};
use serde::{Deserialize, Serialize};

pub const SUCCESS_MESSAGE: &str = "Conversion successful";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResponse {
    pub status_code: u16,
    pub body: ResponseBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    #[serde(rename_all = "camelCase")]
    Success {
        message: String,
        slide_count: usize,
        images: Vec<PublishedSlide>,
    },
    #[serde(rename_all = "camelCase")]
    Failure {
        error: String,
        error_kind: ErrorKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        slide_count: Option<usize>,
    },
}

impl ConversionResponse {
    pub fn success(output: &ConversionOutput) -> Self {
        Self {
            status_code: 200,
            body: ResponseBody::Success {
                message: SUCCESS_MESSAGE.to_string(),
                slide_count: output.slide_count,
                images: output.images.clone(),
            },
        }
    }

    /// Localised failure envelope. The page-limit error carries the actual
    /// slide count; every other error embeds its cause in the message.
    pub fn failure(error: &ConvertError, locale: Locale) -> Self {
        let (message, slide_count) = match error {
            ConvertError::TooManyPages { count, max } => {
                (locale.too_many_slides(*max, *count), Some(*count))
            }
            other => (locale.conversion_failed(&other.to_string()), None),
        };

        Self {
            status_code: error.status_code(),
            body: ResponseBody::Failure {
                error: message,
                error_kind: error.kind(),
                slide_count,
            },
        }
    }

    pub fn from_result(result: &Result<ConversionOutput, ConvertError>, locale: Locale) -> Self {
        match result {
            Ok(output) => Self::success(output),
            Err(e) => Self::failure(e, locale),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }

    /// The proxy-integration form: `body` serialised into a JSON string.
    pub fn to_encoded(&self) -> Result<EncodedResponse, serde_json::Error> {
        Ok(EncodedResponse {
            status_code: self.status_code,
            body: serde_json::to_string(&self.body)?,
        })
    }
}

/// `{statusCode, body}` with `body` as a JSON-encoded string, the shape an
/// API Gateway proxy response requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedResponse {
    pub status_code: u16,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ConversionStats;
    use serde_json::json;

    fn output() -> ConversionOutput {
        let images: Vec<PublishedSlide> = (1..=2)
            .map(|n| PublishedSlide {
                slide_number: n,
                storage_key: format!("job/deck_slide_{n:03}.jpg"),
                file_name: format!("deck_slide_{n:03}.jpg"),
                size_bytes: 10,
                floor_reached: false,
            })
            .collect();
        ConversionOutput {
            job_id: "job".into(),
            slide_count: images.len(),
            images,
            stats: ConversionStats::default(),
        }
    }

    #[test]
    fn success_envelope() {
        let json = serde_json::to_value(ConversionResponse::success(&output())).unwrap();
        assert_eq!(
            json,
            json!({
                "statusCode": 200,
                "body": {
                    "message": "Conversion successful",
                    "slideCount": 2,
                    "images": [
                        {"slideNumber": 1, "storageKey": "job/deck_slide_001.jpg", "fileName": "deck_slide_001.jpg"},
                        {"slideNumber": 2, "storageKey": "job/deck_slide_002.jpg", "fileName": "deck_slide_002.jpg"}
                    ]
                }
            })
        );
    }

    #[test]
    fn page_limit_envelope() {
        let err = ConvertError::TooManyPages { count: 25, max: 20 };
        let response = ConversionResponse::failure(&err, Locale::En);
        assert_eq!(response.status_code, 400);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["body"]["slideCount"], 25);
        assert_eq!(json["body"]["errorKind"], "too_many_pages");
        assert!(json["body"]["error"].as_str().unwrap().contains("20"));
    }

    #[test]
    fn generic_failure_envelope_embeds_cause() {
        let err = ConvertError::render("conversion timeout (120 seconds)");
        let response = ConversionResponse::failure(&err, Locale::En);
        assert_eq!(response.status_code, 500);
        assert!(!response.is_success());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["body"]["errorKind"], "render");
        assert!(json["body"]["error"].as_str().unwrap().contains("timeout"));
        assert!(json["body"].get("slideCount").is_none());
    }

    #[test]
    fn japanese_messages() {
        let err = ConvertError::TooManyPages { count: 21, max: 20 };
        match ConversionResponse::failure(&err, Locale::Ja).body {
            ResponseBody::Failure { error, .. } => {
                assert!(error.contains("20枚"));
                assert!(error.contains("21枚"));
            }
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn encoded_envelope_carries_body_as_string() {
        let err = ConvertError::TooManyPages { count: 25, max: 20 };
        let encoded = ConversionResponse::failure(&err, Locale::Ja).to_encoded().unwrap();

        let json = serde_json::to_value(&encoded).unwrap();
        assert_eq!(json["statusCode"], 400);
        assert!(json["body"].is_string());

        let body: serde_json::Value = serde_json::from_str(json["body"].as_str().unwrap()).unwrap();
        assert_eq!(body["slideCount"], 25);
        assert_eq!(body["errorKind"], "too_many_pages");
        assert!(body["error"].as_str().unwrap().contains("20枚"));
    }

    #[test]
    fn encoded_success_round_trips_to_structured_body() {
        let response = ConversionResponse::success(&output());
        let encoded = response.to_encoded().unwrap();
        assert_eq!(encoded.status_code, 200);

        let body: ResponseBody = serde_json::from_str(&encoded.body).unwrap();
        assert_eq!(body, response.body);
    }

    #[test]
    fn envelope_deserialises_back() {
        let response = ConversionResponse::failure(&ConvertError::Validation("x".into()), Locale::En);
        let text = serde_json::to_string(&response).unwrap();
        let back: ConversionResponse = serde_json::from_str(&text).unwrap();
        assert_eq!(back, response);
    }
}
