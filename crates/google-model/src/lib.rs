//! Adapter for the Gemini API on Google AI Studio.

#[macro_use]
extern crate tracing;

mod proto;
mod response;

use lingua_model::{
    Error, File, FileUpload, ProviderAdapter, ProviderName, Request, Response,
    Result, Target, WireBody, WireReply, WireRequest,
};

const UPLOAD_PATH: &str = "/upload/v1beta/files?uploadType=media";

/// Adapter for the Google Gemini API.
#[derive(Clone, Copy, Debug, Default)]
pub struct GoogleAdapter;

impl ProviderAdapter for GoogleAdapter {
    #[inline]
    fn name(&self) -> ProviderName {
        ProviderName::Google
    }

    #[inline]
    fn schema_markers(&self) -> &'static [&'static str] {
        &["responseJsonSchema", "response_json_schema", "responseSchema"]
    }

    fn render(
        &self,
        target: &Target<'_>,
        request: &Request,
    ) -> Result<WireRequest> {
        let body = proto::create_request(request)?;
        let body = serde_json::to_value(&body)
            .map_err(|err| Error::request("render", err))?;
        let path = format!("/v1beta/models/{}:generateContent", target.model);
        Ok(WireRequest::json(target.url(&path), body)
            .header("x-goog-api-key", target.api_key))
    }

    fn parse(&self, endpoint: &str, reply: &WireReply) -> Result<Response> {
        self.check_status(endpoint, reply)?;
        response::parse_generate_content(reply)
    }

    fn render_upload(
        &self,
        target: &Target<'_>,
        upload: &FileUpload,
    ) -> Result<WireRequest> {
        let body = WireBody::Raw {
            content_type: upload.mime_type.clone(),
            data: upload.data.clone(),
        };
        Ok(WireRequest::with_body(target.url(UPLOAD_PATH), body)
            .header("x-goog-api-key", target.api_key)
            .header("X-Goog-Upload-Protocol", "raw"))
    }

    fn parse_upload(
        &self,
        endpoint: &str,
        reply: &WireReply,
        upload: &FileUpload,
    ) -> Result<File> {
        self.check_status(endpoint, reply)?;
        response::parse_uploaded_file(reply, upload)
    }
}

#[cfg(test)]
mod tests {
    use lingua_model::{ErrorKind, Provider};

    use super::*;

    #[test]
    fn test_render_endpoint() {
        let provider = Provider::new(ProviderName::Google, "AIza-test")
            .with_model("gemini-2.5-pro");
        let target = Target::resolve(&provider).unwrap();
        let wire = GoogleAdapter.render(&target, &Request::new("hi")).unwrap();
        assert_eq!(
            wire.url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-pro:generateContent"
        );
        assert_eq!(wire.header_value("x-goog-api-key"), Some("AIza-test"));
        assert!(!format!("{wire:?}").contains("AIza-test"));
    }

    #[test]
    fn test_api_error() {
        let reply = WireReply::new(
            400,
            r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#,
        );
        let endpoint = "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";
        let err = GoogleAdapter.parse(endpoint, &reply).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("API key not valid"));
    }

    #[test]
    fn test_render_upload() {
        let provider = Provider::new(ProviderName::Google, "k");
        let target = Target::resolve(&provider).unwrap();
        let upload = FileUpload::from_bytes("notes.txt", b"hello".to_vec());
        let wire = GoogleAdapter.render_upload(&target, &upload).unwrap();
        assert_eq!(wire.endpoint(), "https://generativelanguage.googleapis.com/upload/v1beta/files");
        assert!(matches!(
            &wire.body,
            WireBody::Raw { content_type, data }
                if content_type == "text/plain" && data.as_ref() == b"hello"
        ));
    }
}
