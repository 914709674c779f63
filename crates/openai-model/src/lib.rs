//! Adapters for the OpenAI chat-completions dialect.
//!
//! Both [`OpenAIAdapter`] and [`GrokAdapter`] speak the same wire format,
//! they differ in endpoint, default model, the spelling of the token limit
//! and in which options the capability matrix lets through.

#[macro_use]
extern crate tracing;

mod proto;
mod response;
mod schema;

use lingua_model::{
    File, FileUpload, FormPart, ProviderAdapter, ProviderName, Request,
    Response, Result, Target, WireBody, WireReply, WireRequest,
};

const CHAT_PATH: &str = "/chat/completions";
const FILES_PATH: &str = "/files";

/// Parts of the request that carry the structured-output schema.
const SCHEMA_MARKERS: &[&str] = &["response_format", "json_schema"];

/// Adapter for the OpenAI API.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenAIAdapter;

/// Adapter for the xAI Grok API.
#[derive(Clone, Copy, Debug, Default)]
pub struct GrokAdapter;

fn render_chat(target: &Target<'_>, request: &Request) -> Result<WireRequest> {
    let body = proto::create_request(request, target)?;
    let body = serde_json::to_value(&body)
        .map_err(|err| lingua_model::Error::request("render", err))?;
    Ok(WireRequest::json(target.url(CHAT_PATH), body)
        .header("Authorization", format!("Bearer {}", target.api_key)))
}

fn render_upload(
    target: &Target<'_>,
    upload: &FileUpload,
    purpose: Option<&str>,
) -> WireRequest {
    let mut parts = Vec::with_capacity(2);
    if let Some(purpose) = purpose {
        parts.push(FormPart::Text {
            name: "purpose".to_owned(),
            value: purpose.to_owned(),
        });
    }
    parts.push(FormPart::File {
        name: "file".to_owned(),
        filename: upload.filename.clone(),
        mime_type: upload.mime_type.clone(),
        data: upload.data.clone(),
    });
    WireRequest::with_body(target.url(FILES_PATH), WireBody::Multipart(parts))
        .header("Authorization", format!("Bearer {}", target.api_key))
}

impl ProviderAdapter for OpenAIAdapter {
    #[inline]
    fn name(&self) -> ProviderName {
        ProviderName::OpenAI
    }

    #[inline]
    fn schema_markers(&self) -> &'static [&'static str] {
        SCHEMA_MARKERS
    }

    fn render(
        &self,
        target: &Target<'_>,
        request: &Request,
    ) -> Result<WireRequest> {
        render_chat(target, request)
    }

    fn parse(&self, endpoint: &str, reply: &WireReply) -> Result<Response> {
        self.check_status(endpoint, reply)?;
        response::parse_chat_completion(reply)
    }

    fn render_upload(
        &self,
        target: &Target<'_>,
        upload: &FileUpload,
    ) -> Result<WireRequest> {
        Ok(render_upload(target, upload, Some("user_data")))
    }

    fn parse_upload(
        &self,
        endpoint: &str,
        reply: &WireReply,
        upload: &FileUpload,
    ) -> Result<File> {
        self.check_status(endpoint, reply)?;
        response::parse_file_object(self.name(), reply, upload)
    }
}

impl ProviderAdapter for GrokAdapter {
    #[inline]
    fn name(&self) -> ProviderName {
        ProviderName::Grok
    }

    #[inline]
    fn schema_markers(&self) -> &'static [&'static str] {
        SCHEMA_MARKERS
    }

    fn render(
        &self,
        target: &Target<'_>,
        request: &Request,
    ) -> Result<WireRequest> {
        render_chat(target, request)
    }

    fn parse(&self, endpoint: &str, reply: &WireReply) -> Result<Response> {
        self.check_status(endpoint, reply)?;
        response::parse_chat_completion(reply)
    }

    fn render_upload(
        &self,
        target: &Target<'_>,
        upload: &FileUpload,
    ) -> Result<WireRequest> {
        Ok(render_upload(target, upload, None))
    }

    fn parse_upload(
        &self,
        endpoint: &str,
        reply: &WireReply,
        upload: &FileUpload,
    ) -> Result<File> {
        self.check_status(endpoint, reply)?;
        response::parse_file_object(self.name(), reply, upload)
    }
}

#[cfg(test)]
mod tests {
    use lingua_model::{ErrorKind, Provider};

    use super::*;

    #[test]
    fn test_render_headers_and_endpoint() {
        let provider = Provider::new(ProviderName::OpenAI, "sk-test");
        let target = Target::resolve(&provider).unwrap();
        let wire = OpenAIAdapter.render(&target, &Request::new("hi")).unwrap();
        assert_eq!(wire.url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(wire.header_value("authorization"), Some("Bearer sk-test"));

        let provider = Provider::new(ProviderName::Grok, "xai-test")
            .with_base_url("http://localhost:9000/v1/");
        let target = Target::resolve(&provider).unwrap();
        let wire = GrokAdapter.render(&target, &Request::new("hi")).unwrap();
        assert_eq!(wire.url, "http://localhost:9000/v1/chat/completions");
    }

    #[test]
    fn test_api_error() {
        let reply = WireReply::new(
            401,
            r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#,
        );
        let endpoint = "https://api.openai.com/v1/chat/completions";
        let err = OpenAIAdapter.parse(endpoint, &reply).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
        match err {
            lingua_model::Error::Api {
                provider,
                status,
                message,
                endpoint: at,
            } => {
                assert_eq!(provider, ProviderName::OpenAI);
                assert_eq!(status, 401);
                assert_eq!(message, "Incorrect API key provided");
                assert_eq!(at, endpoint);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = GrokAdapter
            .parse("https://api.x.ai/v1/chat/completions", &reply)
            .unwrap_err();
        assert!(err.to_string().starts_with("grok API error (401)"));
    }

    #[test]
    fn test_render_upload() {
        let provider = Provider::new(ProviderName::OpenAI, "sk-test");
        let target = Target::resolve(&provider).unwrap();
        let upload = FileUpload::from_bytes("a.txt", b"hi".to_vec());
        let wire = OpenAIAdapter.render_upload(&target, &upload).unwrap();
        assert_eq!(wire.url, "https://api.openai.com/v1/files");
        let WireBody::Multipart(parts) = &wire.body else {
            panic!("expected a multipart body");
        };
        assert_eq!(parts.len(), 2);
        assert!(matches!(
            &parts[0],
            FormPart::Text { name, value } if name == "purpose" && value == "user_data"
        ));

        let provider = Provider::new(ProviderName::Grok, "xai-test");
        let target = Target::resolve(&provider).unwrap();
        let wire = GrokAdapter.render_upload(&target, &upload).unwrap();
        let WireBody::Multipart(parts) = &wire.body else {
            panic!("expected a multipart body");
        };
        assert_eq!(parts.len(), 1);
    }
}
