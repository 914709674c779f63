//! Adapter for the Anthropic Messages API.
//!
//! Structured output has no native switch here, so a schema is rendered as
//! a single forced tool whose input is the answer.

#[macro_use]
extern crate tracing;

mod proto;
mod response;

use lingua_model::{
    Error, File, FileUpload, FormPart, ProviderAdapter, ProviderName, Request,
    Response, Result, Target, WireBody, WireReply, WireRequest,
};

const MESSAGES_PATH: &str = "/v1/messages";
const FILES_PATH: &str = "/v1/files";
const API_VERSION: &str = "2023-06-01";
const FILES_BETA: &str = "files-api-2025-04-14";

/// Adapter for the Anthropic API.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnthropicAdapter;

fn authorized(target: &Target<'_>, request: WireRequest) -> WireRequest {
    request
        .header("x-api-key", target.api_key)
        .header("anthropic-version", API_VERSION)
}

impl ProviderAdapter for AnthropicAdapter {
    #[inline]
    fn name(&self) -> ProviderName {
        ProviderName::Anthropic
    }

    #[inline]
    fn schema_markers(&self) -> &'static [&'static str] {
        &["input_schema", proto::JSON_TOOL_NAME]
    }

    fn render(
        &self,
        target: &Target<'_>,
        request: &Request,
    ) -> Result<WireRequest> {
        let body = proto::create_request(request, target)?;
        let body = serde_json::to_value(&body)
            .map_err(|err| Error::request("render", err))?;
        let wire = authorized(
            target,
            WireRequest::json(target.url(MESSAGES_PATH), body),
        );
        if proto::uses_files(request) {
            return Ok(wire.header("anthropic-beta", FILES_BETA));
        }
        Ok(wire)
    }

    fn parse(&self, endpoint: &str, reply: &WireReply) -> Result<Response> {
        self.check_status(endpoint, reply)?;
        response::parse_message(reply)
    }

    fn render_upload(
        &self,
        target: &Target<'_>,
        upload: &FileUpload,
    ) -> Result<WireRequest> {
        let parts = vec![FormPart::File {
            name: "file".to_owned(),
            filename: upload.filename.clone(),
            mime_type: upload.mime_type.clone(),
            data: upload.data.clone(),
        }];
        let wire = WireRequest::with_body(
            target.url(FILES_PATH),
            WireBody::Multipart(parts),
        );
        Ok(authorized(target, wire).header("anthropic-beta", FILES_BETA))
    }

    fn parse_upload(
        &self,
        endpoint: &str,
        reply: &WireReply,
        upload: &FileUpload,
    ) -> Result<File> {
        self.check_status(endpoint, reply)?;
        response::parse_file_metadata(reply, upload)
    }
}
