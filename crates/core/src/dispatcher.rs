//! The single entry point for one request/response exchange.

use lingua_anthropic_model::AnthropicAdapter;
use lingua_google_model::GoogleAdapter;
use lingua_model::{
    Error, File, FileUpload, Provider, ProviderAdapter, ProviderName, Request,
    Response, Result, Target, Transport, schema_rejection,
};
use lingua_openai_model::{GrokAdapter, OpenAIAdapter};
use tracing::Instrument;

use crate::Context;

/// Returns the adapter that speaks `name`'s wire format.
pub fn adapter_for(name: ProviderName) -> &'static dyn ProviderAdapter {
    match name {
        ProviderName::Anthropic => &AnthropicAdapter,
        ProviderName::OpenAI => &OpenAIAdapter,
        ProviderName::Google => &GoogleAdapter,
        ProviderName::Grok => &GrokAdapter,
    }
}

fn resolve(provider: &Provider) -> Result<(Target<'_>, &'static dyn ProviderAdapter)> {
    let target = Target::resolve(provider)?;
    if target.api_key.trim().is_empty() {
        return Err(Error::validation("APIKey", "API key is empty"));
    }
    Ok((target, adapter_for(target.name)))
}

/// Sends `request` to `provider` and waits for the answer.
///
/// Every local precondition (a known provider, supported options, a
/// well-formed request) is checked before anything touches the transport.
/// If `ctx` is cancelled or expires while the exchange is outstanding, the
/// exchange is abandoned and a cancellation error is returned. Nothing is
/// retried.
pub async fn prompt(
    ctx: &Context,
    transport: &dyn Transport,
    provider: &Provider,
    request: &Request,
) -> Result<Response> {
    let (target, adapter) = resolve(provider)?;
    let span = debug_span!("prompt", provider = %target.name, model = target.model);
    async move {
        request.options.validate(target.name)?;
        request.validate(target.name)?;

        let wire = adapter.render(&target, request)?;
        let endpoint = wire.endpoint().to_owned();
        trace!("rendered request: {wire:?}");

        let reply = ctx
            .run("prompt", adapter.dispatch(transport, wire))
            .await
            .inspect_err(|err| error!("exchange failed: {err}"))?;
        trace!("got reply with status {}", reply.status);

        let response = adapter.parse(&endpoint, &reply).map_err(|err| {
            if request.schema.is_some() {
                schema_rejection(err, adapter.schema_markers())
            } else {
                err
            }
        })?;
        debug!(
            "finished with {:?}, {} tokens",
            response.finish_reason,
            response.tokens.total()
        );
        Ok(response)
    }
    .instrument(span)
    .await
}

/// Uploads a file to `provider` for later use in a [`Request`].
///
/// The returned [`File`] is only valid with the same provider. A failed
/// call that already reached the provider is not rolled back.
pub async fn upload_file(
    ctx: &Context,
    transport: &dyn Transport,
    provider: &Provider,
    upload: &FileUpload,
) -> Result<File> {
    let (target, adapter) = resolve(provider)?;
    let span = debug_span!("upload_file", provider = %target.name, filename = %upload.filename);
    async move {
        upload.validate()?;
        let wire = adapter.render_upload(&target, upload)?;
        let endpoint = wire.endpoint().to_owned();

        let reply = ctx
            .run("upload file", adapter.dispatch(transport, wire))
            .await
            .inspect_err(|err| error!("upload failed: {err}"))?;

        let file = adapter.parse_upload(&endpoint, &reply, upload)?;
        debug!("uploaded as {}", file.id);
        Ok(file)
    }
    .instrument(span)
    .await
}
