//! Demonstrates ingesting an image twice against a mocked provider: the first call uploads and
//! analyzes it, the second is answered from the dedup store without touching the model.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime};
use url::Url;
// self
use model_broker::{
	auth::{AuthorizationKey, ModelId, ProviderId, ScopeId},
	content::ReqwestContentSource,
	flows::{ImageIngestor, IngestOutcome, ReqwestBroker},
	provider::{DefaultProviderStrategy, ProviderDescriptor, ProviderStrategy, RequestPolicy},
	store::{DedupStore, MemoryStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let expires_at = OffsetDateTime::now_utc() + Duration::minutes(30);
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v2/oauth");
			then.status(200).header("content-type", "application/json").body(format!(
				"{{\"access_token\":\"demo-access\",\"expires_at\":{}}}",
				expires_at.unix_timestamp_nanos() / 1_000_000
			));
		})
		.await;
	let upload_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/files");
			then.status(200).header("content-type", "application/json").body("{\"id\":\"file-demo\"}");
		})
		.await;
	let chat_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/chat/completions");
			then.status(200).header("content-type", "application/json").body(
				"{\"choices\":[{\"message\":{\"content\":\"A ginger cat asleep on a keyboard.\"}}]}",
			);
		})
		.await;
	let mut image_mocks = Vec::new();

	for path in ["/media/first.png", "/media/same-bytes-again.png"] {
		image_mocks.push(
			server
				.mock_async(|when, then| {
					when.method(GET).path(path);
					then.status(200).header("content-type", "image/png").body("not-really-a-png");
				})
				.await,
		);
	}

	let descriptor = ProviderDescriptor::builder(ProviderId::new("demo-provider")?)
		.token_endpoint(Url::parse(&server.url("/api/v2/oauth"))?)
		.api_endpoint(Url::parse(&server.url("/api/v1"))?)
		.scope(ScopeId::new("API_PERS")?)
		.chat_model(ModelId::new("demo-chat")?)
		.vision_model(ModelId::new("demo-vision")?)
		.policy(RequestPolicy { max_auth_retries: 1, ..Default::default() })
		.build()?;
	let strategy: Arc<dyn ProviderStrategy> = Arc::new(DefaultProviderStrategy);
	let broker = ReqwestBroker::new(
		descriptor,
		strategy,
		AuthorizationKey::from_client_credentials("demo-client", "super-secret"),
	)?;
	let ingestor = ImageIngestor::new(
		broker,
		Arc::new(ReqwestContentSource::default()),
		DedupStore::new(Arc::new(MemoryStore::default())),
		"Describe the image in one sentence.",
	)?;

	for location in ["/media/first.png", "/media/same-bytes-again.png"] {
		let outcome = ingestor.ingest(&server.url(location)).await?;
		let label = match &outcome {
			IngestOutcome::Reused(_) => "reused",
			IngestOutcome::Analyzed(_) => "analyzed",
			IngestOutcome::Superseded(_) => "superseded",
		};
		let record = outcome.record();

		println!("{location}: {label} {} -> {}", record.hash, record.analysis);
	}

	token_mock.assert_calls_async(1).await;
	upload_mock.assert_calls_async(1).await;
	chat_mock.assert_calls_async(1).await;

	for image_mock in image_mocks {
		image_mock.assert_calls_async(1).await;
	}

	Ok(())
}
