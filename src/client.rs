//! Service client for AWS Batch job queues.
//!
//! This module defines the `BatchClient` trait and provides an HTTP
//! implementation that calls the AWS Batch REST API directly, signing
//! each request with SigV4.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use aws_credential_types::provider::error::CredentialsError;
use aws_credential_types::provider::ProvideCredentials;
use aws_sigv4::http_request::{sign, SignableBody, SignableRequest, SigningSettings};
use aws_sigv4::sign::v4;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::BatchClientConfig;
use crate::error::{AwsError, JobQueueError};
use crate::types::{
    CreateJobQueueInput, CreateJobQueueOutput, DescribeJobQueuesInput, DescribeJobQueuesOutput,
    UpdateJobQueueInput, UpdateJobQueueOutput,
};

/// Trait for the AWS Batch operations the job queue resource needs.
///
/// This trait abstracts the communication layer, allowing for different
/// implementations (e.g., the HTTP client, mock clients for testing).
#[async_trait]
pub trait BatchClient: Send + Sync {
    /// Creates a job queue.
    async fn create_job_queue(
        &self,
        input: CreateJobQueueInput,
    ) -> Result<CreateJobQueueOutput, JobQueueError>;

    /// Updates the state, priority or compute environment order of a job queue.
    async fn update_job_queue(
        &self,
        input: UpdateJobQueueInput,
    ) -> Result<UpdateJobQueueOutput, JobQueueError>;

    /// Deletes a job queue. The queue must be disabled first.
    async fn delete_job_queue(&self, job_queue: &str) -> Result<(), JobQueueError>;

    /// Describes job queues by name or ARN.
    async fn describe_job_queues(
        &self,
        input: DescribeJobQueuesInput,
    ) -> Result<DescribeJobQueuesOutput, JobQueueError>;

    /// Adds or overwrites tags on a resource.
    async fn tag_resource(
        &self,
        resource_arn: &str,
        tags: &BTreeMap<String, String>,
    ) -> Result<(), JobQueueError>;

    /// Removes tags from a resource.
    async fn untag_resource(
        &self,
        resource_arn: &str,
        tag_keys: &[String],
    ) -> Result<(), JobQueueError>;
}

/// Type alias for a shared BatchClient.
pub type SharedBatchClient = Arc<dyn BatchClient>;

/// Request payload for `DeleteJobQueue`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteJobQueueRequestBody<'a> {
    job_queue: &'a str,
}

/// Request payload for `TagResource`.
#[derive(Debug, Clone, Serialize)]
struct TagResourceRequestBody<'a> {
    tags: &'a BTreeMap<String, String>,
}

/// Error payload returned by the Batch API.
#[derive(Debug, Clone, Default, Deserialize)]
struct ErrorResponseBody {
    #[serde(default, alias = "Message")]
    message: Option<String>,
    #[serde(default, rename = "__type")]
    error_type: Option<String>,
}

/// HTTP implementation of the BatchClient.
pub struct HttpBatchClient {
    /// HTTP client for making requests
    http_client: reqwest::Client,
    /// AWS credentials provider
    credentials_provider: Arc<dyn ProvideCredentials>,
    /// Configuration for the client
    config: BatchClientConfig,
}

impl HttpBatchClient {
    /// Creates a new HttpBatchClient from the environment's AWS config.
    pub async fn from_env() -> Result<Self, JobQueueError> {
        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;
        Self::from_aws_config(&aws_config)
    }

    /// Creates a new HttpBatchClient from AWS SDK config.
    pub fn from_aws_config(aws_config: &aws_config::SdkConfig) -> Result<Self, JobQueueError> {
        let credentials_provider = aws_config
            .credentials_provider()
            .ok_or_else(|| JobQueueError::credentials("No credentials provider configured", false))?;

        Ok(Self {
            http_client: reqwest::Client::new(),
            credentials_provider: Arc::new(credentials_provider),
            config: BatchClientConfig::from_aws_config(aws_config),
        })
    }

    /// Creates a new HttpBatchClient with custom configuration.
    pub fn with_config(
        credentials_provider: Arc<dyn ProvideCredentials>,
        config: BatchClientConfig,
    ) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            credentials_provider,
            config,
        }
    }

    /// Signs an HTTP request using AWS SigV4 and returns the signed headers.
    async fn sign_request(
        &self,
        method: &Method,
        uri: &str,
        body: &[u8],
    ) -> Result<Vec<(String, String)>, JobQueueError> {
        let credentials = self
            .credentials_provider
            .provide_credentials()
            .await
            .map_err(|e| {
                let is_retriable = matches!(
                    e,
                    CredentialsError::ProviderTimedOut(_) | CredentialsError::ProviderError(_)
                );
                JobQueueError::credentials(format!("Failed to get AWS credentials: {}", e), is_retriable)
            })?;

        let identity = credentials.into();
        let signing_settings = SigningSettings::default();
        let signing_params = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.config.region)
            .name("batch")
            .time(SystemTime::now())
            .settings(signing_settings)
            .build()
            .map_err(|e| JobQueueError::signing(format!("Failed to build signing params: {}", e)))?;

        let signable_request = SignableRequest::new(
            method.as_str(),
            uri,
            std::iter::once(("content-type", "application/json")),
            SignableBody::Bytes(body),
        )
        .map_err(|e| JobQueueError::signing(format!("Failed to create signable request: {}", e)))?;

        let (signing_instructions, _signature) = sign(signable_request, &signing_params.into())
            .map_err(|e| JobQueueError::signing(format!("Failed to sign request: {}", e)))?
            .into_parts();

        // Build a temporary HTTP request to apply signing instructions
        let mut temp_request = http::Request::builder()
            .method(method.as_str())
            .uri(uri)
            .body(())
            .map_err(|e| JobQueueError::signing(format!("Failed to build temp request: {}", e)))?;

        signing_instructions.apply_to_request_http1x(&mut temp_request);

        let headers: Vec<(String, String)> = temp_request
            .headers()
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_str().unwrap_or("").to_string()))
            .collect();

        Ok(headers)
    }

    /// Sends a signed request and returns the raw response body.
    async fn send(
        &self,
        method: Method,
        uri: String,
        body: Vec<u8>,
        operation: &str,
        resource_name: &str,
    ) -> Result<Vec<u8>, JobQueueError> {
        let signed_headers = self.sign_request(&method, &uri, &body).await?;

        let mut request = self
            .http_client
            .request(method, &uri)
            .header("Content-Type", "application/json")
            .body(body);

        for (name, value) in signed_headers {
            request = request.header(&name, &value);
        }

        tracing::debug!(operation = operation, resource = resource_name, "Calling AWS Batch");

        let response = request
            .send()
            .await
            .map_err(|e| JobQueueError::api(operation, resource_name, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let error_type = header_value(response.headers(), "x-amzn-errortype");
        let request_id = header_value(response.headers(), "x-amzn-requestid");
        let response_body = response.bytes().await.map_err(|e| {
            JobQueueError::api(operation, resource_name, format!("Failed to read response body: {}", e))
        })?;

        if status.is_success() {
            return Ok(response_body.to_vec());
        }

        let parsed: ErrorResponseBody = serde_json::from_slice(&response_body).unwrap_or_default();
        let error_message = parsed
            .message
            .unwrap_or_else(|| String::from_utf8_lossy(&response_body).to_string());
        let code = error_type
            .or(parsed.error_type)
            .map(|t| t.split(':').next().unwrap_or_default().to_string())
            .unwrap_or_else(|| status.to_string());

        if status.as_u16() == 429 || code.contains("Throttling") || code.contains("TooManyRequests") {
            return Err(JobQueueError::Throttling {
                message: format!("Rate limit exceeded: {}", error_message),
                retry_after_ms: None,
            });
        }

        if status.as_u16() == 404 || code.contains("ResourceNotFound") {
            return Err(JobQueueError::ResourceNotFound {
                message: error_message,
                resource_id: Some(resource_name.to_string()),
            });
        }

        Err(JobQueueError::Api {
            message: format!("{} returned {}: {}", operation, status, error_message),
            operation: operation.to_string(),
            resource_name: resource_name.to_string(),
            aws_error: Some(AwsError {
                code,
                message: error_message,
                request_id,
            }),
        })
    }

    async fn post_json<I, O>(
        &self,
        path: &str,
        input: &I,
        operation: &str,
        resource_name: &str,
    ) -> Result<O, JobQueueError>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let body = serde_json::to_vec(input).map_err(|e| {
            JobQueueError::serdes(format!("Failed to serialize {} request: {}", operation, e))
        })?;
        let uri = format!("{}{}", self.config.endpoint(), path);
        let response_body = self
            .send(Method::POST, uri, body, operation, resource_name)
            .await?;
        decode_body(&response_body, operation)
    }

    fn tags_uri(&self, resource_arn: &str) -> String {
        format!(
            "{}/v1/tags/{}",
            self.config.endpoint(),
            urlencoding::encode(resource_arn)
        )
    }
}

fn header_value(headers: &reqwest::header::HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Decodes a response body, treating an empty body as `{}`.
fn decode_body<O: DeserializeOwned>(body: &[u8], operation: &str) -> Result<O, JobQueueError> {
    let body: &[u8] = if body.is_empty() { b"{}" } else { body };
    serde_json::from_slice(body).map_err(|e| {
        JobQueueError::serdes(format!("Failed to deserialize {} response: {}", operation, e))
    })
}

#[async_trait]
impl BatchClient for HttpBatchClient {
    async fn create_job_queue(
        &self,
        input: CreateJobQueueInput,
    ) -> Result<CreateJobQueueOutput, JobQueueError> {
        let name = input.job_queue_name.clone();
        self.post_json("/v1/createjobqueue", &input, "CreateJobQueue", &name)
            .await
    }

    async fn update_job_queue(
        &self,
        input: UpdateJobQueueInput,
    ) -> Result<UpdateJobQueueOutput, JobQueueError> {
        let name = input.job_queue.clone();
        self.post_json("/v1/updatejobqueue", &input, "UpdateJobQueue", &name)
            .await
    }

    async fn delete_job_queue(&self, job_queue: &str) -> Result<(), JobQueueError> {
        let body = DeleteJobQueueRequestBody { job_queue };
        let _: serde_json::Value = self
            .post_json("/v1/deletejobqueue", &body, "DeleteJobQueue", job_queue)
            .await?;
        Ok(())
    }

    async fn describe_job_queues(
        &self,
        input: DescribeJobQueuesInput,
    ) -> Result<DescribeJobQueuesOutput, JobQueueError> {
        let name = input.job_queues.join(",");
        self.post_json("/v1/describejobqueues", &input, "DescribeJobQueues", &name)
            .await
    }

    async fn tag_resource(
        &self,
        resource_arn: &str,
        tags: &BTreeMap<String, String>,
    ) -> Result<(), JobQueueError> {
        let body = serde_json::to_vec(&TagResourceRequestBody { tags })?;
        self.send(
            Method::POST,
            self.tags_uri(resource_arn),
            body,
            "TagResource",
            resource_arn,
        )
        .await?;
        Ok(())
    }

    async fn untag_resource(
        &self,
        resource_arn: &str,
        tag_keys: &[String],
    ) -> Result<(), JobQueueError> {
        let query = tag_keys
            .iter()
            .map(|k| format!("tagKeys={}", urlencoding::encode(k)))
            .collect::<Vec<_>>()
            .join("&");
        let uri = format!("{}?{}", self.tags_uri(resource_arn), query);
        self.send(Method::DELETE, uri, Vec::new(), "UntagResource", resource_arn)
            .await?;
        Ok(())
    }
}

/// A call recorded by [`MockBatchClient`].
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCall {
    CreateJobQueue(CreateJobQueueInput),
    UpdateJobQueue(UpdateJobQueueInput),
    DeleteJobQueue(String),
    DescribeJobQueues(DescribeJobQueuesInput),
    TagResource {
        resource_arn: String,
        tags: BTreeMap<String, String>,
    },
    UntagResource {
        resource_arn: String,
        tag_keys: Vec<String>,
    },
}

/// A scripted mock implementation of BatchClient for testing.
///
/// Responses are consumed in order per operation; when a queue runs dry the
/// mock answers with a benign default (an empty describe result, an echoed
/// create). Every call is recorded.
#[cfg(test)]
pub struct MockBatchClient {
    create_responses: std::sync::Mutex<Vec<Result<CreateJobQueueOutput, JobQueueError>>>,
    update_responses: std::sync::Mutex<Vec<Result<UpdateJobQueueOutput, JobQueueError>>>,
    delete_responses: std::sync::Mutex<Vec<Result<(), JobQueueError>>>,
    describe_responses: std::sync::Mutex<Vec<Result<DescribeJobQueuesOutput, JobQueueError>>>,
    tag_responses: std::sync::Mutex<Vec<Result<(), JobQueueError>>>,
    calls: std::sync::Mutex<Vec<ClientCall>>,
}

#[cfg(test)]
impl MockBatchClient {
    pub fn new() -> Self {
        Self {
            create_responses: std::sync::Mutex::new(Vec::new()),
            update_responses: std::sync::Mutex::new(Vec::new()),
            delete_responses: std::sync::Mutex::new(Vec::new()),
            describe_responses: std::sync::Mutex::new(Vec::new()),
            tag_responses: std::sync::Mutex::new(Vec::new()),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn with_create_response(self, response: Result<CreateJobQueueOutput, JobQueueError>) -> Self {
        self.create_responses.lock().unwrap().push(response);
        self
    }

    pub fn with_update_response(self, response: Result<UpdateJobQueueOutput, JobQueueError>) -> Self {
        self.update_responses.lock().unwrap().push(response);
        self
    }

    pub fn with_delete_response(self, response: Result<(), JobQueueError>) -> Self {
        self.delete_responses.lock().unwrap().push(response);
        self
    }

    pub fn with_describe_response(
        self,
        response: Result<DescribeJobQueuesOutput, JobQueueError>,
    ) -> Self {
        self.describe_responses.lock().unwrap().push(response);
        self
    }

    /// Queues a describe response containing the given queues.
    pub fn with_described(self, queues: Vec<crate::types::JobQueueDetail>) -> Self {
        self.with_describe_response(Ok(DescribeJobQueuesOutput {
            job_queues: queues,
            next_token: None,
        }))
    }

    /// Queues a response for the next tag or untag call.
    pub fn with_tag_response(self, response: Result<(), JobQueueError>) -> Self {
        self.tag_responses.lock().unwrap().push(response);
        self
    }

    /// Returns every call made so far, in order.
    pub fn calls(&self) -> Vec<ClientCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns the calls that mutate the queue, skipping describes.
    pub fn mutating_calls(&self) -> Vec<ClientCall> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, ClientCall::DescribeJobQueues(_)))
            .collect()
    }

    fn record(&self, call: ClientCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn next<T>(queue: &std::sync::Mutex<Vec<Result<T, JobQueueError>>>) -> Option<Result<T, JobQueueError>> {
        let mut responses = queue.lock().unwrap();
        if responses.is_empty() {
            None
        } else {
            Some(responses.remove(0))
        }
    }
}

#[cfg(test)]
#[async_trait]
impl BatchClient for MockBatchClient {
    async fn create_job_queue(
        &self,
        input: CreateJobQueueInput,
    ) -> Result<CreateJobQueueOutput, JobQueueError> {
        let name = input.job_queue_name.clone();
        self.record(ClientCall::CreateJobQueue(input));
        Self::next(&self.create_responses).unwrap_or_else(|| {
            Ok(CreateJobQueueOutput {
                job_queue_arn: format!("arn:aws:batch:us-east-1:123456789012:job-queue/{}", name),
                job_queue_name: name,
            })
        })
    }

    async fn update_job_queue(
        &self,
        input: UpdateJobQueueInput,
    ) -> Result<UpdateJobQueueOutput, JobQueueError> {
        self.record(ClientCall::UpdateJobQueue(input));
        Self::next(&self.update_responses).unwrap_or_else(|| Ok(UpdateJobQueueOutput::default()))
    }

    async fn delete_job_queue(&self, job_queue: &str) -> Result<(), JobQueueError> {
        self.record(ClientCall::DeleteJobQueue(job_queue.to_string()));
        Self::next(&self.delete_responses).unwrap_or(Ok(()))
    }

    async fn describe_job_queues(
        &self,
        input: DescribeJobQueuesInput,
    ) -> Result<DescribeJobQueuesOutput, JobQueueError> {
        self.record(ClientCall::DescribeJobQueues(input));
        Self::next(&self.describe_responses).unwrap_or_else(|| Ok(DescribeJobQueuesOutput::default()))
    }

    async fn tag_resource(
        &self,
        resource_arn: &str,
        tags: &BTreeMap<String, String>,
    ) -> Result<(), JobQueueError> {
        self.record(ClientCall::TagResource {
            resource_arn: resource_arn.to_string(),
            tags: tags.clone(),
        });
        Self::next(&self.tag_responses).unwrap_or(Ok(()))
    }

    async fn untag_resource(
        &self,
        resource_arn: &str,
        tag_keys: &[String],
    ) -> Result<(), JobQueueError> {
        self.record(ClientCall::UntagResource {
            resource_arn: resource_arn.to_string(),
            tag_keys: tag_keys.to_vec(),
        });
        Self::next(&self.tag_responses).unwrap_or(Ok(()))
    }
}
