//! Certificates fetched from a GitHub repository.
//!
//! # Responsibilities
//! - Check the provider options (token, repository, certificate and key paths)
//! - Fetch each artifact's raw content, one request per file
//! - Write the fetched content to the certificate's local files
//!
//! # Design Decisions
//! - No retry: an error status fails the call with the status and reason
//! - The ref defaults to the configured branch when `branch` is absent

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use url::Url;

use crate::certificate::error::{CertificateError, CertificateResult};
use crate::certificate::material::Certificate;
use crate::certificate::provider::ProviderOptions;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_BRANCH: &str = "master";

const RAW_CONTENT_TYPE: &str = "application/vnd.github.v3.raw";
const CLIENT_USER_AGENT: &str = "docker-proxy";

/// Minimal client for the repository contents endpoint.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    base_url: Url,
}

impl GithubClient {
    pub fn new(base_url: &str) -> CertificateResult<Self> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> CertificateResult<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    /// URL of `GET /repos/<repository>/contents/<path>?ref=<reference>`.
    pub fn content_url(&self, repository: &str, path: &str, reference: &str) -> CertificateResult<Url> {
        let route = format!(
            "repos/{}/contents/{}",
            repository.trim_matches('/'),
            path.trim_start_matches('/')
        );
        let mut url = self.base_url.join(&route)?;
        url.query_pairs_mut().append_pair("ref", reference);
        Ok(url)
    }

    /// Raw content of a file in the repository.
    pub async fn get_api_content(
        &self,
        repository: &str,
        path: &str,
        token: Option<&str>,
        reference: &str,
    ) -> CertificateResult<String> {
        let url = self.content_url(repository, path, reference)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(RAW_CONTENT_TYPE));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("token {}", token))
                .map_err(|_| CertificateError::InvalidParameter("token"))?;
            headers.insert(AUTHORIZATION, value);
        }

        tracing::debug!(repository = %repository, path = %path, reference = %reference, "Fetching repository content");

        let response = self.http.get(url).headers(headers).send().await?;
        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(CertificateError::Remote {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

/// Provider reading certificate files from a GitHub repository.
#[derive(Debug, Clone)]
pub struct Github {
    client: GithubClient,
    default_branch: String,
}

impl Github {
    pub const NAME: &'static str = "github";

    const REQUIRED: [&'static str; 4] = ["token", "repository", "certificate_path", "private_key_path"];

    pub fn new(client: GithubClient, default_branch: impl Into<String>) -> Self {
        Self {
            client,
            default_branch: default_branch.into(),
        }
    }

    pub async fn create_certificate(
        &self,
        certificate: &Certificate,
        options: &ProviderOptions,
    ) -> CertificateResult<()> {
        for key in Self::REQUIRED {
            options.require(key)?;
        }

        let token = options.require("token")?;
        let repository = options.require("repository")?;
        let reference = options.get("branch").unwrap_or(self.default_branch.as_str());

        tracing::info!(
            domain = %certificate.domain(),
            repository = %repository,
            reference = %reference,
            "Fetching certificate from github"
        );

        if let Some(chain_path) = options.get("certificate_chain_path") {
            let chain = self
                .client
                .get_api_content(repository, chain_path, Some(token), reference)
                .await?;
            certificate.write_certificate_chain(&chain)?;
        }

        let content = self
            .client
            .get_api_content(repository, options.require("certificate_path")?, Some(token), reference)
            .await?;
        certificate.write_certificate(&content)?;

        let private_key = self
            .client
            .get_api_content(repository, options.require("private_key_path")?, Some(token), reference)
            .await?;
        certificate.write_private_key(&private_key)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_url() {
        let client = GithubClient::new(DEFAULT_API_URL).unwrap();
        let url = client.content_url("org/repo", "certs/c.pem", "master").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/org/repo/contents/certs/c.pem?ref=master"
        );
    }

    #[test]
    fn test_content_url_keeps_base_path() {
        let client = GithubClient::new("https://git.example.com/api/v3").unwrap();
        let url = client.content_url("org/repo", "/k.pem", "main").unwrap();
        assert_eq!(
            url.as_str(),
            "https://git.example.com/api/v3/repos/org/repo/contents/k.pem?ref=main"
        );
    }

    #[tokio::test]
    async fn test_missing_parameters_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let certificate = Certificate::in_directory("a.example.com", dir.path()).unwrap();
        let provider = Github::new(GithubClient::new(DEFAULT_API_URL).unwrap(), DEFAULT_BRANCH);

        let mut options = ProviderOptions::new();
        let expected = ["token", "repository", "certificate_path", "private_key_path"];
        for key in expected {
            let err = provider.create_certificate(&certificate, &options).await.unwrap_err();
            assert!(
                matches!(err, CertificateError::MissingParameter(missing) if missing == key),
                "expected missing `{}`, got {}",
                key,
                err
            );
            options.insert(key, "value");
        }
    }
}
