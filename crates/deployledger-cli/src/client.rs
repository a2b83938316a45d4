#![deny(clippy::all, clippy::pedantic)]

use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::args::Cli;
use deployledger_api_types::{ApiErrorBody, IDEMPOTENCY_KEY_HEADER};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("server URL is required (use --server or DEPLOYLEDGER_SERVER_URL)")]
    MissingServer,
    #[error("failed to read input file {path}: {source}")]
    InputFile {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server error: {0}")]
    Server(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Clone, Debug)]
pub struct Ctx {
    pub client: Client,
    pub base: Url,
}

impl Ctx {
    pub fn new(server: &str) -> Result<Self, CliError> {
        let base = Url::parse(server)?.join("/")?;
        let client = Client::builder().user_agent(Self::user_agent()).build()?;
        Ok(Self { client, base })
    }

    pub fn user_agent() -> &'static str {
        concat!("deployledger-cli/", env!("CARGO_PKG_VERSION"))
    }

    pub fn url(&self, path: &str) -> Result<Url, CliError> {
        self.base.join(path).map_err(CliError::Url)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, CliError> {
        let mut url = self.url(path)?;
        if !query.is_empty() {
            let mut qp = url.query_pairs_mut();
            for (k, v) in query {
                qp.append_pair(k, v);
            }
        }

        Self::send(self.client.request(Method::GET, url)).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        idempotency_key: Option<&str>,
    ) -> Result<T, CliError> {
        let mut req = self.client.request(Method::POST, self.url(path)?).json(body);
        if let Some(key) = idempotency_key {
            req = req.header(IDEMPOTENCY_KEY_HEADER, key);
        }

        Self::send(req).await
    }

    async fn send<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, CliError> {
        let resp = req.send().await?;
        Self::handle(resp).await
    }

    async fn handle<T: DeserializeOwned>(resp: Response) -> Result<T, CliError> {
        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            let detail = match serde_json::from_slice::<ApiErrorBody>(&bytes) {
                Ok(body) => match body.error.hint {
                    Some(hint) => format!("{}: {} ({hint})", body.error.code, body.error.message),
                    None => format!("{}: {}", body.error.code, body.error.message),
                },
                Err(_) => String::from_utf8_lossy(&bytes).into_owned(),
            };
            return Err(CliError::Server(format!("status {status} {detail}")));
        }
        let val = serde_json::from_slice(&bytes)
            .map_err(|e| CliError::Server(format!("failed to parse body: {e}")))?;
        Ok(val)
    }
}

pub fn build_ctx_from_cli(cli: &Cli) -> Result<Ctx, CliError> {
    let server = cli.server.as_deref().ok_or(CliError::MissingServer)?;
    Ctx::new(server)
}
