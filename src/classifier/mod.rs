use crate::event::AppEvent;
use crate::record::Analysis;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::sync::mpsc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::warn;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const FALLBACK_ENDPOINT_ERROR: &str = "The classification service returned an unknown error.";

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("tokio runtime unavailable: {0}")]
    RuntimeUnavailable(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{0}")]
    Endpoint(String),
}

/// A file sent alongside (or instead of) the pasted text. Forwarded as-is;
/// the endpoint handles text extraction for `.txt` and `.pdf` uploads.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct ClassificationPayload {
    #[serde(default)]
    titulo: String,
    classificacao: String,
    sugestao_resposta: String,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    erro: Option<String>,
}

/// Async client for the classification endpoint. Requests run on the tokio
/// runtime captured at construction; outcomes come back as [`AppEvent`]s.
#[derive(Clone)]
pub struct ClassifierClient {
    base_url: String,
    http: reqwest::Client,
    tx: mpsc::Sender<AppEvent>,
    runtime_handle: Handle,
}

impl ClassifierClient {
    pub fn new(base_url: String, tx: mpsc::Sender<AppEvent>) -> Result<Self, ClassifierError> {
        let runtime_handle = Handle::try_current()
            .map_err(|err| ClassifierError::RuntimeUnavailable(err.to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            tx,
            runtime_handle,
        })
    }

    /// Fire-and-forget submission. The caller keeps the submit control
    /// disabled until one of the two completion events arrives, so at most
    /// one request is ever in flight. There is no abort path; a request
    /// runs to completion or failure.
    pub fn submit(&self, text: String, attachment: Option<Attachment>) {
        let tx = self.tx.clone();
        let http = self.http.clone();
        let url = format!("{}/processar", self.base_url);
        let original_text = text.clone();

        self.runtime_handle.spawn(async move {
            let event = match classify(&http, &url, text, attachment).await {
                Ok(payload) => AppEvent::AnalysisReady(Analysis {
                    title: payload.titulo,
                    classification: payload.classificacao,
                    response: payload.sugestao_resposta,
                    original_text,
                }),
                Err(err) => {
                    warn!("classification request failed: {err}");
                    AppEvent::AnalysisFailed(err.to_string())
                }
            };
            let _ = tx.send(event);
        });
    }
}

async fn classify(
    http: &reqwest::Client,
    url: &str,
    text: String,
    attachment: Option<Attachment>,
) -> Result<ClassificationPayload, ClassifierError> {
    let mut form = Form::new().text("email_texto", text);
    if let Some(attachment) = attachment {
        form = form.part(
            "email_arquivo",
            Part::bytes(attachment.bytes).file_name(attachment.file_name),
        );
    }

    let response = http.post(url).multipart(form).send().await?;
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        return Err(ClassifierError::Endpoint(endpoint_error_message(&body)));
    }

    serde_json::from_slice(&body).map_err(|err| {
        ClassifierError::Endpoint(format!("unexpected response from classifier: {err}"))
    })
}

/// Error bodies are expected to carry an `erro` field; anything else falls
/// back to a generic message.
fn endpoint_error_message(body: &[u8]) -> String {
    serde_json::from_slice::<ErrorPayload>(body)
        .ok()
        .and_then(|payload| payload.erro)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_ENDPOINT_ERROR.to_string())
}

#[cfg(test)]
mod tests {
    use super::{endpoint_error_message, ClassificationPayload, ClassifierClient};
    use crate::event::AppEvent;
    use std::sync::mpsc;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn endpoint_error_message_reads_the_erro_field() {
        let body = r#"{"erro": "Nenhum conteúdo de email para analisar."}"#;
        assert_eq!(
            endpoint_error_message(body.as_bytes()),
            "Nenhum conteúdo de email para analisar."
        );
    }

    #[test]
    fn endpoint_error_message_falls_back_when_erro_is_missing() {
        assert_eq!(
            endpoint_error_message(br#"{"detail": "boom"}"#),
            super::FALLBACK_ENDPOINT_ERROR
        );
    }

    #[test]
    fn endpoint_error_message_falls_back_on_a_non_json_body() {
        assert_eq!(
            endpoint_error_message(b"<html>502 Bad Gateway</html>"),
            super::FALLBACK_ENDPOINT_ERROR
        );
    }

    #[test]
    fn classification_payload_tolerates_a_missing_title() {
        let payload: ClassificationPayload = serde_json::from_str(
            r#"{"classificacao": "Produtivo", "sugestao_resposta": "Prezado(a), recebemos sua solicitação."}"#,
        )
        .expect("payload without a title should decode");
        assert_eq!(payload.titulo, "");
        assert_eq!(payload.classificacao, "Produtivo");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn submit_delivers_a_successful_analysis_over_the_channel() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/processar"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "titulo": "Fatura",
                "classificacao": "Financeiro",
                "sugestao_resposta": "Olá, recebemos sua solicitação."
            })))
            .mount(&server)
            .await;

        let (tx, rx) = mpsc::channel();
        let client = ClassifierClient::new(server.uri(), tx).expect("client should build");
        client.submit("Preciso de ajuda com fatura".to_string(), None);

        let event = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("a completion event should arrive");
        match event {
            AppEvent::AnalysisReady(analysis) => {
                assert_eq!(analysis.title, "Fatura");
                assert_eq!(analysis.classification, "Financeiro");
                assert_eq!(analysis.response, "Olá, recebemos sua solicitação.");
                assert_eq!(analysis.original_text, "Preciso de ajuda com fatura");
            }
            other => panic!("expected AnalysisReady, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn submit_reports_the_endpoint_error_message_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/processar"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"erro": "Nenhum texto ou arquivo válido enviado."})),
            )
            .mount(&server)
            .await;

        let (tx, rx) = mpsc::channel();
        let client = ClassifierClient::new(server.uri(), tx).expect("client should build");
        client.submit(String::new(), None);

        let event = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("a completion event should arrive");
        match event {
            AppEvent::AnalysisFailed(message) => {
                assert!(message.contains("Nenhum texto ou arquivo válido enviado."));
            }
            other => panic!("expected AnalysisFailed, got {other:?}"),
        }
    }
}
