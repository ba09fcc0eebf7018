use dealer_integrations::mail::{HttpMailApi, OutboundAttachment, OutboundEmail};
use settlement_engine::notifications::{MailMessage, MailTransport, NotifierError};

/// Delivers order confirmations through the HTTP mail API.
#[derive(Clone)]
pub struct HttpMailTransport {
    api: HttpMailApi,
}

impl HttpMailTransport {
    pub fn new(api: HttpMailApi) -> Self {
        Self { api }
    }
}

impl MailTransport for HttpMailTransport {
    async fn send(&self, message: MailMessage) -> Result<(), NotifierError> {
        let email = OutboundEmail {
            from: message.from,
            to: message.to,
            subject: message.subject,
            html: message.html_body,
            attachments: message
                .attachments
                .into_iter()
                .map(|a| OutboundAttachment { file_name: a.file_name, content_type: a.content_type, content: a.content })
                .collect(),
        };
        self.api.send(&email).await.map_err(|e| NotifierError::TransportError(e.to_string()))
    }
}
