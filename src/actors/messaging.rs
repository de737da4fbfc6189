use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};

use crate::clients::MessageClient;
use crate::domain::{ChatMessage, NewMessage};
use crate::error::MessageError;
use crate::messages::{MessageRequest, ServiceResponse};
use crate::store::rows::{decode_message, message_col, new_message_row, MESSAGE_SCHEMA};
use crate::store::Table;

/// Messaging repository: append-only chat between riders and customers,
/// keyed by order id.
pub struct MessageService {
    receiver: mpsc::Receiver<MessageRequest>,
    messages: Table,
}

impl MessageService {
    pub fn new(buffer_size: usize) -> (Self, MessageClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let service = Self {
            receiver,
            messages: Table::open(MESSAGE_SCHEMA),
        };
        let client = MessageClient::new(sender);
        (service, client)
    }

    #[instrument(name = "message_service", skip(self))]
    pub async fn run(mut self) {
        info!("MessageService starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                MessageRequest::Send {
                    message,
                    respond_to,
                } => {
                    self.handle_send(message, respond_to);
                }
                MessageRequest::History {
                    order_id,
                    since,
                    respond_to,
                } => {
                    self.handle_history(order_id, since, respond_to);
                }
                MessageRequest::Shutdown => {
                    info!("MessageService shutting down");
                    break;
                }
            }
        }

        info!("MessageService stopped");
    }

    #[instrument(
        fields(order_id = %message.order_id, sender_type = %message.sender_type),
        skip(self, message, respond_to)
    )]
    fn handle_send(&mut self, message: NewMessage, respond_to: ServiceResponse<(), MessageError>) {
        debug!("Processing send request");

        let text = message.text.trim();
        if message.order_id.is_empty() || text.is_empty() {
            error!("Validation failed: missing order_id or text");
            let _ = respond_to.send(Err(MessageError::ValidationError(
                "Missing order_id or text".to_string(),
            )));
            return;
        }

        let message = NewMessage {
            text: text.to_string(),
            ..message
        };
        self.messages.append(new_message_row(&message, Utc::now()));

        info!("Message stored");
        let _ = respond_to.send(Ok(()));
    }

    /// Messages for one order in insertion order, optionally only those
    /// strictly newer than the `since` cursor.
    #[instrument(fields(order_id = %order_id), skip(self, respond_to))]
    fn handle_history(
        &self,
        order_id: String,
        since: Option<DateTime<Utc>>,
        respond_to: ServiceResponse<Vec<ChatMessage>, MessageError>,
    ) {
        debug!("Processing history request");

        let messages: Vec<ChatMessage> = self
            .messages
            .rows()
            .filter(|row| row.get(message_col::ORDER_ID).map(String::as_str) == Some(&order_id))
            .map(decode_message)
            .filter(|m| since.map(|cursor| m.timestamp > cursor).unwrap_or(true))
            .collect();

        debug!(count = messages.len(), "Message history collected");
        let _ = respond_to.send(Ok(messages));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SenderType;

    async fn spawn() -> MessageClient {
        let (service, client) = MessageService::new(10);
        tokio::spawn(service.run());
        client
    }

    fn msg(order: &str, text: &str) -> NewMessage {
        NewMessage {
            order_id: order.to_string(),
            sender_type: SenderType::Rider,
            sender_id: "R001".to_string(),
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn history_filters_by_order_and_keeps_insertion_order() {
        let client = spawn().await;
        client.send(msg("ORD-1", "first")).await.unwrap();
        client.send(msg("ORD-2", "other order")).await.unwrap();
        client.send(msg("ORD-1", "second")).await.unwrap();

        let history = client.history("ORD-1".into(), None).await.unwrap();
        let texts: Vec<&str> = history.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["first", "second"]);
    }

    #[tokio::test]
    async fn since_cursor_is_strictly_greater_than() {
        let client = spawn().await;
        client.send(msg("ORD-1", "old")).await.unwrap();

        let all = client.history("ORD-1".into(), None).await.unwrap();
        let cursor = all[0].timestamp;

        // Nothing is newer than its own timestamp.
        let after = client.history("ORD-1".into(), Some(cursor)).await.unwrap();
        assert!(after.is_empty());

        client.send(msg("ORD-1", "new")).await.unwrap();
        let after = client.history("ORD-1".into(), Some(cursor)).await.unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].text, "new");
    }

    #[tokio::test]
    async fn send_rejects_blank_text_and_trims() {
        let client = spawn().await;
        let err = client.send(msg("ORD-1", "   ")).await.unwrap_err();
        assert!(matches!(err, MessageError::ValidationError(_)));

        let err = client.send(msg("", "hello")).await.unwrap_err();
        assert!(matches!(err, MessageError::ValidationError(_)));

        client.send(msg("ORD-1", "  padded  ")).await.unwrap();
        let history = client.history("ORD-1".into(), None).await.unwrap();
        assert_eq!(history[0].text, "padded");
    }
}
