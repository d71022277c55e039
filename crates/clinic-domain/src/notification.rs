use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Confirmation,
    Reminder,
    Cancellation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
    Sms,
}

/// Registro de notificación construido por el flujo. La entrega real es
/// responsabilidad de un colaborador externo; aquí sólo se marca `sent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub channel: NotificationChannel,
    pub recipient: String,
    pub sent: bool,
}

impl Notification {
    pub fn confirmation_email(recipient: impl Into<String>) -> Self {
        Self { kind: NotificationKind::Confirmation,
               channel: NotificationChannel::Email,
               recipient: recipient.into(),
               sent: false }
    }
}
