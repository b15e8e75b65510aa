use async_trait::async_trait;
use ev_bridge_error::transport::TransportError;
use ev_bridge_error::TransportResult;
use ev_bridge_sdk::{
    translate, BinaryRecordBuilder, Message, Sender, SpecVersion, StructuredBuilder,
    TransformerFactory, VersionTranslator,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Forced wire shape and schema version for a sender.
///
/// Transports that cannot negotiate per message pick one of these at
/// configuration time; [`EncodingSender`] then re-translates every outbound
/// message to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Encoding {
    BinaryV01,
    BinaryV02,
    BinaryV03,
    BinaryV10,
    StructuredV01,
    StructuredV02,
    StructuredV03,
    StructuredV10,
}

impl Encoding {
    pub fn version(&self) -> SpecVersion {
        match self {
            Encoding::BinaryV01 | Encoding::StructuredV01 => SpecVersion::V01,
            Encoding::BinaryV02 | Encoding::StructuredV02 => SpecVersion::V02,
            Encoding::BinaryV03 | Encoding::StructuredV03 => SpecVersion::V03,
            Encoding::BinaryV10 | Encoding::StructuredV10 => SpecVersion::V10,
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(
            self,
            Encoding::StructuredV01
                | Encoding::StructuredV02
                | Encoding::StructuredV03
                | Encoding::StructuredV10
        )
    }
}

/// Sender decorator that re-translates every outbound message to a fixed
/// shape and schema version before handing it to the inner sender.
pub struct EncodingSender {
    inner: Arc<dyn Sender>,
    encoding: Encoding,
}

impl EncodingSender {
    pub fn new(inner: Arc<dyn Sender>, encoding: Encoding) -> Self {
        EncodingSender { inner, encoding }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    fn reshape(&self, message: Message) -> TransportResult<Message> {
        let factories: Vec<Box<dyn TransformerFactory>> =
            vec![VersionTranslator::factory(self.encoding.version())];
        let reshaped = if self.encoding.is_structured() {
            let mut sink = StructuredBuilder::new();
            translate(message, &mut sink, &factories).map_err(send_error)?;
            let (format, bytes) = sink.finish().map_err(send_error)?;
            Message::Structured { format, bytes }
        } else {
            let mut sink = BinaryRecordBuilder::new();
            translate(message, &mut sink, &factories).map_err(send_error)?;
            Message::Binary(sink.finish().map_err(send_error)?)
        };
        Ok(reshaped)
    }
}

fn send_error(err: ev_bridge_sdk::BindingError) -> TransportError {
    TransportError::Send {
        reason: err.to_string(),
    }
}

#[async_trait]
impl Sender for EncodingSender {
    async fn send(
        &self,
        cancel: &CancellationToken,
        message: Message,
    ) -> TransportResult<Option<Message>> {
        let message = self.reshape(message)?;
        self.inner.send(cancel, message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_selects_version_and_shape() {
        assert_eq!(Encoding::BinaryV02.version(), SpecVersion::V02);
        assert!(!Encoding::BinaryV02.is_structured());
        assert_eq!(Encoding::StructuredV10.version(), SpecVersion::V10);
        assert!(Encoding::StructuredV10.is_structured());
    }

    #[test]
    fn encoding_round_trips_through_serde() {
        let json = serde_json::to_string(&Encoding::StructuredV03).unwrap();
        assert_eq!(json, "\"structured-v03\"");
        let back: Encoding = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Encoding::StructuredV03);
    }
}
