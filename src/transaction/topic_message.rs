//! Topic message submission transaction

use crate::error::{Error, Result};
use crate::wire::{DecodeError, TopicMessageSubmitBody, TransactionOperation};

use super::{Transaction, TransactionData};

#[derive(Debug, Clone, Default)]
pub struct TopicMessageSubmitData {
    topic_num: u64,
    message: Vec<u8>,
}

impl TransactionData for TopicMessageSubmitData {
    fn into_operation(self) -> TransactionOperation {
        TransactionOperation::TopicMessageSubmit(TopicMessageSubmitBody {
            topic_num: self.topic_num,
            message: self.message,
        })
    }

    fn try_from_operation(operation: TransactionOperation) -> Result<Self> {
        match operation {
            TransactionOperation::TopicMessageSubmit(body) => Ok(Self {
                topic_num: body.topic_num,
                message: body.message,
            }),
            other => Err(Error::Decode(DecodeError::Malformed(format!(
                "expected topic message body, got {}",
                other.name()
            )))),
        }
    }
}

/// Publishes a message to a consensus topic; the receipt carries the
/// assigned sequence number.
pub type TopicMessageSubmitTransaction = Transaction<TopicMessageSubmitData>;

impl TopicMessageSubmitTransaction {
    pub fn new() -> Self {
        Self::with_data(TopicMessageSubmitData::default())
    }

    pub fn set_topic_num(&mut self, topic_num: u64) -> Result<&mut Self> {
        self.data_mut("topic_num")?.topic_num = topic_num;
        Ok(self)
    }

    pub fn set_message(&mut self, message: impl Into<Vec<u8>>) -> Result<&mut Self> {
        self.data_mut("message")?.message = message.into();
        Ok(self)
    }
}

impl Default for TopicMessageSubmitTransaction {
    fn default() -> Self {
        Self::new()
    }
}
