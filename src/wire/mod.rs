//! Wire codec
//!
//! Deterministic, bidirectional mapping between envelope structures and
//! compact binary form. Encoding is pure; decoding rejects malformed or
//! truncated byte streams with a typed error instead of an unrelated
//! runtime fault.

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::error::Error;

mod messages;

pub use messages::{
    AccountAmount, AccountCreateBody, AccountInfoData, QueryEnvelope, QueryHeader, QueryOperation,
    QueryResult, ResponseEnvelope, ResponseHeader, ResponseKind, SignaturePair, SignedPayload,
    TopicMessageSubmitBody, TransactionBody, TransactionEnvelope, TransactionOperation,
    TransactionReceipt, TransferBody,
};

/// Upper bound on a single decoded message. Guards against length prefixes
/// that would otherwise drive huge allocations.
const MAX_MESSAGE_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("truncated wire payload")]
    Truncated,
    #[error("malformed wire payload: {0}")]
    Malformed(String),
}

fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_MESSAGE_BYTES)
}

fn map_bincode_error(err: bincode::Error) -> DecodeError {
    match *err {
        bincode::ErrorKind::Io(ref io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
            DecodeError::Truncated
        }
        bincode::ErrorKind::SizeLimit => {
            DecodeError::Malformed("message exceeds size limit".into())
        }
        ref other => DecodeError::Malformed(other.to_string()),
    }
}

/// Encode a wire structure. Pure and side-effect free.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, Error> {
    wire_options()
        .serialize(value)
        .map_err(|e| Error::Encode(e.to_string()))
}

/// Decode a wire structure, rejecting malformed, truncated, or
/// trailing-garbage input.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DecodeError> {
    wire_options().deserialize(bytes).map_err(map_bincode_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{AccountId, Timestamp, TransactionId};
    use crate::status::Status;

    fn sample_body() -> TransactionBody {
        TransactionBody {
            transaction_id: TransactionId::new(
                AccountId::from_num(2),
                Timestamp {
                    seconds: 1_700_000_000,
                    nanos: 42,
                },
            ),
            node_account_id: AccountId::from_num(3),
            max_fee: 100_000_000,
            valid_duration_secs: 120,
            memo: "hello".into(),
            operation: TransactionOperation::Transfer(TransferBody {
                transfers: vec![
                    AccountAmount {
                        account_id: AccountId::from_num(2),
                        amount: -10,
                    },
                    AccountAmount {
                        account_id: AccountId::from_num(9),
                        amount: 10,
                    },
                ],
            }),
        }
    }

    #[test]
    fn body_round_trip_preserves_fields_and_discriminator() {
        let body = sample_body();
        let bytes = encode(&body).unwrap();
        let decoded: TransactionBody = decode(&bytes).unwrap();
        assert_eq!(decoded, body);
        assert_eq!(decoded.operation.name(), "transfer");
    }

    #[test]
    fn encoding_is_deterministic() {
        let body = sample_body();
        assert_eq!(encode(&body).unwrap(), encode(&body).unwrap());
    }

    #[test]
    fn truncated_input_is_a_typed_error() {
        let bytes = encode(&sample_body()).unwrap();
        let err = decode::<TransactionBody>(&bytes[..bytes.len() - 3]).unwrap_err();
        assert_eq!(err, DecodeError::Truncated);
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        let mut bytes = encode(&sample_body()).unwrap();
        bytes.extend_from_slice(&[0xde, 0xad]);
        assert!(matches!(
            decode::<TransactionBody>(&bytes),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn unknown_discriminant_is_rejected() {
        // A response envelope whose result enum tag is out of range.
        let envelope = ResponseEnvelope {
            header: ResponseHeader {
                status: Status::Ok,
                cost: 0,
            },
            result: None,
        };
        let mut bytes = encode(&envelope).unwrap();
        // Flip the Option tag to a nonsense value.
        let last = bytes.len() - 1;
        bytes[last] = 0x7f;
        assert!(decode::<ResponseEnvelope>(&bytes).is_err());
    }

    #[test]
    fn default_values_survive_the_round_trip() {
        // Zero/default field values must come back exactly, not as "unset".
        let receipt = TransactionReceipt {
            status: Status::Ok,
            account_id: None,
            topic_sequence_number: Some(0),
        };
        let decoded: TransactionReceipt = decode(&encode(&receipt).unwrap()).unwrap();
        assert_eq!(decoded, receipt);
        assert_eq!(decoded.topic_sequence_number, Some(0));
    }
}
