//! Transaction lifecycle: freeze, sign, serialize, auto-execute paths

use crate::crypto::PrivateKey;
use crate::error::Error;
use crate::ids::{AccountId, TransactionId};
use crate::status::Status;
use crate::test_utils::{mock_client, operator_account, receipt_ok, receipt_response};
use crate::transaction::{AnyTransaction, TransactionReceipt, TransferTransaction};
use crate::wire::TransactionOperation;

fn frozen_transfer(node_ids: Vec<AccountId>) -> TransferTransaction {
    let mut tx = TransferTransaction::new();
    tx.add_transfer(operator_account(), -50)
        .unwrap()
        .add_transfer(AccountId::from_num(9), 50)
        .unwrap()
        .set_transaction_id(TransactionId::generate(operator_account()))
        .unwrap()
        .set_node_account_ids(node_ids)
        .unwrap()
        .freeze()
        .unwrap();
    tx
}

#[test]
fn freeze_requires_identifiers() {
    let mut tx = TransferTransaction::new();
    assert!(matches!(tx.freeze(), Err(Error::Config(_))));

    tx.set_transaction_id(TransactionId::generate(operator_account()))
        .unwrap();
    assert!(matches!(tx.freeze(), Err(Error::Config(_))));

    tx.set_node_account_ids(vec![AccountId::from_num(3)]).unwrap();
    tx.freeze().unwrap();
    assert!(tx.is_frozen());
}

#[test]
fn freezing_twice_is_an_immutability_error() {
    let mut tx = frozen_transfer(vec![AccountId::from_num(3)]);
    assert!(matches!(tx.freeze(), Err(Error::Immutable { .. })));
}

#[test]
fn mutating_any_field_after_freeze_fails() {
    let mut tx = frozen_transfer(vec![AccountId::from_num(3)]);

    assert!(matches!(
        tx.set_memo("late"),
        Err(Error::Immutable { field: "memo" })
    ));
    assert!(matches!(
        tx.add_transfer(AccountId::from_num(10), 1),
        Err(Error::Immutable { field: "transfers" })
    ));
    assert!(matches!(
        tx.set_max_fee(1),
        Err(Error::Immutable { field: "max_fee" })
    ));
    assert!(matches!(
        tx.set_node_account_ids(vec![AccountId::from_num(4)]),
        Err(Error::Immutable { .. })
    ));
}

#[test]
fn signing_before_freeze_is_a_sequencing_error() {
    let mut tx = TransferTransaction::new();
    let key = PrivateKey::generate();
    assert!(matches!(
        tx.sign(&key),
        Err(Error::NotFrozen { operation: "sign" })
    ));
}

#[test]
fn signing_is_additive_and_idempotent_per_key() {
    let mut tx = frozen_transfer(vec![AccountId::from_num(3), AccountId::from_num(4)]);
    let first = PrivateKey::generate();
    let second = PrivateKey::generate();

    tx.sign(&first).unwrap();
    tx.sign(&first).unwrap();
    assert_eq!(tx.signer_keys().len(), 1);

    tx.sign(&second).unwrap();
    tx.sign(&first).unwrap();
    let keys = tx.signer_keys();
    assert_eq!(keys.len(), 2);
    // Insertion order survives re-signing.
    assert_eq!(keys[0], first.public_key().to_bytes().to_vec());
    assert_eq!(keys[1], second.public_key().to_bytes().to_vec());

    assert!(tx.signed_by(&first.public_key()));
    assert!(tx.signed_by(&second.public_key()));
    assert!(!tx.signed_by(&PrivateKey::generate().public_key()));
}

#[test]
fn to_bytes_requires_freeze() {
    let tx = TransferTransaction::new();
    assert!(matches!(tx.to_bytes(), Err(Error::NotFrozen { .. })));
    assert!(matches!(tx.hash(), Err(Error::NotFrozen { .. })));
}

#[test]
fn unsigned_round_trip_preserves_body_and_discriminator() {
    let tx = frozen_transfer(vec![AccountId::from_num(3), AccountId::from_num(4)]);
    let bytes = tx.to_bytes().unwrap();

    let restored = AnyTransaction::from_bytes(&bytes).unwrap();
    assert!(restored.is_frozen());
    assert_eq!(restored.transaction_id(), tx.transaction_id());
    assert_eq!(
        restored.frozen_node_ids(),
        vec![AccountId::from_num(3), AccountId::from_num(4)]
    );
    assert!(matches!(
        restored.operation(),
        TransactionOperation::Transfer(_)
    ));
    // Byte-for-byte round trip of the whole envelope.
    assert_eq!(restored.to_bytes().unwrap(), bytes);
}

#[test]
fn signed_round_trip_preserves_signature_entries_in_order() {
    let mut tx = frozen_transfer(vec![AccountId::from_num(3)]);
    let first = PrivateKey::generate();
    let second = PrivateKey::generate();
    tx.sign(&first).unwrap();
    tx.sign(&second).unwrap();

    let bytes = tx.to_bytes().unwrap();
    let restored = AnyTransaction::from_bytes(&bytes).unwrap();

    assert_eq!(restored.signer_keys(), tx.signer_keys());
    assert_eq!(restored.to_bytes().unwrap(), bytes);

    // Restored signatures still verify against the restored body.
    let payload = restored
        .signed_payload_for(&AccountId::from_num(3))
        .unwrap();
    for pair in &payload.signatures {
        let key = crate::crypto::PublicKey::from_bytes(&pair.public_key).unwrap();
        key.verify(&payload.body, &pair.signature).unwrap();
    }
}

#[test]
fn restored_transactions_downcast_by_discriminator() {
    let bytes = frozen_transfer(vec![AccountId::from_num(3)]).to_bytes().unwrap();

    let as_transfer = AnyTransaction::from_bytes(&bytes)
        .unwrap()
        .downcast::<crate::transaction::TransferData>()
        .unwrap();
    assert_eq!(as_transfer.transfers().len(), 2);

    let wrong = AnyTransaction::from_bytes(&bytes)
        .unwrap()
        .downcast::<crate::transaction::AccountCreateData>();
    assert!(matches!(wrong, Err(Error::Decode(_))));
}

#[test]
fn from_bytes_rejects_malformed_input() {
    assert!(matches!(
        AnyTransaction::from_bytes(&[0u8; 4]),
        Err(Error::Decode(_))
    ));

    let tx = frozen_transfer(vec![AccountId::from_num(3)]);
    let bytes = tx.to_bytes().unwrap();
    assert!(matches!(
        AnyTransaction::from_bytes(&bytes[..bytes.len() - 2]),
        Err(Error::Decode(_))
    ));
}

#[test]
fn hash_is_stable_across_signing() {
    let mut tx = frozen_transfer(vec![AccountId::from_num(3)]);
    let before = tx.hash().unwrap();
    tx.sign(&PrivateKey::generate()).unwrap();
    // Signatures do not touch the body.
    assert_eq!(tx.hash().unwrap(), before);
    assert_eq!(before.len(), 48);
}

#[tokio::test(start_paused = true)]
async fn execute_auto_freezes_against_topology_and_auto_signs() {
    let (client, transport) = mock_client(3, vec![receipt_ok(Some(AccountId::from_num(1001)))]);

    let mut tx = TransferTransaction::new();
    tx.add_transfer(operator_account(), -10)
        .unwrap()
        .add_transfer(AccountId::from_num(9), 10)
        .unwrap();
    assert!(!tx.is_frozen());

    let receipt = tx.execute(&client).await.unwrap();
    assert_eq!(receipt.status, Status::Ok);
    assert_eq!(receipt.account_id, Some(AccountId::from_num(1001)));

    // Topology-aware freeze bound one body per node.
    assert_eq!(tx.frozen_node_ids().len(), 3);
    let operator_key = client.operator().unwrap().key.public_key();
    assert!(tx.signed_by(&operator_key));
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_receipt_surfaces_as_receipt_error_with_entity_fields() {
    let (client, _transport) = mock_client(
        1,
        vec![receipt_response(
            Status::Ok,
            TransactionReceipt {
                status: Status::InsufficientPayerBalance,
                account_id: Some(AccountId::from_num(1002)),
                topic_sequence_number: None,
            },
        )],
    );

    let mut tx = TransferTransaction::new();
    tx.add_transfer(operator_account(), -10).unwrap();
    let err = tx.execute(&client).await.unwrap_err();
    match err {
        Error::Receipt {
            status, receipt, ..
        } => {
            assert_eq!(status, Status::InsufficientPayerBalance);
            // Entity fields remain inspectable on partial failure.
            assert_eq!(receipt.account_id, Some(AccountId::from_num(1002)));
        }
        other => panic!("expected receipt error, got {other:?}"),
    }
}
