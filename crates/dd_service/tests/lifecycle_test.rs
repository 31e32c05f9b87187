//! End-to-end lifecycle tests over a real SQLite mailbox.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tempfile::tempdir;

use dd_crypto::aead::NONCE_LEN;
use dd_crypto::kdf::SALT_LEN;
use dd_proto::message::MessageStatus;
use dd_proto::policy::PolicyError;
use dd_service::{MessageService, MessagingError, UserService};
use dd_store::{MailboxIndex, Store};

// 52 characters.
const BODY: &str = "Meet me at the old harbor tonight, gate 4, pier two.";
const PASSPHRASE: &str = "Secret123";

async fn mailbox_with_users(users: &[&str]) -> Store {
    let store = Store::open_in_memory().await.expect("open store");
    for user in users {
        store.create_user(user).await.expect("create user");
    }
    store
}

#[tokio::test]
async fn send_then_read_returns_the_original_text() {
    let store = mailbox_with_users(&["@a", "@b"]).await;
    let messages = MessageService::new(store.clone());

    let id = messages.send("@a", "@b", BODY, PASSPHRASE).await.expect("send");

    let stored = store.get_message(&id).await.expect("get").expect("some");
    assert_eq!(stored.status, MessageStatus::Unread);
    // Only the envelope is persisted, never the plaintext.
    assert!(!stored.envelope.contains("harbor"));

    let plaintext = messages.read(&id, PASSPHRASE, "@b").await.expect("read");
    assert_eq!(plaintext, BODY);

    let stored = store.get_message(&id).await.expect("get").expect("some");
    assert_eq!(stored.status, MessageStatus::Read);
}

#[tokio::test]
async fn same_body_and_passphrase_produce_different_envelopes() {
    let store = mailbox_with_users(&["@a", "@b"]).await;
    let messages = MessageService::new(store.clone());

    let first = messages.send("@a", "@b", BODY, PASSPHRASE).await.expect("send");
    let second = messages.send("@a", "@b", BODY, PASSPHRASE).await.expect("send");

    let e1 = store.get_message(&first).await.unwrap().unwrap().envelope;
    let e2 = store.get_message(&second).await.unwrap().unwrap().envelope;
    assert_ne!(e1, e2);
}

#[tokio::test]
async fn only_the_recipient_may_read() {
    let store = mailbox_with_users(&["@a", "@b", "@c"]).await;
    let messages = MessageService::new(store.clone());

    let id = messages.send("@a", "@b", BODY, PASSPHRASE).await.expect("send");

    // Correct passphrase does not help the wrong requester, and the
    // attempt must not consume the reveal.
    let err = messages.read(&id, PASSPHRASE, "@c").await.unwrap_err();
    assert!(matches!(err, MessagingError::AccessDenied));

    let stored = store.get_message(&id).await.unwrap().unwrap();
    assert_eq!(stored.status, MessageStatus::Unread);

    let plaintext = messages.read(&id, PASSPHRASE, "@b").await.expect("read");
    assert_eq!(plaintext, BODY);
}

#[tokio::test]
async fn reveal_is_one_shot() {
    let store = mailbox_with_users(&["@a", "@b"]).await;
    let messages = MessageService::new(store);

    let id = messages.send("@a", "@b", BODY, PASSPHRASE).await.expect("send");
    messages.read(&id, PASSPHRASE, "@b").await.expect("first read");

    let err = messages.read(&id, PASSPHRASE, "@b").await.unwrap_err();
    assert!(matches!(err, MessagingError::AlreadyRead));
}

#[tokio::test]
async fn wrong_passphrase_fails_and_leaves_the_message_unread() {
    let store = mailbox_with_users(&["@a", "@b"]).await;
    let messages = MessageService::new(store.clone());

    let id = messages.send("@a", "@b", BODY, PASSPHRASE).await.expect("send");

    for guess in ["Wrong1234", "Secret124"] {
        let err = messages.read(&id, guess, "@b").await.unwrap_err();
        assert!(matches!(err, MessagingError::WrongKey));
        let stored = store.get_message(&id).await.unwrap().unwrap();
        assert_eq!(stored.status, MessageStatus::Unread);
    }

    // Retries are unlimited; the right passphrase still works.
    let plaintext = messages.read(&id, PASSPHRASE, "@b").await.expect("read");
    assert_eq!(plaintext, BODY);
}

#[tokio::test]
async fn tampered_envelopes_are_rejected_as_wrong_key() {
    let store = mailbox_with_users(&["@a", "@b"]).await;
    let messages = MessageService::new(store.clone());

    let id = messages.send("@a", "@b", BODY, PASSPHRASE).await.expect("send");
    let envelope = store.get_message(&id).await.unwrap().unwrap().envelope;
    let raw = STANDARD.decode(&envelope).expect("decode");

    // One bit flip in each region: salt, nonce, ciphertext, tag.
    let positions = [
        0,                          // salt
        SALT_LEN + 1,               // nonce
        SALT_LEN + NONCE_LEN + 1,   // ciphertext
        raw.len() - 1,              // tag
    ];
    for pos in positions {
        let mut mangled = raw.clone();
        mangled[pos] ^= 0x01;
        sqlx::query("UPDATE messages SET envelope = ? WHERE id = ?")
            .bind(STANDARD.encode(&mangled))
            .bind(&id)
            .execute(&store.pool)
            .await
            .expect("tamper");

        let err = messages.read(&id, PASSPHRASE, "@b").await.unwrap_err();
        assert!(matches!(err, MessagingError::WrongKey), "flip at byte {pos}");
    }

    // Restore the original envelope; it still opens.
    sqlx::query("UPDATE messages SET envelope = ? WHERE id = ?")
        .bind(&envelope)
        .bind(&id)
        .execute(&store.pool)
        .await
        .expect("restore");
    assert_eq!(messages.read(&id, PASSPHRASE, "@b").await.expect("read"), BODY);
}

#[tokio::test]
async fn truncated_envelope_is_a_format_error() {
    let store = mailbox_with_users(&["@a", "@b"]).await;
    let messages = MessageService::new(store.clone());

    let id = messages.send("@a", "@b", BODY, PASSPHRASE).await.expect("send");
    sqlx::query("UPDATE messages SET envelope = ? WHERE id = ?")
        .bind(STANDARD.encode([0u8; 10]))
        .bind(&id)
        .execute(&store.pool)
        .await
        .expect("truncate");

    let err = messages.read(&id, PASSPHRASE, "@b").await.unwrap_err();
    assert!(matches!(err, MessagingError::Envelope(_)));
}

#[tokio::test]
async fn send_enforces_the_validation_policy() {
    let store = mailbox_with_users(&["@a", "@b"]).await;
    let messages = MessageService::new(store);

    let body_49 = "x".repeat(49);
    let err = messages.send("@a", "@b", &body_49, PASSPHRASE).await.unwrap_err();
    assert!(matches!(
        err,
        MessagingError::Policy(PolicyError::MessageTooShort { min: 50 })
    ));

    let body_50 = "x".repeat(50);
    assert!(messages.send("@a", "@b", &body_50, PASSPHRASE).await.is_ok());

    for (passphrase, expected) in [
        ("abcdefg", PolicyError::PassphraseTooShort { min: 8 }),
        ("abcdefgh", PolicyError::PassphraseNeedsDigit),
    ] {
        let err = messages.send("@a", "@b", BODY, passphrase).await.unwrap_err();
        assert!(matches!(err, MessagingError::Policy(ref e) if *e == expected));
    }
    assert!(messages.send("@a", "@b", BODY, "abcd1234").await.is_ok());
}

#[tokio::test]
async fn unknown_and_malformed_recipients_are_distinguished() {
    let store = mailbox_with_users(&["@a"]).await;
    let messages = MessageService::new(store);

    let err = messages.send("@a", "@ghost", BODY, PASSPHRASE).await.unwrap_err();
    assert!(matches!(err, MessagingError::RecipientNotFound(ref who) if who == "@ghost"));

    let err = messages.send("@a", "ghost", BODY, PASSPHRASE).await.unwrap_err();
    assert!(matches!(
        err,
        MessagingError::Policy(PolicyError::MalformedUsername(_))
    ));
}

#[tokio::test]
async fn reading_an_unknown_message_is_not_found() {
    let store = mailbox_with_users(&["@b"]).await;
    let messages = MessageService::new(store);

    let err = messages.read("no-such-id", PASSPHRASE, "@b").await.unwrap_err();
    assert!(matches!(err, MessagingError::MessageNotFound(_)));
}

#[tokio::test]
async fn self_messaging_is_allowed() {
    let store = mailbox_with_users(&["@a"]).await;
    let messages = MessageService::new(store);

    let id = messages.send("@a", "@a", BODY, PASSPHRASE).await.expect("send");
    let plaintext = messages.read(&id, PASSPHRASE, "@a").await.expect("read");
    assert_eq!(plaintext, BODY);
}

#[tokio::test]
async fn racing_readers_produce_exactly_one_reveal() {
    // A file-backed store so two pool connections hit the same database.
    let dir = tempdir().expect("tempdir");
    let store = Store::open(&dir.path().join("race.db")).await.expect("open");
    store.create_user("@a").await.expect("user");
    store.create_user("@b").await.expect("user");

    let messages = MessageService::new(store.clone());
    let id = messages.send("@a", "@b", BODY, PASSPHRASE).await.expect("send");

    let left = messages.read(&id, PASSPHRASE, "@b");
    let right = messages.read(&id, PASSPHRASE, "@b");
    let (left, right) = tokio::join!(left, right);

    let outcomes = [left, right];
    let wins = outcomes
        .iter()
        .filter(|r| matches!(r, Ok(text) if text == BODY))
        .count();
    let losses = outcomes
        .iter()
        .filter(|r| matches!(r, Err(MessagingError::AlreadyRead)))
        .count();
    assert_eq!((wins, losses), (1, 1), "outcomes: {outcomes:?}");
}

#[tokio::test]
async fn inbox_views_group_and_count_unread() {
    let store = mailbox_with_users(&["@a", "@b", "@c"]).await;
    let messages = MessageService::new(store);

    messages.send("@a", "@c", BODY, PASSPHRASE).await.expect("send");
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    messages.send("@b", "@c", BODY, PASSPHRASE).await.expect("send");
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    messages.send("@a", "@c", BODY, PASSPHRASE).await.expect("send");

    assert_eq!(messages.unread_count("@c").await.expect("count"), 3);

    let inbox = messages.inbox("@c").await.expect("inbox");
    assert_eq!(inbox.len(), 3);
    assert!(inbox[0].sent_at >= inbox[1].sent_at);

    let grouped = messages.inbox_grouped("@c").await.expect("grouped");
    assert_eq!(grouped.len(), 2);
    assert_eq!(grouped["@a"].len(), 2);
    assert_eq!(grouped["@b"].len(), 1);
    assert!(grouped["@a"][0].sent_at >= grouped["@a"][1].sent_at);

    let from_a = messages.from_sender("@c", "@a").await.expect("from");
    assert_eq!(from_a.len(), 2);
}

#[tokio::test]
async fn user_service_checks_format_and_existence() {
    let store = mailbox_with_users(&["@lucas", "@igor"]).await;
    let users = UserService::new(store);

    assert!(users.authenticate("@lucas").await.expect("auth"));
    assert!(!users.authenticate("@nobody").await.expect("auth"));
    assert!(!users.authenticate("lucas").await.expect("auth"));

    let others = users.available_users("@lucas").await.expect("list");
    let names: Vec<_> = others.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["@igor"]);

    assert!(users.register("@pedro").await.expect("register"));
    assert!(!users.register("@pedro").await.expect("register again"));
    let err = users.register("pedro").await.unwrap_err();
    assert!(matches!(err, MessagingError::Policy(_)));
}
