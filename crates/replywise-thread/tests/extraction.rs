//! Integration tests for thread extraction.
//!
//! These tests build small Gmail-shaped snapshots and run the full
//! extraction and anchor chain over them.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use replywise_thread::address::clean_display_name;
use replywise_thread::{
    AnchorHint, AnchorStrategy, DocumentTree, DomThreadSource, Element, ExtractorConfig, NodeId,
    Snapshot, ThreadSource, Warning,
};

fn message_element(id: &str, from: (&str, &str), to: &[(&str, &str)], body: &str) -> Element {
    let mut recipients = Element::new("div").attr("data-recipients", "");
    for (email, name) in to {
        recipients = recipients.child(
            Element::new("span")
                .attr("email", *email)
                .attr("name", *name)
                .text(*name),
        );
    }
    Element::new("div")
        .attr("data-message-id", id)
        .attr("data-legacy-message-id", format!("legacy-{id}"))
        .child(
            Element::new("span")
                .attr("data-sender", "")
                .attr("email", from.0)
                .attr("name", from.1)
                .text(from.1),
        )
        .child(recipients)
        .child(Element::new("div").attr("data-message-body", "").text(body))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("replywise_thread=debug")
        .with_test_writer()
        .try_init();
}

/// Two messages, a reply area after them, and the signed-in account.
fn gmail_thread() -> (Snapshot, NodeId) {
    let mut doc = Snapshot::with_title("Lunch? - bob@x.com - Mail");
    doc.append(
        doc.root(),
        Element::new("a").attr("aria-label", "Google Account: Bob Builder (bob@x.com)"),
    )
    .unwrap();
    let thread = doc.append(doc.root(), Element::new("div").attr("role", "list")).unwrap();
    doc.append(
        thread,
        message_element(
            "m1",
            ("Alice@X.com", "Alice Liddell"),
            &[("bob@x.com", "Bob Builder"), ("carol@x.com", "Carol")],
            "Lunch on Friday?",
        ),
    )
    .unwrap();
    doc.append(
        thread,
        message_element(
            "m2",
            ("bob@x.com", "Bob Builder"),
            &[("alice@x.com", "Alice Liddell")],
            "Sure, where?",
        ),
    )
    .unwrap();
    let reply_area = doc.append(thread, Element::new("div")).unwrap();
    let compose = doc
        .append(reply_area, Element::new("div").attr("contenteditable", "true"))
        .unwrap();
    (doc, compose)
}

#[test]
fn test_extracts_messages_and_local_user() {
    init_tracing();
    let (doc, _) = gmail_thread();
    let source = DomThreadSource::new(&doc, ExtractorConfig::default());
    let extraction = source.list_messages().unwrap();

    let local = extraction.local_user.as_ref().unwrap();
    assert_eq!(local.email, "bob@x.com");
    assert_eq!(local.display_name, "Bob Builder");
    assert!(extraction.warnings.is_empty());

    assert_eq!(extraction.messages.len(), 2);
    let first = &extraction.messages[0];
    assert_eq!(first.sender, "alice@x.com");
    assert_eq!(first.sender_display_name, "Alice Liddell");
    assert_eq!(first.recipients.len(), 2);
    assert_eq!(first.body_text, "Lunch on Friday?");
    assert_eq!(first.ids.durable.as_deref(), Some("m1"));
    assert_eq!(first.ids.legacy.as_deref(), Some("legacy-m1"));
    assert!(!first.is_authored_by_local_user);
    assert!(extraction.messages[1].is_authored_by_local_user);
}

#[test]
fn test_anchor_falls_back_to_preceding_sibling() {
    init_tracing();
    let (doc, compose) = gmail_thread();
    let source = DomThreadSource::new(&doc, ExtractorConfig::default());

    let anchor = source.find_anchor(&AnchorHint::for_compose(compose)).unwrap();
    assert_eq!(anchor.index, 1);
    assert_eq!(anchor.strategy, AnchorStrategy::PrecedingSibling);
}

#[test]
fn test_anchor_prefers_cached_id_over_structure() {
    let (doc, compose) = gmail_thread();
    let source = DomThreadSource::new(&doc, ExtractorConfig::default());

    let mut hint = AnchorHint::for_compose(compose);
    hint.cached_ids.durable = Some("m1".to_string());
    let anchor = source.find_anchor(&hint).unwrap();
    assert_eq!(anchor.index, 0);
    assert_eq!(anchor.strategy, AnchorStrategy::DurableId);
}

#[test]
fn test_missing_local_user_is_degraded_not_fatal() {
    let mut doc = Snapshot::new();
    doc.append(
        doc.root(),
        message_element("m1", ("bob@x.com", "Bob"), &[("alice@x.com", "Alice")], "hi"),
    )
    .unwrap();

    let source = DomThreadSource::new(&doc, ExtractorConfig::default());
    let extraction = source.list_messages().unwrap();

    assert!(extraction.local_user.is_none());
    assert_eq!(extraction.warnings, vec![Warning::LocalUserUnresolved]);
    assert!(extraction.messages.iter().all(|m| !m.is_authored_by_local_user));
}

#[test]
fn test_local_user_from_title_only() {
    let mut doc = Snapshot::with_title("Inbox (3) - dana@corp.example - Mail");
    doc.append(
        doc.root(),
        message_element("m1", ("dana@corp.example", "Dana"), &[], "note to self"),
    )
    .unwrap();

    let extraction = DomThreadSource::new(&doc, ExtractorConfig::default()).extract();
    assert_eq!(extraction.local_address(), Some("dana@corp.example"));
    assert!(extraction.messages[0].is_authored_by_local_user);
}

#[test]
fn test_recipients_from_text_when_no_attributes() {
    let mut doc = Snapshot::with_title("x - bob@x.com");
    doc.append(
        doc.root(),
        Element::new("div")
            .attr("data-message-id", "m1")
            .child(Element::new("span").attr("data-sender", "").text("Alice <alice@x.com>"))
            .child(
                Element::new("div")
                    .attr("data-recipients", "")
                    .text("to Bob <BOB@x.com>, carol@x.com, bob@x.com"),
            ),
    )
    .unwrap();

    let extraction = DomThreadSource::new(&doc, ExtractorConfig::default()).extract();
    let message = &extraction.messages[0];
    assert_eq!(message.sender, "alice@x.com");
    assert_eq!(message.sender_display_name, "Alice");
    let emails: Vec<_> = message.recipients.iter().map(|p| p.email.as_str()).collect();
    assert_eq!(emails, vec!["bob@x.com", "carol@x.com"]);
    assert_eq!(message.recipients.first().unwrap().display_name, "bob");
}

#[test]
fn test_message_without_sender_is_skipped() {
    let mut doc = Snapshot::with_title("x - bob@x.com");
    doc.append(doc.root(), Element::new("div").attr("data-message-id", "m0").text("?"))
        .unwrap();
    doc.append(
        doc.root(),
        message_element("m1", ("alice@x.com", "Alice"), &[], "hello"),
    )
    .unwrap();

    let extraction = DomThreadSource::new(&doc, ExtractorConfig::default()).extract();
    assert_eq!(extraction.messages.len(), 1);
    assert!(
        extraction
            .warnings
            .contains(&Warning::MessageWithoutSender { position: 0 })
    );
}

#[test]
fn test_body_is_truncated() {
    let mut doc = Snapshot::new();
    doc.append(
        doc.root(),
        message_element("m1", ("alice@x.com", "Alice"), &[], &"é".repeat(50)),
    )
    .unwrap();

    let config = ExtractorConfig {
        body_char_limit: 10,
        ..ExtractorConfig::default()
    };
    let extraction = DomThreadSource::new(&doc, config).extract();
    assert_eq!(extraction.messages[0].body_text.chars().count(), 10);
}

#[test]
fn test_html_body_converted_to_text() {
    let mut doc = Snapshot::new();
    doc.append(
        doc.root(),
        Element::new("div")
            .attr("data-message-id", "m1")
            .child(Element::new("span").attr("data-sender", "").attr("email", "alice@x.com"))
            .child(
                Element::new("div")
                    .attr("data-message-body", "")
                    .html("<p>Hello <b>there</b></p>"),
            ),
    )
    .unwrap();

    let extraction = DomThreadSource::new(&doc, ExtractorConfig::default()).extract();
    let body = &extraction.messages[0].body_text;
    assert!(body.contains("Hello"));
    assert!(body.contains("there"));
    assert!(!body.contains("<p>"));
}

proptest! {
    #[test]
    fn prop_clean_display_name_never_empty_or_address(
        raw in ".{0,40}",
        local in "[a-z0-9._]{0,12}",
        domain in "[a-z]{1,8}\\.[a-z]{2,4}",
    ) {
        let email = format!("{local}@{domain}");
        let name = clean_display_name(&raw, &email);
        prop_assert!(!name.is_empty());
        prop_assert!(!name.contains('@'));
    }
}
