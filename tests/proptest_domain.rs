//! Property-Based Tests — Domain Layer Invariants
//!
//! Uses `proptest` to verify account-id cleaning, message tagging and
//! the session transition function across random inputs.

use proptest::prelude::*;

use ultra_wallet_adapter::domain::account::clean_account_id;
use ultra_wallet_adapter::domain::message::format_message;
use ultra_wallet_adapter::domain::session::{Signal, WalletAccount, WalletSession};

// ── Account Id Properties ───────────────────────────────────

proptest! {
    /// Ids with `@` keep exactly the part before the first `@`.
    #[test]
    fn suffixed_id_keeps_prefix(name in "[a-z1-5.]{0,12}", domain in "[^@]{0,12}@?[a-z]{0,6}") {
        let raw = format!("{name}@{domain}");
        prop_assert_eq!(clean_account_id(Some(raw.as_str())), name);
    }

    /// Ids without `@` are returned unchanged.
    #[test]
    fn plain_id_unchanged(id in "[^@]{0,24}") {
        prop_assert_eq!(clean_account_id(Some(id.as_str())), id);
    }

    /// The cleaned id never contains `@` and is a prefix of the raw id.
    #[test]
    fn cleaned_id_is_prefix(raw in ".{0,32}") {
        let cleaned = clean_account_id(Some(raw.as_str()));
        prop_assert!(!cleaned.contains('@'));
        prop_assert!(raw.starts_with(&cleaned));
    }
}

// ── Message Formatting Properties ───────────────────────────

proptest! {
    /// Untagged text gains exactly the `message:` prefix.
    #[test]
    fn untagged_text_is_prefixed(body in "[a-zA-Z ]{0,40}") {
        prop_assume!(!body.starts_with("UOS"));
        prop_assert_eq!(format_message(&body), format!("message:{body}"));
    }

    /// Hex payloads pass through untouched.
    #[test]
    fn hex_passes_through(hex in "0x[0-9a-f]{0,64}") {
        prop_assert_eq!(format_message(&hex), hex);
    }

    /// Formatting is idempotent.
    #[test]
    fn formatting_is_idempotent(body in ".{0,40}") {
        let once = format_message(&body);
        prop_assert_eq!(format_message(&once), once.clone());
    }
}

// ── Session Transition Properties ───────────────────────────

fn signal_strategy() -> impl Strategy<Value = Signal> {
    let account = ("[a-z]{1,8}(@ultra)?", "EOS[0-9A-Za-z]{8}")
        .prop_map(|(id, key)| WalletAccount::new(id, key));

    prop_oneof![
        any::<bool>().prop_map(Signal::Detected),
        Just(Signal::OperationStarted),
        Just(Signal::OperationFinished),
        "[a-z ]{1,16}".prop_map(Signal::OperationFailed),
        Just(Signal::ConnectStarted),
        account.clone().prop_map(Signal::Connected),
        "[a-z-]{1,12}".prop_map(Signal::ChainIdResolved),
        Just(Signal::DisconnectStarted),
        Just(Signal::Cleared),
        (0u64..4).prop_map(|generation| Signal::CooldownElapsed { generation }),
        Just(Signal::EagerConnectAttempted),
        ((0u64..4), account.clone())
            .prop_map(|(generation, account)| Signal::ProbeSucceeded { generation, account }),
        (0u64..4).prop_map(|generation| Signal::ProbeFailed { generation }),
        account.prop_map(Signal::ProviderConnected),
        Just(Signal::ProviderDisconnected),
    ]
}

proptest! {
    /// A chain id is only ever held by a connected session.
    #[test]
    fn chain_id_implies_connected(signals in prop::collection::vec(signal_strategy(), 0..64)) {
        let mut session = WalletSession::new();
        for signal in signals {
            session.apply(signal);
            if session.chain_id().is_some() {
                prop_assert!(session.is_connected());
            }
            if session.is_connected() {
                prop_assert!(session.raw_account_id().is_some());
                prop_assert!(session.public_key().is_some());
            }
        }
    }

    /// The eager-connect guard flips exactly once.
    #[test]
    fn eager_guard_accepts_once(signals in prop::collection::vec(signal_strategy(), 0..64)) {
        let mut session = WalletSession::new();
        let mut accepted = 0;
        for signal in signals {
            let is_eager = signal == Signal::EagerConnectAttempted;
            if session.apply(signal) && is_eager {
                accepted += 1;
            }
        }
        prop_assert!(accepted <= 1);
    }

    /// While disconnecting, probes and provider connect events never
    /// establish a session.
    #[test]
    fn disconnecting_blocks_background_reconnect(
        signals in prop::collection::vec(signal_strategy(), 0..32),
        generation in 0u64..4,
    ) {
        let mut session = WalletSession::new();
        for signal in signals {
            session.apply(signal);
        }
        session.apply(Signal::DisconnectStarted);
        session.apply(Signal::Cleared);

        let account = WalletAccount::new("mallory", "EOSkey");
        session.apply(Signal::ProbeSucceeded { generation, account: account.clone() });
        session.apply(Signal::ProviderConnected(account));
        prop_assert!(!session.is_connected());
    }
}
